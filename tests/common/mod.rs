//! Common test utilities: result-set builders, an in-memory result source,
//! and a paint surface that records what it was asked to do.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::Notify;

use lazygrid::{
    GridConfig, GridError, HostAttributes, PaintSurface, ResultRow, ResultSource, RowWindow,
    Schema, SurfaceSize, ValueType, VisibleRange,
};

// ============================================================================
// Builders
// ============================================================================

#[must_use]
pub fn range(start: usize, end: usize) -> VisibleRange {
    VisibleRange::new(start, end).expect("non-empty range")
}

#[must_use]
pub fn schema(entries: &[(&str, ValueType)]) -> Schema {
    entries.iter().map(|(n, t)| (*n, *t)).collect()
}

/// `rows` flat rows with an integer `id` and a float `price = id * 1.5`.
#[must_use]
pub fn flat_rows(rows: usize) -> Vec<ResultRow> {
    (0..rows)
        .map(|r| {
            ResultRow::new()
                .with("id", r as i64)
                .with("price", r as f64 * 1.5)
        })
        .collect()
}

#[must_use]
pub fn flat_schema() -> Schema {
    schema(&[("id", ValueType::Integer), ("price", ValueType::Float)])
}

#[must_use]
pub fn no_pivots() -> HostAttributes {
    HostAttributes::default()
}

/// 20px rows under a 20px header; results above `lazy_threshold` rows load lazily.
#[must_use]
pub fn lazy_config(lazy_threshold: usize) -> GridConfig {
    GridConfig {
        row_height: 20.0,
        lazy_threshold,
        ..GridConfig::default()
    }
}

// ============================================================================
// Result source
// ============================================================================

struct MockState {
    rows: Vec<ResultRow>,
    schema: Schema,
    table_schema: Schema,
    windows: RefCell<Vec<RowWindow>>,
    hold: RefCell<Option<Rc<Notify>>>,
    fail_next: Cell<bool>,
}

/// In-memory result source. Clones share state, so a test can keep a handle
/// to a source it handed to a grid.
#[derive(Clone)]
pub struct MockSource {
    state: Rc<MockState>,
}

impl MockSource {
    pub fn new(rows: Vec<ResultRow>, schema: Schema) -> Self {
        Self::with_table_schema(rows, schema.clone(), schema)
    }

    pub fn with_table_schema(rows: Vec<ResultRow>, schema: Schema, table_schema: Schema) -> Self {
        Self {
            state: Rc::new(MockState {
                rows,
                schema,
                table_schema,
                windows: RefCell::new(Vec::new()),
                hold: RefCell::new(None),
                fail_next: Cell::new(false),
            }),
        }
    }

    pub fn flat(rows: usize) -> Self {
        Self::new(flat_rows(rows), flat_schema())
    }

    /// Every row window requested so far.
    pub fn windows(&self) -> Vec<RowWindow> {
        self.state.windows.borrow().clone()
    }

    /// Row windows requested with an explicit start, i.e. range fetches.
    pub fn range_fetches(&self) -> Vec<RowWindow> {
        self.windows()
            .into_iter()
            .filter(|w| w.start_row.is_some())
            .collect()
    }

    /// Make row requests wait until [`MockSource::release`].
    pub fn hold(&self) {
        *self.state.hold.borrow_mut() = Some(Rc::new(Notify::new()));
    }

    /// Let every held and future row request through.
    pub fn release(&self) {
        if let Some(notify) = self.state.hold.borrow_mut().take() {
            notify.notify_waiters();
        }
    }

    /// Fail the next row request.
    pub fn fail_next(&self) {
        self.state.fail_next.set(true);
    }
}

impl ResultSource for MockSource {
    async fn num_rows(&self) -> lazygrid::Result<usize> {
        Ok(self.state.rows.len())
    }

    async fn to_json(&self, window: RowWindow) -> lazygrid::Result<Vec<ResultRow>> {
        self.state.windows.borrow_mut().push(window);
        let hold = self.state.hold.borrow().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        if self.state.fail_next.replace(false) {
            return Err(GridError::Source("connection lost".to_string()));
        }
        let len = self.state.rows.len();
        let start = window.start_row.unwrap_or(0).min(len);
        let end = window.end_row.unwrap_or(len).clamp(start, len);
        Ok(self.state.rows[start..end].to_vec())
    }

    async fn schema(&self) -> lazygrid::Result<Schema> {
        Ok(self.state.schema.clone())
    }

    async fn table_schema(&self) -> lazygrid::Result<Schema> {
        Ok(self.state.table_schema.clone())
    }
}

// ============================================================================
// Paint surface
// ============================================================================

/// Paint surface that counts paints and records resizes.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub paints: usize,
    pub resizes: Vec<(SurfaceSize, f64)>,
}

impl PaintSurface for RecordingSurface {
    fn resize(&mut self, size: SurfaceSize, ratio: f64) {
        self.resizes.push((size, ratio));
    }

    fn paint_now(&mut self) {
        self.paints += 1;
    }
}

/// Yield to the other branches of a `tokio::join!` until `ready` holds.
pub async fn until(ready: impl Fn() -> bool) {
    while !ready() {
        tokio::task::yield_now().await;
    }
}
