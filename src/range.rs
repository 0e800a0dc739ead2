//! Row ranges and estimation of the range a paint needs.

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::layout::{RowLayout, Viewport};

/// A non-empty half-open span of row indices, `[start_row, end_row)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleRange {
    pub start_row: usize,
    pub end_row: usize,
}

impl VisibleRange {
    /// Returns `None` unless `end_row > start_row`.
    pub fn new(start_row: usize, end_row: usize) -> Option<Self> {
        (end_row > start_row).then_some(Self { start_row, end_row })
    }

    /// `self ⊆ other`.
    pub fn within(&self, other: &Self) -> bool {
        self.start_row >= other.start_row && self.end_row <= other.end_row
    }

    /// Whether `self` lies inside `other`, treating a missing range as empty.
    pub fn within_opt(&self, other: Option<&Self>) -> bool {
        other.is_some_and(|o| self.within(o))
    }

    pub fn contains(&self, row: usize) -> bool {
        (self.start_row..self.end_row).contains(&row)
    }

    pub fn len(&self) -> usize {
        self.end_row - self.start_row
    }

    /// Always `false`; ranges are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Grow by `rows` on each side, clamped to `[0, limit)`.
    #[must_use]
    pub fn padded(&self, rows: usize, limit: usize) -> Self {
        let start_row = self.start_row.saturating_sub(rows);
        let end_row = self.end_row.saturating_add(rows).min(limit).max(self.end_row);
        Self { start_row, end_row }
    }

    /// Clamp the end to `limit`, keeping at least one row.
    pub fn clamped(&self, limit: usize) -> Option<Self> {
        Self::new(self.start_row, self.end_row.min(limit))
    }
}

impl std::fmt::Display for VisibleRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start_row, self.end_row)
    }
}

/// What a paint needs: the rows on screen, and the wider range to fetch if they are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    /// Rows that must be loaded before painting.
    pub visible: VisibleRange,
    /// Rows to fetch when `visible` is not cached; always contains `visible`.
    pub fetch: VisibleRange,
}

impl RangeRequest {
    /// A request that fetches exactly what it shows.
    pub fn exact(range: VisibleRange) -> Self {
        Self {
            visible: range,
            fetch: range,
        }
    }
}

/// Estimate the range needed to paint the current viewport.
///
/// Before the viewport has a size, the first `initial_range_rows` rows are
/// requested. Otherwise the visible rows are padded by `padding_viewports`
/// viewports on each side to reduce fetch frequency while scrolling.
/// Returns `None` when the result set has no rows.
pub fn estimate(
    viewport: &Viewport,
    layout: &RowLayout,
    config: &GridConfig,
) -> Option<RangeRequest> {
    if layout.row_count == 0 {
        return None;
    }
    let visible = if layout.is_valid() {
        viewport.visible_rows(layout)
    } else {
        None
    };
    let Some((start, end)) = visible else {
        return initial_range(layout.row_count, config).map(RangeRequest::exact);
    };
    let visible = VisibleRange::new(start, end)?;
    let padding = usize::try_from(config.padding_viewports)
        .unwrap_or(usize::MAX)
        .saturating_mul(visible.len());
    Some(RangeRequest {
        visible,
        fetch: visible.padded(padding, layout.row_count),
    })
}

/// The fixed range loaded before layout metrics are known.
pub fn initial_range(row_count: usize, config: &GridConfig) -> Option<VisibleRange> {
    VisibleRange::new(0, config.initial_range_rows.max(1).min(row_count))
}
