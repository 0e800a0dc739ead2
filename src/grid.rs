//! The grid: loads a result set from a [`ResultSource`], keeps the row store
//! in a [`GridModel`], and gates paints on the [`RangeCache`].
//!
//! Small result sets are loaded whole. Result sets above
//! [`GridConfig::lazy_threshold`] rows are loaded one range at a time: every
//! paint and resize first makes sure the rows on screen are present, and
//! skips the paint while they are being fetched.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use serde::Serialize;

use crate::cache::{RangeCache, RangeLoader};
use crate::config::{GridConfig, HostAttributes};
use crate::error::{GridError, Result};
use crate::layout::{RowLayout, Viewport};
use crate::model::{GridModel, LoadOutcome, RowDataSource};
use crate::range::{estimate, RangeRequest, VisibleRange};
use crate::translate::{translate, TranslateOptions};
use crate::types::{filter_hidden, ResultPayload, ResultRow, Schema};

/// Rows requested from a [`ResultSource`]; unset bounds mean "from the start" / "to the end".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_row: Option<usize>,
}

impl RowWindow {
    /// Every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// The first `n` rows.
    pub fn first(n: usize) -> Self {
        Self {
            start_row: None,
            end_row: Some(n),
        }
    }

    pub fn range(range: VisibleRange) -> Self {
        Self {
            start_row: Some(range.start_row),
            end_row: Some(range.end_row),
        }
    }
}

/// The query/view a grid displays.
#[allow(async_fn_in_trait)]
pub trait ResultSource {
    /// Total rows of the view.
    async fn num_rows(&self) -> Result<usize>;

    /// Rows of the view as ordered column maps.
    async fn to_json(&self, window: RowWindow) -> Result<Vec<ResultRow>>;

    /// Column types of the view.
    async fn schema(&self) -> Result<Schema>;

    /// Column types of the underlying table, used to type row pivots.
    async fn table_schema(&self) -> Result<Schema>;
}

/// Size of the drawing surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// The widget that draws the grid.
pub trait PaintSurface {
    /// Resize the backing store; `ratio` scales CSS pixels to device pixels.
    fn resize(&mut self, size: SurfaceSize, ratio: f64);

    /// Paint the current contents of the row store.
    fn paint_now(&mut self);
}

/// Outcome of [`Grid::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded(LoadOutcome),
    /// A newer load started while this one was waiting on the source.
    Cancelled,
}

/// Everything a lazy range load needs to translate a fetched page.
struct Session<S> {
    source: Rc<S>,
    payload: ResultPayload,
    schema: Schema,
    tree_schema: Schema,
    attrs: HostAttributes,
    row_count: usize,
    lazy: bool,
}

/// A grid bound to a paint surface.
pub struct Grid<S, P> {
    config: GridConfig,
    surface: RefCell<P>,
    model: RefCell<GridModel>,
    viewport: RefCell<Viewport>,
    cache: RangeCache,
    session: RefCell<Option<Session<S>>>,
    generation: Cell<u64>,
    device_pixel_ratio: Cell<f64>,
}

impl<S: ResultSource, P: PaintSurface> Grid<S, P> {
    pub fn new(config: GridConfig, surface: P) -> Self {
        Self {
            model: RefCell::new(GridModel::new(config.clone())),
            config,
            surface: RefCell::new(surface),
            viewport: RefCell::new(Viewport::new()),
            cache: RangeCache::new(),
            session: RefCell::new(None),
            generation: Cell::new(0),
            device_pixel_ratio: Cell::new(1.0),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn model(&self) -> Ref<'_, GridModel> {
        self.model.borrow()
    }

    pub fn model_mut(&self) -> RefMut<'_, GridModel> {
        self.model.borrow_mut()
    }

    pub fn viewport(&self) -> Ref<'_, Viewport> {
        self.viewport.borrow()
    }

    pub fn surface(&self) -> Ref<'_, P> {
        self.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, P> {
        self.surface.borrow_mut()
    }

    pub fn cache(&self) -> &RangeCache {
        &self.cache
    }

    /// Whether the current result set is loaded range by range.
    pub fn is_lazy(&self) -> bool {
        self.session.borrow().as_ref().is_some_and(|s| s.lazy)
    }

    /// Load a result set from `source` and paint it.
    ///
    /// Hidden columns are removed from the schema and from every fetched row.
    /// When another load starts before this one has its data, this one is
    /// abandoned with [`LoadStatus::Cancelled`].
    pub async fn load(&self, source: S, attrs: HostAttributes) -> Result<LoadStatus> {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        let source = Rc::new(source);

        let row_count = source.num_rows().await?;
        let mut first = source.to_json(RowWindow::first(1)).await?;
        let schema = source.schema().await?.without(&attrs.hidden);
        let tree_schema = source.table_schema().await?;

        let lazy = self.config.is_lazy(row_count);
        let mut payload = ResultPayload::with_len(row_count);
        filter_hidden(&mut first, &attrs.hidden);
        payload.fill(0, first);

        let cached = if lazy {
            let range = self
                .request_for(row_count)
                .map(|request| request.fetch)
                .or_else(|| crate::range::initial_range(row_count, &self.config));
            if let Some(range) = range {
                let mut page = source.to_json(RowWindow::range(range)).await?;
                filter_hidden(&mut page, &attrs.hidden);
                payload.fill(range.start_row, page);
            }
            range
        } else {
            let mut rows = source.to_json(RowWindow::all()).await?;
            filter_hidden(&mut rows, &attrs.hidden);
            payload = ResultPayload::from_rows(rows);
            None
        };

        if self.generation.get() != generation {
            log::debug!("load superseded by a newer load, abandoning");
            return Ok(LoadStatus::Cancelled);
        }

        let options = TranslateOptions {
            total_length: lazy.then_some(row_count),
            ..TranslateOptions::full()
        };
        let translation = translate(
            &payload,
            &schema,
            &tree_schema,
            &attrs.row_pivots,
            options,
        );

        self.cache.reset(cached);
        *self.session.borrow_mut() = Some(Session {
            source,
            payload,
            schema,
            tree_schema,
            attrs,
            row_count,
            lazy,
        });
        let outcome = self.model.borrow_mut().set_translation(translation);

        self.relayout().await?;
        Ok(LoadStatus::Loaded(outcome))
    }

    /// Install a fully materialized result set directly, without a source.
    ///
    /// Ends any lazy session; the cache starts a new epoch.
    pub fn set_data(
        &self,
        payload: &ResultPayload,
        schema: &Schema,
        tree_schema: &Schema,
        row_pivots: &[String],
    ) -> LoadOutcome {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.session.borrow_mut().take();
        self.cache.reset(None);
        let translation = translate(
            payload,
            schema,
            tree_schema,
            row_pivots,
            TranslateOptions::full(),
        );
        self.model.borrow_mut().set_translation(translation)
    }

    /// Paint, once the visible rows are loaded. Returns whether a paint happened.
    pub async fn paint(&self) -> Result<bool> {
        let render = self.update_cache().await?;
        if render {
            self.surface.borrow_mut().paint_now();
        }
        Ok(render)
    }

    /// Resize the surface, then paint once the visible rows are loaded.
    ///
    /// The backing store is only resized when the paint goes ahead.
    pub async fn resize(&self, size: SurfaceSize) -> Result<bool> {
        {
            let mut viewport = self.viewport.borrow_mut();
            viewport.resize(px(size.width), px(size.height));
            self.device_pixel_ratio.set(size.device_pixel_ratio);
            let layout = self.layout();
            viewport.clamp_scroll(&layout);
        }
        let render = self.update_cache().await?;
        if render {
            let ratio = if self.config.use_hidpi && size.device_pixel_ratio.is_finite() {
                size.device_pixel_ratio.max(1.0)
            } else {
                1.0
            };
            let mut surface = self.surface.borrow_mut();
            surface.resize(size, ratio);
            surface.paint_now();
        }
        Ok(render)
    }

    /// Scroll the grid body to `scroll_y` pixels. Call [`Grid::paint`] afterwards.
    pub fn scroll_to(&self, scroll_x: f32, scroll_y: f32) {
        let layout = self.layout();
        self.viewport
            .borrow_mut()
            .set_scroll(scroll_x, scroll_y, &layout);
    }

    /// Drop all data and re-run the resize gate, as when the grid is detached.
    pub async fn reset(&self) -> Result<bool> {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.session.borrow_mut().take();
        self.cache.reset(None);
        self.model.borrow_mut().reset();
        self.relayout().await
    }

    /// Rows the current viewport needs.
    pub fn current_request(&self) -> Option<RangeRequest> {
        let row_count = self.model.borrow().row_count();
        self.request_for(row_count)
    }

    fn request_for(&self, row_count: usize) -> Option<RangeRequest> {
        let layout = RowLayout::from_config(row_count, &self.config);
        estimate(&self.viewport.borrow(), &layout, &self.config)
    }

    fn layout(&self) -> RowLayout {
        RowLayout::from_config(self.model.borrow().row_count(), &self.config)
    }

    async fn relayout(&self) -> Result<bool> {
        let viewport = self.viewport.borrow().clone();
        let size = SurfaceSize::new(
            dim(viewport.width),
            dim(viewport.height),
            self.device_pixel_ratio.get(),
        );
        if viewport.has_size() {
            self.resize(size).await
        } else {
            self.paint().await
        }
    }

    async fn update_cache(&self) -> Result<bool> {
        if !self.is_lazy() {
            return Ok(true);
        }
        let request = self.current_request();
        self.cache
            .ensure_range_loaded(request, &PageLoader { grid: self })
            .await
    }
}

/// Loads ranges of the current session into the grid's row store.
struct PageLoader<'a, S, P> {
    grid: &'a Grid<S, P>,
}

impl<S: ResultSource, P: PaintSurface> RangeLoader for PageLoader<'_, S, P> {
    type Page = Vec<ResultRow>;

    async fn fetch(&self, range: VisibleRange) -> Result<Self::Page> {
        let (source, hidden) = {
            let session = self.grid.session.borrow();
            let session = session.as_ref().ok_or_else(no_session)?;
            (Rc::clone(&session.source), session.attrs.hidden.clone())
        };
        let mut page = source.to_json(RowWindow::range(range)).await?;
        filter_hidden(&mut page, &hidden);
        Ok(page)
    }

    fn current_visible(&self) -> Option<VisibleRange> {
        self.grid.current_request().map(|request| request.visible)
    }

    fn commit(&self, range: VisibleRange, page: Self::Page) -> Result<()> {
        let mut session = self.grid.session.borrow_mut();
        let session = session.as_mut().ok_or_else(no_session)?;
        session.payload.fill(range.start_row, page);
        let end = range.end_row.min(session.row_count);
        let translation = translate(
            &session.payload,
            &session.schema,
            &session.tree_schema,
            &session.attrs.row_pivots,
            TranslateOptions::window(range.start_row, end, session.row_count),
        );
        self.grid.model.borrow_mut().set_rows(translation.rows);
        Ok(())
    }
}

fn no_session() -> GridError {
    GridError::Other("no result set loaded".to_string())
}

#[allow(clippy::cast_precision_loss)]
fn px(value: u32) -> f32 {
    value as f32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dim(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u32
    } else {
        0
    }
}
