//! Grid load and paint gating tests
//!
//! Loads in-memory result sets into a grid with a recording paint surface
//! and checks which paints go ahead, which rows are in the row store, and
//! which row windows were requested from the source.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use pretty_assertions::assert_eq;

use common::{
    flat_rows, flat_schema, lazy_config, no_pivots, range, schema, until, MockSource,
    RecordingSurface,
};
use lazygrid::cache::CachePhase;
use lazygrid::model::{CellContext, CellRenderer};
use lazygrid::{
    CellRef, CellValue, Grid, GridConfig, GridError, HostAttributes, LoadStatus, ResultPayload,
    ResultRow, RowDataSource, RowWindow, Schema, SurfaceSize, ValueType,
};

type TestGrid = Grid<MockSource, RecordingSurface>;

fn grid(config: GridConfig) -> TestGrid {
    Grid::new(config, RecordingSurface::default())
}

fn id_at(grid: &TestGrid, y: usize) -> Option<CellValue> {
    match grid.model().value(0, y)? {
        CellRef::Value(v) => Some(v.clone()),
        CellRef::Tree(_) => None,
    }
}

/// A lazily loaded grid of 1000 rows, laid out 200x220 (ten 20px rows
/// under a 20px header).
async fn lazy_grid(source: &MockSource) -> TestGrid {
    let grid = grid(lazy_config(100));
    let status = grid.load(source.clone(), no_pivots()).await.unwrap();
    assert!(matches!(status, LoadStatus::Loaded(_)));
    assert!(grid.resize(SurfaceSize::new(200, 220, 1.0)).await.unwrap());
    grid
}

// =============================================================================
// FULL LOADS
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn test_small_result_loads_whole() {
    let source = MockSource::flat(5);
    let grid = grid(GridConfig::default());

    let status = grid.load(source.clone(), no_pivots()).await.unwrap();

    let LoadStatus::Loaded(outcome) = status else {
        panic!("load was cancelled");
    };
    assert!(outcome.schema_reset);
    assert!(!grid.is_lazy());
    assert_eq!(grid.model().row_count(), 5);
    assert_eq!(grid.model().loaded_rows(), 5);
    assert_eq!(id_at(&grid, 4), Some(CellValue::Integer(4)));
    assert_eq!(
        source.windows(),
        vec![RowWindow::first(1), RowWindow::all()]
    );
    assert_eq!(grid.surface().paints, 1, "initial layout pass paints once");

    // Without a lazy session every paint goes ahead.
    assert!(grid.paint().await.unwrap());
    assert_eq!(grid.surface().paints, 2);
    assert_eq!(source.windows().len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_reload_with_same_schema_keeps_columns() {
    let grid = grid(GridConfig::default());
    grid.load(MockSource::flat(5), no_pivots()).await.unwrap();
    grid.model_mut().column_properties_mut(1).unwrap().width = 140.0;

    let status = grid.load(MockSource::flat(8), no_pivots()).await.unwrap();

    assert_eq!(
        status,
        LoadStatus::Loaded(lazygrid::model::LoadOutcome {
            schema_reset: false
        })
    );
    assert_eq!(grid.model().row_count(), 8);
    assert_eq!(grid.model().column_properties(1).unwrap().width, 140.0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_hidden_columns_removed() {
    let grid = grid(GridConfig::default());
    let attrs = HostAttributes::new(Vec::new(), vec!["price".to_string()]);

    grid.load(MockSource::flat(3), attrs).await.unwrap();

    let model = grid.model();
    assert_eq!(model.column_count(), 1);
    assert_eq!(model.schema()[0].header, "id");
    assert_eq!(model.row(2).unwrap().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_pivoted_result_shows_tree_column() {
    let rows = vec![
        ResultRow::new().with_path(Vec::<String>::new()).with("sales", 10.0),
        ResultRow::new().with_path(["East"]).with("sales", 4.0),
        ResultRow::new().with_path(["West"]).with("sales", 6.0),
    ];
    let source = MockSource::with_table_schema(
        rows,
        schema(&[("sales", ValueType::Float)]),
        schema(&[("region", ValueType::String), ("sales", ValueType::Float)]),
    );
    let grid = grid(GridConfig::default());
    let attrs = HostAttributes::new(vec!["region".to_string()], Vec::new());

    grid.load(source, attrs).await.unwrap();

    let model = grid.model();
    assert!(model.is_tree());
    assert!(model.is_tree_column(-1));
    assert!(!model.is_tree_column(0));
    assert_eq!(model.tree_column().unwrap().level_types, vec![ValueType::String]);
    let cell = CellContext {
        x: -1,
        y: 1,
        is_header_row: false,
        is_user_data_area: true,
    };
    let CellRenderer::Tree(state) = model.renderer_for(cell) else {
        panic!("expected a tree cell");
    };
    assert_eq!(state.label, "East");
    assert_eq!(state.depth, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_source_error_propagates() {
    let source = MockSource::flat(5);
    source.fail_next();
    let grid = grid(GridConfig::default());

    let err = grid.load(source, no_pivots()).await.unwrap_err();

    assert!(matches!(err, GridError::Source(_)));
    assert_eq!(grid.model().row_count(), 0);
}

// =============================================================================
// LAZY LOADS
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn test_lazy_load_fetches_initial_range() {
    let source = MockSource::flat(1000);
    let grid = grid(lazy_config(100));

    grid.load(source.clone(), no_pivots()).await.unwrap();

    assert!(grid.is_lazy());
    assert_eq!(grid.model().row_count(), 1000);
    assert_eq!(grid.model().loaded_rows(), 100);
    assert_eq!(grid.cache().cached_range(), Some(range(0, 100)));
    assert_eq!(source.range_fetches(), vec![RowWindow::range(range(0, 100))]);
    assert!(grid.model().row(100).is_none());
    assert_eq!(grid.surface().paints, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_resize_within_cache_paints() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;

    assert_eq!(source.range_fetches().len(), 1, "viewport is inside the initial range");
    let surface = grid.surface();
    assert_eq!(surface.paints, 2);
    assert_eq!(surface.resizes.len(), 1);
    assert_eq!(surface.resizes[0].0, SurfaceSize::new(200, 220, 1.0));
}

#[tokio::test(flavor = "current_thread")]
async fn test_scroll_fetches_padded_range() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;

    grid.scroll_to(0.0, 10_000.0);
    let request = grid.current_request().unwrap();
    assert_eq!(request.visible, range(500, 510));
    assert_eq!(request.fetch, range(490, 520));

    assert!(grid.paint().await.unwrap());

    assert_eq!(
        source.range_fetches().last(),
        Some(&RowWindow::range(range(490, 520)))
    );
    assert_eq!(grid.cache().cached_range(), Some(range(490, 520)));
    assert_eq!(id_at(&grid, 500), Some(CellValue::Integer(500)));
    assert_eq!(id_at(&grid, 0), Some(CellValue::Integer(0)), "row 0 is kept");
    assert_eq!(id_at(&grid, 50), None, "rows outside the new range are dropped");
    assert_eq!(grid.model().row_count(), 1000);
    assert_eq!(grid.surface().paints, 3);

    // Scrolling within the cached range does not fetch.
    grid.scroll_to(0.0, 10_100.0);
    assert!(grid.paint().await.unwrap());
    assert_eq!(source.range_fetches().len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_paint_during_fetch_is_coalesced() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;
    grid.scroll_to(0.0, 10_000.0);
    source.hold();

    let (first, second) = tokio::join!(grid.paint(), async {
        until(|| grid.cache().in_flight_range().is_some()).await;
        grid.scroll_to(0.0, 10_040.0);
        let skipped = grid.paint().await;
        source.release();
        skipped
    });

    assert!(!second.unwrap(), "paint during a fetch is skipped");
    assert!(first.unwrap(), "viewport still inside the fetched range");
    assert_eq!(source.range_fetches().len(), 2);
    assert_eq!(grid.surface().paints, 3);
}

#[tokio::test(flavor = "current_thread")]
async fn test_stale_fetch_is_discarded() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;
    grid.scroll_to(0.0, 10_000.0);
    source.hold();

    let (first, second) = tokio::join!(grid.paint(), async {
        until(|| grid.cache().in_flight_range().is_some()).await;
        grid.scroll_to(0.0, 15_000.0);
        let skipped = grid.paint().await;
        source.release();
        skipped
    });

    assert!(!first.unwrap(), "viewport left the fetched range");
    assert!(!second.unwrap());
    assert_eq!(grid.cache().cached_range(), Some(range(0, 100)));
    assert_eq!(id_at(&grid, 500), None, "stale page was not committed");
    assert_eq!(grid.surface().paints, 2);

    assert!(grid.paint().await.unwrap());
    assert_eq!(grid.cache().cached_range(), Some(range(740, 770)));
    assert_eq!(id_at(&grid, 750), Some(CellValue::Integer(750)));
}

#[tokio::test(flavor = "current_thread")]
async fn test_fetch_error_retried_on_next_paint() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;
    grid.scroll_to(0.0, 10_000.0);
    source.fail_next();

    let err = grid.paint().await.unwrap_err();

    assert!(matches!(err, GridError::Source(_)));
    assert_eq!(grid.cache().phase(), CachePhase::Idle);
    assert_eq!(grid.cache().cached_range(), Some(range(0, 100)));

    assert!(grid.paint().await.unwrap());
    assert_eq!(grid.cache().cached_range(), Some(range(490, 520)));
}

#[tokio::test(flavor = "current_thread")]
async fn test_resize_waits_for_rows() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;
    grid.scroll_to(0.0, 10_000.0);
    source.hold();

    let (resized, ()) = tokio::join!(grid.resize(SurfaceSize::new(200, 420, 1.0)), async {
        until(|| grid.cache().in_flight_range().is_some()).await;
        assert_eq!(grid.surface().resizes.len(), 1, "backing store untouched while fetching");
        source.release();
    });

    assert!(resized.unwrap());
    assert_eq!(grid.surface().resizes.len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_hidpi_ratio() {
    let source = MockSource::flat(10);
    let grid = grid(GridConfig::default());
    grid.load(source, no_pivots()).await.unwrap();

    grid.resize(SurfaceSize::new(100, 100, 2.0)).await.unwrap();
    assert_eq!(grid.surface().resizes.last().unwrap().1, 2.0);

    let plain = self::grid(GridConfig {
        use_hidpi: false,
        ..GridConfig::default()
    });
    plain.load(MockSource::flat(10), no_pivots()).await.unwrap();
    plain.resize(SurfaceSize::new(100, 100, 2.0)).await.unwrap();
    assert_eq!(plain.surface().resizes.last().unwrap().1, 1.0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_hidpi_ratio_survives_reload() {
    let grid = grid(GridConfig::default());
    grid.load(MockSource::flat(10), no_pivots()).await.unwrap();
    grid.resize(SurfaceSize::new(100, 100, 2.0)).await.unwrap();

    grid.load(MockSource::flat(12), no_pivots()).await.unwrap();
    let (size, ratio) = *grid.surface().resizes.last().unwrap();
    assert_eq!(ratio, 2.0);
    assert_eq!(size, SurfaceSize::new(100, 100, 2.0));

    grid.reset().await.unwrap();
    assert_eq!(grid.surface().resizes.last().unwrap().1, 2.0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_tall_surface_is_not_clamped() {
    let source = MockSource::flat(5000);
    let grid = grid(lazy_config(10_000));
    grid.load(source, no_pivots()).await.unwrap();

    grid.resize(SurfaceSize::new(200, 70_020, 1.0)).await.unwrap();

    assert_eq!(grid.viewport().height, 70_020.0);
    assert_eq!(grid.current_request().unwrap().visible, range(0, 3500));
}

// =============================================================================
// SUPERSEDED LOADS AND RESET
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn test_newer_load_cancels_older() {
    let slow = MockSource::flat(20);
    let fast = MockSource::flat(30);
    let grid = grid(GridConfig::default());
    slow.hold();

    let (first, second) = tokio::join!(grid.load(slow.clone(), no_pivots()), async {
        until(|| !slow.windows().is_empty()).await;
        let status = grid.load(fast.clone(), no_pivots()).await;
        slow.release();
        status
    });

    assert_eq!(first.unwrap(), LoadStatus::Cancelled);
    assert!(matches!(second.unwrap(), LoadStatus::Loaded(_)));
    assert_eq!(grid.model().row_count(), 30);
}

#[tokio::test(flavor = "current_thread")]
async fn test_reset_clears_rows() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;

    assert!(grid.reset().await.unwrap());

    assert!(!grid.is_lazy());
    assert_eq!(grid.model().row_count(), 0);
    assert_eq!(grid.model().column_count(), 0);
    assert_eq!(grid.cache().cached_range(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn test_set_data_ends_lazy_session() {
    let source = MockSource::flat(1000);
    let grid = lazy_grid(&source).await;
    let payload = ResultPayload::from_rows(flat_rows(3));

    let outcome = grid.set_data(&payload, &flat_schema(), &Schema::new(), &[]);

    assert!(!outcome.schema_reset, "same columns as the lazy load");
    assert!(!grid.is_lazy());
    assert_eq!(grid.model().row_count(), 3);
    assert!(grid.paint().await.unwrap());
}
