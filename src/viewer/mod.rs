//! WASM-exported `GridView`, the entry point used by the hosting page.
//!
//! The page owns the drawing widget and calls in on layout changes:
//! - `load(view, table, rowPivots, hidden)` when the query changes
//! - `resize(width, height)` on element resize
//! - `paint()` after scrolling
//!
//! Each of these returns a promise resolving to whether the grid painted.
//! The widget reads cells back through `getCell` and `columnProperties`.

mod source;
mod surface;

use std::rc::Rc;

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::config::{GridConfig, HostAttributes};
use crate::grid::{Grid, LoadStatus, SurfaceSize};
use crate::model::{CellContext, RowDataSource};

use source::JsResultSource;
use surface::CallbackSurface;

type JsGrid = Grid<JsResultSource, CallbackSurface>;

fn device_pixel_ratio() -> f64 {
    web_sys::window().map_or(1.0, |window| window.device_pixel_ratio())
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// The grid exported to JavaScript
#[wasm_bindgen]
pub struct GridView {
    grid: Rc<JsGrid>,
}

#[wasm_bindgen]
impl GridView {
    /// Create a grid. `config` is an optional partial `GridConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(render_callback: Option<Function>, config: JsValue) -> Result<GridView, JsValue> {
        console_error_panic_hook::set_once();

        let config: GridConfig = if is_absent(&config) {
            GridConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid grid config: {e}")))?
        };

        Ok(GridView {
            grid: Rc::new(Grid::new(config, CallbackSurface::new(render_callback))),
        })
    }

    /// Set the callback invoked with `("resize", width, height)` and `("paint")`.
    #[wasm_bindgen(js_name = "setRenderCallback")]
    pub fn set_render_callback(&self, callback: Option<Function>) {
        self.grid.surface_mut().set_callback(callback);
    }

    /// Load a view. `row_pivots` is the host's `row-pivots` attribute (a JSON
    /// array); `hidden` is an optional array of column names to leave out.
    pub fn load(
        &self,
        view: JsValue,
        table: JsValue,
        row_pivots: Option<String>,
        hidden: JsValue,
    ) -> Result<Promise, JsValue> {
        let row_pivots = HostAttributes::parse_row_pivots(row_pivots.as_deref())?;
        let hidden: Vec<String> = if is_absent(&hidden) {
            Vec::new()
        } else {
            serde_wasm_bindgen::from_value(hidden)
                .map_err(|e| JsValue::from_str(&format!("Invalid hidden columns: {e}")))?
        };
        let grid = Rc::clone(&self.grid);
        Ok(future_to_promise(async move {
            let source = JsResultSource::new(view, table);
            let status = grid
                .load(source, HostAttributes::new(row_pivots, hidden))
                .await?;
            Ok(JsValue::from_bool(matches!(status, LoadStatus::Loaded(_))))
        }))
    }

    /// Resize to `width` x `height` CSS pixels and repaint when the rows are loaded.
    pub fn resize(&self, width: u32, height: u32) -> Promise {
        let grid = Rc::clone(&self.grid);
        let size = SurfaceSize::new(width, height, device_pixel_ratio());
        future_to_promise(async move {
            let painted = grid.resize(size).await?;
            Ok(JsValue::from_bool(painted))
        })
    }

    /// Repaint when the visible rows are loaded.
    pub fn paint(&self) -> Promise {
        let grid = Rc::clone(&self.grid);
        future_to_promise(async move {
            let painted = grid.paint().await?;
            Ok(JsValue::from_bool(painted))
        })
    }

    /// Drop all data (element detached).
    pub fn reset(&self) -> Promise {
        let grid = Rc::clone(&self.grid);
        future_to_promise(async move {
            let painted = grid.reset().await?;
            Ok(JsValue::from_bool(painted))
        })
    }

    #[wasm_bindgen(js_name = "scrollTo")]
    pub fn scroll_to(&self, scroll_x: f32, scroll_y: f32) {
        self.grid.scroll_to(scroll_x, scroll_y);
    }

    #[wasm_bindgen(js_name = "rowCount")]
    pub fn row_count(&self) -> usize {
        self.grid.model().row_count()
    }

    #[wasm_bindgen(js_name = "columnCount")]
    pub fn column_count(&self) -> usize {
        self.grid.model().column_count()
    }

    #[wasm_bindgen(js_name = "isTree")]
    pub fn is_tree(&self) -> bool {
        self.grid.model().is_tree()
    }

    /// How to render cell (`x`, `y`); `x = -1` is the tree column.
    #[wasm_bindgen(js_name = "getCell")]
    pub fn get_cell(&self, x: i32, y: usize, is_header_row: bool) -> Result<JsValue, JsValue> {
        let renderer = self.grid.model().renderer_for(CellContext {
            x,
            y,
            is_header_row,
            is_user_data_area: !is_header_row,
        });
        serde_wasm_bindgen::to_value(&renderer)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    #[wasm_bindgen(js_name = "columnProperties")]
    pub fn column_properties(&self, x: usize) -> Result<JsValue, JsValue> {
        let model = self.grid.model();
        let Some(props) = model.column_properties(x) else {
            return Ok(JsValue::UNDEFINED);
        };
        serde_wasm_bindgen::to_value(props)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Record a user-resized column width so it survives schema changes.
    #[wasm_bindgen(js_name = "setColumnWidth")]
    pub fn set_column_width(&self, x: usize, width: f32) {
        if let Some(props) = self.grid.model_mut().column_properties_mut(x) {
            props.width = width;
            props.column_autosizing = false;
        }
    }
}
