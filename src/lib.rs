//! lazygrid - lazy-loading data layer for a canvas data grid
//!
//! Turns query results (rows keyed by column name, optionally pivoted into a
//! tree) into index-keyed grid rows, and keeps only the rows near the viewport
//! loaded for large result sets:
//! - Row translation with tree metadata for pivoted views
//! - Range cache that coalesces fetches and drops stale pages
//! - Column model with width memoization and finance number formats
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView } from 'lazygrid';
//! await init();
//! const grid = new GridView((kind, w, h) => widget.handle(kind, w, h));
//! await grid.load(view, table, element.getAttribute('row-pivots'));
//! await grid.resize(element.clientWidth, element.clientHeight);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod layout;
pub mod model;
pub mod numfmt;
pub mod range;
pub mod translate;
pub mod types;

// WASM bindings
#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::GridView;

pub use cache::{RangeCache, RangeLoader};
pub use config::{GridConfig, HostAttributes};
pub use error::{GridError, Result};
pub use grid::{Grid, LoadStatus, PaintSurface, ResultSource, RowWindow, SurfaceSize};
pub use model::{GridModel, RowDataSource};
pub use range::{RangeRequest, VisibleRange};
pub use translate::{translate, TranslateOptions, Translation};
pub use types::*;

/// Translate a JSON result set and return the translation as JSON
///
/// # Arguments
/// * `payload` - JSON array of rows keyed by column name
/// * `schema` - JSON object of column name to type name
/// * `tree_schema` - JSON object of table column name to type name
/// * `row_pivots` - the `row-pivots` attribute, a JSON array of names
///
/// # Errors
/// Returns an error if any argument is not valid JSON of the expected shape.
#[wasm_bindgen]
pub fn translate_json(
    payload: &str,
    schema: &str,
    tree_schema: &str,
    row_pivots: Option<String>,
) -> std::result::Result<String, JsValue> {
    let translation = translate_str(payload, schema, tree_schema, row_pivots.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&translation)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// [`translate`] over JSON text inputs.
///
/// # Errors
/// Returns an error if any argument is not valid JSON of the expected shape.
pub fn translate_str(
    payload: &str,
    schema: &str,
    tree_schema: &str,
    row_pivots: Option<&str>,
) -> Result<Translation> {
    let payload = ResultPayload::from_json_str(payload)?;
    let schema = Schema::from_json_str(schema)?;
    let tree_schema = Schema::from_json_str(tree_schema)?;
    let row_pivots = HostAttributes::parse_row_pivots(row_pivots)?;
    Ok(translate(
        &payload,
        &schema,
        &tree_schema,
        &row_pivots,
        TranslateOptions::full(),
    ))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
