//! Result source backed by a JavaScript view/table pair.

use js_sys::{Array, Function, Promise, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{GridError, Result};
use crate::grid::{ResultSource, RowWindow};
use crate::types::{ResultRow, Schema};

/// Adapts a JS view exposing `num_rows()`, `to_json(opts)` and `schema()`,
/// plus the table it was created from (`schema()`).
pub(crate) struct JsResultSource {
    view: JsValue,
    table: JsValue,
}

impl JsResultSource {
    pub(crate) fn new(view: JsValue, table: JsValue) -> Self {
        Self { view, table }
    }
}

fn js_err(e: &JsValue) -> GridError {
    GridError::Source(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

/// Call `target[name](...args)` and await the result if it is a promise.
async fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name)).map_err(|e| js_err(&e))?;
    let method: Function = method
        .dyn_into()
        .map_err(|_| GridError::Source(format!("`{name}` is not a function")))?;
    let result = method.apply(target, args).map_err(|e| js_err(&e))?;
    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(|e| js_err(&e)),
        Err(value) => Ok(value),
    }
}

/// Round-trip a JS value through JSON text so key order is preserved.
fn stringify(value: &JsValue) -> Result<String> {
    JSON::stringify(value)
        .map_err(|e| js_err(&e))?
        .as_string()
        .ok_or_else(|| GridError::Source("value is not JSON-serializable".to_string()))
}

impl ResultSource for JsResultSource {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    async fn num_rows(&self) -> Result<usize> {
        let value = call_method(&self.view, "num_rows", &Array::new()).await?;
        match value.as_f64() {
            Some(n) if n.is_finite() && n >= 0.0 => Ok(n as usize),
            _ => Err(GridError::Source("num_rows() did not return a count".to_string())),
        }
    }

    async fn to_json(&self, window: RowWindow) -> Result<Vec<ResultRow>> {
        let options = serde_wasm_bindgen::to_value(&window)
            .map_err(|e| GridError::Source(e.to_string()))?;
        let rows = call_method(&self.view, "to_json", &Array::of1(&options)).await?;
        Ok(serde_json::from_str(&stringify(&rows)?)?)
    }

    async fn schema(&self) -> Result<Schema> {
        let schema = call_method(&self.view, "schema", &Array::new()).await?;
        Schema::from_json_str(&stringify(&schema)?)
    }

    async fn table_schema(&self) -> Result<Schema> {
        let schema = call_method(&self.table, "schema", &Array::new()).await?;
        Schema::from_json_str(&stringify(&schema)?)
    }
}
