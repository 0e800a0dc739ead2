//! Structured error types for lazygrid.

/// All errors that can occur while translating result sets and loading row ranges.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Malformed JSON payload, schema, or attribute.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Column schema could not be interpreted.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// The result source rejected a request (row count, page, or schema fetch).
    #[error("Result source: {0}")]
    Source(String),

    /// A host element attribute could not be parsed.
    #[error("Invalid attribute `{name}`: {reason}")]
    Attribute { name: String, reason: String },

    /// Payload shape does not fit the requested translation.
    #[error("Translate error: {0}")]
    Translate(String),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
