//! Grid configuration and host element attributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Default height of a data row in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 24.0;

/// Default (and minimum restored) column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: f32 = 50.0;

/// Result sets with more rows than this are loaded lazily, one visible range at a time.
pub const LAZY_THRESHOLD: usize = 10_000;

/// Rows loaded before the viewport has been laid out.
pub const INITIAL_RANGE_ROWS: usize = 100;

/// Immutable grid configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Height of one data row in pixels.
    pub row_height: f32,
    /// Header rows drawn above the data (column header row).
    pub header_rows: u32,
    /// Width given to columns with no remembered width.
    pub minimum_column_width: f32,
    /// Row count above which ranges are loaded lazily.
    pub lazy_threshold: usize,
    /// Rows fetched when the viewport has no size yet.
    pub initial_range_rows: usize,
    /// Extra viewports fetched above and below the visible rows.
    pub padding_viewports: u32,
    /// Text color of non-negative numbers.
    pub positive_color: String,
    /// Text color of negative numbers.
    pub negative_color: String,
    /// Header overrides keyed by the `|`-joined column path.
    pub column_aliases: HashMap<String, String>,
    /// Scale the backing store by the device pixel ratio.
    pub use_hidpi: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            header_rows: 1,
            minimum_column_width: DEFAULT_COLUMN_WIDTH,
            lazy_threshold: LAZY_THRESHOLD,
            initial_range_rows: INITIAL_RANGE_ROWS,
            padding_viewports: 1,
            positive_color: "rgb(160,207,255)".to_string(),
            negative_color: "rgb(255,136,136)".to_string(),
            column_aliases: HashMap::new(),
            use_hidpi: true,
        }
    }
}

impl GridConfig {
    /// Height of the header band above the first data row.
    pub fn header_height(&self) -> f32 {
        let rows = u16::try_from(self.header_rows).unwrap_or(u16::MAX);
        f32::from(rows) * self.row_height
    }

    /// Header for a column, after aliasing.
    pub fn header_for<'a>(&'a self, display_name: &'a str) -> &'a str {
        self.column_aliases
            .get(display_name)
            .map_or(display_name, String::as_str)
    }

    /// Whether a result set of `row_count` rows is loaded lazily.
    pub fn is_lazy(&self, row_count: usize) -> bool {
        row_count > self.lazy_threshold
    }
}

/// Declarative attributes of the element hosting the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAttributes {
    /// Active row pivots, outermost first.
    pub row_pivots: Vec<String>,
    /// Column names excluded from the schema and from every row.
    pub hidden: Vec<String>,
}

impl HostAttributes {
    pub fn new(row_pivots: Vec<String>, hidden: Vec<String>) -> Self {
        Self { row_pivots, hidden }
    }

    /// Parse the `row-pivots` attribute (a JSON array of strings).
    ///
    /// A missing or empty attribute means no pivots.
    pub fn parse_row_pivots(attribute: Option<&str>) -> Result<Vec<String>> {
        let Some(text) = attribute.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(Vec::new());
        };
        serde_json::from_str(text).map_err(|e| GridError::Attribute {
            name: "row-pivots".to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_partial_json() {
        let config: GridConfig =
            serde_json::from_str(r#"{"rowHeight": 20, "lazyThreshold": 5}"#).expect("valid");
        assert_eq!(config.row_height, 20.0);
        assert_eq!(config.lazy_threshold, 5);
        assert_eq!(config.initial_range_rows, INITIAL_RANGE_ROWS);
        assert_eq!(config.header_height(), 20.0);
    }

    #[test]
    fn test_header_alias() {
        let mut config = GridConfig::default();
        config
            .column_aliases
            .insert("2018|Sales".to_string(), "Sales '18".to_string());
        assert_eq!(config.header_for("2018|Sales"), "Sales '18");
        assert_eq!(config.header_for("2019|Sales"), "2019|Sales");
    }

    #[test]
    fn test_parse_row_pivots() {
        assert_eq!(
            HostAttributes::parse_row_pivots(Some(r#"["State", "City"]"#)).expect("valid"),
            vec!["State".to_string(), "City".to_string()]
        );
        assert!(HostAttributes::parse_row_pivots(None)
            .expect("valid")
            .is_empty());
        assert!(HostAttributes::parse_row_pivots(Some("State")).is_err());
    }
}
