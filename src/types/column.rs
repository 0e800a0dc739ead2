use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GridError, Result};

/// Column index under which tree metadata is stored in a [`FlatRow`](super::FlatRow).
pub const TREE_COLUMN_INDEX: i32 = -1;

/// Delimiter between pivot levels in a compound column key (`"2018,Sales"`).
pub const COLUMN_KEY_DELIMITER: char = ',';

/// Delimiter between pivot levels in a column header (`"2018|Sales"`).
pub const HEADER_DELIMITER: char = '|';

/// Display type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl ValueType {
    /// Map a source schema type name onto a display type.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "date" | "datetime" => Some(Self::Date),
            _ => None,
        }
    }

    /// Integer and float columns are right-aligned and colored by sign.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Ordered mapping from column name to type, as reported by a result source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entries: Vec<(String, ValueType)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a JSON object such as `{"a": "integer", "b": "string"}`.
    ///
    /// Unknown type names fall back to `string` with a warning.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (name, type_name) in map {
            let Some(type_name) = type_name.as_str() else {
                return Err(GridError::Schema(format!(
                    "type of column `{name}` is not a string"
                )));
            };
            let value_type = ValueType::from_name(type_name).unwrap_or_else(|| {
                log::warn!("unknown type `{type_name}` for column `{name}`, treating as string");
                ValueType::String
            });
            entries.push((name.clone(), value_type));
        }
        Ok(Self { entries })
    }

    /// Parse a schema from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Object(map) => Self::from_json_map(&map),
            _ => Err(GridError::Schema("schema must be a JSON object".to_string())),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value_type: ValueType) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value_type;
        } else {
            self.entries.push((name, value_type));
        }
    }

    pub fn get(&self, name: &str) -> Option<ValueType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Drop every column whose name is in `hidden`.
    pub fn without(&self, hidden: &[String]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| !hidden.iter().any(|h| h == name))
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueType)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ValueType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (N, ValueType)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (name, value_type) in iter {
            schema.insert(name, value_type);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_json_map(&map).map_err(serde::de::Error::custom)
    }
}

/// Describes one grid column, keyed by integer position rather than by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Position of the column in every [`FlatRow`](super::FlatRow);
    /// [`TREE_COLUMN_INDEX`] for the synthetic tree column.
    pub index: i32,
    /// Pivot levels of the column key, e.g. `["2018", "Sales"]`.
    pub path: Vec<String>,
    /// Path joined with [`HEADER_DELIMITER`].
    pub display_name: String,
    pub value_type: ValueType,
    /// Per-depth types of the row pivots; only set on the tree column.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub level_types: Vec<ValueType>,
}

impl ColumnDescriptor {
    pub fn new(index: i32, path: Vec<String>, value_type: ValueType) -> Self {
        let display_name = path.join(&HEADER_DELIMITER.to_string());
        Self {
            index,
            path,
            display_name,
            value_type,
            level_types: Vec::new(),
        }
    }

    pub fn is_tree(&self) -> bool {
        self.index == TREE_COLUMN_INDEX
    }

    /// Last pivot level of the column, which names the underlying source column.
    pub fn leaf_name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_preserves_order() {
        let schema = Schema::from_json_str(r#"{"z": "integer", "a": "float", "m": "str"}"#)
            .expect("valid schema");
        let names: Vec<&str> = schema.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        assert_eq!(schema.get("m"), Some(ValueType::String));
    }

    #[test]
    fn test_unknown_type_is_string() {
        let schema = Schema::from_json_str(r#"{"x": "decimal"}"#).expect("valid schema");
        assert_eq!(schema.get("x"), Some(ValueType::String));
    }

    #[test]
    fn test_non_object_schema_rejected() {
        assert!(Schema::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_descriptor_display_name() {
        let column = ColumnDescriptor::new(
            2,
            vec!["2018".to_string(), "Sales".to_string()],
            ValueType::Float,
        );
        assert_eq!(column.display_name, "2018|Sales");
        assert_eq!(column.leaf_name(), "Sales");
        assert!(!column.is_tree());
    }
}
