use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CellValue, COLUMN_KEY_DELIMITER};

/// Key carrying the row path of a pivoted (tree) row.
pub const ROW_PATH_KEY: &str = "__ROW_PATH__";

/// One row of a result set: an ordered mapping from compound column key to value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ResultRow {
    /// Ancestor chain of group labels; `None` when the row carries no row-path key.
    pub row_path: Option<Vec<String>>,
    /// Column values in key order.
    pub columns: Vec<(String, CellValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.columns.push((key.into(), value.into()));
        self
    }

    /// Builder-style row path.
    #[must_use]
    pub fn with_path<S: Into<String>>(mut self, path: impl IntoIterator<Item = S>) -> Self {
        self.row_path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    /// Look up a column value by key.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a column value, trying `position` first.
    ///
    /// Rows of one result set share key order, so the hint almost always hits.
    pub fn get_at(&self, position: usize, key: &str) -> Option<&CellValue> {
        match self.columns.get(position) {
            Some((k, v)) if k == key => Some(v),
            _ => self.get(key),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    pub fn has_row_path(&self) -> bool {
        self.row_path.is_some()
    }

    /// Row path, with a missing path read as empty.
    pub fn path(&self) -> &[String] {
        self.row_path.as_deref().unwrap_or(&[])
    }

    pub fn depth(&self) -> usize {
        self.path().len()
    }
}

impl From<Map<String, Value>> for ResultRow {
    fn from(map: Map<String, Value>) -> Self {
        let mut row = Self {
            row_path: None,
            columns: Vec::with_capacity(map.len()),
        };
        for (key, value) in map {
            if key == ROW_PATH_KEY {
                row.row_path = Some(parse_row_path(value));
            } else {
                row.columns.push((key, CellValue::from(value)));
            }
        }
        row
    }
}

fn parse_row_path(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            log::warn!("malformed {ROW_PATH_KEY} value {other}, treating as empty path");
            Vec::new()
        }
    }
}

/// A possibly sparse result set. Unset slots are rows that have not been fetched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPayload {
    rows: Vec<Option<ResultRow>>,
}

impl ResultPayload {
    /// A fully materialized payload.
    pub fn from_rows(rows: Vec<ResultRow>) -> Self {
        Self {
            rows: rows.into_iter().map(Some).collect(),
        }
    }

    /// An empty payload with `len` unset slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            rows: vec![None; len],
        }
    }

    /// Parse a JSON array of row objects.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let rows: Vec<ResultRow> = serde_json::from_str(json)?;
        Ok(Self::from_rows(rows))
    }

    /// Write `page` into consecutive slots starting at `start_row`, growing as needed.
    pub fn fill(&mut self, start_row: usize, page: Vec<ResultRow>) {
        let end = start_row.saturating_add(page.len());
        if self.rows.len() < end {
            self.rows.resize(end, None);
        }
        for (slot, row) in self.rows.iter_mut().skip(start_row).zip(page) {
            *slot = Some(row);
        }
    }

    /// Number of slots, loaded or not.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultRow> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    /// Number of loaded slots.
    pub fn loaded(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    /// The row that defines the shape of the payload: row 0, or the first loaded row.
    pub fn first(&self) -> Option<&ResultRow> {
        self.rows.iter().find_map(Option::as_ref)
    }
}

/// Remove hidden columns from every row of a fetched page.
///
/// A key is hidden when its last pivot level (trimmed) is in `hidden`. Keys are
/// taken from the first row, as every row of a page shares the same keys.
pub fn filter_hidden(rows: &mut [ResultRow], hidden: &[String]) {
    if hidden.is_empty() {
        return;
    }
    let Some(first) = rows.first() else {
        return;
    };
    let to_delete: Vec<String> = first
        .keys()
        .filter(|key| {
            let leaf = key.rsplit(COLUMN_KEY_DELIMITER).next().unwrap_or(key).trim();
            hidden.iter().any(|h| h == leaf)
        })
        .map(str::to_string)
        .collect();
    if to_delete.is_empty() {
        return;
    }
    for row in rows.iter_mut() {
        row.columns.retain(|(key, _)| !to_delete.contains(key));
    }
}
