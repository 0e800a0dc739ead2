use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{CellValue, TREE_COLUMN_INDEX};

/// Label of the synthetic root prefixed to every tree row path.
pub const ROOT_LABEL: &str = "ROOT";

/// Rollup label of the grand-total row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Tree column metadata of a pivoted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMeta {
    /// Label shown in the tree column; `None` for an unnamed group.
    pub rollup: Option<String>,
    /// Ancestor chain, prefixed with [`ROOT_LABEL`].
    pub row_path: Vec<String>,
    pub is_leaf: bool,
}

impl TreeMeta {
    /// Depth of the row below the synthetic root.
    pub fn depth(&self) -> usize {
        self.row_path.len().saturating_sub(1)
    }
}

/// Value of one grid cell: a scalar, or the tree metadata at [`TREE_COLUMN_INDEX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Value(&'a CellValue),
    Tree(&'a TreeMeta),
}

/// A grid row keyed by integer column index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRow {
    /// Values by column index `0..N`.
    pub values: Vec<CellValue>,
    /// Tree metadata, present on pivoted rows.
    pub tree: Option<TreeMeta>,
}

impl FlatRow {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { values, tree: None }
    }

    /// Cell at column `index`; [`TREE_COLUMN_INDEX`] addresses the tree metadata.
    pub fn get(&self, index: i32) -> Option<CellRef<'_>> {
        if index == TREE_COLUMN_INDEX {
            return self.tree.as_ref().map(CellRef::Tree);
        }
        let index = usize::try_from(index).ok()?;
        self.values.get(index).map(CellRef::Value)
    }

    pub fn value(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }

    /// Replace the value at `index`. Returns `false` when the column does not exist.
    pub fn set(&mut self, index: usize, value: CellValue) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of value columns (the tree column is not counted).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Length of the row path including the root, or 0 for non-tree rows.
    pub fn path_len(&self) -> usize {
        self.tree.as_ref().map_or(0, |t| t.row_path.len())
    }
}

impl Serialize for FlatRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.tree.is_some());
        let mut map = serializer.serialize_map(Some(self.values.len() + extra))?;
        for (index, value) in self.values.iter().enumerate() {
            map.serialize_entry(&index, value)?;
        }
        if let Some(tree) = &self.tree {
            map.serialize_entry(&TREE_COLUMN_INDEX, tree)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_index() {
        let mut row = FlatRow::new(vec![CellValue::Integer(1), CellValue::Integer(2)]);
        row.tree = Some(TreeMeta {
            rollup: Some("A".to_string()),
            row_path: vec![ROOT_LABEL.to_string(), "A".to_string()],
            is_leaf: true,
        });
        assert_eq!(row.get(1), Some(CellRef::Value(&CellValue::Integer(2))));
        assert!(row.get(2).is_none());
        assert!(matches!(row.get(TREE_COLUMN_INDEX), Some(CellRef::Tree(_))));
        assert!(row.get(-2).is_none());
        assert_eq!(row.path_len(), 2);
    }

    #[test]
    fn test_serialize_integer_keys() {
        let row = FlatRow::new(vec![CellValue::Integer(1), CellValue::Null]);
        let json = serde_json::to_string(&row).expect("serializable");
        assert_eq!(json, r#"{"0":1,"1":null}"#);
    }
}
