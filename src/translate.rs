//! Row translation: result-set rows keyed by column name become grid rows keyed
//! by column index, plus the column descriptors the grid is configured from.
//!
//! Pivoted (tree) results carry a row path on every row. Those rows get tree
//! metadata stored under [`TREE_COLUMN_INDEX`], and the column list gains a
//! synthetic tree column in front.

use serde::Serialize;

use crate::types::{
    CellValue, ColumnDescriptor, FlatRow, ResultPayload, ResultRow, Schema, TreeMeta, ValueType,
    COLUMN_KEY_DELIMITER, ROOT_LABEL, TOTAL_LABEL, TREE_COLUMN_INDEX,
};

/// Label of a column whose path is blank (the single "total" column of a
/// fully aggregated result, and the tree column).
pub const BLANK_COLUMN_LABEL: &str = " ";

/// Which part of the payload to translate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// First row to populate.
    pub start_row: usize,
    /// End (exclusive) of the populated rows; defaults to the payload length.
    pub end_row: Option<usize>,
    /// Length of the output row sequence. Slots outside
    /// `[start_row, end_row)` are left unset.
    pub total_length: Option<usize>,
}

impl TranslateOptions {
    /// Translate every loaded row.
    pub fn full() -> Self {
        Self::default()
    }

    /// Populate `[start_row, end_row)` of an output pre-sized to `total_length`.
    pub fn window(start_row: usize, end_row: usize, total_length: usize) -> Self {
        Self {
            start_row,
            end_row: Some(end_row),
            total_length: Some(total_length),
        }
    }
}

/// Output of [`translate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Grid rows by row index; `None` marks a row that has not been loaded.
    pub rows: Vec<Option<FlatRow>>,
    pub is_tree: bool,
    /// Tree column first (when `is_tree`), then value columns `0..N`.
    pub columns: Vec<ColumnDescriptor>,
}

impl Translation {
    /// Descriptors of the value columns, without the tree column.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.is_tree())
    }

    pub fn tree_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.is_tree())
    }

    /// Number of rows that were populated.
    pub fn populated(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }
}

/// Translate a result payload into index-keyed grid rows and column descriptors.
///
/// * `schema` - types of the view's columns, looked up by each column's last pivot level
/// * `tree_schema` - types of the table's columns, looked up by row pivot name
/// * `row_pivots` - active row pivots, outermost first
pub fn translate(
    payload: &ResultPayload,
    schema: &Schema,
    tree_schema: &Schema,
    row_pivots: &[String],
    options: TranslateOptions,
) -> Translation {
    let Some(first) = payload.first() else {
        return Translation {
            rows: vec![None; options.total_length.unwrap_or(0)],
            is_tree: false,
            columns: schema_columns(schema),
        };
    };

    let is_tree = first.has_row_path();
    let keys: Vec<&str> = first.keys().collect();
    let columns = payload_columns(&keys, is_tree, schema, tree_schema, row_pivots);

    let end = options.end_row.unwrap_or(payload.len()).min(payload.len());
    let start = options.start_row.min(end);
    let mut rows: Vec<Option<FlatRow>> = vec![None; options.total_length.unwrap_or(end)];

    for idx in start..end {
        let Some(row) = payload.get(idx) else {
            continue;
        };
        let Some(slot) = rows.get_mut(idx) else {
            break;
        };
        let mut flat = flatten(row, &keys);
        if is_tree {
            let next_depth = payload.get(idx + 1).map_or(0, ResultRow::depth);
            flat.tree = Some(tree_meta(row, idx, next_depth));
        }
        *slot = Some(flat);
    }

    Translation {
        rows,
        is_tree,
        columns,
    }
}

/// Descriptors for an empty payload: one per schema entry, in schema order.
fn schema_columns(schema: &Schema) -> Vec<ColumnDescriptor> {
    schema
        .iter()
        .zip(0_i32..)
        .map(|((name, value_type), index)| {
            ColumnDescriptor::new(index, vec![name.to_string()], value_type)
        })
        .collect()
}

fn payload_columns(
    keys: &[&str],
    is_tree: bool,
    schema: &Schema,
    tree_schema: &Schema,
    row_pivots: &[String],
) -> Vec<ColumnDescriptor> {
    let mut columns = Vec::with_capacity(keys.len() + usize::from(is_tree));

    if is_tree {
        let level_types: Vec<ValueType> = row_pivots
            .iter()
            .map(|pivot| tree_schema.get(pivot).unwrap_or_default())
            .collect();
        let mut tree = ColumnDescriptor::new(
            TREE_COLUMN_INDEX,
            vec![BLANK_COLUMN_LABEL.to_string()],
            level_types.first().copied().unwrap_or_default(),
        );
        tree.level_types = level_types;
        columns.push(tree);
    }

    for (key, index) in keys.iter().zip(0_i32..) {
        let mut path: Vec<String> = key
            .split(COLUMN_KEY_DELIMITER)
            .map(str::to_string)
            .collect();
        if columns.is_empty() && path.iter().all(String::is_empty) {
            path = vec![BLANK_COLUMN_LABEL.to_string()];
        }
        let value_type = path
            .last()
            .and_then(|leaf| schema.get(leaf))
            .unwrap_or_default();
        columns.push(ColumnDescriptor::new(index, path, value_type));
    }

    columns
}

fn flatten(row: &ResultRow, keys: &[&str]) -> FlatRow {
    let values = keys
        .iter()
        .enumerate()
        .map(|(position, key)| row.get_at(position, key).cloned().unwrap_or(CellValue::Null))
        .collect();
    FlatRow::new(values)
}

fn tree_meta(row: &ResultRow, idx: usize, next_depth: usize) -> TreeMeta {
    let path = row.path();
    let rollup = match path.last() {
        Some(label) => Some(label.clone()),
        None if idx == 0 => Some(TOTAL_LABEL.to_string()),
        None => None,
    };
    let mut row_path = Vec::with_capacity(path.len() + 1);
    row_path.push(ROOT_LABEL.to_string());
    row_path.extend(path.iter().cloned());
    TreeMeta {
        rollup,
        row_path,
        is_leaf: path.len() >= next_depth,
    }
}
