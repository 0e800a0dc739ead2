//! Grid row store and column model.
//!
//! [`GridModel`] holds the translated rows the grid paints from and the
//! per-column presentation properties. It is exposed to the grid through
//! the [`RowDataSource`] trait.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::numfmt::{cell_style, ColumnFormat, FormattedValue};
use crate::translate::Translation;
use crate::types::{
    CellRef, CellValue, ColumnDescriptor, FlatRow, TreeMeta, ValueType, HEADER_DELIMITER,
    TREE_COLUMN_INDEX,
};

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    Left,
    Right,
}

/// Entry of the grid's column schema. Equality of the whole list decides
/// whether a load keeps column widths and formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridColumn {
    /// Column index as text.
    pub name: String,
    pub header: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// Presentation properties of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProperties {
    pub header: String,
    pub halign: HAlign,
    pub column_header_halign: HAlign,
    pub format: Option<ColumnFormat>,
    pub width: f32,
    pub column_autosizing: bool,
}

impl ColumnProperties {
    fn for_column(header: String, value_type: ValueType, width: f32) -> Self {
        let halign = if value_type.is_numeric() {
            HAlign::Right
        } else {
            HAlign::Left
        };
        Self {
            header,
            halign,
            column_header_halign: halign,
            format: ColumnFormat::for_type(value_type),
            width,
            column_autosizing: true,
        }
    }

    /// Last level of the header, shared by the same measure under every column pivot.
    fn leaf_header(&self) -> &str {
        self.header
            .rsplit(HEADER_DELIMITER)
            .next()
            .unwrap_or(&self.header)
    }
}

/// Result of installing a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// The column schema changed; widths and formats were rebuilt.
    pub schema_reset: bool,
}

/// Position and role of a cell being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellContext {
    /// Column index; [`TREE_COLUMN_INDEX`] for the tree column.
    pub x: i32,
    /// Row index.
    pub y: usize,
    pub is_header_row: bool,
    pub is_user_data_area: bool,
}

/// Drawing state of a tree column cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeCellState {
    pub label: String,
    pub depth: usize,
    /// The next row is at a different depth.
    pub last: bool,
    /// The next row is deeper, so this group is expanded.
    pub expanded: bool,
}

/// How a cell should be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CellRenderer {
    /// Plain cell with fixed text (tree column header).
    Simple(String),
    /// Tree column cell with connector lines.
    Tree(TreeCellState),
    /// Data cell with formatted text.
    Styled(FormattedValue),
    /// Row not loaded yet, or outside the data area.
    Empty,
}

/// Row-oriented data interface the grid paints from.
pub trait RowDataSource {
    /// Cell at column `x`, row `y`. `None` when the row is not loaded.
    fn value(&self, x: i32, y: usize) -> Option<CellRef<'_>>;

    /// Replace a value in a loaded row.
    fn set_value(&mut self, x: usize, y: usize, value: CellValue) -> Result<()>;

    /// Total rows, loaded or not.
    fn row_count(&self) -> usize;

    fn is_tree(&self) -> bool;

    fn is_tree_column(&self, x: i32) -> bool {
        x == TREE_COLUMN_INDEX && self.is_tree()
    }

    /// Display text and color of a value in column `x`.
    fn cell_style(&self, x: i32, value: &CellValue) -> FormattedValue;

    fn renderer_for(&self, cell: CellContext) -> CellRenderer;
}

/// The grid's row store and column model.
#[derive(Debug, Clone, Default)]
pub struct GridModel {
    config: GridConfig,
    rows: Vec<Option<FlatRow>>,
    is_tree: bool,
    schema: Vec<GridColumn>,
    schema_loaded: bool,
    tree_column: Option<ColumnDescriptor>,
    columns: Vec<ColumnProperties>,
}

impl GridModel {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Install a translation.
    ///
    /// When the column schema is unchanged only the rows are replaced.
    /// Otherwise the schema is rebuilt, carrying over column widths by header.
    pub fn set_translation(&mut self, translation: Translation) -> LoadOutcome {
        let Translation {
            rows,
            is_tree,
            columns,
        } = translation;

        let mut tree_column = None;
        let mut schema = Vec::with_capacity(columns.len());
        for column in columns {
            if column.is_tree() {
                tree_column = Some(column);
                continue;
            }
            schema.push(GridColumn {
                name: column.index.to_string(),
                header: self.config.header_for(&column.display_name).to_string(),
                value_type: column.value_type,
            });
        }

        self.rows = rows;
        self.is_tree = is_tree;
        self.tree_column = tree_column;

        if self.schema_loaded && schema == self.schema {
            return LoadOutcome {
                schema_reset: false,
            };
        }

        log::info!("Setting up initial schema and data load");
        let widths = self.memoize_widths();
        self.columns = schema
            .iter()
            .map(|column| {
                let width = restore_width(&widths, &column.header)
                    .unwrap_or(self.config.minimum_column_width);
                ColumnProperties::for_column(column.header.clone(), column.value_type, width)
            })
            .collect();
        self.schema = schema;
        self.schema_loaded = true;
        LoadOutcome { schema_reset: true }
    }

    /// Remember current widths by leaf header, or by full header when the
    /// leaf is already taken.
    fn memoize_widths(&self) -> HashMap<String, f32> {
        let mut widths = HashMap::new();
        for props in &self.columns {
            let leaf = props.leaf_header();
            if widths.contains_key(leaf) {
                widths.insert(props.header.clone(), props.width);
            } else {
                widths.insert(leaf.to_string(), props.width);
            }
        }
        widths
    }

    /// Replace the row store after a lazy range load.
    ///
    /// Row 0 (the grand total of a pivoted view) is kept from the current
    /// store when the new rows do not include it.
    pub fn set_rows(&mut self, mut rows: Vec<Option<FlatRow>>) {
        if let Some(slot @ None) = rows.first_mut() {
            *slot = self.rows.first().cloned().flatten();
        }
        self.rows = rows;
    }

    /// Drop all rows and columns, as when the grid is detached.
    pub fn reset(&mut self) {
        let config = std::mem::take(&mut self.config);
        *self = Self::new(config);
    }

    pub fn schema(&self) -> &[GridColumn] {
        &self.schema
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_properties(&self, x: usize) -> Option<&ColumnProperties> {
        self.columns.get(x)
    }

    pub fn column_properties_mut(&mut self, x: usize) -> Option<&mut ColumnProperties> {
        self.columns.get_mut(x)
    }

    /// Whether the tree column should be drawn.
    pub fn show_tree_column(&self) -> bool {
        self.is_tree
    }

    pub fn tree_column(&self) -> Option<&ColumnDescriptor> {
        self.tree_column.as_ref()
    }

    pub fn row(&self, y: usize) -> Option<&FlatRow> {
        self.rows.get(y).and_then(Option::as_ref)
    }

    /// Rows that are loaded.
    pub fn loaded_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    fn value_type(&self, x: i32) -> Option<ValueType> {
        let x = usize::try_from(x).ok()?;
        self.schema.get(x).map(|c| c.value_type)
    }

    fn tree_cell(&self, meta: &TreeMeta, y: usize) -> TreeCellState {
        let depth_diff = match self.row(y + 1) {
            Some(next) => signed(meta.row_path.len()) - signed(next.path_len()),
            None => -1,
        };
        let depth = meta.depth();
        let label = match (&meta.rollup, &self.tree_column) {
            (Some(label), Some(column)) if depth > 0 => {
                ColumnFormat::FinanceTree(column.level_types.clone())
                    .format_label(label, depth - 1)
            }
            (Some(label), _) => label.clone(),
            (None, _) => String::new(),
        };
        TreeCellState {
            label,
            depth,
            last: depth_diff != 0,
            expanded: depth_diff < 0,
        }
    }
}

fn signed(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn restore_width(widths: &HashMap<String, f32>, header: &str) -> Option<f32> {
    let leaf = header.rsplit(HEADER_DELIMITER).next().unwrap_or(header);
    widths
        .get(header)
        .or_else(|| widths.get(leaf))
        .copied()
}

impl RowDataSource for GridModel {
    fn value(&self, x: i32, y: usize) -> Option<CellRef<'_>> {
        self.row(y)?.get(x)
    }

    fn set_value(&mut self, x: usize, y: usize, value: CellValue) -> Result<()> {
        let row = self
            .rows
            .get_mut(y)
            .and_then(Option::as_mut)
            .ok_or_else(|| GridError::Other(format!("row {y} is not loaded")))?;
        if row.set(x, value) {
            Ok(())
        } else {
            Err(GridError::Other(format!("column {x} does not exist")))
        }
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn is_tree(&self) -> bool {
        self.is_tree
    }

    fn cell_style(&self, x: i32, value: &CellValue) -> FormattedValue {
        let value_type = self.value_type(x).unwrap_or_default();
        cell_style(value, value_type, &self.config)
    }

    fn renderer_for(&self, cell: CellContext) -> CellRenderer {
        if cell.x == TREE_COLUMN_INDEX {
            if cell.is_header_row {
                return CellRenderer::Simple(String::new());
            }
            return match self.value(cell.x, cell.y) {
                Some(CellRef::Tree(meta)) => CellRenderer::Tree(self.tree_cell(meta, cell.y)),
                _ => CellRenderer::Empty,
            };
        }
        if !cell.is_user_data_area {
            return CellRenderer::Empty;
        }
        match self.value(cell.x, cell.y) {
            Some(CellRef::Value(value)) => CellRenderer::Styled(self.cell_style(cell.x, value)),
            _ => CellRenderer::Empty,
        }
    }
}
