//! Uniform-height row geometry of the grid body.

use crate::config::GridConfig;

/// Row geometry: every data row has the same height, below a fixed header band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    /// Total rows in the result set, loaded or not.
    pub row_count: usize,
    /// Height of one data row in pixels
    pub row_height: f32,
    /// Height of the header band in pixels
    pub header_height: f32,
}

impl RowLayout {
    pub fn new(row_count: usize, row_height: f32, header_height: f32) -> Self {
        Self {
            row_count,
            row_height,
            header_height,
        }
    }

    /// Layout for `row_count` rows using the configured row and header heights.
    pub fn from_config(row_count: usize, config: &GridConfig) -> Self {
        Self::new(row_count, config.row_height, config.header_height())
    }

    /// Whether row positions can be computed at all.
    pub fn is_valid(&self) -> bool {
        self.row_height.is_finite() && self.row_height > 0.0
    }

    /// Height of all data rows.
    #[allow(clippy::cast_precision_loss)]
    pub fn total_height(&self) -> f32 {
        self.row_count as f32 * self.row_height
    }

    /// Index of the row containing body coordinate `y`, clamped to the last row.
    ///
    /// Returns `None` for an empty layout.
    pub fn row_at_y(&self, y: f32) -> Option<usize> {
        if self.row_count == 0 || !self.is_valid() {
            return None;
        }
        Some(rows_in(y, self.row_height).min(self.row_count - 1))
    }

    /// Number of rows needed to cover `height` pixels, counting partial rows.
    pub fn rows_covering(&self, height: f32) -> usize {
        if !self.is_valid() || height <= 0.0 {
            return 0;
        }
        whole((height / self.row_height).ceil())
    }
}

/// Whole rows of `row_height` that fit in `y` pixels (negative `y` is row 0).
fn rows_in(y: f32, row_height: f32) -> usize {
    whole((y / row_height).floor())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(rows: f32) -> usize {
    if rows.is_nan() || rows <= 0.0 {
        0
    } else {
        rows as usize
    }
}
