//! Viewport state management for scrolling.

use super::RowLayout;

/// Viewport state - represents the visible area of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Horizontal scroll position in pixels
    pub scroll_x: f32,
    /// Vertical scroll position of the grid body in pixels
    pub scroll_y: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels, including the header band
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// A viewport that has not been laid out yet.
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Whether layout metrics are available.
    pub fn has_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Visible rows as a half-open `(start, end)` pair, counting partially visible rows.
    ///
    /// Returns `None` when nothing can be shown: no size, no rows, or a header
    /// band taller than the viewport.
    pub fn visible_rows(&self, layout: &RowLayout) -> Option<(usize, usize)> {
        if !self.has_size() {
            return None;
        }
        let body_height = (self.height - layout.header_height).max(0.0);
        if body_height <= 0.0 {
            return None;
        }
        let start = layout.row_at_y(self.scroll_y)?;
        // A row starting exactly at the bottom edge is not on screen.
        let end = layout
            .rows_covering(self.scroll_y + body_height)
            .min(layout.row_count);
        (end > start).then_some((start, end))
    }

    /// Clamp scroll position to valid range.
    pub fn clamp_scroll(&mut self, layout: &RowLayout) {
        let body_height = (self.height - layout.header_height).max(0.0);
        let max_y = (layout.total_height() - body_height).max(0.0);
        self.scroll_y = self.scroll_y.clamp(0.0, max_y);
        self.scroll_x = self.scroll_x.max(0.0);
    }

    /// Scroll by delta amounts
    pub fn scroll_by(&mut self, delta_x: f32, delta_y: f32, layout: &RowLayout) {
        self.scroll_x += delta_x;
        self.scroll_y += delta_y;
        self.clamp_scroll(layout);
    }

    /// Set absolute scroll position
    pub fn set_scroll(&mut self, x: f32, y: f32, layout: &RowLayout) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(layout);
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
