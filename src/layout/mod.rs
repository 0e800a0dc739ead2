//! Layout engine for row positions and viewport management.
//!
//! This module handles:
//! - Row geometry of the grid body (uniform row height below a header band)
//! - Viewport state (scroll position, size, visible rows)

mod rows;
mod viewport;

pub use rows::RowLayout;
pub use viewport::Viewport;
