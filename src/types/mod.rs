//! Data types shared by the translator, the range cache, and the grid model.

mod column;
mod payload;
mod row;
mod value;

pub use column::*;
pub use payload::*;
pub use row::*;
pub use value::*;
