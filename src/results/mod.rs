// Results module - row container and fetch-time row shaping

pub mod row;
pub mod shape;

pub use row::Row;
pub use shape::{FetchShape, ShapedRow};
