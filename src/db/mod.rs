//! Storage layer: SQLite schema and row/domain-type conversions.

pub mod converters;
pub mod schema;
