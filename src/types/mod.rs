//! Core value types: fixed-width integer tuples and alias-qualified schemas.

pub mod schema;
pub mod tuple;

pub use schema::{ColumnRef, Schema};
pub use tuple::Tuple;
