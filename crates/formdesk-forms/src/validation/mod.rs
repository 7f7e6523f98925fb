//! Field and record validation
//!
//! Two levels with deliberately different shapes: [`validate_field`] returns
//! the first failing check for one field, [`validate_record`] runs every
//! field of a schema and keeps all of their errors.

mod field;
pub mod pattern;
mod record;

pub use field::validate_field;
pub use record::validate_record;
