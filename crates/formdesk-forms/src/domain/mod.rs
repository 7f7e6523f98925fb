//! Forms domain: field descriptors, schemas and submissions

pub mod aggregates;
pub mod value_objects;
