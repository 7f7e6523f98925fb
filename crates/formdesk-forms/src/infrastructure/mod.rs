//! Infrastructure adapters

pub mod persistence;
