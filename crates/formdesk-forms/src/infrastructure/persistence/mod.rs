//! Repository implementations

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::{InMemorySchemaRepository, InMemorySubmissionRepository};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
