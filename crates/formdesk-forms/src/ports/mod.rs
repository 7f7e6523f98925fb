//! Outbound ports (repository traits)
//!
//! Infrastructure implements these; the application service only sees the
//! traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{FormSchema, Submission};
use crate::intake::ContentHash;

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique key is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Submission store.
///
/// `insert` must reject a second record with the same fingerprint atomically
/// with [`RepositoryError::Conflict`]; a separate lookup followed by an insert
/// is not enough under concurrent intake.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: &Submission, fingerprint: &ContentHash) -> RepoResult<()>;

    async fn find_by_id(&self, id: &Uuid) -> RepoResult<Option<Submission>>;

    async fn find_by_fingerprint(&self, fingerprint: &ContentHash) -> RepoResult<Option<Submission>>;

    /// Every stored submission, newest first.
    async fn find_all(&self) -> RepoResult<Vec<Submission>>;

    /// One page of submissions, newest first.
    async fn find_page(&self, offset: usize, limit: usize) -> RepoResult<Vec<Submission>>;

    async fn count(&self) -> RepoResult<u64>;
}

/// Schema store, keyed by schema name.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Insert or replace the whole schema stored under `schema.name`.
    async fn upsert(&self, schema: &FormSchema) -> RepoResult<FormSchema>;

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<FormSchema>>;

    /// All schemas, most recently created first.
    async fn list(&self) -> RepoResult<Vec<FormSchema>>;
}
