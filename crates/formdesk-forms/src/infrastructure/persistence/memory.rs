//! In-memory repositories (development and tests)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{FormSchema, Submission};
use crate::intake::{same_record, ContentHash};
use crate::ports::{RepoResult, RepositoryError, SchemaRepository, SubmissionRepository};

#[derive(Default)]
struct SubmissionIndex {
    /// Creation order.
    rows: Vec<Submission>,
    by_id: HashMap<Uuid, usize>,
    by_fingerprint: HashMap<ContentHash, Vec<usize>>,
}

impl SubmissionIndex {
    fn duplicate_of(&self, submission: &Submission, fingerprint: &ContentHash) -> Option<&Submission> {
        self.by_fingerprint
            .get(fingerprint)?
            .iter()
            .map(|&row| &self.rows[row])
            .find(|existing| same_record(&existing.data, &submission.data))
    }
}

/// In-memory submission repository.
///
/// The duplicate check and the insert happen under one write lock.
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    index: RwLock<SubmissionIndex>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert(&self, submission: &Submission, fingerprint: &ContentHash) -> RepoResult<()> {
        let mut index = self.index.write();

        if let Some(existing) = index.duplicate_of(submission, fingerprint) {
            return Err(RepositoryError::Conflict(format!(
                "content matches submission {}",
                existing.id
            )));
        }
        if index.by_id.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict(format!("id {} already stored", submission.id)));
        }

        let row = index.rows.len();
        index.rows.push(submission.clone());
        index.by_id.insert(submission.id, row);
        index.by_fingerprint.entry(fingerprint.clone()).or_default().push(row);
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> RepoResult<Option<Submission>> {
        let index = self.index.read();
        Ok(index.by_id.get(id).map(|&row| index.rows[row].clone()))
    }

    async fn find_by_fingerprint(&self, fingerprint: &ContentHash) -> RepoResult<Option<Submission>> {
        let index = self.index.read();
        Ok(index
            .by_fingerprint
            .get(fingerprint)
            .and_then(|rows| rows.first())
            .map(|&row| index.rows[row].clone()))
    }

    async fn find_all(&self) -> RepoResult<Vec<Submission>> {
        Ok(self.index.read().rows.iter().rev().cloned().collect())
    }

    async fn find_page(&self, offset: usize, limit: usize) -> RepoResult<Vec<Submission>> {
        Ok(self
            .index
            .read()
            .rows
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.index.read().rows.len() as u64)
    }
}

#[derive(Clone)]
struct SchemaRecord {
    schema: FormSchema,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// In-memory schema repository.
#[derive(Default)]
pub struct InMemorySchemaRepository {
    schemas: DashMap<String, SchemaRecord>,
}

impl InMemorySchemaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaRepository for InMemorySchemaRepository {
    async fn upsert(&self, schema: &FormSchema) -> RepoResult<FormSchema> {
        let now = Utc::now();
        self.schemas
            .entry(schema.name.clone())
            .and_modify(|record| {
                record.schema = schema.clone();
                record.updated_at = now;
            })
            .or_insert_with(|| SchemaRecord { schema: schema.clone(), created_at: now, updated_at: now });
        Ok(schema.clone())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<FormSchema>> {
        Ok(self.schemas.get(name).map(|record| record.schema.clone()))
    }

    async fn list(&self) -> RepoResult<Vec<FormSchema>> {
        let mut records: Vec<SchemaRecord> = self.schemas.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
                .then_with(|| a.schema.name.cmp(&b.schema.name))
        });
        Ok(records.into_iter().map(|record| record.schema).collect())
    }
}
