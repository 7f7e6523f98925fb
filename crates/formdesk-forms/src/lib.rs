//! Formdesk Forms
//!
//! Schema-driven form validation, submission intake and reporting.
//!
//! ## Features
//! - Declarative field descriptors (`text`, `email`, `password`, `date`,
//!   `number`, `dropdown`) with length, range, option and pattern constraints
//! - Per-field validation (first error wins) and whole-record validation
//!   (all field errors accumulated)
//! - Submission intake with sanitization and content-fingerprint duplicate
//!   detection
//! - Analytics snapshots recomputed from the full submission set
//!
//! ## Architecture
//!
//! ```text
//!  FieldDescriptor ──► FormSchema ──► validation::validate_record
//!                                            │
//!  raw record ──► intake::sanitize ──► intake::fingerprint ──► SubmissionRepository
//!                                                                     │
//!                                        analytics::AnalyticsAggregator ◄┘
//! ```

pub mod analytics;
pub mod application;
pub mod client;
pub mod coerce;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod intake;
pub mod ports;
pub mod validation;

pub use analytics::{AnalyticsAggregator, AnalyticsConfig, AnalyticsSnapshot};
pub use application::{FormService, Page, PageRequest};
pub use domain::aggregates::{FormSchema, PatternPolicy, Submission, SubmissionData};
pub use domain::value_objects::{FieldDescriptor, FieldError, FieldType, PatternRule};
pub use error::{FormsError, Result};
pub use intake::{fingerprint, sanitize, ContentHash};
pub use ports::{RepoResult, RepositoryError, SchemaRepository, SubmissionRepository};
pub use validation::{validate_field, validate_record};
