//! Submission intake: sanitization and duplicate fingerprints

mod fingerprint;
mod sanitize;

pub use fingerprint::{fingerprint, same_record, structurally_equal, ContentHash};
pub use sanitize::sanitize;
