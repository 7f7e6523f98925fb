//! Custom `validation.pattern` compilation.
//!
//! Patterns use `fancy_regex`, so lookaround and backreferences are
//! accepted alongside the plain `regex` syntax. Malformed patterns are never the submitter's fault, so validation skips
//! them. Compiled results, including failures, are cached per source string
//! so the warning is logged once rather than on every record.

use std::sync::OnceLock;

use dashmap::DashMap;
use fancy_regex::Regex;

const MAX_CACHED_PATTERNS: usize = 512;

static CACHE: OnceLock<DashMap<String, Option<Regex>>> = OnceLock::new();

pub fn compile(source: &str) -> Result<Regex, fancy_regex::Error> {
    Regex::new(source)
}

/// Whether `text` matches. A match that aborts at runtime (backtrack limit)
/// counts as a match, so the constraint is skipped rather than failing the value.
pub fn matches(regex: &Regex, text: &str) -> bool {
    regex.is_match(text).unwrap_or_else(|err| {
        tracing::warn!(pattern = regex.as_str(), error = %err, "validation pattern aborted");
        true
    })
}

/// Compiled pattern, or `None` if `source` does not compile.
pub fn cached(source: &str) -> Option<Regex> {
    let cache = CACHE.get_or_init(DashMap::new);
    if let Some(entry) = cache.get(source) {
        return entry.clone();
    }

    let compiled = match compile(source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(pattern = source, error = %err, "ignoring malformed validation pattern");
            None
        }
    };

    if cache.len() >= MAX_CACHED_PATTERNS {
        cache.clear();
    }
    cache.insert(source.to_string(), compiled.clone());
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pattern_is_cached() {
        let first = cached("^[0-9]{3}$").unwrap();
        assert!(matches(&first, "123"));
        assert!(cached("^[0-9]{3}$").is_some());
    }

    #[test]
    fn test_lookaround_and_backreferences_compile() {
        let digit = cached("^(?=.*[0-9]).{8,}$").unwrap();
        assert!(matches(&digit, "abcdefg1"));
        assert!(!matches(&digit, "abcdefgh"));

        let doubled = compile(r"^(\w)\1$").unwrap();
        assert!(matches(&doubled, "aa"));
        assert!(!matches(&doubled, "ab"));
    }

    #[test]
    fn test_malformed_pattern_yields_none() {
        assert!(cached("([unclosed").is_none());
        assert!(cached("([unclosed").is_none());
        assert!(compile("([unclosed").is_err());
    }
}
