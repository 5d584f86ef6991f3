//! Catalog loading: parses the YAML file, fails open on any malformed
//! input, and caches the result for a short TTL.

use crate::validate::validate_intent;
use chrono::{DateTime, Utc};
use orc_core::{Clock, Intent};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long a loaded catalog stays cached before the next read re-parses
/// the file.
pub const CACHE_TTL: Duration = Duration::from_secs(5);

/// Parse catalog file contents into validated intents.
///
/// Accepts a root mapping with key `active_intents`, or the legacy alias
/// `intents`. Any parse failure, missing file content, or non-sequence root
/// yields an empty catalog — this function never returns an error.
#[must_use]
pub fn parse_catalog(contents: &str) -> Vec<Intent> {
    let doc: Value = match serde_yaml::from_str(contents) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "catalog YAML failed to parse; using empty catalog");
            return Vec::new();
        }
    };

    let Some(mapping) = doc.as_mapping() else {
        tracing::warn!("catalog root is not a mapping; using empty catalog");
        return Vec::new();
    };

    let sequence = mapping
        .get(Value::String("active_intents".to_string()))
        .or_else(|| mapping.get(Value::String("intents".to_string())))
        .and_then(Value::as_sequence);

    let Some(sequence) = sequence else {
        tracing::warn!("catalog has no 'active_intents' (or legacy 'intents') array; using empty catalog");
        return Vec::new();
    };

    let mut seen_ids = HashSet::new();
    let mut intents = Vec::with_capacity(sequence.len());
    for entry in sequence {
        match validate_intent(entry, &mut seen_ids) {
            Ok(intent) => intents.push(intent),
            Err(reason) => tracing::warn!(reason, "dropping invalid catalog entry"),
        }
    }
    intents
}

/// Cached, TTL-bound view over the on-disk catalog file.
pub struct Catalog {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<(DateTime<Utc>, Vec<Intent>)>>,
}

impl Catalog {
    /// Open a catalog backed by `path`. The file is not read until the
    /// first call to [`Catalog::all`] or [`Catalog::get`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            cache: Mutex::new(None),
        }
    }

    /// The catalog file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the catalog file currently exists on disk.
    #[must_use]
    pub fn file_present(&self) -> bool {
        self.path.is_file()
    }

    /// All intents currently in the catalog, re-reading the file if the
    /// cache has expired.
    #[must_use]
    pub fn all(&self) -> Vec<Intent> {
        let now = self.clock.now();
        let mut guard = self.cache.lock().expect("catalog cache mutex poisoned");
        if let Some((loaded_at, intents)) = guard.as_ref() {
            if now.signed_duration_since(*loaded_at).num_seconds()
                < CACHE_TTL.as_secs() as i64
            {
                return intents.clone();
            }
        }
        let contents = std::fs::read_to_string(&self.path).unwrap_or_default();
        let intents = parse_catalog(&contents);
        *guard = Some((now, intents.clone()));
        intents
    }

    /// Look up a single intent by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Intent> {
        self.all().into_iter().find(|i| i.id == id)
    }

    /// Force the next read to re-parse the file regardless of TTL.
    pub fn reload(&self) {
        *self.cache.lock().expect("catalog cache mutex poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::SystemClock;

    #[test]
    fn malformed_yaml_yields_empty_catalog() {
        assert!(parse_catalog("not: [valid: yaml: :").is_empty());
    }

    #[test]
    fn non_mapping_root_yields_empty_catalog() {
        assert!(parse_catalog("- a\n- b\n").is_empty());
    }

    #[test]
    fn missing_active_intents_key_yields_empty_catalog() {
        assert!(parse_catalog("other_key: []\n").is_empty());
    }

    #[test]
    fn legacy_intents_key_is_accepted() {
        let yaml = "intents:\n  - id: INT-001\n    name: Legacy\n    status: PENDING\n    owned_scope: [\"a/**\"]\n    created_at: \"2026-01-01T00:00:00Z\"\n    updated_at: \"2026-01-01T00:00:00Z\"\n";
        let intents = parse_catalog(yaml);
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].id, "INT-001");
    }

    #[test]
    fn current_key_is_accepted() {
        let yaml = "active_intents:\n  - id: INT-002\n    name: Current\n    status: PENDING\n    owned_scope: [\"a/**\"]\n    created_at: \"2026-01-01T00:00:00Z\"\n    updated_at: \"2026-01-01T00:00:00Z\"\n";
        assert_eq!(parse_catalog(yaml).len(), 1);
    }

    #[test]
    fn missing_file_yields_empty_catalog() {
        let catalog = Catalog::new("/nonexistent/active_intents.yaml", Arc::new(SystemClock));
        assert!(catalog.all().is_empty());
        assert!(!catalog.file_present());
    }

    #[test]
    fn catalog_get_finds_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active_intents.yaml");
        std::fs::write(&path, "active_intents:\n  - id: INT-009\n    name: Findable\n    status: PENDING\n    owned_scope: [\"a/**\"]\n    created_at: \"2026-01-01T00:00:00Z\"\n    updated_at: \"2026-01-01T00:00:00Z\"\n").unwrap();
        let catalog = Catalog::new(&path, Arc::new(SystemClock));
        assert!(catalog.get("INT-009").is_some());
        assert!(catalog.get("INT-404").is_none());
    }

    #[test]
    fn reload_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active_intents.yaml");
        std::fs::write(&path, "active_intents: []\n").unwrap();
        let catalog = Catalog::new(&path, Arc::new(SystemClock));
        assert!(catalog.all().is_empty());
        std::fs::write(&path, "active_intents:\n  - id: INT-010\n    name: Added later\n    status: PENDING\n    owned_scope: [\"a/**\"]\n    created_at: \"2026-01-01T00:00:00Z\"\n    updated_at: \"2026-01-01T00:00:00Z\"\n").unwrap();
        catalog.reload();
        assert_eq!(catalog.all().len(), 1);
    }
}
