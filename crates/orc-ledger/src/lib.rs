// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Append-only JSONL trace ledger.
//!
//! [`TraceLedger::log`] never propagates an I/O failure to the caller
//! (§4.4, §7): a single retry after a short backoff is attempted, and if
//! that also fails the error is logged and swallowed. This is the
//! fail-open rule — governance bookkeeping must never block a tool call.

use orc_core::{
    Contributor, Conversation, FileRecord, LedgerRecord, LineRange, NullVcsProbe, Related,
    TraceEntry, VcsInfo, VcsProbe,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Per-call metadata supplied to [`TraceLedger::log`] beyond what a
/// [`TraceEntry`] itself carries.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Model identifier attributed to the edit; `"unknown"` if absent.
    pub model_identifier: Option<String>,
    /// 1-based start line of the touched range; defaults to 1.
    pub start_line: Option<u32>,
    /// 1-based end line of the touched range; defaults to 1.
    pub end_line: Option<u32>,
    /// Additional `{type: "specification", ...}` relations to attach.
    pub related_specs: Vec<Related>,
}

/// Append-only writer/reader over the ledger's JSONL file.
pub struct TraceLedger {
    path: PathBuf,
    vcs: Arc<dyn VcsProbe>,
}

impl TraceLedger {
    /// Open a ledger backed by `path`, using `vcs` to resolve the revision
    /// id attached to each record.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, vcs: Arc<dyn VcsProbe>) -> Self {
        Self {
            path: path.into(),
            vcs,
        }
    }

    /// The ledger file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Never returns an error: failures are logged and
    /// swallowed after one retry.
    pub fn log(&self, entry: &TraceEntry, options: LogOptions) {
        let record = build_ledger_record(entry, self.vcs.as_ref(), &options);
        let mut line = match serde_json::to_string(&record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize ledger record; dropping");
                return;
            }
        };
        line.push('\n');

        if self.append(&line).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
        if let Err(e) = self.append(&line) {
            tracing::warn!(error = %e, path = %self.path.display(), "ledger append failed twice; dropping entry");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    /// Return up to `limit` most recent records for `intent_id`, in file
    /// order. Tolerates malformed lines and both the legacy flat
    /// [`TraceEntry`] shape and the current [`LedgerRecord`] shape.
    #[must_use]
    pub fn get_recent_entries(&self, intent_id: &str, limit: usize) -> Vec<LedgerRecord> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let mut matches = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((record, record_intent_id)) = parse_line(line) else {
                continue;
            };
            if record_intent_id.as_deref() == Some(intent_id) {
                matches.push(record);
            }
        }
        let start = matches.len().saturating_sub(limit);
        matches[start..].to_vec()
    }
}

fn build_ledger_record(
    entry: &TraceEntry,
    vcs: &dyn VcsProbe,
    options: &LogOptions,
) -> LedgerRecord {
    let revision_id = vcs.current_revision_id();

    let mut related = Vec::new();
    if let Some(intent_id) = &entry.intent_id {
        related.push(Related::intent(intent_id.clone()));
    }
    related.extend(options.related_specs.iter().cloned());

    // A conversation's `related` must always carry an intent relation
    // (§3.2). With none attributed to this call, record the call without
    // a per-file conversation rather than emit one with an empty list.
    let files = match (&entry.file, &entry.intent_id) {
        (Some(_), None) | (None, _) => Vec::new(),
        (Some(file), Some(_)) => {
            let content_hash = file.post_hash.clone().or_else(|| file.pre_hash.clone());
            vec![FileRecord {
                relative_path: file.relative_path.clone(),
                conversations: vec![Conversation {
                    url: entry.session_id.clone(),
                    contributor: Contributor {
                        entity_type: "AI".to_string(),
                        model_identifier: options
                            .model_identifier
                            .clone()
                            .unwrap_or_else(|| "unknown".to_string()),
                    },
                    ranges: vec![LineRange {
                        start_line: options.start_line.unwrap_or(1),
                        end_line: options.end_line.unwrap_or(1),
                        content_hash,
                    }],
                    related,
                }],
            }]
        }
    };

    LedgerRecord {
        id: entry.id,
        timestamp: entry.timestamp,
        vcs: VcsInfo { revision_id },
        files,
    }
}

/// Parse one JSONL line into a unified `LedgerRecord`, also returning the
/// intent id it should be filtered by. Current-format lines carry a `vcs`
/// key; its absence marks a legacy flat `TraceEntry`.
fn parse_line(line: &str) -> Option<(LedgerRecord, Option<String>)> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    if value.get("vcs").is_some() {
        let record: LedgerRecord = serde_json::from_value(value).ok()?;
        let intent_id = record
            .files
            .first()
            .and_then(|f| f.conversations.first())
            .and_then(|c| c.related.iter().find(|r| r.related_type == "intent"))
            .map(|r| r.value.clone());
        Some((record, intent_id))
    } else {
        let entry: TraceEntry = serde_json::from_value(value).ok()?;
        let intent_id = entry.intent_id.clone();
        let record = build_ledger_record(&entry, &NullVcsProbe, &LogOptions::default());
        Some((record, intent_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::{MutationClass, ScopeValidation, TraceFile};
    use uuid::Uuid;

    fn sample_entry(intent_id: &str, path: &str) -> TraceEntry {
        TraceEntry {
            id: Uuid::new_v4(),
            timestamp: "2026-07-26T00:00:00Z".parse().unwrap(),
            intent_id: Some(intent_id.to_string()),
            session_id: "session-1".to_string(),
            tool_name: "write_to_file".to_string(),
            mutation_class: MutationClass::FileCreation,
            file: Some(TraceFile {
                relative_path: path.to_string(),
                pre_hash: None,
                post_hash: Some("sha256:abc".to_string()),
            }),
            scope_validation: ScopeValidation::Pass,
            success: true,
            error: None,
        }
    }

    #[test]
    fn log_appends_exactly_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        ledger.log(&sample_entry("INT-001", "src/x.ts"), LogOptions::default());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn log_preserves_prior_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        ledger.log(&sample_entry("INT-001", "a.ts"), LogOptions::default());
        let first = std::fs::read_to_string(&path).unwrap();
        ledger.log(&sample_entry("INT-001", "b.ts"), LogOptions::default());
        let second = std::fs::read_to_string(&path).unwrap();
        assert!(second.starts_with(&first));
    }

    #[test]
    fn record_includes_intent_relation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        ledger.log(&sample_entry("INT-007", "a.ts"), LogOptions::default());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"value\":\"INT-007\""));
        assert!(contents.contains("\"type\":\"intent\""));
    }

    #[test]
    fn file_bearing_entry_with_no_intent_omits_the_file_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        let mut entry = sample_entry("INT-001", "a.ts");
        entry.intent_id = None;
        ledger.log(&entry, LogOptions::default());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("\"related\""));
        assert!(contents.contains("\"files\":[]"));
    }

    #[test]
    fn get_recent_entries_filters_by_intent_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        for i in 0..25 {
            ledger.log(&sample_entry("INT-001", &format!("f{i}.ts")), LogOptions::default());
        }
        ledger.log(&sample_entry("INT-002", "other.ts"), LogOptions::default());

        let recent = ledger.get_recent_entries("INT-001", 20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent.last().unwrap().files[0].relative_path, "f24.ts");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        std::fs::write(&path, "not json at all\n").unwrap();
        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        ledger.log(&sample_entry("INT-001", "a.ts"), LogOptions::default());
        let recent = ledger.get_recent_entries("INT-001", 20);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn legacy_flat_entries_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_trace.jsonl");
        let entry = sample_entry("INT-009", "legacy.ts");
        let mut line = serde_json::to_string(&entry).unwrap();
        line.push('\n');
        std::fs::write(&path, line).unwrap();

        let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
        let recent = ledger.get_recent_entries("INT-009", 20);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].files[0].relative_path, "legacy.ts");
    }

    #[test]
    fn missing_ledger_file_yields_empty_results() {
        let ledger = TraceLedger::new("/nonexistent/agent_trace.jsonl", Arc::new(NullVcsProbe));
        assert!(ledger.get_recent_entries("INT-001", 20).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use orc_core::{MutationClass, ScopeValidation, TraceFile};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn intent_id_strategy() -> impl Strategy<Value = String> {
        "[A-Z]{3}-[0-9]{3}".prop_map(|s| s)
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        "[a-z]{1,8}\\.ts".prop_map(|s| s)
    }

    fn legacy_entry(intent_id: &str, path: &str) -> TraceEntry {
        TraceEntry {
            id: Uuid::new_v4(),
            timestamp: "2026-07-26T00:00:00Z".parse().unwrap(),
            intent_id: Some(intent_id.to_string()),
            session_id: "session-1".to_string(),
            tool_name: "write_to_file".to_string(),
            mutation_class: MutationClass::FileCreation,
            file: Some(TraceFile {
                relative_path: path.to_string(),
                pre_hash: None,
                post_hash: Some("sha256:abc".to_string()),
            }),
            scope_validation: ScopeValidation::Pass,
            success: true,
            error: None,
        }
    }

    proptest! {
        // Property 9: a legacy flat TraceEntry line and a current-format
        // LedgerRecord line for the same intent are both readable by
        // get_recent_entries, yielding internally equivalent results.
        #[test]
        fn legacy_and_current_format_entries_are_equivalently_readable(
            intent_id in intent_id_strategy(),
            legacy_path in path_strategy(),
            current_path in path_strategy(),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("agent_trace.jsonl");

            let entry = legacy_entry(&intent_id, &legacy_path);
            let mut line = serde_json::to_string(&entry).unwrap();
            line.push('\n');
            std::fs::write(&path, &line).unwrap();

            let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
            ledger.log(&legacy_entry(&intent_id, &current_path), LogOptions::default());

            let recent = ledger.get_recent_entries(&intent_id, 20);
            prop_assert_eq!(recent.len(), 2);
            for record in &recent {
                prop_assert_eq!(record.files.len(), 1);
                prop_assert_eq!(record.files[0].conversations.len(), 1);
                prop_assert!(record
                    .files[0]
                    .conversations[0]
                    .related
                    .iter()
                    .any(|r| r.related_type == "intent" && r.value == intent_id));
            }
            let paths: Vec<&str> = recent.iter().map(|r| r.files[0].relative_path.as_str()).collect();
            prop_assert!(paths.contains(&legacy_path.as_str()));
            prop_assert!(paths.contains(&current_path.as_str()));
        }

        #[test]
        fn limit_caps_returned_entries(intent_id in intent_id_strategy(), count in 1usize..10) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("agent_trace.jsonl");
            let ledger = TraceLedger::new(&path, Arc::new(NullVcsProbe));
            for i in 0..count {
                ledger.log(&legacy_entry(&intent_id, &format!("f{i}.ts")), LogOptions::default());
            }
            let limit = (count / 2).max(1);
            let recent = ledger.get_recent_entries(&intent_id, limit);
            prop_assert_eq!(recent.len(), limit.min(count));
        }
    }
}
