// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Advisory cooperative session coordinator (§4.8).
//!
//! Maintains a `## Active Sessions` markdown table in the shared brain
//! file. This is advisory only: it imposes no lock. Optimistic locking in
//! the hook engine is the actual concurrency guard.

use chrono::{DateTime, Utc};
use orc_core::Clock;
use orc_mdutil::{find_section, insert_before_footer, parse_table_rows};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SECTION_HEADING: &str = "Active Sessions";
const STALE_AFTER_SECS: i64 = 5 * 60;

/// One row of the active-sessions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// The session's id.
    pub session_id: String,
    /// The intent currently claimed by this session, if any.
    pub intent_id: Option<String>,
    /// When the session last sent a heartbeat.
    pub last_seen: DateTime<Utc>,
}

/// Coordinates sessions via the shared brain file's table.
pub struct SessionCoordinator {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Build a coordinator over the brain file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// The brain file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upsert this session's row. No-op if the brain file does not exist.
    pub fn heartbeat(&self, session_id: &str, intent_id: Option<&str>) {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return;
        };
        let mut sessions = read_sessions(&contents);
        sessions.retain(|s| s.session_id != session_id);
        sessions.push(SessionInfo {
            session_id: session_id.to_string(),
            intent_id: intent_id.map(str::to_string),
            last_seen: self.clock.now(),
        });
        let updated = write_sessions(&contents, &sessions);
        if let Err(e) = std::fs::write(&self.path, updated) {
            tracing::warn!(error = %e, "failed to write session heartbeat");
        }
    }

    /// All sessions currently listed, in table order.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        read_sessions(&contents)
    }

    /// Whether `intent_id` is currently claimed by a session other than
    /// `session_id`.
    #[must_use]
    pub fn is_intent_claimed_by_other(&self, session_id: &str, intent_id: &str) -> bool {
        self.list_sessions().iter().any(|s| {
            s.session_id != session_id && s.intent_id.as_deref() == Some(intent_id)
        })
    }

    /// Remove sessions whose last heartbeat is older than 5 minutes,
    /// writing back only if any row was removed. Returns the count
    /// removed.
    pub fn cleanup_stale_sessions(&self) -> usize {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return 0;
        };
        let now = self.clock.now();
        let sessions = read_sessions(&contents);
        let (fresh, stale): (Vec<_>, Vec<_>) = sessions
            .into_iter()
            .partition(|s| now.signed_duration_since(s.last_seen).num_seconds() < STALE_AFTER_SECS);
        if stale.is_empty() {
            return 0;
        }
        let updated = write_sessions(&contents, &fresh);
        if let Err(e) = std::fs::write(&self.path, updated) {
            tracing::warn!(error = %e, "failed to write session cleanup");
            return 0;
        }
        stale.len()
    }
}

fn read_sessions(contents: &str) -> Vec<SessionInfo> {
    let Some(section) = find_section(contents, |h| h == SECTION_HEADING) else {
        return Vec::new();
    };
    parse_table_rows(section.body(contents))
        .into_iter()
        .filter_map(|cells| {
            let session_id = cells.first()?.clone();
            let intent_cell = cells.get(1)?.clone();
            let last_seen = cells.get(2)?.parse::<DateTime<Utc>>().ok()?;
            let intent_id = if intent_cell == "none" { None } else { Some(intent_cell) };
            Some(SessionInfo {
                session_id,
                intent_id,
                last_seen,
            })
        })
        .collect()
}

fn write_sessions(contents: &str, sessions: &[SessionInfo]) -> String {
    let table = render_table(sessions);
    match find_section(contents, |h| h == SECTION_HEADING) {
        Some(section) => {
            let mut out = String::with_capacity(contents.len() + table.len());
            out.push_str(&contents[..section.body_start]);
            out.push_str(&table);
            out.push_str(&contents[section.body_end..]);
            out
        }
        None => {
            let new_section = format!("## {SECTION_HEADING}\n\n{table}");
            insert_before_footer(contents, &new_section)
        }
    }
}

fn render_table(sessions: &[SessionInfo]) -> String {
    let mut out = String::from("\n| Session | Intent | Last Seen |\n|---|---|---|\n");
    for s in sessions {
        let intent = s.intent_id.as_deref().unwrap_or("none");
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            s.session_id,
            intent,
            s.last_seen.to_rfc3339()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::SystemClock;

    fn brain_with_table() -> &'static str {
        "# Brain\n\n## Active Sessions\n\n| Session | Intent | Last Seen |\n|---|---|---|\n| s1 | INT-001 | 2026-01-01T00:00:00Z |\n"
    }

    #[test]
    fn heartbeat_is_noop_when_file_missing() {
        let coordinator = SessionCoordinator::new("/nonexistent/CLAUDE.md", Arc::new(SystemClock));
        coordinator.heartbeat("s1", Some("INT-001"));
    }

    #[test]
    fn heartbeat_upserts_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        std::fs::write(&path, brain_with_table()).unwrap();
        let coordinator = SessionCoordinator::new(&path, Arc::new(SystemClock));
        coordinator.heartbeat("s1", Some("INT-002"));
        let sessions = coordinator.list_sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].intent_id.as_deref(), Some("INT-002"));
    }

    #[test]
    fn heartbeat_creates_section_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        std::fs::write(&path, "# Brain\n").unwrap();
        let coordinator = SessionCoordinator::new(&path, Arc::new(SystemClock));
        coordinator.heartbeat("s1", None);
        let sessions = coordinator.list_sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].intent_id, None);
    }

    #[test]
    fn is_intent_claimed_by_other_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        std::fs::write(&path, brain_with_table()).unwrap();
        let coordinator = SessionCoordinator::new(&path, Arc::new(SystemClock));
        assert!(coordinator.is_intent_claimed_by_other("s2", "INT-001"));
        assert!(!coordinator.is_intent_claimed_by_other("s1", "INT-001"));
    }

    #[test]
    fn cleanup_removes_stale_rows_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        std::fs::write(&path, brain_with_table()).unwrap();
        let coordinator = SessionCoordinator::new(&path, Arc::new(SystemClock));
        let removed = coordinator.cleanup_stale_sessions();
        assert_eq!(removed, 1);
        assert!(coordinator.list_sessions().is_empty());
    }

    #[test]
    fn cleanup_is_noop_when_nothing_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        std::fs::write(&path, "# Brain\n\n## Active Sessions\n\n").unwrap();
        let coordinator = SessionCoordinator::new(&path, Arc::new(SystemClock));
        coordinator.heartbeat("s1", Some("INT-001"));
        assert_eq!(coordinator.cleanup_stale_sessions(), 0);
    }
}
