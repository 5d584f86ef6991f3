// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Records dated lessons-learned entries into the shared brain file
//! (§4.6). All writes are best-effort and fire-and-forget: a failure is
//! logged, never propagated to the caller.

use chrono::{DateTime, Utc};
use orc_mdutil::{format_date, insert_before_next_top_heading};
use std::path::{Path, PathBuf};

const SECTION_HEADING: &str = "## Lessons Learned";
const MINIMAL_HEADER: &str = "# Brain\n\n";

/// A single lesson to record.
#[derive(Debug, Clone)]
pub struct Lesson {
    /// The intent active when the lesson occurred, if any.
    pub intent_id: Option<String>,
    /// The tool involved.
    pub tool_name: String,
    /// Free-text description of the issue.
    pub description: String,
    /// Short category label, e.g. `"Scope Violation"`.
    pub category: String,
}

/// Appends lessons to the shared brain file.
pub struct LessonRecorder {
    path: PathBuf,
}

impl LessonRecorder {
    /// Build a recorder over the brain file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The brain file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a lesson. Best-effort: failures are logged, not returned.
    pub fn record_lesson(&self, lesson: &Lesson, now: DateTime<Utc>) {
        let contents = std::fs::read_to_string(&self.path).unwrap_or_else(|_| MINIMAL_HEADER.to_string());
        let updated = record_lesson_text(&contents, lesson, now);
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "failed to create brain file directory");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, updated) {
            tracing::warn!(error = %e, "failed to record lesson");
        }
    }

    /// Convenience wrapper for a scope-violation rejection.
    pub fn record_scope_violation(&self, intent_id: &str, tool_name: &str, path: &str, now: DateTime<Utc>) {
        self.record_lesson(
            &Lesson {
                intent_id: Some(intent_id.to_string()),
                tool_name: tool_name.to_string(),
                description: format!("Attempted write to '{path}' outside the intent's owned scope"),
                category: "Scope Violation".to_string(),
            },
            now,
        );
    }

    /// Convenience wrapper for a stale-file rejection.
    pub fn record_hash_mismatch(&self, intent_id: &str, tool_name: &str, path: &str, now: DateTime<Utc>) {
        self.record_lesson(
            &Lesson {
                intent_id: Some(intent_id.to_string()),
                tool_name: tool_name.to_string(),
                description: format!("Stale read detected on '{path}': on-disk content changed since last observed"),
                category: "Stale File".to_string(),
            },
            now,
        );
    }
}

/// Pure text transform underlying [`LessonRecorder::record_lesson`].
#[must_use]
pub fn record_lesson_text(contents: &str, lesson: &Lesson, now: DateTime<Utc>) -> String {
    let intent_display = lesson.intent_id.as_deref().unwrap_or("none");
    let entry = format!(
        "### {}: {} ({})\n- Tool: {}\n- Issue: {}\n- Intent: {}\n\n",
        format_date(now),
        lesson.category,
        intent_display,
        lesson.tool_name,
        lesson.description,
        intent_display,
    );

    match contents.find(SECTION_HEADING) {
        Some(heading_start) => {
            let body_start = heading_start + SECTION_HEADING.len();
            let body_start = contents[body_start..]
                .find('\n')
                .map(|i| body_start + i + 1)
                .unwrap_or(contents.len());
            insert_before_next_top_heading(contents, body_start, &entry)
        }
        None => {
            let mut out = contents.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            if !out.ends_with("\n\n") {
                out.push('\n');
            }
            out.push_str(SECTION_HEADING);
            out.push_str("\n\n");
            out.push_str(&entry);
            out
        }
    }
}
