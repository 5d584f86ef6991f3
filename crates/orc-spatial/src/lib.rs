// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Maintains the intent-to-files spatial map, a human-editable markdown
//! file partitioned into a `## <id>` section per intent (§3.4, §4.5).
//!
//! Every write here is best-effort: the map is informational, and its
//! absence or an I/O failure while updating it is never a fault for the
//! caller.

use chrono::{DateTime, Utc};
use orc_core::MutationClass;
use orc_mdutil::{find_section, find_subsection, insert_before_footer};
use std::path::{Path, PathBuf};

const DEFAULT_HEADER: &str = "# Intent Spatial Map\n\nMaps each active intent to the files it has touched.\n\n";

/// Maintains the spatial map file at a fixed workspace path.
pub struct SpatialIndex {
    path: PathBuf,
}

impl SpatialIndex {
    /// Build an index over the map file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The map file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that `rel_path` belongs to `intent_id`. Idempotent: calling
    /// this twice in succession leaves the file unchanged the second time
    /// (Property 7). Failures are logged and swallowed.
    pub fn add_file_to_intent(
        &self,
        intent_id: &str,
        rel_path: &str,
        intent_name: Option<&str>,
        mutation_class: Option<MutationClass>,
        now: DateTime<Utc>,
    ) {
        let contents = std::fs::read_to_string(&self.path).unwrap_or_else(|_| DEFAULT_HEADER.to_string());
        let updated = add_file_to_intent_text(&contents, intent_id, rel_path, intent_name, mutation_class, now);
        if let Some(updated) = updated {
            if let Err(e) = write_atomic(&self.path, &updated) {
                tracing::warn!(error = %e, "failed to update spatial map");
            }
        }
    }

    /// Remove any reference to `rel_path` from `intent_id`'s section.
    /// No-op if the file or section is absent. Failures are logged and
    /// swallowed.
    pub fn remove_file_from_intent(&self, intent_id: &str, rel_path: &str) {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return;
        };
        if let Some(updated) = remove_file_from_intent_text(&contents, intent_id, rel_path) {
            if let Err(e) = write_atomic(&self.path, &updated) {
                tracing::warn!(error = %e, "failed to update spatial map");
            }
        }
    }
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Pure text transform for [`SpatialIndex::add_file_to_intent`]. Returns
/// `None` if the path is already present (no write needed).
#[must_use]
pub fn add_file_to_intent_text(
    contents: &str,
    intent_id: &str,
    rel_path: &str,
    intent_name: Option<&str>,
    mutation_class: Option<MutationClass>,
    now: DateTime<Utc>,
) -> Option<String> {
    let section = find_section(contents, |h| h.starts_with(intent_id));
    let mut out = match section {
        Some(section) if section.body(contents).contains(rel_path) => {
            return ensure_evolution_entry_if_needed(contents, intent_id, rel_path, mutation_class, now)
        }
        Some(section) => {
            let insertion = format!("- {rel_path}\n");
            insert_after_files_subsection(contents, &section, &insertion)
        }
        None => {
            let heading = match intent_name {
                Some(name) => format!("## {intent_id}: {name}\n"),
                None => format!("## {intent_id}\n"),
            };
            let new_section = format!("{heading}\n### Files\n- {rel_path}\n\n");
            insert_before_footer(contents, &new_section)
        }
    };

    if mutation_class == Some(MutationClass::IntentEvolution) {
        if let Some(updated) = ensure_evolution_entry_if_needed(&out, intent_id, rel_path, mutation_class, now) {
            out = updated;
        }
    }
    Some(out)
}

fn insert_after_files_subsection(contents: &str, section: &orc_mdutil::Section, insertion: &str) -> String {
    let body = section.body(contents);
    if let Some(files) = find_subsection(body, |h| h == "Files") {
        let absolute_insert_point = section.body_start + files.body_end;
        let mut out = String::with_capacity(contents.len() + insertion.len());
        out.push_str(&contents[..absolute_insert_point]);
        out.push_str(insertion);
        out.push_str(&contents[absolute_insert_point..]);
        out
    } else {
        let absolute_insert_point = section.body_end;
        let mut out = String::with_capacity(contents.len() + insertion.len());
        out.push_str(&contents[..absolute_insert_point]);
        out.push_str("\n### Files\n");
        out.push_str(insertion);
        out.push_str(&contents[absolute_insert_point..]);
        out
    }
}

fn ensure_evolution_entry_if_needed(
    contents: &str,
    intent_id: &str,
    rel_path: &str,
    mutation_class: Option<MutationClass>,
    now: DateTime<Utc>,
) -> Option<String> {
    if mutation_class != Some(MutationClass::IntentEvolution) {
        return None;
    }
    let section = find_section(contents, |h| h.starts_with(intent_id))?;
    let body = section.body(contents);
    let entry = format!(
        "- _[EVOLUTION {}]_ {} — new behavior added\n",
        orc_mdutil::format_date(now),
        rel_path
    );
    let absolute_point = match find_subsection(body, |h| h == "Evolution Log") {
        Some(evolution) => section.body_start + evolution.body_end,
        None => section.body_end,
    };
    let mut out = String::with_capacity(contents.len() + entry.len() + 20);
    out.push_str(&contents[..absolute_point]);
    if find_subsection(body, |h| h == "Evolution Log").is_none() {
        out.push_str("\n### Evolution Log\n");
    }
    out.push_str(&entry);
    out.push_str(&contents[absolute_point..]);
    Some(out)
}

/// Pure text transform for [`SpatialIndex::remove_file_from_intent`].
#[must_use]
pub fn remove_file_from_intent_text(contents: &str, intent_id: &str, rel_path: &str) -> Option<String> {
    let section = find_section(contents, |h| h.starts_with(intent_id))?;
    let body = section.body(contents);
    if !body.contains(rel_path) {
        return None;
    }
    let filtered: String = body
        .lines()
        .filter(|line| !line.contains(rel_path))
        .map(|line| format!("{line}\n"))
        .collect();
    let mut out = String::with_capacity(contents.len());
    out.push_str(&contents[..section.body_start]);
    out.push_str(&filtered);
    out.push_str(&contents[section.body_end..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-07-26T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn creates_new_section_when_absent() {
        let out = add_file_to_intent_text("", "INT-001", "src/x.ts", Some("Example"), None, now()).unwrap();
        assert!(out.contains("## INT-001: Example"));
        assert!(out.contains("### Files"));
        assert!(out.contains("- src/x.ts"));
    }

    #[test]
    fn appends_to_existing_section() {
        let md = "## INT-001: Example\n\n### Files\n- a.ts\n";
        let out = add_file_to_intent_text(md, "INT-001", "b.ts", None, None, now()).unwrap();
        assert!(out.contains("a.ts"));
        assert!(out.contains("b.ts"));
    }

    #[test]
    fn idempotent_add_does_not_duplicate() {
        let md = "## INT-001: Example\n\n### Files\n- a.ts\n";
        assert!(add_file_to_intent_text(md, "INT-001", "a.ts", None, None, now()).is_none());
    }

    #[test]
    fn evolution_mutation_adds_evolution_log_entry() {
        let md = "## INT-001: Example\n\n### Files\n- a.ts\n";
        let out = add_file_to_intent_text(
            md,
            "INT-001",
            "b.ts",
            None,
            Some(MutationClass::IntentEvolution),
            now(),
        )
        .unwrap();
        assert!(out.contains("### Evolution Log"));
        assert!(out.contains("EVOLUTION 2026-07-26"));
        assert!(out.contains("b.ts — new behavior added"));
    }

    #[test]
    fn new_section_inserted_before_footer() {
        let md = "# Intent Spatial Map\n\n---\n_generated_\n";
        let out = add_file_to_intent_text(md, "INT-002", "x.ts", None, None, now()).unwrap();
        assert!(out.find("INT-002").unwrap() < out.find("---").unwrap());
    }

    #[test]
    fn remove_file_from_intent_strips_matching_line() {
        let md = "## INT-001: Example\n\n### Files\n- a.ts\n- b.ts\n";
        let out = remove_file_from_intent_text(md, "INT-001", "a.ts").unwrap();
        assert!(!out.contains("a.ts"));
        assert!(out.contains("b.ts"));
    }

    #[test]
    fn remove_is_noop_for_missing_section() {
        assert!(remove_file_from_intent_text("no sections here", "INT-001", "a.ts").is_none());
    }
}
