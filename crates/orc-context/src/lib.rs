// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Assembles and formats a budgeted prompt context for an intent (§4.3).

use orc_catalog::Catalog;
use orc_core::{Intent, LedgerRecord, RelatedSpecType};
use orc_ledger::TraceLedger;
use orc_mdutil::find_section;
use std::path::PathBuf;
use std::sync::Arc;

/// Byte budget for the formatted prompt (Property 8).
pub const CONTEXT_BUDGET_BYTES: usize = 16_384;
/// Per-excerpt truncation limit when reading a related spec file.
pub const SPEC_EXCERPT_BYTES: usize = 2_048;
/// Number of most-recent ledger entries considered.
pub const RECENT_LEDGER_LIMIT: usize = 20;

const TRUNCATION_MARKER: &str = "...[truncated]";

/// A resolved excerpt of a `speckit` or `constitution`-typed related spec.
#[derive(Debug, Clone)]
pub struct SpecExcerpt {
    /// The spec's reference, as declared on the intent.
    pub reference: String,
    /// File content, truncated to [`SPEC_EXCERPT_BYTES`].
    pub text: String,
}

/// The assembled, pre-formatting context for one intent.
#[derive(Debug, Clone)]
pub struct IntentContext {
    /// The intent itself.
    pub intent: Intent,
    /// Workspace-relative paths from the spatial map's section for this
    /// intent.
    pub related_files: Vec<String>,
    /// Resolved speckit/constitution excerpts.
    pub spec_excerpts: Vec<SpecExcerpt>,
    /// Most recent ledger entries for this intent, oldest first.
    pub recent_trace: Vec<LedgerRecord>,
}

/// Builds [`IntentContext`]s from the catalog, spatial map, and ledger.
pub struct ContextBuilder {
    catalog: Arc<Catalog>,
    ledger: Arc<TraceLedger>,
    spatial_map_path: PathBuf,
    workspace_root: PathBuf,
}

impl ContextBuilder {
    /// Build a context assembler over the given collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        ledger: Arc<TraceLedger>,
        spatial_map_path: impl Into<PathBuf>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            spatial_map_path: spatial_map_path.into(),
            workspace_root: workspace_root.into(),
        }
    }

    /// Build a budgeted context for `id`, or `None` if the intent is
    /// absent.
    #[must_use]
    pub fn build_intent_context(&self, id: &str) -> Option<IntentContext> {
        let intent = self.catalog.get(id)?;

        let related_files = self.load_related_files(id);
        let spec_excerpts = self.load_spec_excerpts(&intent);
        let recent_trace = self.ledger.get_recent_entries(id, RECENT_LEDGER_LIMIT);

        let mut context = IntentContext {
            intent,
            related_files,
            spec_excerpts,
            recent_trace,
        };
        truncate_to_budget(&mut context);
        Some(context)
    }

    fn load_related_files(&self, id: &str) -> Vec<String> {
        let Ok(contents) = std::fs::read_to_string(&self.spatial_map_path) else {
            return Vec::new();
        };
        let Some(section) = find_section(&contents, |h| h.starts_with(id)) else {
            return Vec::new();
        };
        section
            .body(&contents)
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .filter(|entry| !entry.starts_with('_'))
            .map(str::to_string)
            .collect()
    }

    fn load_spec_excerpts(&self, intent: &Intent) -> Vec<SpecExcerpt> {
        let Some(related_specs) = &intent.related_specs else {
            return Vec::new();
        };
        related_specs
            .iter()
            .filter(|spec| matches!(spec.spec_type, RelatedSpecType::Speckit | RelatedSpecType::Constitution))
            .filter_map(|spec| {
                let path = self.workspace_root.join(&spec.reference);
                let bytes = std::fs::read(&path).ok()?;
                Some(SpecExcerpt {
                    reference: spec.reference.clone(),
                    text: truncate_utf8(&bytes, SPEC_EXCERPT_BYTES),
                })
            })
            .collect()
    }
}

fn truncate_utf8(bytes: &[u8], limit: usize) -> String {
    if bytes.len() <= limit {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut end = limit;
    while end > 0 && !bytes.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", String::from_utf8_lossy(&bytes[..end]), TRUNCATION_MARKER)
}

fn truncate_to_budget(context: &mut IntentContext) {
    while format_context_for_prompt(Some(context)).len() > CONTEXT_BUDGET_BYTES {
        if !context.recent_trace.is_empty() {
            context.recent_trace.remove(0);
        } else if !context.spec_excerpts.is_empty() {
            context.spec_excerpts.remove(0);
        } else if !context.related_files.is_empty() {
            context.related_files.remove(0);
        } else {
            break;
        }
    }
}

/// Render a context into the XML-like prompt block. Returns an empty
/// string for `None`.
#[must_use]
pub fn format_context_for_prompt(context: Option<&IntentContext>) -> String {
    let Some(context) = context else {
        return String::new();
    };
    let intent = &context.intent;
    let mut out = format!(
        "<intent_context id=\"{}\" name=\"{}\" status=\"{}\" version=\"{}\">\n",
        escape(&intent.id),
        escape(&intent.name),
        escape(status_str(intent.status)),
        intent.version
    );

    out.push_str("  <scope>");
    for pattern in &intent.owned_scope {
        out.push_str(&format!("<pattern>{}</pattern>", escape(pattern)));
    }
    out.push_str("</scope>\n");

    out.push_str("  <constraints>");
    for constraint in &intent.constraints {
        out.push_str(&format!("<constraint>{}</constraint>", escape(constraint)));
    }
    out.push_str("</constraints>\n");

    out.push_str("  <acceptance_criteria>");
    for criterion in &intent.acceptance_criteria {
        out.push_str(&format!("<criterion>{}</criterion>", escape(criterion)));
    }
    out.push_str("</acceptance_criteria>\n");

    if !context.related_files.is_empty() {
        out.push_str("  <related_files>");
        for file in &context.related_files {
            out.push_str(&format!("<file path=\"{}\"/>", escape(file)));
        }
        out.push_str("</related_files>\n");
    }

    if !context.spec_excerpts.is_empty() {
        out.push_str("  <related_specs>");
        for excerpt in &context.spec_excerpts {
            out.push_str(&format!(
                "<spec_excerpt ref=\"{}\">{}</spec_excerpt>",
                escape(&excerpt.reference),
                escape(&excerpt.text)
            ));
        }
        out.push_str("</related_specs>\n");
    }

    if !context.recent_trace.is_empty() {
        out.push_str("  <recent_activity>");
        for record in &context.recent_trace {
            out.push_str(&format!("<trace_entry id=\"{}\"/>", escape(&record.id.to_string())));
        }
        out.push_str("</recent_activity>\n");
    }

    out.push_str("</intent_context>");
    out
}

fn status_str(status: orc_core::IntentStatus) -> &'static str {
    match status {
        orc_core::IntentStatus::Pending => "PENDING",
        orc_core::IntentStatus::InProgress => "IN_PROGRESS",
        orc_core::IntentStatus::Complete => "COMPLETE",
        orc_core::IntentStatus::Blocked => "BLOCKED",
        orc_core::IntentStatus::Archived => "ARCHIVED",
    }
}

fn escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&apos;".to_string(),
            other => other.to_string(),
        })
        .collect()
}
