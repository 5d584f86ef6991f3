//! `postToolUse`: logs every gated call, never rejects (§4.9, §4.4).

use crate::{classify_tool, HookEngine, ToolClass};
use orc_core::{MutationClass, Related, ScopeValidation, TraceEntry, TraceFile};
use orc_ledger::LogOptions;

/// Outcome of a tool call reported back to `postToolUse` for logging.
#[derive(Debug, Clone, Default)]
pub struct PostToolUseContext {
    /// The tool name, matching the `preToolUse` call it follows.
    pub tool_name: String,
    /// Workspace-relative path the call targeted, if any.
    pub file_path: Option<String>,
    /// The intent attributed to this call (the same one `preToolUse`
    /// resolved).
    pub intent_id: Option<String>,
    /// The file's content hash observed by `preToolUse`, carried forward so
    /// a no-op write can be detected.
    pub pre_hash: Option<String>,
    /// Whether the underlying tool call itself succeeded.
    pub success: bool,
    /// Error text from the tool call, if it failed.
    pub error: Option<String>,
    /// Model identifier attributed to the edit.
    pub model_identifier: Option<String>,
    /// 1-based start line of the touched range.
    pub start_line: Option<u32>,
    /// 1-based end line of the touched range.
    pub end_line: Option<u32>,
    /// Override the heuristic mutation classification, e.g. for
    /// `delete_file` which `classify_mutation` has no dedicated rule for.
    pub mutation_class_override: Option<MutationClass>,
}

impl HookEngine {
    /// Log a completed tool call. Always succeeds from the caller's
    /// perspective: every fallible step inside is itself fail-open.
    pub fn post_tool_use(&self, ctx: &PostToolUseContext) {
        if !self.is_enabled() {
            return;
        }
        if classify_tool(&ctx.tool_name) == ToolClass::Exempt {
            return;
        }

        let now = self.clock.now();
        let rel_path = ctx.file_path.as_deref().map(orc_scope::normalize_path);
        let post_hash = rel_path
            .as_deref()
            .and_then(|p| orc_scope::compute_file_hash(&self.workspace_root.join(p)));

        let mutation_class = ctx
            .mutation_class_override
            .unwrap_or_else(|| orc_scope::classify_mutation(&ctx.tool_name, ctx.pre_hash.as_deref()));

        let scope_validation = if classify_tool(&ctx.tool_name) == ToolClass::Write {
            ScopeValidation::Pass
        } else {
            ScopeValidation::Exempt
        };

        if ctx.success && ctx.pre_hash.is_some() && ctx.pre_hash == post_hash {
            tracing::debug!(tool = %ctx.tool_name, path = ?rel_path, "tool call reported success with no observed content change");
        }

        let entry = TraceEntry {
            id: self.uuid_source.new_v4(),
            timestamp: now,
            intent_id: ctx.intent_id.clone(),
            session_id: self.session_id.clone(),
            tool_name: ctx.tool_name.clone(),
            mutation_class,
            file: rel_path.as_ref().map(|path| TraceFile {
                relative_path: path.clone(),
                pre_hash: ctx.pre_hash.clone(),
                post_hash: post_hash.clone(),
            }),
            scope_validation,
            success: ctx.success,
            error: ctx.error.clone(),
        };

        let related_specs = ctx
            .intent_id
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .and_then(|intent| intent.related_specs)
            .unwrap_or_default()
            .into_iter()
            .filter(|spec| spec.spec_type == orc_core::RelatedSpecType::Speckit)
            .map(|spec| Related::specification(spec.reference))
            .collect();

        self.ledger.log(
            &entry,
            LogOptions {
                model_identifier: ctx.model_identifier.clone(),
                start_line: ctx.start_line,
                end_line: ctx.end_line,
                related_specs,
            },
        );

        if let (true, Some(rel_path), Some(intent_id)) = (ctx.success, rel_path.as_deref(), ctx.intent_id.as_deref()) {
            let intent_name = self.catalog.get(intent_id).map(|i| i.name);
            self.spatial
                .add_file_to_intent(intent_id, rel_path, intent_name.as_deref(), Some(mutation_class), now);
        }

        if let Some(rel_path) = &rel_path {
            self.set_cached_hash(rel_path, post_hash);
        }

        if !ctx.success {
            if let (Some(_), Some(error)) = (rel_path.as_deref(), ctx.error.as_deref()) {
                self.lessons.record_lesson(
                    &orc_lessons::Lesson {
                        intent_id: ctx.intent_id.clone(),
                        tool_name: ctx.tool_name.clone(),
                        description: error.to_string(),
                        category: "Tool Failure".to_string(),
                    },
                    now,
                );
            }
        }
    }
}
