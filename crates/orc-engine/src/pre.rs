//! `preToolUse`: the ten-step validation chain (§4.9).

use crate::{classify_tool, intent_not_actionable_denial, intent_not_found_denial, no_active_intent_denial};
use crate::{AllowReason, HookEngine, PreToolUseResult, ToolClass};
use orc_core::{Denial, ErrorCode, IntentStatus};
use orc_hitl::ApprovalRequest;

/// One tool-call invocation as the host reports it to `preToolUse`.
#[derive(Debug, Clone, Default)]
pub struct PreToolUseContext {
    /// The tool name exactly as the host's dispatcher names it.
    pub tool_name: String,
    /// Workspace-relative path the call targets, if any.
    pub file_path: Option<String>,
    /// The intent the host believes is active, if it tracks one itself.
    /// Falls back to the engine's own [`HookEngine::active_intent`] when
    /// omitted.
    pub intent_id: Option<String>,
    /// Free-text description shown to a human approver for destructive
    /// calls.
    pub description: Option<String>,
}

impl HookEngine {
    /// Validate a tool call before it runs. Never panics; every rejection
    /// path returns a [`PreToolUseResult::Denied`] with an agent-actionable
    /// reason.
    #[must_use]
    pub fn pre_tool_use(&self, ctx: &PreToolUseContext) -> PreToolUseResult {
        if !self.is_enabled() {
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Unclassified,
            };
        }

        let class = classify_tool(&ctx.tool_name);
        let effective_intent_id = self.resolve_intent_id(ctx.intent_id.as_deref());

        // Step 1: exempt tools are never gated.
        if class == ToolClass::Exempt {
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Exempt,
            };
        }

        // Step 2: destructive tools require an IN_PROGRESS intent and HITL
        // sign-off, independent of file scope.
        if class == ToolClass::Destructive {
            return self.gate_destructive(ctx, effective_intent_id.as_deref());
        }

        // Step 3: a write with no active intent is rejected outright.
        let Some(intent_id) = effective_intent_id else {
            if class == ToolClass::Write {
                return PreToolUseResult::Denied(no_active_intent_denial());
            }
            // Step 4: anything left over is unclassified; allow and log.
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Unclassified,
            };
        };

        if class != ToolClass::Write {
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Unclassified,
            };
        }

        // Step 5: the intent must actually exist.
        let Some(intent) = self.catalog.get(&intent_id) else {
            return PreToolUseResult::Denied(intent_not_found_denial(&intent_id));
        };

        // Step 6: the intent must be actionable.
        if intent.status != IntentStatus::InProgress {
            return PreToolUseResult::Denied(intent_not_actionable_denial(&intent));
        }

        let Some(rel_path) = ctx.file_path.as_deref() else {
            // A write-classified tool with no path to check scope against;
            // allow it through the gate without touching the hash cache.
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Gated,
            };
        };
        let rel_path = orc_scope::normalize_path(rel_path);

        // Step 7: an ignored path bypasses scope and hash checks entirely.
        if self.is_ignored(&rel_path) {
            return PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::IntentIgnored,
            };
        }

        // Step 8: scope check.
        if !orc_scope::is_in_scope(&rel_path, &intent.owned_scope) {
            let now = self.clock.now();
            self.lessons.record_scope_violation(&intent.id, &ctx.tool_name, &rel_path, now);
            return PreToolUseResult::Denied(Denial::new(
                ErrorCode::ScopeViolation,
                format!(
                    "'{rel_path}' is outside intent '{}' owned scope ({}); widen owned_scope or select a \
                     different intent before writing here",
                    intent.id,
                    intent.owned_scope.join(", ")
                ),
            ));
        }

        // Step 9: optimistic-lock stale-read detection.
        let disk_hash = orc_scope::compute_file_hash(&self.workspace_root.join(&rel_path));
        if let Some(cached) = self.cached_hash(&rel_path) {
            if disk_hash.as_deref() != Some(cached.as_str()) {
                let now = self.clock.now();
                self.lessons.record_hash_mismatch(&intent.id, &ctx.tool_name, &rel_path, now);
                return PreToolUseResult::Denied(Denial::new(
                    ErrorCode::StaleFile,
                    format!(
                        "'{rel_path}' changed on disk since it was last read in this session; re-read it \
                         before writing to avoid clobbering the newer content"
                    ),
                ));
            }
        }
        if let Some(hash) = &disk_hash {
            self.set_cached_hash(&rel_path, Some(hash.clone()));
        }

        // Step 10: fully gated allow, carrying the pre-hash for postToolUse.
        PreToolUseResult::Allowed {
            pre_hash: disk_hash,
            reason: AllowReason::Gated,
        }
    }

    fn gate_destructive(&self, ctx: &PreToolUseContext, intent_id: Option<&str>) -> PreToolUseResult {
        let Some(intent_id) = intent_id else {
            return PreToolUseResult::Denied(no_active_intent_denial());
        };
        let Some(intent) = self.catalog.get(intent_id) else {
            return PreToolUseResult::Denied(intent_not_found_denial(intent_id));
        };
        if intent.status != IntentStatus::InProgress {
            return PreToolUseResult::Denied(intent_not_actionable_denial(&intent));
        }

        let request = ApprovalRequest {
            tool_name: ctx.tool_name.clone(),
            intent_id: Some(intent.id.clone()),
            file_path: ctx.file_path.clone(),
            description: ctx.description.clone(),
        };
        let response = self.hitl.request_approval(&request);
        if response.approved {
            PreToolUseResult::Allowed {
                pre_hash: None,
                reason: AllowReason::Destructive,
            }
        } else {
            PreToolUseResult::Denied(Denial::new(
                ErrorCode::HitlRejected,
                response
                    .reason
                    .unwrap_or_else(|| format!("human approver rejected '{}'", ctx.tool_name)),
            ))
        }
    }
}
