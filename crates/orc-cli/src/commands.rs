// SPDX-License-Identifier: MIT OR Apache-2.0
//! Handlers for the `orc` subcommands.
//!
//! These functions are library-level so they can be unit-tested without
//! spawning the binary.

use crate::payload::{parse_guarded, PostToolUseRequest, PreToolUseRequest, PreToolUseResponse};
use crate::wiring::{self, catalog_path};
use orc_config::OrcConfig;
use orc_core::IntentStatus;
use orc_engine::{PostToolUseContext, PreToolUseContext};
use std::path::Path;

/// Run the `pre-tool-use` subcommand: read `raw` as a [`PreToolUseRequest`],
/// evaluate it against the engine, and return the response to print.
pub fn pre_tool_use(workspace_root: &Path, session_id: &str, config: &OrcConfig, raw: &str) -> PreToolUseResponse {
    let request = match parse_guarded::<PreToolUseRequest>(raw) {
        Ok(request) => request,
        Err(reason) => {
            return PreToolUseResponse {
                allowed: false,
                pre_hash: None,
                reason: Some(reason),
                error_code: Some("ERR_MALFORMED_PAYLOAD".to_string()),
            }
        }
    };
    let engine = wiring::engine_for(workspace_root, session_id, config);
    let ctx = PreToolUseContext {
        tool_name: request.tool_name,
        file_path: request.file_path,
        intent_id: request.intent_id,
        description: request.description,
    };
    engine.pre_tool_use(&ctx).into()
}

/// Run the `post-tool-use` subcommand: read `raw` as a [`PostToolUseRequest`]
/// and log it. Never fails from the caller's perspective (§4.4).
pub fn post_tool_use(workspace_root: &Path, session_id: &str, config: &OrcConfig, raw: &str) -> Result<(), String> {
    let request = parse_guarded::<PostToolUseRequest>(raw)?;
    let engine = wiring::engine_for(workspace_root, session_id, config);
    let ctx = PostToolUseContext {
        tool_name: request.tool_name,
        file_path: request.file_path,
        intent_id: request.intent_id,
        pre_hash: request.pre_hash,
        success: request.success,
        error: request.error,
        model_identifier: request.model_identifier,
        start_line: request.start_line,
        end_line: request.end_line,
        mutation_class_override: request.mutation_class,
    };
    engine.post_tool_use(&ctx);
    Ok(())
}

/// Outcome of `select_active_intent` (§6.5), rendered by `main.rs`.
pub struct SelectOutcome {
    /// Formatted prompt context for the selected intent.
    pub context: String,
}

/// Run the `select-active-intent` subcommand: transition a PENDING intent
/// to IN_PROGRESS (leaving an already-IN_PROGRESS one untouched), set it as
/// the engine's active intent, and return its formatted context.
pub fn select_active_intent(
    workspace_root: &Path,
    session_id: &str,
    config: &OrcConfig,
    intent_id: &str,
) -> Result<SelectOutcome, String> {
    let engine = wiring::engine_for(workspace_root, session_id, config);
    let intent = engine
        .catalog()
        .get(intent_id)
        .ok_or_else(|| format!("intent '{intent_id}' does not exist in the catalog"))?;

    if intent.status == IntentStatus::Pending {
        engine
            .lifecycle()
            .transition_intent(intent_id, IntentStatus::InProgress)
            .map_err(|e| e.to_string())?;
    } else if intent.status != IntentStatus::InProgress {
        return Err(format!(
            "intent '{intent_id}' is {:?} and cannot be selected: {}",
            intent.status,
            intent.status.not_actionable_reason()
        ));
    }

    engine.set_active_intent(intent_id);

    let builder = wiring::context_builder_for(workspace_root);
    let intent_context = builder.build_intent_context(intent_id);
    let context = orc_context::format_context_for_prompt(intent_context.as_ref());

    Ok(SelectOutcome { context })
}

/// Run the `verify-acceptance-criteria` subcommand: transition an
/// IN_PROGRESS intent to COMPLETE and clear the engine's active intent if
/// it matched.
pub fn verify_acceptance_criteria(
    workspace_root: &Path,
    session_id: &str,
    config: &OrcConfig,
    intent_id: &str,
) -> Result<(), String> {
    let engine = wiring::engine_for(workspace_root, session_id, config);
    let intent = engine
        .catalog()
        .get(intent_id)
        .ok_or_else(|| format!("intent '{intent_id}' does not exist in the catalog"))?;

    if intent.status != IntentStatus::InProgress {
        return Err(format!(
            "intent '{intent_id}' is {:?}; only an IN_PROGRESS intent can be verified complete",
            intent.status
        ));
    }

    engine
        .lifecycle()
        .transition_intent(intent_id, IntentStatus::Complete)
        .map_err(|e| e.to_string())?;

    if engine.active_intent().as_deref() == Some(intent_id) {
        engine.clear_active_intent();
    }
    Ok(())
}

/// Run the `is-enabled` subcommand.
#[must_use]
pub fn is_enabled(workspace_root: &Path, session_id: &str, config: &OrcConfig) -> bool {
    wiring::engine_for(workspace_root, session_id, config).is_enabled()
}

/// Run the `heartbeat` subcommand: record this session's presence and
/// return the other sessions currently sharing the workspace.
pub fn heartbeat(workspace_root: &Path, session_id: &str, intent_id: Option<&str>) -> Vec<String> {
    let coordinator = wiring::session_coordinator_for(workspace_root);
    coordinator.heartbeat(session_id, intent_id);
    coordinator
        .list_sessions()
        .into_iter()
        .filter(|s| s.session_id != session_id)
        .map(|s| s.session_id)
        .collect()
}

/// Whether the catalog file exists for `workspace_root`, used by `is-enabled`
/// and startup diagnostics.
#[must_use]
pub fn catalog_file_exists(workspace_root: &Path) -> bool {
    catalog_path(workspace_root).is_file()
}
