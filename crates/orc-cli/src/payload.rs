//! JSON wire shapes for the stdin/stdout hook contract (§6.4).
//!
//! Field names are camelCase to match the pseudocode in the
//! specification's tool-dispatch contract, which a host written in
//! JavaScript or TypeScript would send as-is.

use orc_core::{Denial, MutationClass};
use orc_engine::{AllowReason, PreToolUseResult};
use orc_json_guard::JsonGuardLimits;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Depth/size guardrails applied to every hook payload before it is
/// deserialized into a typed request.
const PAYLOAD_LIMITS: JsonGuardLimits = JsonGuardLimits::new(32, 1_000_000);

/// Parse `raw` as a JSON object within [`PAYLOAD_LIMITS`], then deserialize
/// it into `T`. Returns a single human-readable error on either failure.
pub fn parse_guarded<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("payload is not valid JSON: {e}"))?;
    let violations = orc_json_guard::validate_json_object(&value, PAYLOAD_LIMITS);
    if !violations.is_empty() {
        return Err(violations.join("; "));
    }
    serde_json::from_value(value).map_err(|e| format!("payload does not match expected shape: {e}"))
}

/// Request body for the `pre-tool-use` subcommand, read from stdin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreToolUseRequest {
    /// Name of the tool the host is about to invoke.
    pub tool_name: String,
    /// Workspace-relative or absolute path the call targets, if any.
    pub file_path: Option<String>,
    /// The intent the host attributes to this call, if any.
    pub intent_id: Option<String>,
    /// Free-text description, surfaced to a HITL approver.
    pub description: Option<String>,
}

/// Response body for the `pre-tool-use` subcommand, written to stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreToolUseResponse {
    /// Whether the host may proceed with the tool call.
    pub allowed: bool,
    /// The content hash observed at gate time, to be echoed back into the
    /// matching `post-tool-use` call.
    pub pre_hash: Option<String>,
    /// Human-readable reason, present when `allowed` is `false`.
    pub reason: Option<String>,
    /// Machine-readable error code (e.g. `ERR_SCOPE_VIOLATION`), present
    /// when `allowed` is `false`.
    pub error_code: Option<String>,
}

impl From<PreToolUseResult> for PreToolUseResponse {
    fn from(result: PreToolUseResult) -> Self {
        match result {
            PreToolUseResult::Allowed { pre_hash, reason } => Self {
                allowed: true,
                pre_hash,
                reason: allow_reason_text(reason),
                error_code: None,
            },
            PreToolUseResult::Denied(Denial { kind, reason }) => Self {
                allowed: false,
                pre_hash: None,
                reason: Some(reason),
                error_code: Some(kind.code().to_string()),
            },
        }
    }
}

fn allow_reason_text(reason: AllowReason) -> Option<String> {
    match reason {
        AllowReason::Exempt => None,
        AllowReason::Destructive => Some("approved by human-in-the-loop gate".to_string()),
        AllowReason::Unclassified => None,
        AllowReason::IntentIgnored => Some("path matched .intentignore".to_string()),
        AllowReason::Gated => None,
    }
}

/// Request body for the `post-tool-use` subcommand, read from stdin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostToolUseRequest {
    /// Name of the tool that was invoked, matching the preceding
    /// `pre-tool-use` call.
    pub tool_name: String,
    /// Path the call targeted, if any.
    pub file_path: Option<String>,
    /// The intent attributed to this call.
    pub intent_id: Option<String>,
    /// The `preHash` echoed back from `pre-tool-use`.
    pub pre_hash: Option<String>,
    /// Whether the tool call itself succeeded.
    pub success: bool,
    /// Error text, if the tool call failed.
    pub error: Option<String>,
    /// Model identifier attributed to the edit.
    pub model_identifier: Option<String>,
    /// 1-based start line of the touched range.
    pub start_line: Option<u32>,
    /// 1-based end line of the touched range.
    pub end_line: Option<u32>,
    /// Caller-declared mutation classification (§3.2). When present this
    /// is used verbatim instead of the heuristic classifier — the only
    /// way a `delete_file` call is ever recorded as `FILE_DELETION`.
    pub mutation_class: Option<MutationClass>,
}
