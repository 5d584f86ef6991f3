//! Compile-time-constant tool classification (§4.9).
//!
//! Membership in each set is a fixed property of the tool name, not
//! configuration: there is no rule engine and no runtime registration path.

/// Coarse bucket a tool name falls into for gating purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolClass {
    /// Never gated: read-only or informational tools.
    Exempt,
    /// Mutates a file; requires an actionable intent owning its scope.
    Write,
    /// Irreversible or wide-blast-radius; requires HITL approval.
    Destructive,
    /// Neither exempt, write, nor destructive; allowed and logged as-is.
    Unclassified,
}

const EXEMPT_TOOLS: &[&str] = &[
    "read_file",
    "list_files",
    "list_code_definition_names",
    "search_files",
    "browser_action",
    "ask_followup_question",
    "attempt_completion",
    "new_task",
    "plan_mode_respond",
    "switch_mode",
    "select_active_intent",
    "verify_acceptance_criteria",
    "update_todo_list",
    "use_mcp_tool",
    "access_mcp_resource",
];

const WRITE_TOOLS: &[&str] = &[
    "write_to_file",
    "apply_diff",
    "edit",
    "search_and_replace",
    "search_replace",
    "edit_file",
    "apply_patch",
    "insert_code_block",
];

const DESTRUCTIVE_TOOLS: &[&str] = &["execute_command", "delete_file"];

/// Classify `tool_name` into its gating bucket.
#[must_use]
pub fn classify_tool(tool_name: &str) -> ToolClass {
    if EXEMPT_TOOLS.contains(&tool_name) {
        ToolClass::Exempt
    } else if DESTRUCTIVE_TOOLS.contains(&tool_name) {
        ToolClass::Destructive
    } else if WRITE_TOOLS.contains(&tool_name) {
        ToolClass::Write
    } else {
        ToolClass::Unclassified
    }
}
