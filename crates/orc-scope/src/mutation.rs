//! Heuristic classification of a tool call into a [`MutationClass`].
//!
//! The classification order is significant: earlier rules take priority
//! over later ones (§4.1).

use orc_core::MutationClass;

const AST_REFACTOR_TOOLS: &[&str] = &[
    "apply_diff",
    "edit",
    "search_and_replace",
    "search_replace",
    "edit_file",
    "apply_patch",
];

/// Classify a mutation given the tool name and the pre-call content hash of
/// the affected file (`None` if the file did not exist before the call).
#[must_use]
pub fn classify_mutation(tool_name: &str, pre_hash: Option<&str>) -> MutationClass {
    if pre_hash.is_none() {
        return MutationClass::FileCreation;
    }
    if AST_REFACTOR_TOOLS.contains(&tool_name) {
        return MutationClass::AstRefactor;
    }
    if tool_name == "write_to_file" {
        return MutationClass::IntentEvolution;
    }
    if tool_name == "execute_command" {
        return MutationClass::Configuration;
    }
    MutationClass::IntentEvolution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pre_hash_is_file_creation_regardless_of_tool() {
        assert_eq!(
            classify_mutation("apply_diff", None),
            MutationClass::FileCreation
        );
        assert_eq!(
            classify_mutation("write_to_file", None),
            MutationClass::FileCreation
        );
    }

    #[test]
    fn diff_style_tools_are_ast_refactor() {
        for tool in AST_REFACTOR_TOOLS {
            assert_eq!(
                classify_mutation(tool, Some("sha256:aa")),
                MutationClass::AstRefactor
            );
        }
    }

    #[test]
    fn write_to_file_is_intent_evolution() {
        assert_eq!(
            classify_mutation("write_to_file", Some("sha256:aa")),
            MutationClass::IntentEvolution
        );
    }

    #[test]
    fn execute_command_is_configuration() {
        assert_eq!(
            classify_mutation("execute_command", Some("sha256:aa")),
            MutationClass::Configuration
        );
    }

    #[test]
    fn unknown_tool_defaults_to_intent_evolution() {
        assert_eq!(
            classify_mutation("some_future_tool", Some("sha256:aa")),
            MutationClass::IntentEvolution
        );
    }
}
