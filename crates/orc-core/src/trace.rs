//! Internal [`TraceEntry`] and the externally-documented [`LedgerRecord`]
//! shape it is serialized into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse, heuristic categorization of a mutation's nature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    /// A structural/diff-style edit to existing content.
    AstRefactor,
    /// A full-file rewrite that evolves the intent's own behavior.
    IntentEvolution,
    /// A targeted correction of incorrect behavior.
    BugFix,
    /// Documentation-only change.
    Documentation,
    /// Configuration/build-file change.
    Configuration,
    /// The file did not exist before this mutation.
    FileCreation,
    /// The file was removed.
    FileDeletion,
}

/// Result of checking a mutation's path against the intent's owned scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScopeValidation {
    /// The path matched the intent's owned scope.
    Pass,
    /// The path was rejected by the pre-hook's scope check.
    Fail,
    /// Scope does not apply to this call (exempt/destructive/ignored).
    Exempt,
}

/// Per-invocation record produced by the hook engine, internal to the
/// engine before it is lowered into a [`LedgerRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// UUID v4 identifying this invocation.
    pub id: Uuid,
    /// When the invocation was logged.
    pub timestamp: DateTime<Utc>,
    /// The active intent at the time of the call, if any.
    pub intent_id: Option<String>,
    /// The session that made the call.
    pub session_id: String,
    /// The tool name as the host reported it.
    pub tool_name: String,
    /// Heuristic mutation classification.
    pub mutation_class: MutationClass,
    /// The affected file, if any.
    pub file: Option<TraceFile>,
    /// Outcome of the scope check for this call.
    pub scope_validation: ScopeValidation,
    /// Whether the underlying tool call itself succeeded.
    pub success: bool,
    /// Error text from the tool call, if it failed.
    pub error: Option<String>,
}

/// The file touched by a [`TraceEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Workspace-relative path.
    pub relative_path: String,
    /// Hash observed before the tool ran, if the file existed.
    pub pre_hash: Option<String>,
    /// Hash observed after the tool ran, if the file exists afterward.
    pub post_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// External Agent Trace schema (LedgerRecord)
// ---------------------------------------------------------------------------

/// One line of the append-only ledger, in the externally-documented Agent
/// Trace schema (§3.2, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Unique id for this record.
    pub id: Uuid,
    /// When the record was written.
    pub timestamp: DateTime<Utc>,
    /// Version-control context, best-effort.
    pub vcs: VcsInfo,
    /// Per-file conversation entries. Empty when the originating
    /// [`TraceEntry::file`] was `None`.
    pub files: Vec<FileRecord>,
}

/// Version-control context attached to a ledger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsInfo {
    /// The current revision id, if the probe succeeded.
    pub revision_id: Option<String>,
}

/// A single file's conversation history within a [`LedgerRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Workspace-relative path.
    pub relative_path: String,
    /// One entry per contributing conversation (always exactly one here).
    pub conversations: Vec<Conversation>,
}

/// One contributor's edit to a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// The session id that performed the edit.
    pub url: String,
    /// Who made the edit.
    pub contributor: Contributor,
    /// Line ranges touched, each carrying its own content hash.
    pub ranges: Vec<LineRange>,
    /// Related entities (always includes the originating intent).
    pub related: Vec<Related>,
}

/// The entity that performed an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    /// `"AI"` or `"Human"`.
    pub entity_type: String,
    /// Model identifier, or `"unknown"` if not supplied.
    pub model_identifier: String,
}

/// A contiguous line range touched by one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRange {
    /// 1-based starting line.
    pub start_line: u32,
    /// 1-based ending line (inclusive).
    pub end_line: u32,
    /// Content hash of the range: `post_hash` if present, else `pre_hash`.
    pub content_hash: Option<String>,
}

/// A relation from a conversation to an intent, spec, or parent trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Related {
    /// `"intent"`, `"specification"`, or `"parent_trace"`.
    #[serde(rename = "type")]
    pub related_type: String,
    /// The referenced value (intent id, spec path, trace id, ...).
    pub value: String,
}

impl Related {
    /// Build an `{type: "intent", value: <id>}` relation.
    #[must_use]
    pub fn intent(id: impl Into<String>) -> Self {
        Self {
            related_type: "intent".to_string(),
            value: id.into(),
        }
    }

    /// Build a `{type: "specification", value: <ref>}` relation.
    #[must_use]
    pub fn specification(reference: impl Into<String>) -> Self {
        Self {
            related_type: "specification".to_string(),
            value: reference.into(),
        }
    }
}
