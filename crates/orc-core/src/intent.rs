//! The [`Intent`] type and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an [`Intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Declared but not yet selected for work.
    Pending,
    /// Selected; the assistant may mutate files within scope.
    InProgress,
    /// Acceptance criteria verified; no further mutation expected.
    Complete,
    /// Paused; work cannot proceed until resumed.
    Blocked,
    /// Terminal. No further transitions are possible.
    Archived,
}

impl IntentStatus {
    /// Returns `true` if `self -> target` is one of the allowed transitions.
    ///
    /// This is the authoritative lifecycle table (§3.1): encode it once as a
    /// static list rather than scattering the logic across call sites.
    #[must_use]
    pub fn can_transition_to(self, target: IntentStatus) -> bool {
        use IntentStatus::{Archived, Blocked, Complete, InProgress, Pending};
        matches!(
            (self, target),
            (Pending, InProgress)
                | (Pending, Archived)
                | (InProgress, Complete)
                | (InProgress, Blocked)
                | (InProgress, Archived)
                | (Blocked, InProgress)
                | (Blocked, Archived)
                | (Complete, Archived)
        )
    }

    /// A status-specific sentence explaining why a non-`IN_PROGRESS` intent
    /// cannot accept a write right now.
    #[must_use]
    pub fn not_actionable_reason(self) -> &'static str {
        match self {
            IntentStatus::Pending => {
                "the intent is PENDING and has not been selected yet; call select_active_intent first"
            }
            IntentStatus::InProgress => "the intent is already actionable",
            IntentStatus::Blocked => {
                "the intent is BLOCKED; it must be resumed to IN_PROGRESS before mutating files"
            }
            IntentStatus::Complete => {
                "the intent is COMPLETE; acceptance criteria were already verified"
            }
            IntentStatus::Archived => "the intent is ARCHIVED and is terminal",
        }
    }
}

/// A cross-reference from an intent to an external specification or issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedSpecType {
    /// A speckit-authored specification file.
    Speckit,
    /// A GitHub issue.
    GithubIssue,
    /// A GitHub pull request.
    GithubPr,
    /// The project constitution.
    Constitution,
    /// Any other external reference.
    External,
}

/// A single `related_specs` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSpec {
    /// The kind of reference.
    #[serde(rename = "type")]
    pub spec_type: RelatedSpecType,
    /// The reference value (a path, URL, or issue number).
    #[serde(rename = "ref")]
    pub reference: String,
}

/// The unit of authorization: a declared piece of work with an owned scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique id matching `^[A-Z]+-\d{3,}$`.
    pub id: String,
    /// Free-text name, 3-200 chars.
    pub name: String,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// Bumped by a human on semantic evolution; never auto-incremented.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Non-empty ordered glob patterns this intent may mutate.
    pub owned_scope: Vec<String>,
    /// Free-text rules surfaced to the assistant.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Free-text verifiable acceptance items.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Cross-references to external specs/issues/PRs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_specs: Option<Vec<RelatedSpec>>,
    /// Optional parent for hierarchical decomposition (not enforced here).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_intent: Option<String>,
    /// Optional free-text tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp; `created_at <= updated_at` always holds.
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Intent {
    /// Whether `self` is actionable, i.e. in `IN_PROGRESS`.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.status == IntentStatus::InProgress
    }
}
