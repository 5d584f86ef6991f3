//! Error taxonomy for the intent gate.
//!
//! Every kind corresponds to a row in the gating decision table; the pair
//! `(code, message)` is the single channel the assistant sees, so each one
//! states what failed, why, and how to recover.

use std::fmt;

/// Discriminant for every error the gate can surface or log internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A write/destructive tool ran with no active intent selected.
    NoActiveIntent,
    /// The referenced intent id is not present in the catalog.
    IntentNotFound,
    /// The intent exists but is not in `IN_PROGRESS`.
    IntentNotActionable,
    /// The target path is not covered by the intent's owned scope.
    ScopeViolation,
    /// The cached hash for a path disagrees with the hash on disk.
    StaleFile,
    /// A human-in-the-loop approval was rejected.
    HitlRejected,
    /// The requested lifecycle transition is not in the allowed set.
    IllegalTransition,
    /// The catalog file could not be parsed as YAML.
    CatalogParse,
    /// The ledger append failed on both the initial attempt and the retry.
    LedgerWrite,
    /// An I/O error occurred while computing a file hash.
    HashIo,
}

impl ErrorCode {
    /// Stable machine-readable code, e.g. `ERR_SCOPE_VIOLATION`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NoActiveIntent => "ERR_NO_ACTIVE_INTENT",
            Self::IntentNotFound => "ERR_INTENT_NOT_FOUND",
            Self::IntentNotActionable => "ERR_INTENT_NOT_ACTIONABLE",
            Self::ScopeViolation => "ERR_SCOPE_VIOLATION",
            Self::StaleFile => "ERR_STALE_FILE",
            Self::HitlRejected => "ERR_HITL_REJECTED",
            Self::IllegalTransition => "ERR_ILLEGAL_TRANSITION",
            Self::CatalogParse => "ERR_CATALOG_PARSE",
            Self::LedgerWrite => "ERR_LEDGER_WRITE",
            Self::HashIo => "ERR_HASH_IO",
        }
    }

    /// Whether this kind is ever returned to the assistant as a pre-hook
    /// denial, as opposed to being swallowed by the fail-open policy.
    #[must_use]
    pub fn is_assistant_visible(self) -> bool {
        matches!(
            self,
            Self::NoActiveIntent
                | Self::IntentNotFound
                | Self::IntentNotActionable
                | Self::ScopeViolation
                | Self::StaleFile
                | Self::HitlRejected
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for ErrorCode {}

/// A denial surfaced to the assistant from `preToolUse`.
///
/// `reason` is the single communication channel and must be agent-actionable:
/// what failed, why, and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// The error kind.
    pub kind: ErrorCode,
    /// Human/agent-readable explanation, self-contained.
    pub reason: String,
}

impl Denial {
    /// Build a new denial.
    #[must_use]
    pub fn new(kind: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.reason)
    }
}

impl std::error::Error for Denial {}

/// Errors from the lifecycle manager's mutating operations. These are
/// returned to the lifecycle call site, never from the hook engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// `(from, to)` is not in the allowed transition set.
    #[error(
        "illegal transition for intent '{intent_id}': {from:?} -> {to:?} is not allowed"
    )]
    IllegalTransition {
        /// The intent being transitioned.
        intent_id: String,
        /// Current status.
        from: crate::intent::IntentStatus,
        /// Requested status.
        to: crate::intent::IntentStatus,
    },

    /// No intent with this id exists in the catalog.
    #[error("intent '{0}' not found in catalog")]
    NotFound(String),

    /// The catalog file could not be read or parsed.
    #[error("catalog I/O or parse error: {0}")]
    CatalogIo(String),
}
