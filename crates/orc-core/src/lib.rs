// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Shared types, error taxonomy, and capability traits for the intent gate.
//!
//! This crate has no internal dependencies within the workspace; every
//! other crate in the gate depends on it for the [`Intent`] model, the
//! trace/ledger shapes, the error taxonomy, and the injectable capability
//! traits (clock, UUID source, VCS probe).

mod capability;
mod error;
mod intent;
mod trace;

pub use capability::{Clock, NullVcsProbe, RandomUuidSource, SystemClock, UuidSource, VcsProbe};
pub use error::{Denial, ErrorCode, LifecycleError};
pub use intent::{Intent, IntentStatus, RelatedSpec, RelatedSpecType};
pub use trace::{
    Contributor, Conversation, FileRecord, LedgerRecord, LineRange, MutationClass, Related,
    ScopeValidation, TraceEntry, TraceFile, VcsInfo,
};

/// Standard workspace-relative layout (§6.1).
pub mod layout {
    /// Hidden directory name conventionally holding all gate state.
    pub const ORCHESTRATION_DIR: &str = ".orchestration";
    /// Intent catalog file, relative to [`ORCHESTRATION_DIR`].
    pub const CATALOG_FILE: &str = "active_intents.yaml";
    /// Append-only trace ledger.
    pub const LEDGER_FILE: &str = "agent_trace.jsonl";
    /// Human-readable intent -> files spatial map.
    pub const SPATIAL_MAP_FILE: &str = "intent_map.md";
    /// Shared brain: lessons learned + session presence table.
    pub const BRAIN_FILE: &str = "CLAUDE.md";
    /// Gitignore-subset of paths exempt from gating.
    pub const IGNORE_FILE: &str = ".intentignore";
}
