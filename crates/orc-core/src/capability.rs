//! Narrow capability interfaces the engine consumes from its host.
//!
//! Each is injected rather than called directly (§9 design notes): a
//! default implementation is provided for production use, and tests swap in
//! deterministic fakes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Wall-clock time, injected so tests can freeze it.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// UUID v4 generation, injected so tests can assert on fixed ids.
pub trait UuidSource: Send + Sync {
    /// Generate a new random id.
    fn new_v4(&self) -> Uuid;
}

/// `Uuid::new_v4` source for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuidSource;

impl UuidSource for RandomUuidSource {
    fn new_v4(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Abstract probe for the host's version-control system.
///
/// Implementation-free by design (§6.6): the core never shells out itself.
/// `current_revision_id` must never panic and should swallow its own
/// failures, returning `None`.
pub trait VcsProbe: Send + Sync {
    /// Current revision identifier, or `None` if unavailable.
    fn current_revision_id(&self) -> Option<String>;
}

/// A probe that never reports a revision. Used where no VCS integration is
/// wired up; the ledger records `vcs.revision_id: null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVcsProbe;

impl VcsProbe for NullVcsProbe {
    fn current_revision_id(&self) -> Option<String> {
        None
    }
}
