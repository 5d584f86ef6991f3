// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! The hook engine: wires the catalog, scope, ledger, spatial map, lessons,
//! and HITL gate collaborators into the `preToolUse`/`postToolUse` contract
//! (§4.9, §6.4-§6.5).
//!
//! One [`HookEngine`] exists per `(workspace_root, session_id)` pair; it is
//! never a process-wide singleton (§9). [`EngineRegistry`] is the injectable
//! cache a host uses to reuse engines across calls within the same session.

mod classify;
mod post;
mod pre;

pub use classify::{classify_tool, ToolClass};
pub use post::PostToolUseContext;
pub use pre::PreToolUseContext;

use orc_catalog::{Catalog, LifecycleManager};
use orc_core::layout::{IGNORE_FILE, ORCHESTRATION_DIR};
use orc_core::{Clock, Denial, ErrorCode, UuidSource};
use orc_hitl::HitlGate;
use orc_ledger::TraceLedger;
use orc_lessons::LessonRecorder;
use orc_scope::IgnoreMatcher;
use orc_spatial::SpatialIndex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long a positive/negative `isEnabled` result is cached before the
/// filesystem is checked again.
pub const ENABLED_CACHE_TTL: Duration = Duration::from_secs(5);

/// The outcome of a `preToolUse` check.
#[derive(Debug, Clone)]
pub enum PreToolUseResult {
    /// The call may proceed.
    Allowed {
        /// The file's content hash observed before the call, if any file was
        /// named and it already existed. Carried into `postToolUse` so the
        /// engine can detect a no-op write.
        pre_hash: Option<String>,
        /// Why this call was allowed.
        reason: AllowReason,
    },
    /// The call is rejected; `denial.reason` is shown to the assistant.
    Denied(Denial),
}

/// Why a `preToolUse` call was allowed, carried through for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// The tool is in the exempt set.
    Exempt,
    /// The tool is destructive and HITL approved it.
    Destructive,
    /// The tool is in neither the exempt, write, nor destructive sets.
    Unclassified,
    /// The path matched an `.intentignore` rule.
    IntentIgnored,
    /// The full intent-gated path was walked and passed every check.
    Gated,
}

/// Lazily-loaded, best-effort `.intentignore` matcher, shared across calls
/// for one engine instance.
struct IgnoreState {
    matcher: IgnoreMatcher,
}

/// Per-`(workspace_root, session_id)` engine instance.
///
/// Holds the collaborators needed to evaluate both hook points plus the
/// small amount of session-local state the gate depends on: the active
/// intent, the optimistic-lock hash cache, and the cached `.intentignore`
/// matcher.
pub struct HookEngine {
    workspace_root: PathBuf,
    session_id: String,
    catalog: Arc<Catalog>,
    lifecycle: Arc<LifecycleManager>,
    ledger: Arc<TraceLedger>,
    spatial: Arc<SpatialIndex>,
    lessons: Arc<LessonRecorder>,
    hitl: Arc<dyn HitlGate>,
    clock: Arc<dyn Clock>,
    uuid_source: Arc<dyn UuidSource>,
    active_intent: Mutex<Option<String>>,
    file_hash_cache: Mutex<HashMap<String, String>>,
    ignore: Mutex<Option<IgnoreState>>,
    enabled_cache: Mutex<Option<(chrono::DateTime<chrono::Utc>, bool)>>,
}

/// Everything the host must supply to build a [`HookEngine`].
pub struct HookEngineDeps {
    /// The workspace root the engine gates.
    pub workspace_root: PathBuf,
    /// The session this engine instance belongs to.
    pub session_id: String,
    /// Shared intent catalog.
    pub catalog: Arc<Catalog>,
    /// Lifecycle manager wrapping the same catalog.
    pub lifecycle: Arc<LifecycleManager>,
    /// Append-only trace ledger.
    pub ledger: Arc<TraceLedger>,
    /// Intent-to-files spatial map.
    pub spatial: Arc<SpatialIndex>,
    /// Lessons-learned recorder.
    pub lessons: Arc<LessonRecorder>,
    /// Human-in-the-loop approval gate for destructive tools.
    pub hitl: Arc<dyn HitlGate>,
    /// Clock, injected for deterministic tests.
    pub clock: Arc<dyn Clock>,
    /// UUID v4 source for trace entry ids, injected for deterministic tests.
    pub uuid_source: Arc<dyn UuidSource>,
}

impl HookEngine {
    /// Build a new engine instance. Does not touch disk.
    #[must_use]
    pub fn new(deps: HookEngineDeps) -> Self {
        Self {
            workspace_root: deps.workspace_root,
            session_id: deps.session_id,
            catalog: deps.catalog,
            lifecycle: deps.lifecycle,
            ledger: deps.ledger,
            spatial: deps.spatial,
            lessons: deps.lessons,
            hitl: deps.hitl,
            clock: deps.clock,
            uuid_source: deps.uuid_source,
            active_intent: Mutex::new(None),
            file_hash_cache: Mutex::new(HashMap::new()),
            ignore: Mutex::new(None),
            enabled_cache: Mutex::new(None),
        }
    }

    /// The workspace root this engine gates.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The session this engine instance belongs to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the gate is active for this workspace: the `.orchestration`
    /// directory and catalog file must both exist. Cached for
    /// [`ENABLED_CACHE_TTL`] so a hot tool-call loop doesn't stat the
    /// filesystem on every invocation.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        let now = self.clock.now();
        let mut guard = self.enabled_cache.lock().expect("enabled cache poisoned");
        if let Some((checked_at, enabled)) = *guard {
            if now.signed_duration_since(checked_at).num_seconds() < ENABLED_CACHE_TTL.as_secs() as i64 {
                return enabled;
            }
        }
        let enabled = self.workspace_root.join(ORCHESTRATION_DIR).is_dir() && self.catalog.file_present();
        *guard = Some((now, enabled));
        enabled
    }

    /// Select the engine's active intent, consulted by calls whose context
    /// omits an explicit `intentId` (§6.5 `select_active_intent`).
    pub fn set_active_intent(&self, intent_id: impl Into<String>) {
        *self.active_intent.lock().expect("active intent mutex poisoned") = Some(intent_id.into());
    }

    /// Clear the engine's active intent.
    pub fn clear_active_intent(&self) {
        *self.active_intent.lock().expect("active intent mutex poisoned") = None;
    }

    /// The engine's currently selected active intent, if any.
    #[must_use]
    pub fn active_intent(&self) -> Option<String> {
        self.active_intent.lock().expect("active intent mutex poisoned").clone()
    }

    /// The lifecycle manager backing `select_active_intent` and the other
    /// agent-facing mutating operations (§6.5).
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    /// The underlying catalog, for read-only agent-facing queries.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn resolve_intent_id(&self, explicit: Option<&str>) -> Option<String> {
        explicit.map(str::to_string).or_else(|| self.active_intent())
    }

    fn is_ignored(&self, rel_path: &str) -> bool {
        let mut guard = self.ignore.lock().expect("ignore cache mutex poisoned");
        if guard.is_none() {
            let path = self.workspace_root.join(IGNORE_FILE);
            let matcher = std::fs::read_to_string(&path)
                .map(|contents| IgnoreMatcher::parse(&contents))
                .unwrap_or_else(|_| IgnoreMatcher::empty());
            *guard = Some(IgnoreState { matcher });
        }
        guard.as_ref().expect("just populated").matcher.is_ignored(rel_path)
    }

    fn cached_hash(&self, rel_path: &str) -> Option<String> {
        self.file_hash_cache
            .lock()
            .expect("hash cache mutex poisoned")
            .get(rel_path)
            .cloned()
    }

    fn set_cached_hash(&self, rel_path: &str, hash: Option<String>) {
        let mut guard = self.file_hash_cache.lock().expect("hash cache mutex poisoned");
        match hash {
            Some(hash) => {
                guard.insert(rel_path.to_string(), hash);
            }
            None => {
                guard.remove(rel_path);
            }
        }
    }
}

fn no_active_intent_denial() -> Denial {
    Denial::new(
        ErrorCode::NoActiveIntent,
        "no active intent is selected for this session; call select_active_intent with an \
         IN_PROGRESS intent id, or declare one in .orchestration/active_intents.yaml, before \
         mutating files"
            .to_string(),
    )
}

fn intent_not_found_denial(id: &str) -> Denial {
    Denial::new(
        ErrorCode::IntentNotFound,
        format!("intent '{id}' does not exist in the catalog; check active_intents.yaml for the correct id"),
    )
}

fn intent_not_actionable_denial(intent: &orc_core::Intent) -> Denial {
    Denial::new(
        ErrorCode::IntentNotActionable,
        format!(
            "intent '{}' is {:?} and cannot accept writes right now: {}",
            intent.id,
            intent.status,
            intent.status.not_actionable_reason()
        ),
    )
}

/// Caches one [`HookEngine`] per `(workspace_root, session_id)` pair so a
/// host issuing many tool calls within a session reuses the same engine
/// state (active intent, hash cache, ignore matcher) instead of rebuilding
/// it on every call. This is an explicit, injectable cache rather than a
/// process-wide singleton: a host may hold as many registries as it likes,
/// and tests construct a fresh one per case.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Mutex<HashMap<(PathBuf, String), Arc<HookEngine>>>,
}

impl EngineRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached engine for `(workspace_root, session_id)`, building
    /// one via `build` on first use.
    pub fn get_or_create(
        &self,
        workspace_root: &Path,
        session_id: &str,
        build: impl FnOnce() -> HookEngine,
    ) -> Arc<HookEngine> {
        let key = (workspace_root.to_path_buf(), session_id.to_string());
        let mut guard = self.engines.lock().expect("engine registry mutex poisoned");
        guard.entry(key).or_insert_with(|| Arc::new(build())).clone()
    }

    /// Drop the cached engine for `(workspace_root, session_id)`, if any.
    pub fn forget(&self, workspace_root: &Path, session_id: &str) {
        let key = (workspace_root.to_path_buf(), session_id.to_string());
        self.engines.lock().expect("engine registry mutex poisoned").remove(&key);
    }

    /// Number of live engine instances currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.lock().expect("engine registry mutex poisoned").len()
    }

    /// Whether the registry currently holds no engines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::{NullVcsProbe, RandomUuidSource, SystemClock};
    use std::sync::Arc;

    struct AlwaysApprove;
    impl HitlGate for AlwaysApprove {
        fn request_approval(&self, _request: &orc_hitl::ApprovalRequest) -> orc_hitl::ApprovalResponse {
            orc_hitl::ApprovalResponse::approved()
        }
    }

    fn build_engine(root: &Path, session_id: &str) -> HookEngine {
        let catalog_path = root.join(ORCHESTRATION_DIR).join("active_intents.yaml");
        let ledger_path = root.join(ORCHESTRATION_DIR).join("agent_trace.jsonl");
        let spatial_path = root.join(ORCHESTRATION_DIR).join("intent_map.md");
        let brain_path = root.join(ORCHESTRATION_DIR).join("CLAUDE.md");
        let catalog = Arc::new(Catalog::new(&catalog_path, Arc::new(SystemClock)));
        HookEngine::new(HookEngineDeps {
            workspace_root: root.to_path_buf(),
            session_id: session_id.to_string(),
            lifecycle: Arc::new(LifecycleManager::new(Arc::clone(&catalog), Arc::new(SystemClock))),
            catalog,
            ledger: Arc::new(TraceLedger::new(ledger_path, Arc::new(NullVcsProbe))),
            spatial: Arc::new(SpatialIndex::new(spatial_path)),
            lessons: Arc::new(LessonRecorder::new(brain_path)),
            hitl: Arc::new(AlwaysApprove),
            clock: Arc::new(SystemClock),
            uuid_source: Arc::new(RandomUuidSource),
        })
    }

    #[test]
    fn disabled_without_orchestration_directory() {
        let dir = tempfile::tempdir().unwrap();
        let engine = build_engine(dir.path(), "session-1");
        assert!(!engine.is_enabled());
    }

    #[test]
    fn enabled_once_catalog_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(ORCHESTRATION_DIR)).unwrap();
        std::fs::write(
            dir.path().join(ORCHESTRATION_DIR).join("active_intents.yaml"),
            "active_intents: []\n",
        )
        .unwrap();
        let engine = build_engine(dir.path(), "session-1");
        assert!(engine.is_enabled());
    }

    #[test]
    fn active_intent_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let engine = build_engine(dir.path(), "session-1");
        assert_eq!(engine.active_intent(), None);
        engine.set_active_intent("INT-001");
        assert_eq!(engine.active_intent().as_deref(), Some("INT-001"));
        engine.clear_active_intent();
        assert_eq!(engine.active_intent(), None);
    }

    #[test]
    fn registry_reuses_engine_for_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let registry = EngineRegistry::new();
        let a = registry.get_or_create(dir.path(), "session-1", || build_engine(dir.path(), "session-1"));
        a.set_active_intent("INT-042");
        let b = registry.get_or_create(dir.path(), "session-1", || build_engine(dir.path(), "session-1"));
        assert_eq!(b.active_intent().as_deref(), Some("INT-042"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_separates_different_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let registry = EngineRegistry::new();
        let a = registry.get_or_create(dir.path(), "session-1", || build_engine(dir.path(), "session-1"));
        let b = registry.get_or_create(dir.path(), "session-2", || build_engine(dir.path(), "session-2"));
        a.set_active_intent("INT-001");
        assert_eq!(b.active_intent(), None);
        assert_eq!(registry.len(), 2);
    }
}
