//! Assembles the hook engine and its collaborators from configuration
//! (§4.9, §6.6).

use orc_catalog::{default_catalog_path, Catalog, LifecycleManager};
use orc_config::OrcConfig;
use orc_context::ContextBuilder;
use orc_core::layout::{BRAIN_FILE, LEDGER_FILE, ORCHESTRATION_DIR, SPATIAL_MAP_FILE};
use orc_core::{Clock, NullVcsProbe, RandomUuidSource, SystemClock, VcsProbe};
use orc_engine::{EngineRegistry, HookEngine, HookEngineDeps};
use orc_hitl::{DefaultHitlGate, HitlGate};
use orc_ledger::TraceLedger;
use orc_lessons::LessonRecorder;
use orc_session::SessionCoordinator;
use orc_spatial::SpatialIndex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::host::StdinConfirmation;

/// Process-wide cache of built engines, keyed by `(workspace_root,
/// session_id)`. A single `orc` invocation only ever builds one engine;
/// the registry exists so a host embedding this crate as a library across
/// many hook calls doesn't re-parse the catalog every time.
fn registry() -> &'static EngineRegistry {
    static REGISTRY: OnceLock<EngineRegistry> = OnceLock::new();
    REGISTRY.get_or_init(EngineRegistry::new)
}

/// Build (or reuse) the hook engine for `workspace_root`/`session_id`.
pub fn engine_for(workspace_root: &Path, session_id: &str, config: &OrcConfig) -> Arc<HookEngine> {
    orc_hitl::set_enabled(config.hitl_enabled);
    let root = workspace_root.to_path_buf();
    let sid = session_id.to_string();
    let vcs_probe: Arc<dyn VcsProbe> = config
        .vcs_probe()
        .map(|probe| Arc::new(probe) as Arc<dyn VcsProbe>)
        .unwrap_or_else(|| Arc::new(NullVcsProbe));

    registry().get_or_create(workspace_root, session_id, move || {
        let orchestration_dir = root.join(ORCHESTRATION_DIR);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let catalog = Arc::new(Catalog::new(default_catalog_path(&root), Arc::clone(&clock)));
        let lifecycle = Arc::new(LifecycleManager::new(Arc::clone(&catalog), Arc::clone(&clock)));
        let ledger = Arc::new(TraceLedger::new(orchestration_dir.join(LEDGER_FILE), vcs_probe));
        let spatial = Arc::new(SpatialIndex::new(orchestration_dir.join(SPATIAL_MAP_FILE)));
        let lessons = Arc::new(LessonRecorder::new(orchestration_dir.join(BRAIN_FILE)));
        let hitl: Arc<dyn HitlGate> = Arc::new(DefaultHitlGate::new(Arc::new(StdinConfirmation)));

        HookEngine::new(HookEngineDeps {
            workspace_root: root,
            session_id: sid,
            catalog,
            lifecycle,
            ledger,
            spatial,
            lessons,
            hitl,
            clock,
            uuid_source: Arc::new(RandomUuidSource),
        })
    })
}

/// Drop the cached engine for `workspace_root`/`session_id`, forcing the
/// next call to rebuild it from scratch.
pub fn forget_engine(workspace_root: &Path, session_id: &str) {
    registry().forget(workspace_root, session_id);
}

/// Build a [`ContextBuilder`] over `workspace_root`. Independent of the
/// per-session engine cache, since the formatted context carries no
/// session state.
pub fn context_builder_for(workspace_root: &Path) -> ContextBuilder {
    let orchestration_dir = workspace_root.join(ORCHESTRATION_DIR);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let catalog = Arc::new(Catalog::new(default_catalog_path(workspace_root), clock));
    let ledger = Arc::new(TraceLedger::new(
        orchestration_dir.join(LEDGER_FILE),
        Arc::new(NullVcsProbe),
    ));
    ContextBuilder::new(
        catalog,
        ledger,
        orchestration_dir.join(SPATIAL_MAP_FILE),
        workspace_root.to_path_buf(),
    )
}

/// Build a [`SessionCoordinator`] over the shared brain file beneath
/// `workspace_root`.
pub fn session_coordinator_for(workspace_root: &Path) -> SessionCoordinator {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    SessionCoordinator::new(
        workspace_root.join(ORCHESTRATION_DIR).join(BRAIN_FILE),
        clock,
    )
}

/// Standard location of the catalog file beneath `workspace_root`,
/// re-exported so callers don't need to depend on `orc-catalog` directly.
#[must_use]
pub fn catalog_path(workspace_root: &Path) -> PathBuf {
    default_catalog_path(workspace_root)
}
