// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Intent catalog: YAML loader, per-entry validator, and a comment- and
//! ordering-preserving lifecycle writer.

mod lifecycle;
mod loader;
mod validate;

pub use lifecycle::{transition_intent, update_intent_field};
pub use loader::{parse_catalog, Catalog, CACHE_TTL};
pub use validate::validate_intent;

use orc_core::{Clock, IntentStatus, LifecycleError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Wraps a [`Catalog`] with the two mutating lifecycle operations,
/// performing the read-modify-write-invalidate cycle described in §4.2.
pub struct LifecycleManager {
    catalog: Arc<Catalog>,
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LifecycleManager {
    /// Build a manager over an existing catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, clock: Arc<dyn Clock>) -> Self {
        let path = catalog.path().to_path_buf();
        Self {
            catalog,
            path,
            clock,
        }
    }

    /// Transition `id` to `target`. Reads the file fresh, rewrites only the
    /// changed lines, writes back, and invalidates the catalog cache.
    pub fn transition_intent(&self, id: &str, target: IntentStatus) -> Result<(), LifecycleError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| LifecycleError::CatalogIo(e.to_string()))?;
        let updated = lifecycle::transition_intent(&contents, id, target, self.clock.now())?;
        std::fs::write(&self.path, updated).map_err(|e| LifecycleError::CatalogIo(e.to_string()))?;
        self.catalog.reload();
        Ok(())
    }

    /// Overwrite `field` on intent `id` with `value` (a YAML scalar's raw
    /// textual form, e.g. `"quoted string"` or `42`).
    pub fn update_intent_field(
        &self,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), LifecycleError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| LifecycleError::CatalogIo(e.to_string()))?;
        let updated = lifecycle::update_intent_field(&contents, id, field, value, self.clock.now())?;
        std::fs::write(&self.path, updated).map_err(|e| LifecycleError::CatalogIo(e.to_string()))?;
        self.catalog.reload();
        Ok(())
    }
}

/// Standard location of the catalog file beneath a workspace root.
#[must_use]
pub fn default_catalog_path(workspace_root: &Path) -> PathBuf {
    workspace_root
        .join(orc_core::layout::ORCHESTRATION_DIR)
        .join(orc_core::layout::CATALOG_FILE)
}
