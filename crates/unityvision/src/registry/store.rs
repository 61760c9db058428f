//! Shared registry file persistence.
//!
//! The registry is a single JSON array at a well-known per-user path, shared
//! mutable state across every instance process on the machine. There is
//! **no cross-process locking**: every writer does load → mutate → save, and
//! two processes racing on the same tick can lose an update (last save wins,
//! whole-file granularity). That is an accepted trade-off for low contention
//! (one small write per instance every few seconds), and adding a lock here
//! would change the observable failure semantics. Do not "fix" it.
//!
//! Failure policy: discovery is best-effort. A missing file is an empty
//! registry, a corrupt file is logged and treated as empty (the next save
//! self-heals it), and a failed save is logged and swallowed. Registry
//! unavailability must never take down the owning instance.

use std::path::{Path, PathBuf};

use crate::registry::entry::InstanceEntry;

/// Directory under `$HOME` holding bridge state.
const VISION_DIR: &str = ".unityvision";

/// Registry file name inside [`VISION_DIR`].
const REGISTRY_FILE: &str = "projects.json";

/// Load/save access to the shared registry file.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store over an explicit file path. Tests and tools use this;
    /// instances normally use [`RegistryStore::open_default`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store over the machine-wide default path, `~/.unityvision/projects.json`.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// The machine-wide default registry path. Process-wide configuration,
    /// not negotiable per call.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(VISION_DIR).join(REGISTRY_FILE)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full registry.
    ///
    /// An absent file is an empty registry, not an error. A file that exists
    /// but fails to read or parse is logged and treated as empty — corruption
    /// must never block an instance from registering itself fresh.
    pub fn load(&self) -> Vec<InstanceEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("failed to read registry {}: {e}", self.path.display());
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "registry {} is malformed, treating as empty: {e}",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Serialize the full sequence and overwrite the file, creating the
    /// parent directory if needed. Write failures are logged and swallowed.
    pub fn save(&self, entries: &[InstanceEntry]) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("failed to create registry dir {}: {e}", parent.display());
                return;
            }
        }

        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                log::error!("failed to serialize registry: {e}");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, json.as_bytes()) {
            log::error!("failed to write registry {}: {e}", self.path.display());
        }
    }

    /// Find an entry by identity within a loaded sequence.
    pub fn find<'a>(
        entries: &'a [InstanceEntry],
        project_path: &str,
    ) -> Option<&'a InstanceEntry> {
        entries.iter().find(|e| e.project_path == project_path)
    }

    /// Mutable variant of [`RegistryStore::find`] for load–mutate–save cycles.
    pub fn find_mut<'a>(
        entries: &'a mut [InstanceEntry],
        project_path: &str,
    ) -> Option<&'a mut InstanceEntry> {
        entries.iter_mut().find(|e| e.project_path == project_path)
    }
}
