//! Instance entry — one row per discoverable editor instance.
//!
//! Wire format (one object in the registry file's JSON array):
//!
//! ```json
//! {
//!   "projectPath": "/home/dev/projects/tower-defense",
//!   "projectName": "tower-defense",
//!   "pipeName": "unityvision-7f3a",
//!   "port": 13700,
//!   "pid": 41923,
//!   "unityVersion": "2022.3.14f1",
//!   "lastSeen": "2026-08-30T10:15:03.512000+00:00",
//!   "isActive": true
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::time::now_iso8601;

/// One discoverable editor instance.
///
/// `project_path` is the identity: the registry holds at most one entry per
/// path, and the path never changes for the life of an entry. Every other
/// field is overwritten in place on each registration from the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceEntry {
    /// Unique key: absolute path of the open project.
    pub project_path: String,
    /// Human label, derived from the final path component.
    pub project_name: String,
    /// Opaque transport handle a client uses to connect.
    pub pipe_name: String,
    /// Alternate TCP transport hint, retained for older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// OS process id of the owning editor. Informational only.
    pub pid: u32,
    /// Owning editor's version string. Informational only.
    pub unity_version: String,
    /// Last liveness refresh, ISO-8601 UTC. Kept as a string so a corrupt
    /// timestamp degrades per-entry instead of poisoning the whole file.
    pub last_seen: String,
    /// Whether the owner believes itself alive.
    pub is_active: bool,
}

impl InstanceEntry {
    /// Build a fresh, active entry with `last_seen` set to now.
    pub fn new(
        project_path: impl Into<String>,
        pipe_name: impl Into<String>,
        port: Option<u16>,
        pid: u32,
        unity_version: impl Into<String>,
    ) -> Self {
        let project_path = project_path.into();
        let project_name = derive_project_name(&project_path);
        Self {
            project_path,
            project_name,
            pipe_name: pipe_name.into(),
            port,
            pid,
            unity_version: unity_version.into(),
            last_seen: now_iso8601(),
            is_active: true,
        }
    }

    /// Stamp the entry as alive right now.
    pub fn touch(&mut self) {
        self.last_seen = now_iso8601();
        self.is_active = true;
    }
}

/// Final path component of the project path, falling back to the whole path
/// for degenerate inputs like `/`.
pub(crate) fn derive_project_name(project_path: &str) -> String {
    std::path::Path::new(project_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.to_string())
}
