//! Read side of the discovery registry: list and evict.
//!
//! The automation process uses these queries to pick a live instance to
//! connect to, and instances use the eviction sweep to garbage-collect rows
//! left behind by processes that are long gone.
//!
//! Timestamp-parse failures cut both ways deliberately: an unparsable
//! `lastSeen` makes an entry invisible to [`DiscoveryQuery::list_active`]
//! (fail-closed — never hand out a connection target of unknown age) but
//! immune to [`DiscoveryQuery::evict_stale`] (fail-open — never destroy data
//! over a corrupt timestamp).

use chrono::Utc;

use crate::registry::entry::InstanceEntry;
use crate::registry::store::RegistryStore;
use crate::time::age_seconds;

/// Entries older than this are hidden from the active listing. Tunable: the
/// right value depends on the heartbeat cadence actually configured.
pub const DEFAULT_ACTIVE_THRESHOLD_SECS: i64 = 30;

/// Inactive entries older than this are deleted by the eviction sweep.
pub const DEFAULT_EVICT_THRESHOLD_SECS: i64 = 300;

/// Read-side queries over a registry store.
#[derive(Debug, Clone)]
pub struct DiscoveryQuery {
    store: RegistryStore,
}

impl DiscoveryQuery {
    /// Queries over the given store.
    pub fn new(store: RegistryStore) -> Self {
        Self { store }
    }

    /// Raw load, unfiltered.
    pub fn list_all(&self) -> Vec<InstanceEntry> {
        self.store.load()
    }

    /// Entries that are active and were seen strictly less than
    /// `stale_threshold_secs` ago. Unparsable timestamps are treated as
    /// stale.
    pub fn list_active(&self, stale_threshold_secs: i64) -> Vec<InstanceEntry> {
        let now = Utc::now();
        self.store
            .load()
            .into_iter()
            .filter(|e| {
                e.is_active
                    && age_seconds(&e.last_seen, now)
                        .map_or(false, |age| age < stale_threshold_secs)
            })
            .collect()
    }

    /// Delete every entry that is inactive, not `own_project_path`, and was
    /// last seen strictly more than `stale_threshold_secs` ago.
    ///
    /// The caller's own identity is always preserved regardless of its
    /// state, and entries with unparsable timestamps are never deleted.
    pub fn evict_stale(&self, stale_threshold_secs: i64, own_project_path: &str) {
        let now = Utc::now();
        let mut entries = self.store.load();
        let before = entries.len();

        entries.retain(|e| {
            if e.project_path == own_project_path || e.is_active {
                return true;
            }
            // Fail-open: no parsable age, no deletion.
            age_seconds(&e.last_seen, now).map_or(true, |age| age <= stale_threshold_secs)
        });

        if entries.len() != before {
            log::info!("evicted {} stale registry entries", before - entries.len());
            self.store.save(&entries);
        }
    }
}
