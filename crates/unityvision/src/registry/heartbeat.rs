//! Per-instance heartbeat and lifecycle driver.
//!
//! Each instance owns exactly one row in the shared registry and keeps it
//! alive with periodic refreshes. The host's main loop calls
//! [`HeartbeatScheduler::tick`] as often as it likes; the scheduler enforces
//! a minimum interval measured on a monotonic clock, so it is robust to
//! wall-clock adjustment and to loops that tick faster than the cadence.
//!
//! Every operation here is a full load–mutate–save cycle against the shared
//! file and swallows persistence faults (logged), per the registry failure
//! policy: discovery must never crash the owning editor.

use std::time::{Duration, Instant};

use crate::registry::entry::{derive_project_name, InstanceEntry};
use crate::registry::store::RegistryStore;
use crate::time::now_iso8601;

/// Minimum seconds between effective heartbeat ticks.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Static facts about the owning instance, captured once at startup.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    /// Absolute project path; the instance's registry identity.
    pub project_path: String,
    /// Pipe name clients use to reach this instance.
    pub pipe_name: String,
    /// Alternate TCP port hint, if the legacy transport is enabled.
    pub port: Option<u16>,
    /// Editor version string.
    pub unity_version: String,
}

/// Drives register / refresh / deactivate transitions for one instance.
pub struct HeartbeatScheduler {
    store: RegistryStore,
    info: InstanceInfo,
    pid: u32,
    interval: Duration,
    last_tick: Option<Instant>,
}

impl HeartbeatScheduler {
    /// Scheduler for the given instance, with the default 5-second cadence.
    pub fn new(store: RegistryStore, info: InstanceInfo) -> Self {
        Self::with_interval(store, info, Duration::from_secs(HEARTBEAT_INTERVAL_SECS))
    }

    /// Scheduler with an explicit minimum tick interval.
    pub fn with_interval(store: RegistryStore, info: InstanceInfo, interval: Duration) -> Self {
        Self {
            store,
            info,
            pid: std::process::id(),
            interval,
            last_tick: None,
        }
    }

    /// Identity of the owning instance.
    pub fn project_path(&self) -> &str {
        &self.info.project_path
    }

    /// The underlying store, for read-side queries over the same file.
    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Upsert this instance's row: overwrite every mutable field if the row
    /// exists, append a fresh row otherwise, and save. Idempotent — repeated
    /// calls never create duplicates.
    pub fn register_or_update(&self) {
        let mut entries = self.store.load();

        match RegistryStore::find_mut(&mut entries, &self.info.project_path) {
            Some(existing) => {
                existing.project_name = derive_project_name(&self.info.project_path);
                existing.pipe_name = self.info.pipe_name.clone();
                existing.port = self.info.port;
                existing.pid = self.pid;
                existing.unity_version = self.info.unity_version.clone();
                existing.touch();
            }
            None => {
                entries.push(InstanceEntry::new(
                    &self.info.project_path,
                    &self.info.pipe_name,
                    self.info.port,
                    self.pid,
                    &self.info.unity_version,
                ));
            }
        }

        self.store.save(&entries);
    }

    /// Refresh liveness only: update `lastSeen` and force `isActive`. If the
    /// row is missing (another writer evicted it), self-heal by falling back
    /// to a full [`HeartbeatScheduler::register_or_update`].
    pub fn refresh_heartbeat(&self) {
        let mut entries = self.store.load();

        match RegistryStore::find_mut(&mut entries, &self.info.project_path) {
            Some(existing) => {
                existing.touch();
                self.store.save(&entries);
            }
            None => {
                log::info!(
                    "registry row for {} vanished, re-registering",
                    self.info.project_path
                );
                self.register_or_update();
            }
        }
    }

    /// Graceful shutdown: mark the row inactive with a fresh `lastSeen` and
    /// leave it in place. The eviction sweep reaps it later; deleting here
    /// would erase the "was here, now gone" trace readers rely on.
    pub fn deactivate(&self) {
        let mut entries = self.store.load();

        if let Some(existing) = RegistryStore::find_mut(&mut entries, &self.info.project_path) {
            existing.last_seen = now_iso8601();
            existing.is_active = false;
            self.store.save(&entries);
        }
    }

    /// Domain-reload boundary: the process image is about to be replaced in
    /// place. Refresh `lastSeen` but stay active so readers see no liveness
    /// gap; the resumed instance calls
    /// [`HeartbeatScheduler::register_or_update`] again.
    pub fn suspend_for_reload(&self) {
        let mut entries = self.store.load();

        if let Some(existing) = RegistryStore::find_mut(&mut entries, &self.info.project_path) {
            existing.last_seen = now_iso8601();
            self.store.save(&entries);
        }
    }

    /// Recurring-tick entry point. Refreshes the heartbeat if at least the
    /// minimum interval has elapsed since the previous effective tick, and
    /// reports whether it ran.
    pub fn tick(&mut self) -> bool {
        if let Some(last) = self.last_tick {
            if last.elapsed() < self.interval {
                return false;
            }
        }
        self.last_tick = Some(Instant::now());
        self.refresh_heartbeat();
        true
    }
}
