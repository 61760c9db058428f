//! Discovery registry protocol.
//!
//! All editor instances on a machine share one registry file:
//!
//! ```text
//! ~/.unityvision/
//! └── projects.json     — JSON array of instance entries
//! ```
//!
//! Each instance upserts its own row and refreshes it on a heartbeat; the
//! external automation process reads the file to pick an instance to connect
//! to. There is deliberately no cross-process locking — see [`store`].
//!
//! # Modules
//!
//! - [`entry`] — the [`InstanceEntry`] row and its wire schema.
//! - [`store`] — [`RegistryStore`], load/save of the shared file.
//! - [`heartbeat`] — [`HeartbeatScheduler`], per-instance lifecycle driver.
//! - [`query`] — [`DiscoveryQuery`], the read side: list and evict.

pub mod entry;
pub mod heartbeat;
pub mod query;
pub mod store;

// Re-export the primary types so callers can write `registry::RegistryStore`
// without reaching into sub-modules.
pub use entry::InstanceEntry;
pub use heartbeat::{HeartbeatScheduler, InstanceInfo, HEARTBEAT_INTERVAL_SECS};
pub use query::{DiscoveryQuery, DEFAULT_ACTIVE_THRESHOLD_SECS, DEFAULT_EVICT_THRESHOLD_SECS};
pub use store::RegistryStore;
