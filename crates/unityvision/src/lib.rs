//! UnityVision — editor instance discovery and tool dispatch.
//!
//! Lets several editor instances on one machine advertise themselves to a
//! single external automation process through a shared registry file, and
//! lets that process invoke named, schema-described tools against whichever
//! instance it targets.
//!
//! Two subsystems:
//!
//! - [`registry`] — the discovery registry protocol: a shared persistent
//!   file describing live instances, heartbeat-based liveness, and staleness
//!   eviction.
//! - [`tools`] — the tool dispatch subsystem: a catalog of named,
//!   schema-described operations with synchronous/asynchronous execution and
//!   uniform result/error envelopes.
//!
//! The transport that carries invocations between the automation process and
//! an instance is out of scope; an entry only records the pipe name a client
//! should connect to.

pub mod error;
pub mod registry;
pub mod time;
pub mod tools;

// Re-export primary types
pub use error::{Result, VisionError};
pub use registry::{DiscoveryQuery, HeartbeatScheduler, InstanceEntry, InstanceInfo, RegistryStore};
pub use tools::{
    CompletionSlot, DispatchErrorKind, Dispatcher, Envelope, ParameterKind, ToolCatalog,
    ToolDescriptor, ToolDescriptorBuilder, ToolHandler, ToolParameter,
};
