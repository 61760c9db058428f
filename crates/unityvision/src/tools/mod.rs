//! Tool dispatch subsystem.
//!
//! A catalog of named, schema-described operations plus a dispatcher that
//! resolves a name, runs the handler (synchronously or via a completion
//! slot), and normalizes every outcome into a success or error envelope.
//!
//! # Modules
//!
//! - [`descriptor`] — [`ToolDescriptor`] schema/metadata and its builder.
//! - [`catalog`] — [`ToolCatalog`], the name → descriptor map.
//! - [`dispatch`] — [`Dispatcher`], handlers, completion slots, envelopes.

pub mod catalog;
pub mod descriptor;
pub mod dispatch;

pub use catalog::ToolCatalog;
pub use descriptor::{ParameterKind, ToolDescriptor, ToolDescriptorBuilder, ToolParameter};
pub use dispatch::{CompletionSlot, DispatchErrorKind, Dispatcher, Envelope, ToolHandler};
