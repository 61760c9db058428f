//! Dispatcher — resolve a tool name, run its handler, normalize the outcome.
//!
//! `execute` never surfaces a raw fault to its caller: every path produces
//! either a success envelope or an error envelope.
//!
//! ```json
//! { "success": true, "result": { "scene": "Main" } }
//! { "error": { "type": "unknown_tool", "message": "unknown tool: nope" } }
//! ```
//!
//! Synchronous handlers return a `Result` directly. Asynchronous handlers
//! are handed a single-assignment [`CompletionSlot`] which they must
//! eventually resolve or reject; `execute` suspends until the slot settles
//! and imposes **no timeout** — a caller layering a timeout over `execute`
//! must treat it as "abandon waiting", not as termination of the handler.

use std::collections::HashMap;

use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::tools::catalog::ToolCatalog;
use crate::tools::descriptor::ToolDescriptor;

// ── Envelopes ─────────────────────────────────────────────────────────────────

/// Error envelope categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// No descriptor registered under the requested name.
    UnknownTool,
    /// A required parameter was missing or the arguments were not an object.
    InvalidArguments,
    /// The handler ran and raised a fault.
    ExecutionError,
    /// The handler contract was not honored (no handler registered for a
    /// cataloged tool, or a completion slot dropped unresolved).
    ImplementationError,
}

impl DispatchErrorKind {
    /// Wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::ExecutionError => "execution_error",
            Self::ImplementationError => "implementation_error",
        }
    }
}

/// Uniform result shape returned by every dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success { result: Value },
    Error { kind: DispatchErrorKind, message: String },
}

impl Envelope {
    pub fn success(result: Value) -> Self {
        Self::Success { result }
    }

    pub fn error(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Wire form of the envelope.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success { result } => json!({ "success": true, "result": result }),
            Self::Error { kind, message } => json!({
                "error": { "type": kind.as_str(), "message": message }
            }),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// Single-assignment completion slot handed to asynchronous handlers.
///
/// The handler must eventually call [`CompletionSlot::resolve`] or
/// [`CompletionSlot::reject`]; dropping the slot unresolved is a contract
/// violation surfaced to the caller as an `implementation_error`. A handler
/// that holds the slot forever suspends the dispatch indefinitely.
pub struct CompletionSlot {
    tx: oneshot::Sender<std::result::Result<Value, String>>,
}

impl CompletionSlot {
    /// Complete the dispatch with a success value.
    pub fn resolve(self, result: Value) {
        // The receiver only disappears if the dispatch caller abandoned the
        // await; nothing useful to do with the value then.
        let _ = self.tx.send(Ok(result));
    }

    /// Complete the dispatch with a fault message.
    pub fn reject(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(message.into()));
    }
}

/// Boxed synchronous handler.
pub type SyncHandler = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Boxed asynchronous handler. Receives the arguments and the slot it must
/// settle; typically spawns work and returns immediately.
pub type AsyncHandler = Box<dyn Fn(Value, CompletionSlot) + Send + Sync>;

/// Execution half of a registered tool.
pub enum ToolHandler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

impl ToolHandler {
    /// Convenience constructor for synchronous handlers.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Sync(Box::new(f))
    }

    /// Convenience constructor for asynchronous handlers.
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: Fn(Value, CompletionSlot) + Send + Sync + 'static,
    {
        Self::Async(Box::new(f))
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Resolves operation names against a [`ToolCatalog`] and executes them.
#[derive(Default)]
pub struct Dispatcher {
    catalog: ToolCatalog,
    handlers: HashMap<String, ToolHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor together with its handler.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::InvalidArgument` for an empty descriptor name.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: ToolHandler) -> Result<()> {
        let name = descriptor.name.clone();
        self.catalog.register(descriptor)?;
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Register an explicit list of tools. This is the catalog population
    /// strategy used at startup; it produces identical catalog semantics to
    /// registering each tool manually.
    pub fn register_many(
        &mut self,
        tools: impl IntoIterator<Item = (ToolDescriptor, ToolHandler)>,
    ) -> Result<()> {
        for (descriptor, handler) in tools {
            self.register(descriptor, handler)?;
        }
        Ok(())
    }

    /// Remove a tool and its handler. Returns whether anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name);
        self.catalog.unregister(name)
    }

    /// The underlying catalog, e.g. for schema export.
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Mutable catalog access, for advertising a descriptor ahead of its
    /// implementation. Executing such a tool yields an
    /// `implementation_error` envelope.
    pub fn catalog_mut(&mut self) -> &mut ToolCatalog {
        &mut self.catalog
    }

    /// Execute a tool by name. Always returns an envelope, never a fault.
    pub async fn execute(&self, name: &str, arguments: Value) -> Envelope {
        let Some(descriptor) = self.catalog.resolve(name) else {
            return Envelope::error(
                DispatchErrorKind::UnknownTool,
                format!("unknown tool: {name}"),
            );
        };

        if let Err(message) = validate_arguments(descriptor, &arguments) {
            return Envelope::error(DispatchErrorKind::InvalidArguments, message);
        }

        let Some(handler) = self.handlers.get(name) else {
            // Cataloged but never wired up: the registering code broke the
            // handler contract.
            return Envelope::error(
                DispatchErrorKind::ImplementationError,
                format!("tool '{name}' has no registered handler"),
            );
        };

        match handler {
            ToolHandler::Sync(f) => match f(&arguments) {
                Ok(result) => Envelope::success(result),
                Err(e) => Envelope::error(DispatchErrorKind::ExecutionError, e.to_string()),
            },
            ToolHandler::Async(f) => {
                let (tx, rx) = oneshot::channel();
                f(arguments, CompletionSlot { tx });
                match rx.await {
                    Ok(Ok(result)) => Envelope::success(result),
                    Ok(Err(message)) => {
                        Envelope::error(DispatchErrorKind::ExecutionError, message)
                    }
                    Err(_) => Envelope::error(
                        DispatchErrorKind::ImplementationError,
                        format!("tool '{name}' dropped its completion slot unresolved"),
                    ),
                }
            }
        }
    }
}

/// Check the arguments object against the descriptor before invoking the
/// handler: it must be an object (or null, read as empty), and every
/// required parameter must be present.
fn validate_arguments(
    descriptor: &ToolDescriptor,
    arguments: &Value,
) -> std::result::Result<(), String> {
    let empty = serde_json::Map::new();

    let object = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(format!(
                "arguments must be an object, got {}",
                json_type_name(other)
            ))
        }
    };

    for parameter in descriptor.parameters.iter().filter(|p| p.required) {
        if !object.contains_key(&parameter.name) {
            return Err(format!("missing required parameter: {}", parameter.name));
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::tools::descriptor::{ParameterKind, ToolParameter};
    use serde_json::json;

    fn ping_descriptor() -> ToolDescriptor {
        ToolDescriptor::builder("editor_ping", "Liveness probe.").build()
    }

    fn dispatcher_with_ping() -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ping_descriptor(),
                ToolHandler::sync(|_| Ok(json!({ "pong": true }))),
            )
            .unwrap();
        dispatcher
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dispatcher = Dispatcher::new();
        let envelope = dispatcher.execute("nope", json!({})).await;

        assert_eq!(
            envelope.to_json()["error"]["type"],
            "unknown_tool",
            "unexpected envelope: {envelope:?}"
        );
    }

    #[tokio::test]
    async fn test_sync_success() {
        let dispatcher = dispatcher_with_ping();
        let envelope = dispatcher.execute("editor_ping", json!({})).await;

        let wire = envelope.to_json();
        assert_eq!(wire["success"], true);
        assert_eq!(wire["result"]["pong"], true);
    }

    #[tokio::test]
    async fn test_sync_fault_becomes_execution_error() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("boom", "Always fails.").build(),
                ToolHandler::sync(|_| Err(VisionError::Execution("scene not loaded".to_string()))),
            )
            .unwrap();

        let wire = dispatcher.execute("boom", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "execution_error");
        assert_eq!(wire["error"]["message"], "scene not loaded");
    }

    #[tokio::test]
    async fn test_null_arguments_read_as_empty() {
        let dispatcher = dispatcher_with_ping();
        let envelope = dispatcher.execute("editor_ping", Value::Null).await;
        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let dispatcher = dispatcher_with_ping();
        let wire = dispatcher.execute("editor_ping", json!([1, 2])).await.to_json();

        assert_eq!(wire["error"]["type"], "invalid_arguments");
    }

    #[tokio::test]
    async fn test_missing_required_parameter_rejected_before_handler() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("asset_import", "Import an asset.")
                    .parameter(ToolParameter::required(
                        "path",
                        "Asset path",
                        ParameterKind::String,
                    ))
                    .build(),
                ToolHandler::sync(|_| panic!("handler must not run")),
            )
            .unwrap();

        let wire = dispatcher.execute("asset_import", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "invalid_arguments");
        assert_eq!(
            wire["error"]["message"],
            "missing required parameter: path"
        );
    }

    #[tokio::test]
    async fn test_optional_parameter_may_be_absent() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("scene_info", "Describe the scene.")
                    .parameter(ToolParameter::optional(
                        "verbose",
                        "Include hierarchy",
                        ParameterKind::Boolean,
                        Some(json!(false)),
                    ))
                    .build(),
                ToolHandler::sync(|_| Ok(json!(null))),
            )
            .unwrap();

        assert!(dispatcher.execute("scene_info", json!({})).await.is_success());
    }

    #[tokio::test]
    async fn test_async_resolve() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("delayed_echo", "Echo later.")
                    .asynchronous()
                    .build(),
                ToolHandler::asynchronous(|arguments, slot| {
                    tokio::spawn(async move {
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        slot.resolve(json!({ "echo": arguments["message"] }));
                    });
                }),
            )
            .unwrap();

        let wire = dispatcher
            .execute("delayed_echo", json!({ "message": "hi" }))
            .await
            .to_json();
        assert_eq!(wire["success"], true);
        assert_eq!(wire["result"]["echo"], "hi");
    }

    #[tokio::test]
    async fn test_async_reject_becomes_execution_error() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("build_player", "Build.").asynchronous().build(),
                ToolHandler::asynchronous(|_, slot| slot.reject("build pipeline busy")),
            )
            .unwrap();

        let wire = dispatcher.execute("build_player", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "execution_error");
        assert_eq!(wire["error"]["message"], "build pipeline busy");
    }

    #[tokio::test]
    async fn test_dropped_slot_becomes_implementation_error() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("broken", "Drops its slot.").asynchronous().build(),
                ToolHandler::asynchronous(|_, slot| drop(slot)),
            )
            .unwrap();

        let wire = dispatcher.execute("broken", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "implementation_error");
    }

    #[tokio::test]
    async fn test_polling_descriptor_is_ordinary_dispatch() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(
                ToolDescriptor::builder("asset_import", "Import an asset.")
                    .polling("asset_import_status")
                    .build(),
                ToolHandler::sync(|_| Ok(json!({ "accepted": true }))),
            )
            .unwrap();
        dispatcher
            .register(
                ToolDescriptor::builder("asset_import_status", "Poll an import.").build(),
                ToolHandler::sync(|_| Ok(json!({ "done": false }))),
            )
            .unwrap();

        assert!(dispatcher.execute("asset_import", json!({})).await.is_success());
        assert!(dispatcher
            .execute("asset_import_status", json!({}))
            .await
            .is_success());
    }

    #[tokio::test]
    async fn test_descriptor_without_handler_is_implementation_error() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .catalog_mut()
            .register(ToolDescriptor::builder("announced_only", "Not wired up.").build())
            .unwrap();

        let wire = dispatcher.execute("announced_only", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "implementation_error");
    }

    #[tokio::test]
    async fn test_unregister_makes_tool_unknown() {
        let mut dispatcher = dispatcher_with_ping();
        assert!(dispatcher.unregister("editor_ping"));

        let wire = dispatcher.execute("editor_ping", json!({})).await.to_json();
        assert_eq!(wire["error"]["type"], "unknown_tool");
    }

    #[test]
    fn test_envelope_wire_shapes() {
        let ok = Envelope::success(json!(null)).to_json();
        assert_eq!(ok, json!({ "success": true, "result": null }));

        let err = Envelope::error(DispatchErrorKind::UnknownTool, "m").to_json();
        assert_eq!(err, json!({ "error": { "type": "unknown_tool", "message": "m" } }));
    }
}
