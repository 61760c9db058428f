//! UnityVision CLI — `uvctl` command.
//!
//! Read side of the bridge for the automation process (list and sweep the
//! shared instance registry) plus a reference `agent` mode that runs the
//! full instance lifecycle: register, heartbeat, serve tool invocations as
//! newline-delimited JSON on stdin/stdout, deactivate on shutdown.
//!
//! # Agent wire protocol
//!
//! One request per line on stdin:
//!
//! ```json
//! {"tool": "editor_ping", "arguments": {}}
//! ```
//!
//! One envelope per line on stdout:
//!
//! ```json
//! {"success": true, "result": {"pong": true}}
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use unityvision::registry::{DEFAULT_ACTIVE_THRESHOLD_SECS, DEFAULT_EVICT_THRESHOLD_SECS};
use unityvision::{
    DiscoveryQuery, Dispatcher, HeartbeatScheduler, InstanceInfo, ParameterKind, RegistryStore,
    ToolDescriptor, ToolHandler, ToolParameter, VisionError,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// UnityVision CLI — inspect the instance discovery registry and run a
/// reference agent.
#[derive(Parser, Debug)]
#[command(name = "uvctl", about = "UnityVision bridge CLI", version)]
struct Cli {
    /// Registry file to operate on (default: ~/.unityvision/projects.json)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every registry entry, active or not
    List,

    /// Print entries that are active and fresh
    Active {
        /// Staleness threshold in seconds
        #[arg(long, default_value_t = DEFAULT_ACTIVE_THRESHOLD_SECS)]
        threshold: i64,
    },

    /// Delete inactive entries older than the threshold
    Evict {
        /// Staleness threshold in seconds
        #[arg(long, default_value_t = DEFAULT_EVICT_THRESHOLD_SECS)]
        threshold: i64,

        /// Project path to preserve regardless of state
        #[arg(long, default_value = "")]
        keep: String,
    },

    /// Register as an instance and serve tool invocations on stdin/stdout
    Agent {
        /// Project path to register under (the instance identity)
        #[arg(long)]
        project: String,

        /// Pipe name to advertise (default: unityvision-<pid>)
        #[arg(long)]
        pipe: Option<String>,

        /// Legacy TCP port to advertise
        #[arg(long)]
        port: Option<u16>,

        /// Editor version string to advertise
        #[arg(long, default_value = "2022.3.14f1")]
        unity_version: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = cli
        .registry
        .map(RegistryStore::new)
        .unwrap_or_else(RegistryStore::open_default);

    match cli.command {
        Commands::List => {
            let entries = DiscoveryQuery::new(store).list_all();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Active { threshold } => {
            let entries = DiscoveryQuery::new(store).list_active(threshold);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Evict { threshold, keep } => {
            let query = DiscoveryQuery::new(store);
            query.evict_stale(threshold, &keep);
            println!("{}", serde_json::to_string_pretty(&query.list_all())?);
        }
        Commands::Agent {
            project,
            pipe,
            port,
            unity_version,
        } => {
            let pipe = pipe.unwrap_or_else(|| format!("unityvision-{}", std::process::id()));
            run_agent(store, project, pipe, port, unity_version).await?;
        }
    }

    Ok(())
}

// ── Agent loop ────────────────────────────────────────────────────────────────

async fn run_agent(
    store: RegistryStore,
    project: String,
    pipe: String,
    port: Option<u16>,
    unity_version: String,
) -> Result<()> {
    let mut heartbeat = HeartbeatScheduler::new(
        store.clone(),
        InstanceInfo {
            project_path: project.clone(),
            pipe_name: pipe,
            port,
            unity_version,
        },
    );
    heartbeat.register_or_update();

    let mut dispatcher = Dispatcher::new();
    dispatcher.register_many(builtin_tools(store.clone()))?;

    // First line out: the tool schema, so a connecting client knows what it
    // can call.
    println!(
        "{}",
        json!({ "tools": dispatcher.catalog().export_schema() })
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                heartbeat.tick();
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, deactivating");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    None => break,
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        println!("{}", handle_request(&dispatcher, &line).await);
                    }
                }
            }
        }
    }

    heartbeat.deactivate();
    DiscoveryQuery::new(store).evict_stale(DEFAULT_EVICT_THRESHOLD_SECS, &project);
    Ok(())
}

/// Parse one request line and run it through the dispatcher. Malformed
/// requests get an error envelope too; the agent never emits a non-envelope
/// reply.
async fn handle_request(dispatcher: &Dispatcher, line: &str) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return json!({
                "error": { "type": "invalid_arguments", "message": format!("malformed request: {e}") }
            });
        }
    };

    let name = request["tool"].as_str().unwrap_or_default();
    let arguments = request.get("arguments").cloned().unwrap_or(Value::Null);
    dispatcher.execute(name, arguments).await.to_json()
}

// ── Built-in tools ────────────────────────────────────────────────────────────

/// The agent's explicit tool registration list. Each entry pairs a
/// descriptor with its handler; adding a tool means adding a line here.
fn builtin_tools(store: RegistryStore) -> Vec<(ToolDescriptor, ToolHandler)> {
    let snapshot_store = store.clone();

    vec![
        (
            ToolDescriptor::builder("editor_ping", "Liveness probe; returns immediately.").build(),
            ToolHandler::sync(|_| Ok(json!({ "pong": true, "pid": std::process::id() }))),
        ),
        (
            ToolDescriptor::builder(
                "registry_snapshot",
                "Report the discovery registry as this instance sees it.",
            )
            .parameter(ToolParameter::optional(
                "active_only",
                "Only include active, fresh instances",
                ParameterKind::Boolean,
                Some(json!(false)),
            ))
            .build(),
            ToolHandler::sync(move |arguments| {
                let query = DiscoveryQuery::new(snapshot_store.clone());
                let entries = if arguments["active_only"].as_bool().unwrap_or(false) {
                    query.list_active(DEFAULT_ACTIVE_THRESHOLD_SECS)
                } else {
                    query.list_all()
                };
                serde_json::to_value(entries)
                    .map_err(|e| VisionError::SerializationError(e.to_string()))
            }),
        ),
        (
            ToolDescriptor::builder("delayed_echo", "Echo a message after a delay.")
                .parameter(ToolParameter::required(
                    "message",
                    "Text to echo back",
                    ParameterKind::String,
                ))
                .parameter(ToolParameter::optional(
                    "delay_ms",
                    "Delay before responding, in milliseconds",
                    ParameterKind::Number,
                    Some(json!(100)),
                ))
                .asynchronous()
                .build(),
            ToolHandler::asynchronous(|arguments, slot| {
                let delay = arguments["delay_ms"].as_u64().unwrap_or(100);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    match arguments["message"].as_str() {
                        Some(message) => slot.resolve(json!({ "echo": message })),
                        None => slot.reject("message must be a string"),
                    }
                });
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
        let store = RegistryStore::new(dir.path().join("projects.json"));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register_many(builtin_tools(store)).unwrap();
        dispatcher
    }

    #[tokio::test]
    async fn test_builtins_register_cleanly() {
        let dir = tempdir().unwrap();
        let dispatcher = test_dispatcher(&dir);
        assert_eq!(dispatcher.catalog().len(), 3);
    }

    #[tokio::test]
    async fn test_handle_request_ping() {
        let dir = tempdir().unwrap();
        let dispatcher = test_dispatcher(&dir);

        let reply =
            handle_request(&dispatcher, r#"{"tool": "editor_ping", "arguments": {}}"#).await;
        assert_eq!(reply["success"], true);
        assert_eq!(reply["result"]["pong"], true);
    }

    #[tokio::test]
    async fn test_handle_request_malformed_line() {
        let dir = tempdir().unwrap();
        let dispatcher = test_dispatcher(&dir);

        let reply = handle_request(&dispatcher, "not json at all").await;
        assert_eq!(reply["error"]["type"], "invalid_arguments");
    }

    #[tokio::test]
    async fn test_handle_request_missing_tool_field() {
        let dir = tempdir().unwrap();
        let dispatcher = test_dispatcher(&dir);

        let reply = handle_request(&dispatcher, r#"{"arguments": {}}"#).await;
        assert_eq!(reply["error"]["type"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_delayed_echo_roundtrip() {
        let dir = tempdir().unwrap();
        let dispatcher = test_dispatcher(&dir);

        let reply = handle_request(
            &dispatcher,
            r#"{"tool": "delayed_echo", "arguments": {"message": "hi", "delay_ms": 1}}"#,
        )
        .await;
        assert_eq!(reply["result"]["echo"], "hi");
    }

    #[tokio::test]
    async fn test_registry_snapshot_sees_entries() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("projects.json"));

        HeartbeatScheduler::new(
            store.clone(),
            InstanceInfo {
                project_path: "/projects/alpha".to_string(),
                pipe_name: "pipe-alpha".to_string(),
                port: None,
                unity_version: "2022.3".to_string(),
            },
        )
        .register_or_update();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register_many(builtin_tools(store)).unwrap();

        let reply = handle_request(
            &dispatcher,
            r#"{"tool": "registry_snapshot", "arguments": {"active_only": true}}"#,
        )
        .await;
        assert_eq!(reply["result"][0]["projectPath"], "/projects/alpha");
    }
}
