use costtrail_core::Config;
use costtrail_files::{
    convert_discovered, format_summary_report, format_task_list, latest_task_id, list_task_ids,
    summarize_logs, task_summary, Paths,
};
use costtrail_watch::WatchConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "costtrail";

/// Error code used for every failed request
const ERROR_CODE: i64 = -1;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code: ERROR_CODE,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolResult {
    content: Vec<TextContent>,
}

impl ToolResult {
    fn text(text: String) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
        }
    }
}

/// Request handling for the stdio protocol, independent of transport
pub struct Server {
    config: Config,
    paths: Paths,
    fallback_root: PathBuf,
    default_logs_dir: PathBuf,
}

impl Server {
    pub fn new(config: Config, paths: Paths, fallback_root: PathBuf) -> Self {
        let default_logs_dir = fallback_root
            .join(&config.output_subdir)
            .join(costtrail_core::LOGS_DIR);
        Self {
            config,
            paths,
            fallback_root,
            default_logs_dir,
        }
    }

    /// Handle one input line; `None` when nothing should be written back
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparseable message");
                return None;
            }
        };

        let response = self.handle_request(request)?;
        match serde_json::to_string(&response) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                None
            }
        }
    }

    fn handle_request(&self, request: Request) -> Option<Response> {
        tracing::debug!(method = %request.method, "received request");

        // Notifications carry no id and get no reply
        let Some(id) = request.id else {
            if !request.method.starts_with("notifications/") {
                tracing::debug!(method = %request.method, "ignoring request without id");
            }
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => Response::result(id, initialize_result()),
            "tools/list" => Response::result(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, &request.params),
            "ping" => Response::result(id, json!({})),
            other => Response::error(id, format!("unknown method: {}", other)),
        };
        Some(response)
    }

    fn handle_tools_call(&self, id: Value, params: &Value) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(id, "missing or invalid tool name");
        };
        let empty = Map::new();
        let arguments = params
            .get("arguments")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let outcome = match name {
            "generate_csv" => self.generate_csv(arguments),
            "get_cost_summary" => self.cost_summary(arguments),
            "list_tracked_tasks" => self.list_tracked_tasks(arguments),
            "get_current_task_costs" => self.current_task_costs(arguments),
            other => return Response::error(id, format!("unknown tool: {}", other)),
        };

        match outcome {
            Ok(text) => match serde_json::to_value(ToolResult::text(text)) {
                Ok(result) => Response::result(id, result),
                Err(e) => Response::error(id, e.to_string()),
            },
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                Response::error(id, e.to_string())
            }
        }
    }

    fn logs_dir(&self, arguments: &Map<String, Value>) -> PathBuf {
        string_arg(arguments, "logs_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_logs_dir.clone())
    }

    fn no_tasks(&self) -> anyhow::Error {
        anyhow::anyhow!("no tasks found in {}", self.paths.tasks_dir.display())
    }

    fn current_task_id(&self) -> anyhow::Result<String> {
        latest_task_id(&self.paths.tasks_dir)
            .map_err(|e| anyhow::anyhow!("failed to get current task ID: {}", e))?
            .ok_or_else(|| self.no_tasks())
    }

    fn generate_csv(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let input = match string_arg(arguments, "file_path") {
            Some(path) => PathBuf::from(path),
            None => self
                .paths
                .latest_task_log(&self.config.log_file_name)
                .map_err(|e| anyhow::anyhow!("failed to get current task ID: {}", e))?
                .ok_or_else(|| self.no_tasks())?,
        };
        if !input.exists() {
            anyhow::bail!("file does not exist: {}", input.display());
        }

        let report = convert_discovered(&input, &self.config, &self.fallback_root)?;
        Ok(format!(
            "Successfully processed task {} and generated CSV file at {}",
            report.task_id,
            report.output_path.display()
        ))
    }

    fn cost_summary(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let summaries = summarize_logs(&self.logs_dir(arguments))?;
        Ok(format_summary_report(&summaries))
    }

    fn list_tracked_tasks(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let ids = list_task_ids(&self.logs_dir(arguments))?;
        Ok(format_task_list(&ids))
    }

    fn current_task_costs(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
        let task_id = self.current_task_id()?;
        let Some(summary) = task_summary(&self.logs_dir(arguments), &task_id)? else {
            return Ok(format!(
                "No cost data found for current task {}. Run generate_csv to generate cost data.",
                task_id
            ));
        };

        Ok(format!(
            "Current Task Costs (Task ID: {})\nTotal Cost: ${:.6}\nTotal Messages: {}\nCSV File: {}\nLast Updated: {}\n",
            summary.task_id,
            summary.total_cost,
            summary.message_count,
            summary.csv_path.display(),
            summary.last_updated
        ))
    }
}

fn string_arg<'a>(arguments: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": true } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
    })
}

fn logs_dir_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "logs_dir": {
                "type": "string",
                "description": description,
            }
        }
    })
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "generate_csv",
            "description": "Generate CSV file with cost tracking data from ui_messages.json file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to ui_messages.json file (optional, defaults to current task)",
                    }
                }
            }
        },
        {
            "name": "get_cost_summary",
            "description": "Summarize total cost and message counts across all tracked tasks",
            "inputSchema": logs_dir_schema("Directory holding generated CSV files (optional)"),
        },
        {
            "name": "list_tracked_tasks",
            "description": "List task ids that have generated cost CSVs",
            "inputSchema": logs_dir_schema("Directory holding generated CSV files (optional)"),
        },
        {
            "name": "get_current_task_costs",
            "description": "Show costs for the most recently active task",
            "inputSchema": logs_dir_schema("Directory holding generated CSV files (optional)"),
        }
    ])
}

fn write_line(line: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

async fn message_loop(server: Arc<Server>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let server = Arc::clone(&server);
        let reply = tokio::task::spawn_blocking(move || server.handle_line(&line)).await?;
        if let Some(reply) = reply {
            write_line(&reply)?;
        }
    }

    // The watcher keeps running after the client goes away
    tracing::info!("client disconnected (EOF), still watching until interrupted");
    std::future::pending::<()>().await;
    Ok(())
}

pub fn run(tasks_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(tasks_dir);
    let paths = Paths::new(&config)?;
    let fallback_root = std::env::current_dir()?;

    let watch_config = WatchConfig {
        root: paths.tasks_dir.clone(),
        log_file_name: config.log_file_name.clone(),
        debounce: config.debounce(),
    };
    let handler = super::conversion_handler(config.clone(), fallback_root.clone());
    let server = Arc::new(Server::new(config, paths, fallback_root));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let watcher = match costtrail_watch::start(watch_config, handler) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "file watcher unavailable, serving requests only");
                None
            }
        };
        tracing::info!("server ready");

        let outcome = tokio::select! {
            result = message_loop(server) => result,
            signal = tokio::signal::ctrl_c() => {
                tracing::info!("received interrupt, shutting down");
                signal.map_err(anyhow::Error::from)
            }
        };

        if let Some(watcher) = watcher {
            watcher.shutdown().await;
        }
        outcome
    })
}
