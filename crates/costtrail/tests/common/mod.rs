use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const START_TS: i64 = 1_700_000_000_000;

/// A short but realistic task log: request, two API calls, a tool ask, completion
pub fn sample_log() -> Value {
    json!([
        {"type": "say", "say": "text", "text": "Add a CSV exporter", "ts": START_TS},
        {"type": "say", "say": "api_req_started", "text": "{\"cost\": 0.0123, \"inputTokens\": 1200}", "ts": START_TS + 1_000},
        {"type": "ask", "ask": "tool", "text": "{\"tool\":\"readFile\",\"path\":\"src/main.rs\"}", "ts": START_TS + 2_000},
        {"type": "say", "say": "user_feedback", "text": "looks good, see the image", "ts": START_TS + 3_000},
        {"type": "say", "say": "api_req_started", "text": "{\"cost\": 0.02, \"tokensIn\": 800}", "ts": START_TS + 4_000},
        {"type": "say", "say": "api_req_started", "text": "{\"cost\": 0.005}", "ts": START_TS + 5_000},
        {"type": "say", "say": "completion_result", "text": "Task finished at 45% context", "ts": START_TS + 6_000}
    ])
}

/// Write `log` as `<root>/tasks/<task_id>/ui_messages.json`
pub fn write_task_log(root: &Path, task_id: &str, log: &Value) -> PathBuf {
    let dir = root.join("tasks").join(task_id);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ui_messages.json");
    std::fs::write(&path, serde_json::to_vec(log).unwrap()).unwrap();
    path
}

pub fn csv_files(logs_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(logs_dir)
        .map(|entries| entries.flatten().map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}
