//! Configuration for conversion and watching

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Log file written by the agent in each task directory
pub const UI_MESSAGES_FILE: &str = "ui_messages.json";

/// Directory under the output base that receives CSV files
pub const LOGS_DIR: &str = "logs";

const DEFAULT_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_OUTPUT_SUBDIR: &str = "ui-log-parser";

/// Settings shared by the converter, watcher and server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent tasks root (platform default when unset)
    pub tasks_dir: Option<PathBuf>,

    /// File name that qualifies a change event
    pub log_file_name: String,

    /// Quiet window before a changed log is converted
    pub debounce_ms: u64,

    /// Directory joined onto the resolved repository root
    pub output_subdir: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            tasks_dir: None,
            log_file_name: UI_MESSAGES_FILE.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            output_subdir: DEFAULT_OUTPUT_SUBDIR.to_string(),
        }
    }

    /// Parse a JSON config document; invalid content yields defaults
    pub fn from_json(content: &str) -> Self {
        match serde_json::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid config file");
                Self::new()
            }
        }
    }

    /// Apply `COSTTRAIL_*` overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("COSTTRAIL_TASKS_DIR").filter(|v| !v.is_empty()) {
            self.tasks_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = lookup("COSTTRAIL_DEBOUNCE_MS") {
            match ms.parse() {
                Ok(ms) => self.debounce_ms = ms,
                Err(_) => tracing::warn!(value = %ms, "ignoring invalid COSTTRAIL_DEBOUNCE_MS"),
            }
        }
        if let Some(subdir) = lookup("COSTTRAIL_OUTPUT_SUBDIR") {
            self.output_subdir = subdir;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-run pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Stamp records with the working directory found in the log
    pub include_working_directory: bool,

    /// Base directory; CSV files land in `<output_base>/logs`
    pub output_base: PathBuf,
}

impl PipelineOptions {
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        Self {
            include_working_directory: false,
            output_base: output_base.into(),
        }
    }

    pub fn with_working_directory(mut self, include: bool) -> Self {
        self.include_working_directory = include;
        self
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output_base.join(LOGS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.log_file_name, "ui_messages.json");
        assert_eq!(config.debounce(), Duration::from_secs(1));
        assert_eq!(config.output_subdir, "ui-log-parser");
        assert!(config.tasks_dir.is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(r#"{"debounce_ms": 250}"#);
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.log_file_name, "ui_messages.json");
    }

    #[test]
    fn test_from_json_invalid_returns_defaults() {
        let config = Config::from_json("{not json");
        assert_eq!(config.debounce_ms, 1000);
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = [
            ("COSTTRAIL_TASKS_DIR", "/tmp/tasks"),
            ("COSTTRAIL_DEBOUNCE_MS", "50"),
            ("COSTTRAIL_OUTPUT_SUBDIR", "costs"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::new();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.tasks_dir, Some(PathBuf::from("/tmp/tasks")));
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.output_subdir, "costs");
    }

    #[test]
    fn test_apply_env_ignores_bad_debounce() {
        let mut config = Config::new();
        config.apply_env(|key| (key == "COSTTRAIL_DEBOUNCE_MS").then(|| "soon".to_string()));
        assert_eq!(config.debounce_ms, 1000);
    }

    #[test]
    fn test_pipeline_options_logs_dir() {
        let options = PipelineOptions::new("/repo/ui-log-parser").with_working_directory(true);
        assert!(options.include_working_directory);
        assert_eq!(options.logs_dir(), PathBuf::from("/repo/ui-log-parser/logs"));
    }
}
