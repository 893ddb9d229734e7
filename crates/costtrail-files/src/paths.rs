//! Path resolution for task logs, configuration and CSV output

use costtrail_core::extract::format_timestamp_for_filename;
use costtrail_core::Config;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static TASK_ID_RE: OnceLock<Regex> = OnceLock::new();

/// Global storage of the agent extension, relative to the platform config dir
const AGENT_TASKS_SUBPATH: [&str; 5] = [
    "Code",
    "User",
    "globalStorage",
    "saoudrizwan.claude-dev",
    "tasks",
];

/// Resolves standard paths for configuration and agent task logs
#[derive(Debug, Clone)]
pub struct Paths {
    /// Platform config dir; absent on systems without one
    pub config_dir: Option<PathBuf>,
    pub tasks_dir: PathBuf,
}

impl Paths {
    /// Resolve paths, preferring the configured tasks directory
    pub fn new(config: &Config) -> std::io::Result<Self> {
        Self::with_config_dir(config, dirs::config_dir())
    }

    /// The platform config dir is only required when no tasks directory is configured
    pub fn with_config_dir(config: &Config, config_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let tasks_dir = match (&config.tasks_dir, &config_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(base)) => default_tasks_dir(base),
            (None, None) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "config directory not found and no tasks directory configured",
                ))
            }
        };

        Ok(Self {
            config_dir,
            tasks_dir,
        })
    }

    /// Get config.json path
    pub fn config_file(&self) -> Option<PathBuf> {
        self.config_dir.as_deref().map(config_file_in)
    }

    /// Log file of one task
    pub fn task_log(&self, task_id: &str, log_file_name: &str) -> PathBuf {
        self.tasks_dir.join(task_id).join(log_file_name)
    }

    /// Log file of the most recently modified task
    pub fn latest_task_log(&self, log_file_name: &str) -> std::io::Result<Option<PathBuf>> {
        Ok(latest_task_id(&self.tasks_dir)?.map(|id| self.task_log(&id, log_file_name)))
    }
}

fn config_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join("costtrail").join("config.json")
}

pub fn default_tasks_dir(config_dir: &Path) -> PathBuf {
    AGENT_TASKS_SUBPATH
        .iter()
        .fold(config_dir.to_path_buf(), |path, part| path.join(part))
}

/// Load configuration from the config file, then apply environment overrides
pub fn load_config() -> Config {
    let mut config = dirs::config_dir()
        .map(|dir| config_file_in(&dir))
        .filter(|path| path.exists())
        .and_then(|path| std::fs::read_to_string(path).ok())
        .map(|content| Config::from_json(&content))
        .unwrap_or_default();

    config.apply_env(|key| std::env::var(key).ok());
    config
}

/// Task id from a `tasks/<digits>/` path segment, or `"unknown"`
pub fn extract_task_id(path: &Path) -> String {
    let re = TASK_ID_RE.get_or_init(|| Regex::new(r"tasks[/\\]([0-9]+)[/\\]").unwrap());
    let path_str = path.to_string_lossy();
    re.captures(&path_str)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `task_<id>_<YYYY-MM-DD_HH-MM-SS>_costs.csv`
pub fn output_file_name(task_id: &str, start_millis: i64) -> String {
    format!(
        "task_{}_{}_costs.csv",
        task_id,
        format_timestamp_for_filename(start_millis)
    )
}

/// Task id parsed back from an output file name
pub fn task_id_from_file_name(file_name: &str) -> Option<&str> {
    if !file_name.starts_with("task_") || !file_name.ends_with("_costs.csv") {
        return None;
    }
    file_name.split('_').nth(1).filter(|id| !id.is_empty())
}

/// Name of the most recently modified directory under `tasks_dir`
pub fn latest_task_id(tasks_dir: &Path) -> std::io::Result<Option<String>> {
    let mut latest: Option<(std::time::SystemTime, String)> = None;

    for entry in std::fs::read_dir(tasks_dir)?.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_dir() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
            latest = Some((modified, entry.file_name().to_string_lossy().into_owned()));
        }
    }

    Ok(latest.map(|(_, name)| name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_extract_task_id() {
        let path = Path::new("/home/u/globalStorage/tasks/1718000000000/ui_messages.json");
        assert_eq!(extract_task_id(path), "1718000000000");
    }

    #[test]
    fn test_extract_task_id_unknown() {
        assert_eq!(extract_task_id(Path::new("/tmp/ui_messages.json")), "unknown");
        assert_eq!(
            extract_task_id(Path::new("/tmp/tasks/abc/ui_messages.json")),
            "unknown"
        );
    }

    #[test]
    fn test_output_file_name() {
        let name = output_file_name("42", 1_700_000_000_000);
        assert!(name.starts_with("task_42_"));
        assert!(name.ends_with("_costs.csv"));
        assert!(name.contains(&format_timestamp_for_filename(1_700_000_000_000)));
    }

    #[test]
    fn test_task_id_from_file_name() {
        assert_eq!(
            task_id_from_file_name("task_42_2024-01-01_10-00-00_costs.csv"),
            Some("42")
        );
        assert_eq!(task_id_from_file_name("notes.csv"), None);
    }

    #[test]
    fn test_default_tasks_dir() {
        let dir = default_tasks_dir(Path::new("/cfg"));
        assert!(dir.ends_with("saoudrizwan.claude-dev/tasks"));
        assert!(dir.starts_with("/cfg/Code/User"));
    }

    #[test]
    fn test_paths_prefers_configured_tasks_dir() {
        let mut config = Config::new();
        config.tasks_dir = Some(PathBuf::from("/data/tasks"));
        let paths = Paths::new(&config).unwrap();
        assert_eq!(paths.tasks_dir, PathBuf::from("/data/tasks"));
        assert_eq!(
            paths.task_log("7", "ui_messages.json"),
            PathBuf::from("/data/tasks/7/ui_messages.json")
        );
        if let Some(file) = paths.config_file() {
            assert!(file.ends_with("costtrail/config.json"));
        }
    }

    #[test]
    fn test_paths_without_config_dir() {
        let mut config = Config::new();
        config.tasks_dir = Some(PathBuf::from("/data/tasks"));
        let paths = Paths::with_config_dir(&config, None).unwrap();
        assert_eq!(paths.tasks_dir, PathBuf::from("/data/tasks"));
        assert_eq!(paths.config_file(), None);

        let err = Paths::with_config_dir(&Config::new(), None).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_latest_task_log() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("300")).unwrap();
        let mut config = Config::new();
        config.tasks_dir = Some(temp.path().to_path_buf());

        let paths = Paths::with_config_dir(&config, None).unwrap();
        assert_eq!(
            paths.latest_task_log("ui_messages.json").unwrap(),
            Some(temp.path().join("300").join("ui_messages.json"))
        );
    }

    #[test]
    fn test_latest_task_id() {
        let temp = tempfile::TempDir::new().unwrap();
        let older = temp.path().join("100");
        let newer = temp.path().join("200");
        std::fs::create_dir_all(&older).unwrap();
        std::fs::create_dir_all(&newer).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert_eq!(latest_task_id(temp.path()).unwrap(), Some("200".to_string()));
    }

    #[test]
    fn test_latest_task_id_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(latest_task_id(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_latest_task_id_missing_root() {
        assert!(latest_task_id(Path::new("/nonexistent/costtrail/tasks")).is_err());
    }
}
