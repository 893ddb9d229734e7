pub mod convert;
pub mod serve;
pub mod summary;
pub mod tasks;
pub mod version;
pub mod watch;

use costtrail_core::{Config, LOGS_DIR};
use costtrail_watch::Handler;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file and environment, then the `--tasks-dir` flag on top
pub(crate) fn load_config(tasks_dir: Option<PathBuf>) -> Config {
    let mut config = costtrail_files::load_config();
    if tasks_dir.is_some() {
        config.tasks_dir = tasks_dir;
    }
    config
}

/// `<cwd>/<output_subdir>/logs`, where discovery falls back to when a log names no directory
pub(crate) fn default_logs_dir(config: &Config) -> anyhow::Result<PathBuf> {
    Ok(std::env::current_dir()?
        .join(&config.output_subdir)
        .join(LOGS_DIR))
}

pub(crate) fn resolve_logs_dir(logs_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match logs_dir {
        Some(dir) => Ok(dir),
        None => default_logs_dir(&costtrail_files::load_config()),
    }
}

/// Debounced work for the watcher: discovery conversion, failures logged
pub(crate) fn conversion_handler(config: Config, fallback_root: PathBuf) -> Handler {
    Arc::new(move |path: &Path| {
        match costtrail_files::convert_discovered(path, &config, &fallback_root) {
            Ok(report) => tracing::info!(
                task_id = %report.task_id,
                output = %report.output_path.display(),
                records = report.record_count,
                "CSV updated"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to process file"),
        }
    })
}
