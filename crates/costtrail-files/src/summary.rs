//! Summaries over previously generated cost CSVs

use crate::paths::task_id_from_file_name;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TOTAL_COST_COLUMN: &str = "Total cost";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("invalid CSV filename format: {}", .0.display())]
    FileName(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Totals of one generated CSV
#[derive(Debug, Clone)]
pub struct TaskSummary {
    pub task_id: String,
    pub total_cost: f64,
    pub message_count: usize,
    pub csv_path: PathBuf,
    pub last_updated: String,
}

/// Read a cost CSV: data row count and the last row's running total
pub fn analyze_csv(path: &Path) -> Result<TaskSummary, SummaryError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let task_id = task_id_from_file_name(file_name)
        .ok_or_else(|| SummaryError::FileName(path.to_path_buf()))?
        .to_string();

    let modified = std::fs::metadata(path)?.modified()?;
    let last_updated = DateTime::<Local>::from(modified)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let mut reader = csv::Reader::from_path(path)?;
    let total_index = reader
        .headers()?
        .iter()
        .position(|h| h == TOTAL_COST_COLUMN);

    let mut message_count = 0;
    let mut total_cost = 0.0;
    for row in reader.records() {
        let row = row?;
        message_count += 1;
        if let Some(value) = total_index.and_then(|i| row.get(i)) {
            total_cost = value.parse().unwrap_or(0.0);
        }
    }

    Ok(TaskSummary {
        task_id,
        total_cost,
        message_count,
        csv_path: path.to_path_buf(),
        last_updated,
    })
}

/// Cost CSVs in `logs_dir`, sorted by file name; a missing directory has none
pub fn find_cost_csvs(logs_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !logs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(logs_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(task_id_from_file_name)
                    .is_some()
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Summaries of every readable cost CSV, task id descending
pub fn summarize_logs(logs_dir: &Path) -> std::io::Result<Vec<TaskSummary>> {
    let mut summaries: Vec<TaskSummary> = find_cost_csvs(logs_dir)?
        .iter()
        .filter_map(|path| match analyze_csv(path) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable CSV");
                None
            }
        })
        .collect();
    summaries.sort_by(|a, b| b.task_id.cmp(&a.task_id));
    Ok(summaries)
}

/// Task ids with at least one CSV, descending
pub fn list_task_ids(logs_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut ids: Vec<String> = find_cost_csvs(logs_dir)?
        .iter()
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
        .filter_map(task_id_from_file_name)
        .map(str::to_string)
        .collect();
    ids.sort_by(|a, b| b.cmp(a));
    Ok(ids)
}

/// Most recent CSV of one task
pub fn task_summary(logs_dir: &Path, task_id: &str) -> Result<Option<TaskSummary>, SummaryError> {
    let latest = find_cost_csvs(logs_dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(task_id_from_file_name)
                == Some(task_id)
        })
        .next_back();

    latest.map(|path| analyze_csv(&path)).transpose()
}

/// Human-readable report over all summaries
pub fn format_summary_report(summaries: &[TaskSummary]) -> String {
    if summaries.is_empty() {
        return "No tracked tasks found. Run generate_csv to generate cost data.".to_string();
    }

    let total: f64 = summaries.iter().map(|s| s.total_cost).sum();
    let mut report = format!(
        "Cost Summary - Total Tracked Tasks: {}\nTotal Cost Across All Tasks: ${:.6}\n\n",
        summaries.len(),
        total
    );
    for summary in summaries {
        report.push_str(&format_task_block(summary));
        report.push('\n');
    }
    report
}

pub fn format_task_block(summary: &TaskSummary) -> String {
    format!(
        "Task ID: {}\n  Total Cost: ${:.6}\n  Messages: {}\n  CSV File: {}\n  Last Updated: {}\n",
        summary.task_id,
        summary.total_cost,
        summary.message_count,
        summary.csv_path.display(),
        summary.last_updated
    )
}

/// Numbered list of task ids
pub fn format_task_list(task_ids: &[String]) -> String {
    if task_ids.is_empty() {
        return "No tracked tasks found.".to_string();
    }

    let mut list = format!("Tracked Tasks ({} total):\n", task_ids.len());
    for (i, id) in task_ids.iter().enumerate() {
        list.push_str(&format!("{}. {}\n", i + 1, id));
    }
    list
}
