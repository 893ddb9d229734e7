//! One-shot conversion of a task log into a cost CSV

use crate::io::{atomic_write, ensure_logs_dir, render_csv};
use crate::paths::{extract_task_id, output_file_name};
use crate::resolver::resolve_working_directory;
use costtrail_core::{parse_events, process_events, Config, ParseError, PipelineOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LARGE_INPUT_KB: u64 = 500;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("error reading {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error encoding CSV for {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ConvertError {
    /// Missing, unreadable or undecodable input
    pub fn is_input(&self) -> bool {
        matches!(self, ConvertError::Input { .. } | ConvertError::Parse(_))
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub input: PathBuf,
    pub input_bytes: u64,
    pub task_id: String,
    pub output_path: PathBuf,
    pub record_count: usize,
    pub total_cost: f64,
    pub working_directory: Option<String>,
}

fn read_input(path: &Path) -> Result<(Vec<u8>, u64), ConvertError> {
    let input_err = |source| ConvertError::Input {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(input_err)?.len();
    let size_kb = size / 1024;
    tracing::info!(path = %path.display(), size_kb, "processing file");
    if size_kb > LARGE_INPUT_KB {
        tracing::warn!(size_kb, "large file detected");
    }

    let data = std::fs::read(path).map_err(input_err)?;
    Ok((data, size))
}

/// Parse `input`, derive records and write `<output_base>/logs/task_<id>_<start>_costs.csv`.
///
/// Nothing is written when the input cannot be read or decoded.
pub fn convert(input: &Path, options: &PipelineOptions) -> Result<ConvertReport, ConvertError> {
    let (data, input_bytes) = read_input(input)?;
    let events = parse_events(&data)?;
    tracing::info!(count = events.len(), "parsed messages");

    let working_directory = if options.include_working_directory {
        resolve_working_directory(input)
    } else {
        None
    };

    let task_id = extract_task_id(input);
    let output_path = options
        .logs_dir()
        .join(output_file_name(&task_id, events[0].timestamp_millis));
    tracing::debug!(output = %output_path.display(), "generated output path");

    let records = process_events(&events, working_directory.as_deref());
    let total_cost = records.last().map_or(0.0, |r| r.cumulative_cost);

    let bytes = render_csv(&records).map_err(|source| ConvertError::Csv {
        path: output_path.clone(),
        source,
    })?;
    ensure_logs_dir(&options.output_base).map_err(|source| ConvertError::Write {
        path: options.logs_dir(),
        source,
    })?;
    atomic_write(&output_path, &bytes).map_err(|source| ConvertError::Write {
        path: output_path.clone(),
        source,
    })?;

    tracing::info!(
        output = %output_path.display(),
        records = records.len(),
        "cost tracker CSV generated"
    );

    Ok(ConvertReport {
        input: input.to_path_buf(),
        input_bytes,
        task_id,
        output_path,
        record_count: records.len(),
        total_cost,
        working_directory,
    })
}

/// Repository root for a task log: the recorded working directory, else `fallback`
pub fn resolve_output_root(input: &Path, fallback: &Path) -> PathBuf {
    match resolve_working_directory(input) {
        Some(dir) => PathBuf::from(dir),
        None => {
            tracing::info!(
                fallback = %fallback.display(),
                "could not detect repository root, using fallback"
            );
            fallback.to_path_buf()
        }
    }
}

/// Convert into `<repo root>/<output_subdir>/logs`, stamping the working directory
pub fn convert_discovered(
    input: &Path,
    config: &Config,
    fallback_root: &Path,
) -> Result<ConvertReport, ConvertError> {
    let root = resolve_output_root(input, fallback_root);
    let options = PipelineOptions::new(root.join(&config.output_subdir)).with_working_directory(true);
    convert(input, &options)
}
