//! CSV rendering and atomic file operations

use costtrail_core::{OutputRecord, LOGS_DIR};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column order of every cost CSV
pub const CSV_HEADER: [&str; 15] = [
    "Request Summary",
    "Ask/Say",
    "Cost",
    "Text",
    "Timestamp",
    "Context tokens used",
    "Total cost",
    "Cline_Action",
    "Tool_Used",
    "Has_Images",
    "Phase",
    "Context_Percentage",
    "Search_Term_In_Transcript",
    "Cost_Notes",
    "Time_Approx",
];

/// Serialized shape of a record; field order matches `CSV_HEADER`
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Request Summary")]
    request_summary: &'a str,
    #[serde(rename = "Ask/Say")]
    ask_say: &'a str,
    #[serde(rename = "Cost")]
    cost: String,
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "Timestamp")]
    timestamp: &'a str,
    #[serde(rename = "Context tokens used")]
    context_tokens: &'a str,
    #[serde(rename = "Total cost")]
    total_cost: String,
    #[serde(rename = "Cline_Action")]
    action: &'a str,
    #[serde(rename = "Tool_Used")]
    tool_used: &'a str,
    #[serde(rename = "Has_Images")]
    has_images: &'static str,
    #[serde(rename = "Phase")]
    phase: String,
    #[serde(rename = "Context_Percentage")]
    context_percentage: String,
    #[serde(rename = "Search_Term_In_Transcript")]
    search_term: &'a str,
    #[serde(rename = "Cost_Notes")]
    cost_notes: &'a str,
    #[serde(rename = "Time_Approx")]
    time_approx: &'a str,
}

impl<'a> From<&'a OutputRecord> for CsvRow<'a> {
    fn from(record: &'a OutputRecord) -> Self {
        Self {
            request_summary: &record.request_summary,
            ask_say: &record.ask_say,
            cost: record.cost_text(),
            text: &record.text,
            timestamp: &record.timestamp,
            context_tokens: record.context_tokens.as_deref().unwrap_or(""),
            total_cost: record.cumulative_cost_text(),
            action: &record.action,
            tool_used: &record.tool_name,
            has_images: record.has_images_text(),
            phase: record.phase.to_string(),
            context_percentage: record.context_percentage_text(),
            search_term: &record.search_term,
            cost_notes: &record.cost_notes,
            time_approx: &record.approx_time,
        }
    }
}

/// Render records as CSV bytes, header first
pub fn render_csv(records: &[OutputRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Ensure `<base>/logs` exists, creating parents as needed
pub fn ensure_logs_dir(base: &Path) -> std::io::Result<PathBuf> {
    let logs = base.join(LOGS_DIR);
    std::fs::create_dir_all(&logs)?;
    Ok(logs)
}

/// Write data atomically through a uniquely named sibling temp file.
///
/// Concurrent writers to the same path never share a temp file; the last
/// rename wins.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
