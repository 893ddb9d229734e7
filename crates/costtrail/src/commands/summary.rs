use costtrail_files::{format_summary_report, summarize_logs};
use std::path::PathBuf;

pub fn run(logs_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let logs_dir = super::resolve_logs_dir(logs_dir)?;
    let summaries = summarize_logs(&logs_dir)?;
    println!("{}", format_summary_report(&summaries).trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_missing_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(run(Some(temp.path().join("logs"))).is_ok());
    }
}
