use costtrail_files::{format_task_list, list_task_ids};
use std::path::PathBuf;

pub fn run(logs_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let logs_dir = super::resolve_logs_dir(logs_dir)?;
    let ids = list_task_ids(&logs_dir)?;
    println!("{}", format_task_list(&ids).trim_end());
    Ok(())
}
