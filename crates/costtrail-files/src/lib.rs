//! File-side collaborators: input reading, CSV output, path discovery

mod convert;
mod io;
mod paths;
mod resolver;
mod summary;

pub use convert::{convert, convert_discovered, resolve_output_root, ConvertError, ConvertReport};
pub use io::{atomic_write, ensure_logs_dir, render_csv, CSV_HEADER};
pub use paths::{
    default_tasks_dir, extract_task_id, latest_task_id, load_config, output_file_name,
    task_id_from_file_name, Paths,
};
pub use resolver::{find_repo_root, resolve_working_directory};
pub use summary::{
    analyze_csv, find_cost_csvs, format_summary_report, format_task_block, format_task_list,
    list_task_ids, summarize_logs, task_summary, SummaryError, TaskSummary,
};
