use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "costtrail")]
#[command(version)]
#[command(about = "Cost tracking for coding-agent task logs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one ui_messages.json log into a cost CSV
    Convert {
        /// Path to the task log
        file: PathBuf,

        /// Write CSVs under <OUTPUT_BASE>/logs instead of the discovered repository
        #[arg(short, long)]
        output_base: Option<PathBuf>,

        /// Walk up from the current directory to a repository root when the log names none
        #[arg(long)]
        walk_up: bool,
    },

    /// Watch the agent tasks directory and convert logs as they change
    Watch {
        /// Agent tasks root (overrides config and COSTTRAIL_TASKS_DIR)
        #[arg(long)]
        tasks_dir: Option<PathBuf>,
    },

    /// Serve cost tools over stdio JSON-RPC while watching
    Serve {
        /// Agent tasks root (overrides config and COSTTRAIL_TASKS_DIR)
        #[arg(long)]
        tasks_dir: Option<PathBuf>,
    },

    /// Summarize generated cost CSVs
    Summary {
        /// Directory holding task_*_costs.csv files
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },

    /// List task ids with generated cost CSVs
    Tasks {
        /// Directory holding task_*_costs.csv files
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },

    /// Print version information
    Version,
}
