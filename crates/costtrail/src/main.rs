mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output and the serve protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            file,
            output_base,
            walk_up,
        } => commands::convert::run(&file, output_base.as_deref(), walk_up),
        Commands::Watch { tasks_dir } => commands::watch::run(tasks_dir),
        Commands::Serve { tasks_dir } => commands::serve::run(tasks_dir),
        Commands::Summary { logs_dir } => commands::summary::run(logs_dir),
        Commands::Tasks { logs_dir } => commands::tasks::run(logs_dir),
        Commands::Version => commands::version::run(),
    }
}
