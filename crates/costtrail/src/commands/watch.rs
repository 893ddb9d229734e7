use costtrail_files::Paths;
use costtrail_watch::WatchConfig;
use std::path::PathBuf;

pub fn run(tasks_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::load_config(tasks_dir);
    let paths = Paths::new(&config)?;
    let fallback_root = std::env::current_dir()?;

    let watch_config = WatchConfig {
        root: paths.tasks_dir.clone(),
        log_file_name: config.log_file_name.clone(),
        debounce: config.debounce(),
    };
    let handler = super::conversion_handler(config, fallback_root);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let handle = costtrail_watch::start(watch_config, handler)?;
        println!(
            "Watching {} for changes (Ctrl-C to stop)",
            paths.tasks_dir.display()
        );

        tokio::signal::ctrl_c().await?;
        tracing::info!("received interrupt, shutting down");
        handle.shutdown().await;
        Ok::<_, anyhow::Error>(())
    })
}
