//! Filesystem subscription loop for the agent tasks directory

use crate::debounce::{Debouncer, Handler};
use crate::error::WatchError;
use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// What to watch and how long to wait before dispatching
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Tasks root; it and its immediate subdirectories are subscribed
    pub root: PathBuf,
    /// Suffix that makes a changed path qualifying
    pub log_file_name: String,
    pub debounce: Duration,
}

/// Routing decision for one path of a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Qualifying write: hand to the debouncer
    Dispatch(PathBuf),
    /// Newly created directory: subscribe to it
    Subscribe(PathBuf),
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

fn is_dir_create(kind: &EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) => true,
        EventKind::Create(CreateKind::Any) => path.is_dir(),
        _ => false,
    }
}

/// Route a notification: log writes are dispatched, new directories subscribed
pub fn classify(event: &Event, log_file_name: &str) -> Vec<WatchAction> {
    event
        .paths
        .iter()
        .filter_map(|path| {
            if path.to_string_lossy().ends_with(log_file_name) {
                is_write(&event.kind).then(|| WatchAction::Dispatch(path.clone()))
            } else if is_dir_create(&event.kind, path) {
                Some(WatchAction::Subscribe(path.clone()))
            } else {
                None
            }
        })
        .collect()
}

/// Running watcher; stopping closes the subscription and ends the loop
pub struct WatchHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Signal the loop to exit. Armed debounce timers are not cancelled.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Stop and wait for the loop to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "watch loop ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// State owned exclusively by the loop task
struct WatchLoop {
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
    debouncer: Debouncer,
    log_file_name: String,
}

impl WatchLoop {
    fn subscribe(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.watched.contains(path) {
            return Ok(());
        }
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Subscribe {
                path: path.to_path_buf(),
                source,
            })?;
        self.watched.insert(path.to_path_buf());
        Ok(())
    }

    fn subscribe_existing(&mut self, root: &Path) {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %root.display(), error = %e, "failed to list existing tasks");
                return;
            }
        };

        for path in entries.flatten().map(|e| e.path()).filter(|p| p.is_dir()) {
            if let Err(e) = self.subscribe(&path) {
                tracing::warn!(error = %e, "failed to watch task directory");
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        for action in classify(&event, &self.log_file_name) {
            match action {
                WatchAction::Dispatch(path) => self.debouncer.schedule(path),
                WatchAction::Subscribe(path) => match self.subscribe(&path) {
                    Ok(()) => tracing::info!(path = %path.display(), "now watching new task directory"),
                    Err(e) => tracing::warn!(error = %e, "failed to watch new task directory"),
                },
            }
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<Event>,
        mut errors: mpsc::UnboundedReceiver<notify::Error>,
        mut stop: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        tracing::debug!("file watcher events channel closed");
                        break;
                    }
                },
                error = errors.recv() => match error {
                    Some(e) => tracing::warn!(error = %e, "file watcher error"),
                    None => {
                        tracing::debug!("file watcher errors channel closed");
                        break;
                    }
                },
                _ = &mut stop => {
                    tracing::debug!("received stop signal");
                    break;
                }
            }
        }

        tracing::info!(
            watched = self.watched.len(),
            pending = self.debouncer.pending(),
            "watch loop stopped"
        );
        // Dropping `self.watcher` removes every subscription
    }
}

/// Subscribe to `config.root` and its task directories and spawn the loop.
///
/// Failing to watch the root is fatal; failures on subdirectories are logged.
/// Must be called within a tokio runtime.
pub fn start(config: WatchConfig, handler: Handler) -> Result<WatchHandle, WatchError> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();

    let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = event_tx.send(event);
        }
        Err(e) => {
            let _ = error_tx.send(e);
        }
    })
    .map_err(WatchError::Init)?;

    let mut state = WatchLoop {
        watcher,
        watched: HashSet::new(),
        debouncer: Debouncer::new(config.debounce, handler),
        log_file_name: config.log_file_name,
    };
    state.subscribe(&config.root)?;
    state.subscribe_existing(&config.root);

    tracing::info!(
        path = %config.root.display(),
        directories = state.watched.len(),
        debounce_ms = state.debouncer.delay().as_millis() as u64,
        "started watching tasks directory"
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(state.run(event_rx, error_rx, stop_rx));

    Ok(WatchHandle {
        stop: Some(stop_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;

    const LOG: &str = "ui_messages.json";

    #[test]
    fn test_write_to_log_dispatches() {
        let path = PathBuf::from("/tasks/1/ui_messages.json");
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.clone());
        assert_eq!(classify(&event, LOG), vec![WatchAction::Dispatch(path)]);
    }

    #[test]
    fn test_generic_modify_dispatches() {
        let path = PathBuf::from("/tasks/1/ui_messages.json");
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
        assert_eq!(classify(&event, LOG), vec![WatchAction::Dispatch(path)]);
    }

    #[test]
    fn test_non_write_on_log_ignored() {
        let path = PathBuf::from("/tasks/1/ui_messages.json");
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Any)),
            EventKind::Remove(notify::event::RemoveKind::File),
        ] {
            let event = Event::new(kind).add_path(path.clone());
            assert!(classify(&event, LOG).is_empty(), "{:?}", kind);
        }
    }

    #[test]
    fn test_write_to_other_file_ignored() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Any)))
            .add_path(PathBuf::from("/tasks/1/api_conversation_history.json"));
        assert!(classify(&event, LOG).is_empty());
    }

    #[test]
    fn test_folder_create_subscribes() {
        let path = PathBuf::from("/tasks/1718000000000");
        let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path(path.clone());
        assert_eq!(classify(&event, LOG), vec![WatchAction::Subscribe(path)]);
    }

    #[test]
    fn test_generic_create_subscribes_only_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("42");
        std::fs::create_dir(&dir).unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let event = Event::new(EventKind::Create(CreateKind::Any))
            .add_path(dir.clone())
            .add_path(file);
        assert_eq!(classify(&event, LOG), vec![WatchAction::Subscribe(dir)]);
    }
}
