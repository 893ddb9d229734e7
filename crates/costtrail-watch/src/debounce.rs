//! Per-path debounce timers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Work run once a path has been quiet for the debounce window
pub type Handler = Arc<dyn Fn(&Path) + Send + Sync>;

/// Coalesces bursts of notifications for the same path into one handler call.
///
/// Owned by a single control loop; timers run as independent tasks and each
/// invokes the handler on the blocking pool.
pub struct Debouncer {
    delay: Duration,
    handler: Handler,
    pending: HashMap<PathBuf, JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration, handler: Handler) -> Self {
        Self {
            delay,
            handler,
            pending: HashMap::new(),
        }
    }

    /// Arm (or re-arm) the timer for `path`. Must be called within a tokio runtime.
    pub fn schedule(&mut self, path: PathBuf) {
        self.pending.retain(|_, timer| !timer.is_finished());

        if let Some(previous) = self.pending.remove(&path) {
            previous.abort();
            tracing::trace!(path = %path.display(), "debounce timer reset");
        }

        let handler = Arc::clone(&self.handler);
        let delay = self.delay;
        let run_path = path.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!(path = %run_path.display(), "processing file change");

            let shown = run_path.display().to_string();
            let run = tokio::task::spawn_blocking(move || handler(&run_path));
            if let Err(e) = run.await {
                tracing::error!(path = %shown, error = %e, "file processing aborted");
            }
        });

        self.pending.insert(path, timer);
    }

    /// Number of timers still waiting or running
    pub fn pending(&self) -> usize {
        self.pending
            .values()
            .filter(|timer| !timer.is_finished())
            .count()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending
            .get(path)
            .is_some_and(|timer| !timer.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn recording_handler() -> (Handler, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: Handler = Arc::new(move |path: &Path| {
            let _ = tx.send(path.to_path_buf());
        });
        (handler, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_call() {
        let (handler, mut rx) = recording_handler();
        let mut debouncer = Debouncer::new(Duration::from_secs(1), handler);
        let path = PathBuf::from("/tasks/1/ui_messages.json");
        assert_eq!(debouncer.delay(), Duration::from_secs(1));

        for _ in 0..5 {
            debouncer.schedule(path.clone());
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(debouncer.pending(), 1);

        assert_eq!(rx.recv().await, Some(path));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_event_resets_deadline() {
        let (handler, mut rx) = recording_handler();
        let mut debouncer = Debouncer::new(Duration::from_secs(1), handler);
        let path = PathBuf::from("/tasks/2/ui_messages.json");

        debouncer.schedule(path.clone());
        tokio::time::sleep(Duration::from_millis(900)).await;
        debouncer.schedule(path.clone());
        tokio::time::sleep(Duration::from_millis(900)).await;

        // 1.8s after the first event, but only 0.9s after the second
        assert!(rx.try_recv().is_err());
        assert!(debouncer.is_pending(&path));

        assert_eq!(rx.recv().await, Some(path));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_paths_fire_independently() {
        let (handler, mut rx) = recording_handler();
        let mut debouncer = Debouncer::new(Duration::from_secs(1), handler);
        let first = PathBuf::from("/tasks/1/ui_messages.json");
        let second = PathBuf::from("/tasks/2/ui_messages.json");

        debouncer.schedule(first.clone());
        debouncer.schedule(second.clone());
        assert_eq!(debouncer.pending(), 2);

        let mut fired = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        fired.sort();
        assert_eq!(fired, vec![first, second]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_panic_does_not_stop_dispatch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: Handler = Arc::new(move |path: &Path| {
            if path.ends_with("bad/ui_messages.json") {
                panic!("broken log");
            }
            let _ = tx.send(path.to_path_buf());
        });
        let mut debouncer = Debouncer::new(Duration::from_millis(100), handler);

        debouncer.schedule(PathBuf::from("/tasks/bad/ui_messages.json"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let good = PathBuf::from("/tasks/good/ui_messages.json");
        debouncer.schedule(good.clone());
        assert_eq!(rx.recv().await, Some(good));
    }
}
