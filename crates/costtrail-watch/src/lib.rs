//! Debounced file watching for agent task logs
//!
//! ```text
//! notify callback ──events/errors──▶ WatchLoop ──qualifying writes──▶ Debouncer
//!                                       │                               │
//!                                  new task dirs                 one timer per path
//!                                  get subscribed                 └─▶ handler(path)
//! ```

mod debounce;
mod error;
mod watcher;

pub use debounce::{Debouncer, Handler};
pub use error::WatchError;
pub use watcher::{classify, start, WatchAction, WatchConfig, WatchHandle};
