//! UI message parsing and cost record extraction

mod config;
mod error;
pub mod extract;
mod pipeline;
mod types;

pub use config::{Config, PipelineOptions, LOGS_DIR, UI_MESSAGES_FILE};
pub use error::ParseError;
pub use pipeline::{parse_events, process_events};
pub use types::{format_cost, EventKind, LogEvent, OutputRecord, Phase};
