//! Log event and output record types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the conversation produced an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum EventKind {
    Say,
    Ask,
    /// Any other `type`, kept verbatim; empty when missing or null
    Other(String),
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::Other(String::new())
    }
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Say => "say",
            EventKind::Ask => "ask",
            EventKind::Other(raw) => raw,
        }
    }
}

impl From<Option<String>> for EventKind {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("say") => EventKind::Say,
            Some("ask") => EventKind::Ask,
            _ => EventKind::Other(raw.unwrap_or_default()),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Explicit `null` decodes like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the UI messages array
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub say: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Epoch milliseconds
    #[serde(rename = "ts", default, deserialize_with = "null_as_default")]
    pub timestamp_millis: i64,
}

impl LogEvent {
    pub fn say(subtype: &str, text: &str, ts: i64) -> Self {
        Self {
            kind: EventKind::Say,
            say: Some(subtype.to_string()),
            ask: None,
            text: text.to_string(),
            timestamp_millis: ts,
        }
    }

    pub fn ask(subtype: &str, text: &str, ts: i64) -> Self {
        Self {
            kind: EventKind::Ask,
            say: None,
            ask: Some(subtype.to_string()),
            text: text.to_string(),
            timestamp_millis: ts,
        }
    }

    /// Subtype matching the event kind (`say` for say events, `ask` for ask events)
    pub fn subtype(&self) -> &str {
        let value = match self.kind {
            EventKind::Say => self.say.as_deref(),
            EventKind::Ask => self.ask.as_deref(),
            EventKind::Other(_) => self.say.as_deref().or(self.ask.as_deref()),
        };
        value.unwrap_or("")
    }

    pub fn is_say(&self, subtype: &str) -> bool {
        self.kind == EventKind::Say && self.subtype() == subtype
    }

    pub fn is_ask(&self, subtype: &str) -> bool {
        self.kind == EventKind::Ask && self.subtype() == subtype
    }
}

/// Coarse position of an event within a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Initial,
    Processing,
    Completion,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Initial => "Initial",
            Phase::Processing => "Processing",
            Phase::Completion => "Completion",
        };
        f.write_str(label)
    }
}

/// One derived CSV row, index-aligned with its source event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub request_summary: String,
    pub ask_say: String,
    pub cost: Option<f64>,
    pub text: String,
    pub timestamp: String,
    pub context_tokens: Option<String>,
    pub cumulative_cost: f64,
    pub action: String,
    pub tool_name: String,
    pub has_images: bool,
    pub phase: Phase,
    pub context_percentage: Option<String>,
    pub search_term: String,
    pub cost_notes: String,
    pub approx_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

impl OutputRecord {
    /// Cost with six fraction digits, empty when absent
    pub fn cost_text(&self) -> String {
        self.cost.map(format_cost).unwrap_or_default()
    }

    pub fn cumulative_cost_text(&self) -> String {
        format_cost(self.cumulative_cost)
    }

    pub fn has_images_text(&self) -> &'static str {
        if self.has_images {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn context_percentage_text(&self) -> String {
        self.context_percentage
            .as_deref()
            .map(|digits| format!("{}%", digits))
            .unwrap_or_default()
    }
}

pub fn format_cost(cost: f64) -> String {
    format!("{:.6}", cost)
}
