//! Field extraction from free-form event text
//!
//! Every extractor degrades to an absent or default value; nothing here fails.

use crate::types::{EventKind, LogEvent, Phase};
use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

/// Cost patterns in priority order. The `$` pattern also matches dollar
/// amounts in ordinary conversation.
const COST_PATTERNS: [&str; 4] = [
    r#""cost":\s*([0-9.]+)"#,
    r#"cost":\s*([0-9.]+)"#,
    r"\$([0-9.]+)",
    r#""totalCost":\s*([0-9.]+)"#,
];

const TOKEN_PATTERNS: [&str; 4] = [
    r#""inputTokens":\s*([0-9]+)"#,
    r#""outputTokens":\s*([0-9]+)"#,
    r"([0-9]+)\s*tokens",
    r"context.*?([0-9]+).*?tokens",
];

static COST_RES: OnceLock<Vec<Regex>> = OnceLock::new();
static TOKEN_RES: OnceLock<Vec<Regex>> = OnceLock::new();
static TOOL_RE: OnceLock<Regex> = OnceLock::new();
static PERCENT_RE: OnceLock<Regex> = OnceLock::new();

const ACTION_MAX_CHARS: usize = 100;
const INITIAL_PHASE_EVENTS: usize = 5;

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Formatted `"say": "<subtype>"` / `"ask": "<subtype>"` label
pub fn ask_say_label(event: &LogEvent) -> String {
    match event.kind {
        EventKind::Say | EventKind::Ask => {
            format!(r#""{}": "{}""#, event.kind.as_str(), event.subtype())
        }
        EventKind::Other(_) => String::new(),
    }
}

pub fn request_summary(event: &LogEvent, index: usize) -> String {
    if event.kind != EventKind::Say {
        return String::new();
    }
    if index == 0 {
        return format!("Task Request: {}", event.text);
    }
    match event.subtype() {
        "user_feedback" => format!("User Input: {}", event.text),
        "api_req_started" => format!("API Request: {}", event.text),
        _ => String::new(),
    }
}

/// First strictly positive cost found by the pattern chain
pub fn extract_cost(text: &str) -> Option<f64> {
    let patterns = COST_RES.get_or_init(|| compile_all(&COST_PATTERNS));
    patterns
        .iter()
        .filter_map(|re| first_capture(re, text))
        .find_map(|raw| raw.parse::<f64>().ok())
        .filter(|cost| *cost > 0.0)
}

pub fn extract_context_tokens(text: &str) -> Option<String> {
    let patterns = TOKEN_RES.get_or_init(|| compile_all(&TOKEN_PATTERNS));
    patterns
        .iter()
        .find_map(|re| first_capture(re, text))
        .map(str::to_string)
}

/// Assistant narration, truncated and with double quotes swapped for single
pub fn extract_action(event: &LogEvent) -> String {
    if !event.is_say("text") {
        return String::new();
    }
    let mut action: String = event.text.chars().take(ACTION_MAX_CHARS).collect();
    if event.text.chars().count() > ACTION_MAX_CHARS {
        action.push_str("...");
    }
    action.replace('"', "'")
}

pub fn extract_tool_name(event: &LogEvent) -> String {
    if !event.is_ask("tool") {
        return String::new();
    }
    let re = TOOL_RE.get_or_init(|| Regex::new(r#""tool":"([^"]+)""#).unwrap());
    first_capture(re, &event.text)
        .map(str::to_string)
        .unwrap_or_default()
}

pub fn has_images(text: &str) -> bool {
    text.contains("image")
}

pub fn determine_phase(event: &LogEvent, index: usize) -> Phase {
    if index < INITIAL_PHASE_EVENTS {
        Phase::Initial
    } else if event.is_say("api_req_started") {
        Phase::Processing
    } else if event.text.contains("completion") || event.text.contains("finished") {
        Phase::Completion
    } else {
        Phase::Processing
    }
}

/// Digits of the first `<N>%` occurrence
pub fn extract_context_percentage(text: &str) -> Option<String> {
    let re = PERCENT_RE.get_or_init(|| Regex::new(r"([0-9]+)%").unwrap());
    first_capture(re, text).map(str::to_string)
}

pub fn search_term(event: &LogEvent, index: usize) -> String {
    if event.is_say("user_feedback") {
        let words: Vec<&str> = event.text.split_whitespace().collect();
        if words.len() > 2 {
            return format!("user_{}_{}_{}", words[0], words[1], index);
        }
    }
    format!("{}_{}_{}", event.kind.as_str(), event.subtype(), index)
}

pub fn cost_notes(text: &str) -> String {
    if text.contains("cost") {
        "Has cost data".to_string()
    } else {
        String::new()
    }
}

fn local_time(ts_millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(ts_millis).earliest()
}

fn format_millis(ts_millis: i64, pattern: &str) -> String {
    local_time(ts_millis)
        .map(|t| t.format(pattern).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM:SS` in local time
pub fn format_timestamp(ts_millis: i64) -> String {
    format_millis(ts_millis, "%Y-%m-%d %H:%M:%S")
}

/// Filesystem-safe `YYYY-MM-DD_HH-MM-SS` in local time
pub fn format_timestamp_for_filename(ts_millis: i64) -> String {
    format_millis(ts_millis, "%Y-%m-%d_%H-%M-%S")
}

/// `HH:MM` in local time
pub fn format_time_approx(ts_millis: i64) -> String {
    format_millis(ts_millis, "%H:%M")
}
