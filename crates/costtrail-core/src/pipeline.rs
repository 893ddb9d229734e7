//! Event sequence to output record transformation

use crate::error::ParseError;
use crate::extract;
use crate::types::{LogEvent, OutputRecord};

/// Decode a JSON array of events; an empty array is an error
pub fn parse_events(data: &[u8]) -> Result<Vec<LogEvent>, ParseError> {
    let events: Vec<LogEvent> = serde_json::from_slice(data)?;
    if events.is_empty() {
        return Err(ParseError::Empty);
    }
    tracing::debug!(count = events.len(), "decoded UI messages");
    Ok(events)
}

/// Derive one record per event, accumulating cost in input order.
///
/// `working_directory` is stamped on every record unchanged.
pub fn process_events(events: &[LogEvent], working_directory: Option<&str>) -> Vec<OutputRecord> {
    let mut total_cost = 0.0;

    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let cost = extract::extract_cost(&event.text);
            total_cost += cost.unwrap_or(0.0);

            OutputRecord {
                request_summary: extract::request_summary(event, i),
                ask_say: extract::ask_say_label(event),
                cost,
                text: event.text.clone(),
                timestamp: extract::format_timestamp(event.timestamp_millis),
                context_tokens: extract::extract_context_tokens(&event.text),
                cumulative_cost: total_cost,
                action: extract::extract_action(event),
                tool_name: extract::extract_tool_name(event),
                has_images: extract::has_images(&event.text),
                phase: extract::determine_phase(event, i),
                context_percentage: extract::extract_context_percentage(&event.text),
                search_term: extract::search_term(event, i),
                cost_notes: extract::cost_notes(&event.text),
                approx_time: extract::format_time_approx(event.timestamp_millis),
                working_directory: working_directory.map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    fn sample_events() -> Vec<LogEvent> {
        vec![
            LogEvent::say("text", "Build a parser", 1_700_000_000_000),
            LogEvent::say("api_req_started", r#"{"cost": 0.01}"#, 1_700_000_001_000),
            LogEvent::ask("tool", r#"{"tool":"readFile"}"#, 1_700_000_002_000),
            LogEvent::say("api_req_started", r#"{"cost": 0.02}"#, 1_700_000_003_000),
            LogEvent::say("user_feedback", "looks good thanks", 1_700_000_004_000),
            LogEvent::say("completion_result", "task finished", 1_700_000_005_000),
        ]
    }

    #[test]
    fn test_parse_events_rejects_empty() {
        assert!(matches!(parse_events(b"[]"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_events_rejects_non_array() {
        assert!(matches!(
            parse_events(br#"{"type":"say"}"#),
            Err(ParseError::Decode(_))
        ));
        assert!(matches!(parse_events(b"not json"), Err(ParseError::Decode(_))));
    }

    #[test]
    fn test_null_fields_still_produce_records() {
        let data = br#"[{"type":"say","say":"text","text":null,"ts":null},{"type":null,"say":"notice","text":"hi","ts":1700000000000}]"#;
        let events = parse_events(data).unwrap();
        let records = process_events(&events, None);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "");
        assert_eq!(records[0].search_term, "say_text_0");
        assert_eq!(records[1].ask_say, "");
        assert_eq!(records[1].search_term, "_notice_1");
    }

    #[test]
    fn test_single_event_scenario() {
        let data = br#"[{"type":"say","say":"api_req_started","text":"\"cost\": 0.0012","ts":1700000000000}]"#;
        let events = parse_events(data).unwrap();
        let records = process_events(&events, None);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.cost_text(), "0.001200");
        assert_eq!(record.cumulative_cost_text(), "0.001200");
        assert_eq!(record.phase, Phase::Initial);
        assert_eq!(record.request_summary, r#"Task Request: "cost": 0.0012"#);
        assert_eq!(record.cost_notes, "Has cost data");
    }

    #[test]
    fn test_records_align_with_events() {
        let events = sample_events();
        let records = process_events(&events, None);
        assert_eq!(records.len(), events.len());
        for (event, record) in events.iter().zip(&records) {
            assert_eq!(event.text, record.text);
        }
    }

    #[test]
    fn test_cumulative_cost_running_sum() {
        let records = process_events(&sample_events(), None);
        let totals: Vec<String> = records.iter().map(|r| r.cumulative_cost_text()).collect();
        assert_eq!(
            totals,
            vec!["0.000000", "0.010000", "0.010000", "0.030000", "0.030000", "0.030000"]
        );
        assert_eq!(records[0].cost_text(), "");
        assert_eq!(records[3].cost_text(), "0.020000");
    }

    #[test]
    fn test_phase_after_initial_window() {
        let records = process_events(&sample_events(), None);
        assert!(records[..5].iter().all(|r| r.phase == Phase::Initial));
        assert_eq!(records[5].phase, Phase::Completion);
    }

    #[test]
    fn test_working_directory_applied_uniformly() {
        let records = process_events(&sample_events(), Some("/work/repo"));
        assert!(records
            .iter()
            .all(|r| r.working_directory.as_deref() == Some("/work/repo")));

        let plain = process_events(&sample_events(), None);
        assert!(plain.iter().all(|r| r.working_directory.is_none()));
    }

    #[test]
    fn test_deterministic() {
        let events = sample_events();
        assert_eq!(process_events(&events, None), process_events(&events, None));
    }
}
