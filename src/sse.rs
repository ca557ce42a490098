//! SSE data-line parsing for the agent streaming protocol.
//!
//! One frame per line: `data: <json>`. Blank lines, `:`-prefixed comments,
//! and the `[DONE]` sentinel carry no events. A malformed payload is logged
//! and skipped; it never aborts the stream.

use crate::types::StreamEvent;

/// Sentinel payload marking end-of-stream in OpenAI-style backends.
const DONE_SENTINEL: &str = "[DONE]";

/// Parses one framed line into a protocol event.
///
/// Returns `None` for every line that carries no event: blanks, comments,
/// the `[DONE]` sentinel, lines without a `data:` prefix, and payloads that
/// fail to decode.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = line.strip_prefix("data: ")?;
    if payload == DONE_SENTINEL {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(payload, %err, "skipping malformed stream event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamEvent;

    #[test]
    fn parses_text_event() {
        let event = parse_line(r#"data: {"type":"text","content":"Hi"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Text {
                content: "Hi".to_string()
            }
        );
    }

    #[test]
    fn parses_boundary_events() {
        assert_eq!(
            parse_line(r#"data: {"type":"start"}"#),
            Some(StreamEvent::Start)
        );
        assert_eq!(
            parse_line(r#"data: {"type":"done"}"#),
            Some(StreamEvent::Done)
        );
        assert_eq!(
            parse_line(r#"data: {"type":"finish"}"#),
            Some(StreamEvent::Finish)
        );
    }

    #[test]
    fn ignores_blank_lines_and_comments() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line(": keep-alive"), None);
    }

    #[test]
    fn ignores_done_sentinel() {
        assert_eq!(parse_line("data: [DONE]"), None);
    }

    #[test]
    fn ignores_lines_without_data_prefix() {
        assert_eq!(parse_line("event: message"), None);
        assert_eq!(parse_line("id: 7"), None);
    }

    #[test]
    fn malformed_payload_is_skipped() {
        assert_eq!(parse_line("data: {not json"), None);
        assert_eq!(parse_line(r#"data: {"type":"no-such-kind"}"#), None);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let event = parse_line("  data: {\"type\":\"text\",\"content\":\"x\"}  ").unwrap();
        assert_eq!(
            event,
            StreamEvent::Text {
                content: "x".to_string()
            }
        );
    }
}
