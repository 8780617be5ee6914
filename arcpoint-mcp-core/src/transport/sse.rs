//! Server-push event framing.
//!
//! The push channel is a `text/event-stream` body. Only two event types carry
//! meaning for the relay:
//!
//! - `endpoint`: data is the message URL for this subscription, e.g.
//!   `/message?sessionId=abc123`. The value after `sessionId=` becomes the
//!   session token.
//! - `message`: data is one JSON-RPC message for local output.
//!
//! Every other event type, and any event without `data:` lines, is dropped.
//! Lines other than `event:`, `data:` and the blank terminator (comments,
//! `id:`, `retry:`) are ignored.

/// A complete, meaningful event produced by [`EventFrameParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The server announced the message endpoint for this subscription.
    Endpoint {
        /// Joined data lines.
        data: String,
        /// Token extracted from `data`, if it contains exactly one `sessionId=`.
        session_id: Option<String>,
    },
    /// A JSON-RPC message to write to local output.
    Message(String),
}

/// Incremental parser fed one line at a time.
///
/// State (type and accumulated data lines) resets after every blank line,
/// whatever the event type was.
#[derive(Debug, Default)]
pub struct EventFrameParser {
    event_type: String,
    data: Vec<String>,
}

impl EventFrameParser {
    /// Create a parser with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. A trailing `\n` and/or `\r` is stripped first.
    ///
    /// Returns an event when `line` is the blank terminator of an `endpoint`
    /// or `message` event with at least one data line.
    pub fn push_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }

        if let Some(rest) = line.strip_prefix("event:") {
            self.event_type = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            self.data.push(rest.to_string());
        }
        None
    }

    /// Whether a partially accumulated event is pending.
    pub fn has_pending(&self) -> bool {
        !self.event_type.is_empty() || !self.data.is_empty()
    }

    fn dispatch(&mut self) -> Option<StreamEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        let data = std::mem::take(&mut self.data);

        if data.is_empty() {
            return None;
        }

        match event_type.as_str() {
            "endpoint" => {
                let data = data.join("\n");
                let session_id = extract_session_id(&data);
                Some(StreamEvent::Endpoint { data, session_id })
            }
            "message" => Some(StreamEvent::Message(data.join("\n"))),
            _ => None,
        }
    }
}

/// Extract the session token from an `endpoint` event's data.
///
/// Splits on the literal `sessionId=`. Only when that yields exactly two
/// parts is the trimmed second part returned.
pub fn extract_session_id(data: &str) -> Option<String> {
    let mut parts = data.split("sessionId=");
    let _before = parts.next()?;
    let after = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(after.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut EventFrameParser, text: &str) -> Vec<StreamEvent> {
        text.split('\n')
            .filter_map(|line| parser.push_line(line))
            .collect()
    }

    #[test]
    fn test_endpoint_event_extracts_session() {
        let mut parser = EventFrameParser::new();
        let events = feed(&mut parser, "event: endpoint\ndata: /message?sessionId=abc123\n\n");
        assert_eq!(
            events,
            vec![StreamEvent::Endpoint {
                data: " /message?sessionId=abc123".to_string(),
                session_id: Some("abc123".to_string()),
            }]
        );
    }

    #[test]
    fn test_message_event_joins_data_lines() {
        let mut parser = EventFrameParser::new();
        let events = feed(
            &mut parser,
            "event: message\ndata:{\"id\":2,\ndata:\"result\":true}\n\n",
        );
        assert_eq!(
            events,
            vec![StreamEvent::Message("{\"id\":2,\n\"result\":true}".to_string())]
        );
    }

    #[test]
    fn test_data_prefix_not_trimmed() {
        let mut parser = EventFrameParser::new();
        let events = feed(&mut parser, "event: message\ndata:  padded \n\n");
        assert_eq!(events, vec![StreamEvent::Message("  padded ".to_string())]);
    }

    #[test]
    fn test_crlf_lines() {
        let mut parser = EventFrameParser::new();
        let events: Vec<_> = ["event: message\r", "data:{}\r", "\r"]
            .into_iter()
            .filter_map(|l| parser.push_line(l))
            .collect();
        assert_eq!(events, vec![StreamEvent::Message("{}".to_string())]);
    }

    #[test]
    fn test_unknown_event_type_dropped() {
        let mut parser = EventFrameParser::new();
        let events = feed(&mut parser, "event: ping\ndata: keepalive\n\n");
        assert!(events.is_empty());
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_event_without_data_dropped() {
        let mut parser = EventFrameParser::new();
        let events = feed(&mut parser, "event: message\n\nevent: endpoint\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_data_without_event_type_dropped() {
        let mut parser = EventFrameParser::new();
        let events = feed(&mut parser, "data: {\"orphan\":true}\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_state_resets_after_blank_line() {
        let mut parser = EventFrameParser::new();
        let events = feed(
            &mut parser,
            "event: ping\ndata: one\n\ndata: two\n\nevent: message\ndata: three\n\n",
        );
        // "two" has no type after the reset, so only "three" survives.
        assert_eq!(events, vec![StreamEvent::Message(" three".to_string())]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut parser = EventFrameParser::new();
        let events = feed(
            &mut parser,
            ": keepalive\nid: 7\nretry: 1000\nevent: message\ndata:x\n\n",
        );
        assert_eq!(events, vec![StreamEvent::Message("x".to_string())]);
    }

    #[test]
    fn test_has_pending() {
        let mut parser = EventFrameParser::new();
        assert!(!parser.has_pending());
        parser.push_line("event: message");
        assert!(parser.has_pending());
        parser.push_line("");
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_extract_session_id() {
        assert_eq!(
            extract_session_id("/message?sessionId=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_session_id("/message?sessionId= xyz \n"),
            Some("xyz".to_string())
        );
        assert_eq!(extract_session_id("/message"), None);
        assert_eq!(extract_session_id("sessionId=a&sessionId=b"), None);
        assert_eq!(extract_session_id("/message?sessionId="), Some(String::new()));
    }
}
