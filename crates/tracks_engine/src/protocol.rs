use engine_logging::engine_warn;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Progress(f64),
    Completed { tracks_created: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum MessageDecodeError {
    #[error("message is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognised message shape: {0}")]
    UnknownShape(String),
}

const SNIPPET_LEN: usize = 80;

/// Decode one text frame from the progress stream.
///
/// A `"status": "completed"` message wins over a `progress` field in the same object.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, MessageDecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(MessageDecodeError::UnknownShape(snippet(text)));
    };

    if object.get("status").and_then(Value::as_str) == Some("completed") {
        let tracks_created = match object.get("tracks_created").and_then(Value::as_u64) {
            Some(count) => count,
            None => {
                engine_warn!("completion message without usable tracks_created: {}", snippet(text));
                0
            }
        };
        return Ok(ServerMessage::Completed { tracks_created });
    }

    match object.get("progress").and_then(Value::as_f64) {
        Some(percent) => Ok(ServerMessage::Progress(percent)),
        None => Err(MessageDecodeError::UnknownShape(snippet(text))),
    }
}

fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_progress() {
        assert_eq!(
            decode_server_message(r#"{"progress": 42.5}"#).unwrap(),
            ServerMessage::Progress(42.5)
        );
        assert_eq!(
            decode_server_message(r#"{"progress": 0}"#).unwrap(),
            ServerMessage::Progress(0.0)
        );
    }

    #[test]
    fn decodes_completion() {
        assert_eq!(
            decode_server_message(r#"{"status": "completed", "tracks_created": 5}"#).unwrap(),
            ServerMessage::Completed { tracks_created: 5 }
        );
    }

    #[test]
    fn completion_without_count_reports_zero() {
        assert_eq!(
            decode_server_message(r#"{"status": "completed"}"#).unwrap(),
            ServerMessage::Completed { tracks_created: 0 }
        );
    }

    #[test]
    fn completion_wins_over_progress() {
        assert_eq!(
            decode_server_message(r#"{"status":"completed","tracks_created":1,"progress":50}"#)
                .unwrap(),
            ServerMessage::Completed { tracks_created: 1 }
        );
    }

    #[test]
    fn rejects_noise() {
        assert!(matches!(
            decode_server_message("not json"),
            Err(MessageDecodeError::Json(_))
        ));
        assert!(matches!(
            decode_server_message(r#"{"status": "pending"}"#),
            Err(MessageDecodeError::UnknownShape(_))
        ));
        assert!(matches!(
            decode_server_message(r#"{"progress": "ten"}"#),
            Err(MessageDecodeError::UnknownShape(_))
        ));
        assert!(matches!(
            decode_server_message("[1,2]"),
            Err(MessageDecodeError::UnknownShape(_))
        ));
    }

    #[test]
    fn long_noise_is_truncated() {
        let text = format!(r#"{{"x":"{}"}}"#, "a".repeat(200));
        match decode_server_message(&text) {
            Err(MessageDecodeError::UnknownShape(shown)) => {
                assert!(shown.ends_with("..."));
                assert!(shown.len() < text.len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
