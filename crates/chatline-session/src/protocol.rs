//! Wire frames exchanged with the `/chat` endpoint.
//!
//! Outbound: `{"query": "..."}`. Inbound: `{"answer": "..."}` or
//! `{"error": "..."}`; anything else is malformed.

use serde::Serialize;
use serde_json::Value;

/// Frame sent to ask the backend a question.
#[derive(Debug, Serialize)]
pub struct QueryFrame<'a> {
    pub query: &'a str,
}

impl<'a> QueryFrame<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// One fragment of a streamed answer.
    Answer(String),
    /// The backend reported a failure for the current turn.
    Error(String),
    /// Not JSON, not an object, or no string `answer`/`error` key.
    Malformed,
}

impl InboundFrame {
    /// Decode a raw text frame. When both keys are present `answer` wins.
    pub fn parse(raw: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
            return InboundFrame::Malformed;
        };

        match (map.get("answer"), map.get("error")) {
            (Some(Value::String(fragment)), _) => InboundFrame::Answer(fragment.clone()),
            (None | Some(Value::Null), Some(Value::String(text))) => {
                InboundFrame::Error(text.clone())
            }
            _ => InboundFrame::Malformed,
        }
    }
}
