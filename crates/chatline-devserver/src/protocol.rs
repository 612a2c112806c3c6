//! `/chat` wire format as seen from the server side.

use serde::{Deserialize, Serialize};

/// A query frame from a client.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub query: String,
}

/// One frame back to the client. Exactly one field is set.
#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn answer(fragment: impl Into<String>) -> Self {
        Self {
            answer: Some(fragment.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            answer: None,
            error: Some(message.into()),
        }
    }
}

pub const INVALID_FORMAT: &str = "Invalid message format";
pub const INVALID_QUERY: &str = "Invalid query";
