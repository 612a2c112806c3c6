use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::MessageId;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Category of an error message shown in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// The backend answered with an `{"error": ...}` frame.
    Application,
    /// The backend sent a frame that could not be decoded.
    Malformed,
}

/// One entry of the conversation.
///
/// Error messages carry plain text plus a category; styling them is left to
/// whatever renders the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCategory>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::User,
            text: text.into(),
            error: None,
        }
    }

    /// Empty bot message that answer fragments are appended to.
    pub fn bot_placeholder(id: MessageId) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            text: String::new(),
            error: None,
        }
    }

    pub fn error(category: ErrorCategory, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Bot,
            text: text.into(),
            error: Some(category),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Connection status of the session transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Retrying,
    Failed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Retrying => "retrying",
            ConnectionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_serializes_without_error_field() {
        let msg = Message {
            id: MessageId::from("a"),
            sender: Sender::User,
            text: "hello".into(),
            error: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"id":"a","sender":"user","text":"hello"}"#);
    }

    #[test]
    fn error_message_carries_category() {
        let msg = Message::error(ErrorCategory::Application, "model unavailable");
        assert!(msg.is_error());
        assert_eq!(msg.sender, Sender::Bot);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["error"], "application");
        assert_eq!(json["text"], "model unavailable");
    }

    #[test]
    fn record_without_error_field_deserializes() {
        let json = r#"{"id":"b","sender":"bot","text":"Hi there!"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.error, None);
    }

    #[test]
    fn bot_placeholder_is_empty() {
        let id = MessageId::new();
        let msg = Message::bot_placeholder(id.clone());
        assert_eq!(msg.id, id);
        assert!(msg.text.is_empty());
        assert!(!msg.is_error());
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Retrying.is_connected());
    }
}
