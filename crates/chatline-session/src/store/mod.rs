//! Ordered conversation history with write-through persistence.
//!
//! Every mutation rewrites the whole snapshot under one fixed key, so a
//! reload always sees the conversation exactly as it was last shown.

mod storage;

use std::collections::HashSet;

use chatline_common::{EventBus, Message, MessageId, SessionEvent, StoreError};
use tracing::{debug, info, warn};

pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};

/// The running conversation.
pub struct ConversationStore<S> {
    messages: Vec<Message>,
    storage: S,
    key: String,
    events: EventBus,
}

impl<S: SnapshotStorage> ConversationStore<S> {
    /// Load the snapshot under `key`. An absent or malformed snapshot starts
    /// an empty conversation.
    pub fn open(storage: S, key: impl Into<String>, events: EventBus) -> Self {
        let key = key.into();
        let messages = match storage.load(&key) {
            Ok(Some(snapshot)) => decode_snapshot(&snapshot).unwrap_or_else(|reason| {
                warn!(key = %key, reason = %reason, "Discarding malformed conversation snapshot");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read conversation snapshot");
                Vec::new()
            }
        };
        info!(key = %key, messages = messages.len(), "Conversation loaded");

        Self {
            messages,
            storage,
            key,
            events,
        }
    }

    pub fn append(&mut self, message: Message) {
        debug!(id = %message.id, sender = ?message.sender, "Appending message");
        self.messages.push(message.clone());
        self.persist();
        self.events.publish(SessionEvent::MessageAppended(message));
    }

    /// Replace the text of an existing message.
    pub fn update_text(&mut self, id: &MessageId, text: impl Into<String>) -> Result<(), StoreError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| StoreError::UnknownMessage(id.to_string()))?;
        message.text = text.into();
        let text = message.text.clone();
        self.persist();
        self.events.publish(SessionEvent::MessageUpdated {
            id: id.clone(),
            text,
        });
        Ok(())
    }

    /// Drop the whole conversation.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.persist();
        self.events.publish(SessionEvent::ConversationReset);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Write failures are logged, never surfaced: the in-memory conversation
    /// stays authoritative for the running session.
    fn persist(&mut self) {
        if let Err(e) = self.write_snapshot() {
            warn!(key = %self.key, error = %e, "Failed to persist conversation");
        }
    }

    fn write_snapshot(&mut self) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(&self.messages)?;
        self.storage.save(&self.key, &snapshot)
    }
}

fn decode_snapshot(snapshot: &str) -> Result<Vec<Message>, String> {
    let messages: Vec<Message> = serde_json::from_str(snapshot).map_err(|e| e.to_string())?;
    let mut seen = HashSet::new();
    for message in &messages {
        if !seen.insert(&message.id) {
            return Err(format!("duplicate message id {}", message.id));
        }
    }
    Ok(messages)
}
