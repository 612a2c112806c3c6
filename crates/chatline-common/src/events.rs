use tokio::sync::broadcast;

use crate::id::MessageId;
use crate::types::{ConnectionState, Message};

/// Notifications published by a session for whatever presents it.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ConnectionChanged(ConnectionState),
    MessageAppended(Message),
    MessageUpdated { id: MessageId, text: String },
    BusyChanged(bool),
    ConversationReset,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
