//! Reassembles streamed answer fragments into single bot messages.

use chatline_common::{ErrorCategory, Message, MessageId};
use tracing::{debug, warn};

use crate::protocol::InboundFrame;
use crate::store::{ConversationStore, SnapshotStorage};

/// What a single inbound frame did to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A fragment was appended to the turn's bot message.
    Fragment(MessageId),
    /// The backend reported an error; the turn is over and this error
    /// message was appended.
    ApplicationError(MessageId),
    /// The frame could not be understood; this error message was appended
    /// and the turn carries on.
    Malformed(MessageId),
}

impl FrameOutcome {
    pub fn message_id(&self) -> &MessageId {
        match self {
            Self::Fragment(id) | Self::ApplicationError(id) | Self::Malformed(id) => id,
        }
    }
}

/// Tracks the bot message currently being streamed, if any.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    active: Option<MessageId>,
    buffer: String,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_message_id(&self) -> Option<&MessageId> {
        self.active.as_ref()
    }

    /// Start a new turn with an empty bot placeholder. Whatever was streaming
    /// before is finalized.
    pub fn begin_turn<S: SnapshotStorage>(&mut self, store: &mut ConversationStore<S>) -> MessageId {
        let id = MessageId::new();
        store.append(Message::bot_placeholder(id.clone()));
        self.active = Some(id.clone());
        self.buffer.clear();
        id
    }

    /// Stop accumulating into the current bot message.
    pub fn finalize(&mut self) {
        if let Some(id) = self.active.take() {
            debug!(id = %id, chars = self.buffer.len(), "Turn finalized");
        }
        self.buffer.clear();
    }

    /// Apply one raw inbound frame to the conversation.
    pub fn ingest<S: SnapshotStorage>(
        &mut self,
        raw: &str,
        store: &mut ConversationStore<S>,
    ) -> FrameOutcome {
        match InboundFrame::parse(raw) {
            InboundFrame::Answer(fragment) => self.append_fragment(&fragment, store),
            InboundFrame::Error(text) => {
                self.finalize();
                let message = Message::error(ErrorCategory::Application, text);
                let id = message.id.clone();
                store.append(message);
                FrameOutcome::ApplicationError(id)
            }
            InboundFrame::Malformed => {
                warn!(bytes = raw.len(), "Malformed frame from chat endpoint");
                let message = Message::error(ErrorCategory::Malformed, raw);
                let id = message.id.clone();
                store.append(message);
                FrameOutcome::Malformed(id)
            }
        }
    }

    fn append_fragment<S: SnapshotStorage>(
        &mut self,
        fragment: &str,
        store: &mut ConversationStore<S>,
    ) -> FrameOutcome {
        let id = match &self.active {
            Some(id) => id.clone(),
            None => self.begin_turn(store),
        };

        self.buffer.push_str(fragment);
        if let Err(e) = store.update_text(&id, self.buffer.as_str()) {
            // The message vanished underneath us (conversation reset); stream
            // the rest into a fresh one.
            warn!(id = %id, error = %e, "Active message missing, starting a new one");
            let id = self.begin_turn(store);
            self.buffer.push_str(fragment);
            if let Err(e) = store.update_text(&id, self.buffer.as_str()) {
                warn!(id = %id, error = %e, "Failed to apply fragment");
            }
            return FrameOutcome::Fragment(id);
        }
        FrameOutcome::Fragment(id)
    }
}
