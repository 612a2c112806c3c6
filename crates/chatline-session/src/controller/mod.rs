//! Turn sequencing on top of the connection, accumulator and store.
//!
//! A turn starts when a query is accepted and stays "busy" until the first
//! inbound frame arrives (or the connection goes away). Only one turn can be
//! opened while busy; later queries are dropped, never queued.

use chatline_common::{ConnectionState, EventBus, Message, MessageId, SessionEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::accumulator::StreamAccumulator;
use crate::connection::{ConnectionManager, Inbound};
use crate::protocol::QueryFrame;
use crate::store::{ConversationStore, SnapshotStorage};
use crate::transport::{ConnectionId, RetryTimer, TimerToken, Transport, TransportEvent};

#[cfg(test)]
mod tests;

/// Snapshot of the in-flight turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnContext {
    pub active_message_id: Option<MessageId>,
    pub busy: bool,
}

/// The one object a front end talks to.
pub struct SessionController<T, R, S> {
    connection: ConnectionManager<T, R>,
    store: ConversationStore<S>,
    accumulator: StreamAccumulator,
    busy: bool,
    events: EventBus,
}

impl<T, R, S> SessionController<T, R, S>
where
    T: Transport,
    R: RetryTimer,
    S: SnapshotStorage,
{
    pub fn new(
        connection: ConnectionManager<T, R>,
        store: ConversationStore<S>,
        events: EventBus,
    ) -> Self {
        Self {
            connection,
            store,
            accumulator: StreamAccumulator::new(),
            busy: false,
            events,
        }
    }

    pub fn open(&mut self) {
        self.connection.open();
    }

    /// Closing ends any open turn.
    pub fn close(&mut self) {
        self.connection.close();
        self.end_turn();
    }

    /// Submit a user query. Returns whether a frame went out.
    ///
    /// Blank input and input while busy are ignored outright. Otherwise the
    /// user message and an empty bot placeholder are recorded even if the
    /// connection turns out not to be usable, in which case the turn ends on
    /// the spot.
    pub fn send_query(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            debug!("Ignoring blank query");
            return false;
        }
        if self.busy {
            debug!("Turn in progress, ignoring query");
            return false;
        }

        self.set_busy(true);
        self.store.append(Message::user(text));
        let placeholder = self.accumulator.begin_turn(&mut self.store);

        let frame = match QueryFrame::new(text).encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode query");
                self.end_turn();
                return false;
            }
        };

        if self.connection.send(frame) {
            info!(id = %placeholder, chars = text.len(), "Query sent");
            true
        } else {
            info!(state = %self.connection.state(), "Query dropped, connection unavailable");
            self.end_turn();
            false
        }
    }

    pub fn handle_transport_event(&mut self, id: ConnectionId, event: TransportEvent) {
        match self.connection.on_transport_event(id, event) {
            Inbound::Frame(raw) => {
                self.accumulator.ingest(&raw, &mut self.store);
                self.set_busy(false);
            }
            Inbound::Lost => self.end_turn(),
            Inbound::Ignored => {}
        }
    }

    pub fn handle_retry_fired(&mut self, token: TimerToken) {
        self.connection.on_retry_fired(token);
    }

    /// Wipe the conversation. A streaming answer stops being tracked; the
    /// busy flag is left alone.
    pub fn reset_conversation(&mut self) {
        info!(messages = self.store.len(), "Resetting conversation");
        self.accumulator.finalize();
        self.store.reset();
    }

    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn turn(&self) -> TurnContext {
        TurnContext {
            active_message_id: self.accumulator.active_message_id().cloned(),
            busy: self.busy,
        }
    }

    pub fn connection(&self) -> &ConnectionManager<T, R> {
        &self.connection
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn end_turn(&mut self) {
        self.accumulator.finalize();
        self.set_busy(false);
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.events.publish(SessionEvent::BusyChanged(busy));
        }
    }
}
