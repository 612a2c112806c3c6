//! Tokio event loop driving a [`SessionController`].
//!
//! Transport events, retry timer firings and submitted commands arrive on
//! three channels. One `select!` loop takes them one at a time, so the
//! controller never sees two events concurrently.

use std::time::Duration;

use chatline_common::{EventBus, Message, SessionEvent, TransportError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::connection::{ConnectionManager, RetryPolicy};
use crate::controller::SessionController;
use crate::store::{ConversationStore, SnapshotStorage};
use crate::transport::{TimerToken, TokioRetryTimer, TransportEnvelope, WsTransport};

const TRANSPORT_CHANNEL_CAPACITY: usize = 256;
const TIMER_CHANNEL_CAPACITY: usize = 4;
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub storage_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/chat".to_string(),
            connect_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            storage_key: "chatHistory".to_string(),
        }
    }
}

#[derive(Debug)]
enum RuntimeCommand {
    Query(String),
    Reset,
    Shutdown,
}

/// Cloneable handle for anything that produces queries: typed input,
/// recognized speech, scripts.
#[derive(Clone)]
pub struct QueryHandle {
    command_tx: mpsc::Sender<RuntimeCommand>,
    events: EventBus,
}

impl QueryHandle {
    /// Queue final text for `send_query`. The usual gating (blank, busy,
    /// disconnected) applies when the runtime picks it up.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.command(RuntimeCommand::Query(text.into())).await
    }

    pub async fn reset(&self) -> Result<(), TransportError> {
        self.command(RuntimeCommand::Reset).await
    }

    /// Ask the runtime to close the connection and return.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        self.command(RuntimeCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn command(&self, command: RuntimeCommand) -> Result<(), TransportError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Owns the controller and the receiving ends of its event sources.
pub struct SessionRuntime<S> {
    controller: SessionController<WsTransport, TokioRetryTimer, S>,
    transport_rx: mpsc::Receiver<TransportEnvelope>,
    timer_rx: mpsc::Receiver<TimerToken>,
    command_rx: mpsc::Receiver<RuntimeCommand>,
}

impl<S: SnapshotStorage> SessionRuntime<S> {
    /// Build a session over `storage`. Nothing touches the network until
    /// [`run`](Self::run).
    pub fn new(settings: SessionSettings, storage: S) -> (Self, QueryHandle) {
        let events = EventBus::default();
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_CHANNEL_CAPACITY);
        let (timer_tx, timer_rx) = mpsc::channel(TIMER_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let transport = WsTransport::new(settings.endpoint, settings.connect_timeout, transport_tx);
        let timer = TokioRetryTimer::new(timer_tx);
        let connection = ConnectionManager::new(transport, timer, settings.retry, events.clone());
        let store = ConversationStore::open(storage, settings.storage_key, events.clone());
        let controller = SessionController::new(connection, store, events.clone());

        let runtime = Self {
            controller,
            transport_rx,
            timer_rx,
            command_rx,
        };
        let handle = QueryHandle { command_tx, events };
        (runtime, handle)
    }

    /// The conversation as loaded, before anything runs.
    pub fn messages(&self) -> &[Message] {
        self.controller.messages()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.controller.subscribe()
    }

    /// Connect and process events until shut down or every handle is
    /// dropped. Returns the final conversation.
    pub async fn run(self) -> Vec<Message> {
        let Self {
            mut controller,
            mut transport_rx,
            mut timer_rx,
            mut command_rx,
        } = self;

        info!("Session starting");
        controller.open();

        loop {
            tokio::select! {
                Some(envelope) = transport_rx.recv() => {
                    controller.handle_transport_event(envelope.connection, envelope.event);
                }
                Some(token) = timer_rx.recv() => {
                    controller.handle_retry_fired(token);
                }
                command = command_rx.recv() => {
                    match command {
                        Some(RuntimeCommand::Query(text)) => {
                            controller.send_query(&text);
                        }
                        Some(RuntimeCommand::Reset) => controller.reset_conversation(),
                        Some(RuntimeCommand::Shutdown) => {
                            debug!("Shutdown requested");
                            break;
                        }
                        None => {
                            debug!("All query handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        controller.close();
        info!(messages = controller.messages().len(), "Session stopped");
        controller.messages().to_vec()
    }
}
