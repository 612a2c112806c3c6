//! Client-side session engine for a streaming chat backend.
//!
//! Keeps one WebSocket connection to the `/chat` endpoint alive with a
//! bounded fixed-delay retry policy, stitches streamed answer fragments back
//! into single messages, and persists the conversation after every change.
//!
//! The engine itself is synchronous: [`SessionController`] handles one event
//! at a time. [`SessionRuntime`] is the tokio event loop that feeds it
//! transport events, retry timer firings, and queries submitted through a
//! [`QueryHandle`].

pub mod accumulator;
pub mod connection;
pub mod controller;
pub mod protocol;
pub mod runtime;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use accumulator::{FrameOutcome, StreamAccumulator};
pub use connection::{ConnectionManager, Inbound, RetryPolicy};
pub use controller::{SessionController, TurnContext};
pub use protocol::InboundFrame;
pub use runtime::{QueryHandle, SessionRuntime, SessionSettings};
pub use store::{ConversationStore, FileStorage, MemoryStorage, SnapshotStorage};
pub use transport::{
    ConnectionId, RetryTimer, TimerToken, TokioRetryTimer, Transport, TransportEnvelope,
    TransportEvent, WsTransport,
};
