//! Transport and retry-timer seams.
//!
//! The connection manager only ever talks to these traits. The tokio
//! implementations report back asynchronously through channels drained by
//! the session runtime; every report is tagged so that events from a
//! superseded connection or a cancelled timer can be told apart.

mod timer;
mod ws;

use std::fmt;
use std::time::Duration;

use chatline_common::TransportError;

pub use timer::TokioRetryTimer;
pub use ws::WsTransport;

/// Identifies one transport connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifies one scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Something that happened on a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished; frames may flow.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// Connecting failed or the connection broke.
    Error(String),
    /// The remote side closed the connection.
    Closed,
}

/// A transport event tagged with the connection it belongs to.
#[derive(Debug, Clone)]
pub struct TransportEnvelope {
    pub connection: ConnectionId,
    pub event: TransportEvent,
}

/// Bidirectional frame transport owned by the connection manager.
pub trait Transport {
    /// Start establishing a connection. Outcome arrives as events tagged `id`.
    fn connect(&mut self, id: ConnectionId);

    /// Hand one frame to the open connection.
    fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Drop the current connection, if any. Safe to call repeatedly.
    fn close(&mut self);
}

/// One-shot, cancellable timer driving reconnect attempts.
pub trait RetryTimer {
    /// Fire `token` once after `delay`.
    fn schedule(&mut self, delay: Duration, token: TimerToken);

    /// Cancel the scheduled firing, if any.
    fn cancel(&mut self);
}
