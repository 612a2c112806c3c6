//! Connection lifecycle and retry policy.

use std::time::Duration;

use chatline_common::{ConnectionState, EventBus, SessionEvent};
use tracing::{debug, info, warn};

use super::fsm::{transition, Action, ConnInput};
use crate::transport::{ConnectionId, RetryTimer, TimerToken, Transport, TransportEvent};

/// How many times, and how often, a lost connection is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// What a transport event means for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// An inbound frame to hand to the accumulator.
    Frame(String),
    /// The live connection went away; any open turn is over.
    Lost,
    /// Nothing for the session to do.
    Ignored,
}

/// Owns the transport, the retry timer, and the connection state.
pub struct ConnectionManager<T, R> {
    transport: T,
    timer: R,
    policy: RetryPolicy,
    state: ConnectionState,
    attempts: u32,
    current: Option<ConnectionId>,
    next_connection: u64,
    pending_retry: Option<TimerToken>,
    next_token: u64,
    events: EventBus,
}

impl<T: Transport, R: RetryTimer> ConnectionManager<T, R> {
    pub fn new(transport: T, timer: R, policy: RetryPolicy, events: EventBus) -> Self {
        Self {
            transport,
            timer,
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            current: None,
            next_connection: 0,
            pending_retry: None,
            next_token: 0,
            events,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts made since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    pub fn open(&mut self) {
        self.dispatch(ConnInput::OpenRequested);
    }

    pub fn close(&mut self) {
        self.dispatch(ConnInput::CloseRequested);
    }

    /// Transmit a frame if connected. Returns whether it was handed to the
    /// transport; frames are never queued.
    pub fn send(&mut self, frame: String) -> bool {
        if self.state != ConnectionState::Connected {
            warn!(state = %self.state, "Not connected, dropping outbound frame");
            return false;
        }
        match self.transport.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Transport rejected outbound frame");
                false
            }
        }
    }

    /// Apply one transport event. Events from any connection other than the
    /// current one are ignored.
    pub fn on_transport_event(&mut self, id: ConnectionId, event: TransportEvent) -> Inbound {
        if self.current != Some(id) {
            debug!(connection = %id, ?event, "Ignoring event from stale connection");
            return Inbound::Ignored;
        }

        match event {
            TransportEvent::Opened => {
                self.dispatch(ConnInput::Established);
                Inbound::Ignored
            }
            TransportEvent::Frame(text) => {
                if self.state == ConnectionState::Connected {
                    Inbound::Frame(text)
                } else {
                    debug!(state = %self.state, "Ignoring frame outside connected state");
                    Inbound::Ignored
                }
            }
            TransportEvent::Error(reason) => {
                warn!(connection = %id, reason = %reason, "Transport error");
                self.lost()
            }
            TransportEvent::Closed => {
                info!(connection = %id, "Transport closed");
                self.lost()
            }
        }
    }

    /// Apply a retry timer firing. Tokens of cancelled timers are ignored.
    pub fn on_retry_fired(&mut self, token: TimerToken) {
        if self.pending_retry != Some(token) {
            debug!(?token, "Ignoring stale retry timer");
            return;
        }
        self.pending_retry = None;
        self.dispatch(ConnInput::RetryFired);
    }

    fn lost(&mut self) -> Inbound {
        let retries_left = self.attempts < self.policy.max_attempts;
        let was_connected = self.state == ConnectionState::Connected;
        if self.dispatch(ConnInput::TransportLost { retries_left }) && was_connected {
            Inbound::Lost
        } else {
            Inbound::Ignored
        }
    }

    fn dispatch(&mut self, input: ConnInput) -> bool {
        let Some(step) = transition(self.state, input) else {
            debug!(state = %self.state, ?input, "Connection input ignored");
            return false;
        };

        for action in step.actions {
            self.apply(*action);
        }

        if step.next != self.state {
            info!(from = %self.state, to = %step.next, attempts = self.attempts, "Connection state changed");
            self.state = step.next;
            self.events
                .publish(SessionEvent::ConnectionChanged(step.next));
        }
        if step.next == ConnectionState::Failed {
            warn!(
                attempts = self.attempts,
                "Reconnect attempts exhausted, giving up"
            );
        }
        true
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::StartTransport => {
                self.next_connection += 1;
                let id = ConnectionId(self.next_connection);
                self.current = Some(id);
                self.transport.connect(id);
            }
            Action::ReleaseTransport => {
                if self.current.take().is_some() {
                    self.transport.close();
                }
            }
            Action::ResetAttempts => self.attempts = 0,
            Action::CountAttempt => self.attempts += 1,
            Action::ScheduleRetry => {
                if self.pending_retry.is_some() {
                    debug!("Retry already pending");
                    return;
                }
                self.next_token += 1;
                let token = TimerToken(self.next_token);
                self.pending_retry = Some(token);
                info!(
                    delay_ms = self.policy.delay.as_millis() as u64,
                    attempt = self.attempts + 1,
                    max_attempts = self.policy.max_attempts,
                    "Scheduling reconnect"
                );
                self.timer.schedule(self.policy.delay, token);
            }
            Action::CancelRetry => {
                if self.pending_retry.take().is_some() {
                    self.timer.cancel();
                }
            }
        }
    }
}
