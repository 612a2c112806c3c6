//! Connection state transition table.
//!
//! Every way the connection state can change is listed in [`transition`].
//! The manager turns the returned actions into transport and timer calls.

use chatline_common::ConnectionState;

/// Input to the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnInput {
    /// `open()` was called.
    OpenRequested,
    /// The transport finished its handshake.
    Established,
    /// The transport errored or closed without being asked to.
    TransportLost { retries_left: bool },
    /// The pending retry timer fired.
    RetryFired,
    /// `close()` was called.
    CloseRequested,
}

/// Side effect the manager performs while taking a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartTransport,
    ReleaseTransport,
    ResetAttempts,
    CountAttempt,
    ScheduleRetry,
    CancelRetry,
}

/// Result of a state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ConnectionState,
    pub actions: &'static [Action],
}

const fn to(next: ConnectionState, actions: &'static [Action]) -> Option<Transition> {
    Some(Transition { next, actions })
}

/// Look up the transition for `input` in `state`. `None` means the input is
/// ignored in that state.
///
/// `Failed` absorbs every input: once retries are exhausted nothing but a
/// fresh session recovers the connection.
pub fn transition(state: ConnectionState, input: ConnInput) -> Option<Transition> {
    use Action::*;
    use ConnInput::*;
    use ConnectionState::*;

    match (state, input) {
        (Disconnected, OpenRequested) => to(Connecting, &[StartTransport]),
        (Retrying, OpenRequested) => to(Connecting, &[CancelRetry, StartTransport]),
        (Connecting | Connected | Failed, OpenRequested) => None,

        (Connecting, Established) => to(Connected, &[ResetAttempts, CancelRetry]),
        (_, Established) => None,

        (Connecting | Connected, TransportLost { retries_left: true }) => {
            to(Retrying, &[ReleaseTransport, ScheduleRetry])
        }
        (Connecting | Connected, TransportLost { retries_left: false }) => {
            to(Failed, &[ReleaseTransport, CancelRetry])
        }
        (_, TransportLost { .. }) => None,

        (Retrying, RetryFired) => to(Connecting, &[CountAttempt, StartTransport]),
        (_, RetryFired) => None,

        (Connecting | Connected | Retrying, CloseRequested) => {
            to(Disconnected, &[CancelRetry, ReleaseTransport])
        }
        (Disconnected | Failed, CloseRequested) => None,
    }
}
