//! Connection lifecycle: a table-driven state machine plus the manager that
//! owns the transport and retry timer.

mod fsm;
mod manager;

pub use fsm::{transition, Action, ConnInput, Transition};
pub use manager::{ConnectionManager, Inbound, RetryPolicy};
