//! Scripted transport and timer doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chatline_common::TransportError;

use crate::transport::{ConnectionId, RetryTimer, TimerToken, Transport};

#[derive(Debug, Default)]
pub struct TransportLog {
    pub connects: Vec<ConnectionId>,
    pub sent: Vec<String>,
    pub closes: usize,
}

/// Records every call; cloned handles share the same log.
#[derive(Clone, Default)]
pub struct FakeTransport {
    pub log: Rc<RefCell<TransportLog>>,
}

impl FakeTransport {
    pub fn last_connection(&self) -> ConnectionId {
        *self
            .log
            .borrow()
            .connects
            .last()
            .expect("no connection was started")
    }

    pub fn sent(&self) -> Vec<String> {
        self.log.borrow().sent.clone()
    }
}

impl Transport for FakeTransport {
    fn connect(&mut self, id: ConnectionId) {
        self.log.borrow_mut().connects.push(id);
    }

    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.log.borrow_mut().sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }
}

#[derive(Debug, Default)]
pub struct TimerLog {
    pub scheduled: Vec<(Duration, TimerToken)>,
    pub cancels: usize,
}

#[derive(Clone, Default)]
pub struct FakeTimer {
    pub log: Rc<RefCell<TimerLog>>,
}

impl FakeTimer {
    pub fn last_token(&self) -> TimerToken {
        self.log
            .borrow()
            .scheduled
            .last()
            .expect("no retry was scheduled")
            .1
    }
}

impl RetryTimer for FakeTimer {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.log.borrow_mut().scheduled.push((delay, token));
    }

    fn cancel(&mut self) {
        self.log.borrow_mut().cancels += 1;
    }
}
