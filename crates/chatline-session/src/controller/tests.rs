use std::time::Duration;

use chatline_common::{ErrorCategory, Sender};

use super::*;
use crate::connection::RetryPolicy;
use crate::store::MemoryStorage;
use crate::testing::{FakeTimer, FakeTransport};

type Controller = SessionController<FakeTransport, FakeTimer, MemoryStorage>;

struct Harness {
    controller: Controller,
    transport: FakeTransport,
    timer: FakeTimer,
}

impl Harness {
    fn new() -> Self {
        let transport = FakeTransport::default();
        let timer = FakeTimer::default();
        let events = EventBus::default();
        let connection = ConnectionManager::new(
            transport.clone(),
            timer.clone(),
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(2000),
            },
            events.clone(),
        );
        let store = ConversationStore::open(MemoryStorage::default(), "chatHistory", events.clone());
        Self {
            controller: SessionController::new(connection, store, events),
            transport,
            timer,
        }
    }

    fn connected() -> Self {
        let mut harness = Self::new();
        harness.controller.open();
        harness.opened();
        assert_eq!(harness.controller.connection_state(), ConnectionState::Connected);
        harness
    }

    fn current(&self) -> ConnectionId {
        self.transport.last_connection()
    }

    fn opened(&mut self) {
        let id = self.current();
        self.controller.handle_transport_event(id, TransportEvent::Opened);
    }

    fn frame(&mut self, raw: &str) {
        let id = self.current();
        self.controller
            .handle_transport_event(id, TransportEvent::Frame(raw.to_string()));
    }

    fn fail(&mut self) {
        let id = self.current();
        self.controller
            .handle_transport_event(id, TransportEvent::Error("connection refused".into()));
    }

    fn fire_retry(&mut self) {
        let token = self.timer.last_token();
        self.controller.handle_retry_fired(token);
    }
}

#[test]
fn streamed_answer_becomes_one_message() {
    let mut h = Harness::connected();

    assert!(h.controller.send_query("hello"));
    assert!(h.controller.is_busy());
    assert_eq!(h.transport.sent(), vec![r#"{"query":"hello"}"#.to_string()]);
    let bot_id = h.controller.turn().active_message_id.unwrap();

    h.frame(r#"{"answer":"Hi"}"#);
    assert!(!h.controller.is_busy());
    h.frame(r#"{"answer":" there"}"#);
    h.frame(r#"{"answer":"!"}"#);

    let messages = h.controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[1].id, bot_id);
    assert_eq!(messages[1].text, "Hi there!");
}

#[test]
fn application_error_ends_turn_with_distinct_message() {
    let mut h = Harness::connected();
    h.controller.send_query("bad");
    let placeholder = h.controller.turn().active_message_id.unwrap();

    h.frame(r#"{"error":"model unavailable"}"#);

    let messages = h.controller.messages();
    assert_eq!(messages[0].text, "bad");
    let error = messages.last().unwrap();
    assert_ne!(error.id, placeholder);
    assert_eq!(error.text, "model unavailable");
    assert_eq!(error.error, Some(ErrorCategory::Application));
    assert_eq!(h.controller.turn(), TurnContext::default());

    // The next turn gets its own bot message.
    h.controller.send_query("again");
    h.frame(r#"{"answer":"ok"}"#);
    assert_eq!(h.controller.messages().last().unwrap().text, "ok");
    assert_eq!(h.controller.messages()[1].text, "");
}

#[test]
fn reconnect_on_first_retry_resets_attempts() {
    let mut h = Harness::connected();
    let id = h.current();
    h.controller.handle_transport_event(id, TransportEvent::Closed);
    assert_eq!(h.controller.connection_state(), ConnectionState::Retrying);

    h.fire_retry();
    assert_eq!(h.controller.connection().attempts(), 1);
    h.opened();

    assert_eq!(h.controller.connection_state(), ConnectionState::Connected);
    assert_eq!(h.controller.connection().attempts(), 0);
    assert!(h.controller.messages().is_empty());
}

#[test]
fn three_failed_reconnects_give_up() {
    let mut h = Harness::connected();
    let id = h.current();
    h.controller.handle_transport_event(id, TransportEvent::Closed);

    for _ in 0..3 {
        h.fire_retry();
        h.fail();
    }

    assert_eq!(h.controller.connection_state(), ConnectionState::Failed);
    assert!(!h.controller.connection_state().is_connected());
    assert_eq!(h.timer.log.borrow().scheduled.len(), 3);
    assert!(!h.controller.connection().has_pending_retry());

    h.controller.close();
    h.controller.close();
    assert_eq!(h.controller.connection_state(), ConnectionState::Failed);
    assert_eq!(h.timer.log.borrow().scheduled.len(), 3);
}

#[test]
fn malformed_frame_is_reported_without_touching_answer() {
    let mut h = Harness::connected();
    h.controller.send_query("hello");
    h.frame(r#"{"answer":"Hi"}"#);
    let bot_id = h.controller.turn().active_message_id.unwrap();

    h.frame("<html>502 Bad Gateway</html>");
    h.frame(r#"{"answer":" again"}"#);

    let messages = h.controller.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].id, bot_id);
    assert_eq!(messages[1].text, "Hi again");
    assert_eq!(messages[2].text, "<html>502 Bad Gateway</html>");
    assert_eq!(messages[2].error, Some(ErrorCategory::Malformed));
}

#[test]
fn blank_query_is_ignored() {
    let mut h = Harness::connected();
    for blank in ["", "   ", "\n\t"] {
        assert!(!h.controller.send_query(blank));
    }
    assert!(h.controller.messages().is_empty());
    assert!(h.transport.sent().is_empty());
    assert!(!h.controller.is_busy());
}

#[test]
fn query_while_busy_is_ignored() {
    let mut h = Harness::connected();
    assert!(h.controller.send_query("first"));
    assert!(!h.controller.send_query("second"));

    assert_eq!(h.controller.messages().len(), 2);
    assert_eq!(h.transport.sent().len(), 1);

    h.frame(r#"{"answer":"reply"}"#);
    assert!(h.controller.send_query("second"));
}

#[test]
fn query_while_disconnected_closes_turn_immediately() {
    let mut h = Harness::new();

    assert!(!h.controller.send_query("hello?"));

    assert!(!h.controller.is_busy());
    assert!(h.controller.turn().active_message_id.is_none());
    assert!(h.transport.sent().is_empty());
    let messages = h.controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "hello?");
    assert_eq!(messages[1].sender, Sender::Bot);
    assert_eq!(messages[1].text, "");
}

#[test]
fn connection_loss_ends_turn() {
    let mut h = Harness::connected();
    h.controller.send_query("hello");
    assert!(h.controller.is_busy());

    h.fail();

    assert!(!h.controller.is_busy());
    assert!(h.controller.turn().active_message_id.is_none());
    assert_eq!(h.controller.connection_state(), ConnectionState::Retrying);
}

#[test]
fn reset_clears_conversation_and_stops_streaming() {
    let mut h = Harness::connected();
    h.controller.send_query("hello");
    h.frame(r#"{"answer":"Hi"}"#);

    h.controller.reset_conversation();
    assert!(h.controller.messages().is_empty());
    assert!(h.controller.turn().active_message_id.is_none());

    h.frame(r#"{"answer":" late"}"#);
    assert_eq!(h.controller.messages().len(), 1);
    assert_eq!(h.controller.messages()[0].text, " late");
}

#[tokio::test]
async fn busy_changes_are_published() {
    let mut h = Harness::connected();
    let mut rx = h.controller.subscribe();

    h.controller.send_query("hello");
    h.frame(r#"{"answer":"Hi"}"#);

    let mut busy = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::BusyChanged(value) = event {
            busy.push(value);
        }
    }
    assert_eq!(busy, vec![true, false]);
}
