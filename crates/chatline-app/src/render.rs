//! Plain-text rendering of session events.

use std::collections::HashMap;
use std::io::{self, Write};

use chatline_common::{ConnectionState, Message, MessageId, Sender, SessionEvent};
use tokio::sync::broadcast;

/// Writes the conversation as it changes. Streamed bot messages are printed
/// incrementally: only the part not yet shown is written.
pub struct Printer<W> {
    out: W,
    shown: HashMap<MessageId, usize>,
    line_open: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: HashMap::new(),
            line_open: false,
        }
    }

    pub fn history(&mut self, messages: &[Message]) -> io::Result<()> {
        for message in messages {
            self.message(message)?;
        }
        self.close_line()
    }

    pub fn handle(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::MessageAppended(message) => self.message(message)?,
            SessionEvent::MessageUpdated { id, text } => self.update(id, text)?,
            SessionEvent::ConnectionChanged(state) => {
                self.close_line()?;
                writeln!(self.out, "-- {} --", status_line(*state))?;
            }
            SessionEvent::ConversationReset => {
                self.close_line()?;
                self.shown.clear();
                writeln!(self.out, "-- conversation cleared --")?;
            }
            SessionEvent::BusyChanged(_) => {}
        }
        self.out.flush()
    }

    fn message(&mut self, message: &Message) -> io::Result<()> {
        self.close_line()?;
        if message.is_error() {
            writeln!(self.out, "[error] {}", message.text)?;
            return Ok(());
        }
        match message.sender {
            Sender::User => writeln!(self.out, "you: {}", message.text)?,
            Sender::Bot => {
                write!(self.out, "bot: {}", message.text)?;
                self.shown.insert(message.id.clone(), message.text.len());
                self.line_open = true;
            }
        }
        Ok(())
    }

    fn update(&mut self, id: &MessageId, text: &str) -> io::Result<()> {
        let shown = self.shown.get(id).copied().unwrap_or(0);
        if !self.line_open {
            // Something else was printed mid-stream; resume on a fresh line.
            let marker = if shown > 0 { "bot: ..." } else { "bot: " };
            write!(self.out, "{marker}")?;
            self.line_open = true;
        }
        if let Some(delta) = text.get(shown..) {
            write!(self.out, "{delta}")?;
        }
        self.shown.insert(id.clone(), text.len());
        Ok(())
    }

    fn close_line(&mut self) -> io::Result<()> {
        if self.line_open {
            self.line_open = false;
            writeln!(self.out)?;
        }
        Ok(())
    }
}

fn status_line(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Connected => "connected",
        ConnectionState::Retrying => "connection lost, retrying",
        ConnectionState::Failed => "disconnected (gave up reconnecting)",
    }
}

/// Print events to stdout until the session's event bus closes.
pub async fn run(mut events: broadcast::Receiver<SessionEvent>) {
    let mut printer = Printer::new(io::stdout());
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(e) = printer.handle(&event) {
                    tracing::warn!(error = %e, "Failed to write to stdout");
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer fell behind, skipped events");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_common::ErrorCategory;

    fn render(events: &[SessionEvent]) -> String {
        let mut printer = Printer::new(Vec::new());
        for event in events {
            printer.handle(event).unwrap();
        }
        String::from_utf8(printer.out).unwrap()
    }

    #[test]
    fn streamed_answer_prints_only_new_text() {
        let id = MessageId::from("bot-1");
        let out = render(&[
            SessionEvent::MessageAppended(Message::user("hello")),
            SessionEvent::MessageAppended(Message::bot_placeholder(id.clone())),
            SessionEvent::MessageUpdated {
                id: id.clone(),
                text: "Hi".into(),
            },
            SessionEvent::MessageUpdated {
                id,
                text: "Hi there!".into(),
            },
            SessionEvent::MessageAppended(Message::error(ErrorCategory::Application, "oops")),
        ]);
        assert_eq!(out, "you: hello\nbot: Hi there!\n[error] oops\n");
    }

    #[test]
    fn answer_interrupted_by_error_resumes_on_new_line() {
        let id = MessageId::from("bot-1");
        let out = render(&[
            SessionEvent::MessageAppended(Message::bot_placeholder(id.clone())),
            SessionEvent::MessageUpdated {
                id: id.clone(),
                text: "Hi".into(),
            },
            SessionEvent::MessageAppended(Message::error(ErrorCategory::Malformed, "<html>")),
            SessionEvent::MessageUpdated {
                id,
                text: "Hi again".into(),
            },
            SessionEvent::MessageAppended(Message::user("next")),
        ]);
        assert_eq!(out, "bot: Hi\n[error] <html>\nbot: ... again\nyou: next\n");
    }

    #[test]
    fn connection_changes_get_their_own_line() {
        let out = render(&[
            SessionEvent::ConnectionChanged(ConnectionState::Connecting),
            SessionEvent::ConnectionChanged(ConnectionState::Failed),
        ]);
        assert_eq!(
            out,
            "-- connecting... --\n-- disconnected (gave up reconnecting) --\n"
        );
    }

    #[test]
    fn history_closes_open_bot_line() {
        let mut printer = Printer::new(Vec::new());
        let mut bot = Message::bot_placeholder(MessageId::from("b"));
        bot.text = "earlier answer".into();
        printer.history(&[Message::user("q"), bot]).unwrap();
        assert_eq!(
            String::from_utf8(printer.out).unwrap(),
            "you: q\nbot: earlier answer\n"
        );
    }
}
