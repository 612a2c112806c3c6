//! Stdin as a query producer.

use chatline_common::{ConnectionState, SessionEvent};
use chatline_session::QueryHandle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

const CMD_RESET: &str = "/reset";
const CMD_QUIT: &str = "/quit";

/// Wait until the first connection attempt either succeeds or gives up.
/// Returns the state it settled in, or `None` if the session went away.
pub async fn wait_until_settled(
    events: &mut broadcast::Receiver<SessionEvent>,
) -> Option<ConnectionState> {
    loop {
        match events.recv().await {
            Ok(SessionEvent::ConnectionChanged(
                state @ (ConnectionState::Connected | ConnectionState::Failed),
            )) => return Some(state),
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Feed lines to the session until `/quit` or EOF, then shut it down.
///
/// Reading starts only once the connection has settled, so piped input is
/// not dropped while the first handshake is still in flight.
pub async fn read_lines<R>(reader: R, handle: QueryHandle, mut events: broadcast::Receiver<SessionEvent>)
where
    R: AsyncBufRead + Unpin,
{
    match wait_until_settled(&mut events).await {
        Some(state) => tracing::debug!(%state, "Connection settled, reading input"),
        None => return,
    }
    drop(events);

    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {e}");
                break;
            }
        };

        let result = match line.trim() {
            CMD_QUIT => break,
            CMD_RESET => handle.reset().await,
            _ => handle.submit(line.as_str()).await,
        };
        if result.is_err() {
            return;
        }
    }
    let _ = handle.shutdown().await;
}
