//! WebSocket transport built on `tokio-tungstenite`.
//!
//! Each connection runs in its own task: connect with a timeout, report
//! `Opened`, then pump outbound frames and inbound messages until either
//! side goes away.

use std::time::Duration;

use chatline_common::TransportError;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::{ConnectionId, Transport, TransportEnvelope, TransportEvent};

/// Transport over a single WebSocket connection at a time.
pub struct WsTransport {
    url: String,
    connect_timeout: Duration,
    event_tx: mpsc::Sender<TransportEnvelope>,
    outbound_tx: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    pub fn new(
        url: impl Into<String>,
        connect_timeout: Duration,
        event_tx: mpsc::Sender<TransportEnvelope>,
    ) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
            event_tx,
            outbound_tx: None,
            task: None,
        }
    }
}

impl Transport for WsTransport {
    fn connect(&mut self, id: ConnectionId) {
        self.close();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.outbound_tx = Some(outbound_tx);
        self.task = Some(tokio::spawn(connection_task(
            self.url.clone(),
            self.connect_timeout,
            id,
            self.event_tx.clone(),
            outbound_rx,
        )));
    }

    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let outbound = self
            .outbound_tx
            .as_ref()
            .ok_or(TransportError::NotConnected)?;
        outbound
            .send(frame)
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn close(&mut self) {
        // Dropping the outbound sender asks the task to send a close frame
        // and exit on its own.
        self.outbound_tx = None;
        self.task = None;
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn emit(
    event_tx: &mpsc::Sender<TransportEnvelope>,
    connection: ConnectionId,
    event: TransportEvent,
) -> bool {
    event_tx
        .send(TransportEnvelope { connection, event })
        .await
        .is_ok()
}

async fn connection_task(
    url: String,
    connect_timeout: Duration,
    id: ConnectionId,
    event_tx: mpsc::Sender<TransportEnvelope>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    info!(connection = %id, url = %url, "Connecting to chat endpoint");

    let ws_stream = match tokio::time::timeout(
        connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    )
    .await
    {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            warn!(connection = %id, error = %e, "Failed to connect to chat endpoint");
            emit(
                &event_tx,
                id,
                TransportEvent::Error(format!("connection failed: {e}")),
            )
            .await;
            return;
        }
        Err(_elapsed) => {
            warn!(connection = %id, "Connection timed out after {:?}", connect_timeout);
            emit(
                &event_tx,
                id,
                TransportEvent::Error(format!(
                    "connection timed out after {}s",
                    connect_timeout.as_secs()
                )),
            )
            .await;
            return;
        }
    };

    if !emit(&event_tx, id, TransportEvent::Opened).await {
        return;
    }

    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if let Err(e) = sink.send(WsMessage::Text(frame.into())).await {
                            warn!(connection = %id, error = %e, "Failed to send frame");
                            emit(&event_tx, id, TransportEvent::Error(e.to_string())).await;
                            return;
                        }
                    }
                    None => {
                        debug!(connection = %id, "Closing connection on request");
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return;
                    }
                }
            }

            inbound = stream.next() => {
                match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        let text = text.as_str().to_owned();
                        debug!(connection = %id, bytes = text.len(), "Frame received");
                        if !emit(&event_tx, id, TransportEvent::Frame(text)).await {
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        if !emit(&event_tx, id, TransportEvent::Frame(text)).await {
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!(connection = %id, "Chat endpoint closed connection");
                        emit(&event_tx, id, TransportEvent::Closed).await;
                        return;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %id, error = %e, "WebSocket error");
                        emit(&event_tx, id, TransportEvent::Error(e.to_string())).await;
                        return;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
