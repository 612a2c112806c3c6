//! Per-connection handler: upgrade on `/chat`, then answer queries in order.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use crate::protocol::{self, INVALID_FORMAT, INVALID_QUERY};

type Sink = SplitSink<WebSocketStream<TcpStream>, Message>;

pub const CHAT_PATH: &str = "/chat";

/// Queries that make the server misbehave on purpose.
const TRIGGER_ERROR: &str = "!error";
const TRIGGER_GARBAGE: &str = "!garbage";
const TRIGGER_DROP: &str = "!drop";

/// What to do after answering one frame.
enum Flow {
    Continue,
    Hangup,
}

/// Upgrade `stream` and serve it until the client goes away.
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, fragment_delay: Duration) {
    let ws = match tokio_tungstenite::accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
            return;
        }
    };
    tracing::info!(peer = %addr, "Client connected");

    let (mut sink, mut stream) = ws.split();

    while let Some(frame) = stream.next().await {
        let flow = match frame {
            Ok(Message::Text(text)) => answer(&mut sink, text.as_str(), addr, fragment_delay).await,
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                answer(&mut sink, &text, addr, fragment_delay).await
            }
            Ok(Message::Ping(data)) => match sink.send(Message::Pong(data)).await {
                Ok(()) => Flow::Continue,
                Err(_) => Flow::Hangup,
            },
            Ok(Message::Close(_)) => Flow::Hangup,
            Ok(_) => Flow::Continue,
            Err(e) => {
                tracing::debug!(peer = %addr, error = %e, "WS error");
                Flow::Hangup
            }
        };
        if let Flow::Hangup = flow {
            break;
        }
    }

    tracing::info!(peer = %addr, "Client disconnected");
}

fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == CHAT_PATH {
        return Ok(response);
    }
    tracing::warn!(path = %request.uri().path(), "Rejecting upgrade on unknown path");
    let mut rejection = ErrorResponse::new(Some("not found".to_string()));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

async fn answer(sink: &mut Sink, raw: &str, addr: SocketAddr, fragment_delay: Duration) -> Flow {
    let request: protocol::Request = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(peer = %addr, error = %e, "Undecodable frame");
            return reply(sink, &protocol::Response::error(INVALID_FORMAT)).await;
        }
    };

    let query = request.query.trim();
    if query.is_empty() {
        tracing::debug!(peer = %addr, "Empty query");
        return reply(sink, &protocol::Response::error(INVALID_QUERY)).await;
    }

    tracing::info!(peer = %addr, query = %query, "Query received");

    match query {
        TRIGGER_ERROR => reply(sink, &protocol::Response::error("model unavailable")).await,
        TRIGGER_GARBAGE => send_text(sink, "<<not json>>".to_string()).await,
        TRIGGER_DROP => {
            tracing::info!(peer = %addr, "Dropping connection on request");
            let _ = sink.send(Message::Close(None)).await;
            Flow::Hangup
        }
        _ => stream_answer(sink, &format!("You said: {query}"), fragment_delay).await,
    }
}

/// Send `text` one word at a time. The fragments concatenate back to `text`.
async fn stream_answer(sink: &mut Sink, text: &str, fragment_delay: Duration) -> Flow {
    for fragment in text.split_inclusive(' ') {
        if let Flow::Hangup = reply(sink, &protocol::Response::answer(fragment)).await {
            return Flow::Hangup;
        }
        if !fragment_delay.is_zero() {
            tokio::time::sleep(fragment_delay).await;
        }
    }
    Flow::Continue
}

async fn reply(sink: &mut Sink, response: &protocol::Response) -> Flow {
    match serde_json::to_string(response) {
        Ok(json) => send_text(sink, json).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode response");
            Flow::Continue
        }
    }
}

async fn send_text(sink: &mut Sink, text: String) -> Flow {
    match sink.send(Message::Text(text.into())).await {
        Ok(()) => Flow::Continue,
        Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
            Flow::Hangup
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to send frame");
            Flow::Hangup
        }
    }
}
