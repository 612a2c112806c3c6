//! Local stand-in for the chat answer service.
//!
//! Speaks the same `/chat` protocol: each `{"query": ...}` frame is answered
//! with a stream of `{"answer": ...}` fragments. A few magic queries exercise
//! the client's failure paths:
//!
//! - `!error` answers `{"error": "model unavailable"}`
//! - `!garbage` answers a frame that is not JSON
//! - `!drop` closes the connection

mod connection;
pub mod protocol;

use std::time::Duration;

use tokio::net::TcpListener;

pub use connection::CHAT_PATH;

/// Tunables for [`serve`].
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Pause between streamed answer fragments.
    pub fragment_delay: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            fragment_delay: Duration::from_millis(50),
        }
    }
}

/// Accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, options: ServerOptions) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(connection::handle_connection(
                    stream,
                    addr,
                    options.fragment_delay,
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    async fn start() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(
            listener,
            ServerOptions {
                fragment_delay: Duration::ZERO,
            },
        ));
        addr
    }

    async fn next_json(
        ws: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> serde_json::Value {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(frame.to_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn streams_answer_in_fragments() {
        let addr = start().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat"))
            .await
            .unwrap();

        ws.send(Message::Text(r#"{"query":"hello world"}"#.into()))
            .await
            .unwrap();

        let mut answer = String::new();
        let mut fragments = 0;
        while answer != "You said: hello world" {
            let frame = next_json(&mut ws).await;
            answer.push_str(frame["answer"].as_str().unwrap());
            fragments += 1;
        }
        assert_eq!(fragments, 4);
    }

    #[tokio::test]
    async fn rejects_bad_frames() {
        let addr = start().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat"))
            .await
            .unwrap();

        ws.send(Message::Text("not json".into())).await.unwrap();
        assert_eq!(next_json(&mut ws).await["error"], "Invalid message format");

        ws.send(Message::Text(r#"{"query":"   "}"#.into()))
            .await
            .unwrap();
        assert_eq!(next_json(&mut ws).await["error"], "Invalid query");

        ws.send(Message::Text(r#"{"query":"!error"}"#.into()))
            .await
            .unwrap();
        assert_eq!(next_json(&mut ws).await["error"], "model unavailable");
    }

    #[tokio::test]
    async fn refuses_other_paths() {
        let addr = start().await;
        let result = tokio_tungstenite::connect_async(format!("ws://{addr}/other")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn drop_trigger_closes_connection() {
        let addr = start().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat"))
            .await
            .unwrap();

        ws.send(Message::Text(r#"{"query":"!drop"}"#.into()))
            .await
            .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap();
        assert!(matches!(next, Some(Ok(Message::Close(_))) | Some(Err(_)) | None));
    }
}
