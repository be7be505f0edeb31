//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Both `ws://` and `wss://` URLs are supported; TLS is handled by
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream). Close frames are
//! surfaced with their code and reason so the client can tell a host-ended
//! session from a departure or a lost connection.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), buzzer_client::BuzzerError> {
//! use buzzer_client::transport::{Inbound, Transport};
//! use buzzer_client::WebSocketTransport;
//!
//! let mut transport = WebSocketTransport::connect("ws://localhost:8000/buzzer/ws").await?;
//! transport.send(r#"{"event":"BUZZ"}"#.to_string()).await?;
//!
//! match transport.recv().await? {
//!     Inbound::Text(msg) => println!("received: {msg}"),
//!     Inbound::Closed(signal) => println!("closed with {}", signal.code),
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::close::{CloseSignal, CLOSE_NO_STATUS};
use crate::error::BuzzerError;
use crate::transport::{Inbound, Transport};

/// Type alias for the underlying WebSocket stream.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] backed by a WebSocket connection.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) is cancel-safe: dropping its future before it
/// completes loses no message.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Establish a new WebSocket connection to the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Io`] if the URL is invalid or the connection
    /// cannot be established. I/O error kinds are preserved; anything else
    /// maps to [`ErrorKind::Other`](std::io::ErrorKind::Other).
    pub async fn connect(url: &str) -> Result<Self, BuzzerError> {
        tracing::debug!(url = %url, "connecting to WebSocket server");

        let (stream, _response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
            let kind = match &e {
                tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
                _ => std::io::ErrorKind::Other,
            };
            BuzzerError::Io(std::io::Error::new(kind, e))
        })?;

        tracing::info!(url = %url, "WebSocket connection established");

        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-established WebSocket stream (custom TLS, headers,
    /// cookies, proxies).
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// [`connect`](Self::connect) with a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Timeout`] if the deadline elapses, or any error
    /// that [`connect`](Self::connect) may return.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, BuzzerError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| BuzzerError::Timeout)?
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), BuzzerError> {
        if self.closed {
            return Err(BuzzerError::TransportClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| BuzzerError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Inbound, BuzzerError> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(BuzzerError::TransportReceive(e.to_string())),
                // The stream ended without a close frame.
                None => return Ok(Inbound::Closed(CloseSignal::abnormal())),
            };

            match msg {
                Message::Text(text) => return Ok(Inbound::Text(text.to_string())),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "received WebSocket close frame");
                    let signal = match frame {
                        Some(frame) => {
                            CloseSignal::new(u16::from(frame.code), frame.reason.as_str())
                        }
                        None => CloseSignal::new(CLOSE_NO_STATUS, ""),
                    };
                    return Ok(Inbound::Closed(signal));
                }
                Message::Ping(_) => {
                    // tungstenite queues the pong itself.
                    tracing::debug!("received WebSocket ping");
                }
                Message::Pong(_) => {
                    tracing::debug!("received WebSocket pong (ignored)");
                }
                Message::Binary(_) => {
                    tracing::warn!("received unexpected binary WebSocket frame, skipping");
                }
                Message::Frame(_) => {
                    // Never produced by the read half; kept for exhaustiveness.
                    tracing::debug!("received raw WebSocket frame, skipping");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), BuzzerError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| BuzzerError::TransportSend(e.to_string()))
    }
}

#[cfg(test)]
#[cfg(feature = "transport-websocket")]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::close::{CloseKind, CLOSE_NORMAL, CLOSE_TRY_AGAIN_LATER};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    #[test]
    fn websocket_transport_is_send_and_debug() {
        fn assert_send<T: Send + std::fmt::Debug>() {}
        assert_send::<WebSocketTransport>();
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-valid-url")
            .await
            .unwrap_err();
        assert!(matches!(err, BuzzerError::Io(_)));
    }

    #[tokio::test]
    async fn connect_fails_with_unreachable_host() {
        let err = WebSocketTransport::connect("ws://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, BuzzerError::Io(_)));
    }

    /// Start a local WebSocket server that runs `handler` on the accepted
    /// connection and returns the address to connect to.
    async fn start_mock_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}/buzzer/ws")
    }

    async fn close_with(code: CloseCode, reason: &'static str) -> CloseSignal {
        let url = start_mock_server(move |mut ws| async move {
            ws.close(Some(CloseFrame {
                code,
                reason: reason.into(),
            }))
            .await
            .unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        match transport.recv().await.unwrap() {
            Inbound::Closed(signal) => signal,
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn recv_receives_text_messages() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Text(r#"{"event":"RESET"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(
            transport.recv().await.unwrap(),
            Inbound::Text(r#"{"event":"RESET"}"#.into())
        );
    }

    #[tokio::test]
    async fn close_frame_carries_code_and_reason() {
        let signal = close_with(CloseCode::Again, "You left.").await;
        assert_eq!(signal.code, CLOSE_TRY_AGAIN_LATER);
        assert_eq!(signal.reason, "You left.");
        assert_eq!(signal.kind(), CloseKind::UserLeft);
    }

    #[tokio::test]
    async fn normal_close_is_host_ended() {
        let signal = close_with(CloseCode::Normal, "").await;
        assert_eq!(signal.code, CLOSE_NORMAL);
        assert_eq!(signal.kind(), CloseKind::HostEnded);
    }

    #[tokio::test]
    async fn empty_close_frame_is_no_status() {
        let url = start_mock_server(|mut ws| async move {
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let Inbound::Closed(signal) = transport.recv().await.unwrap() else {
            panic!("expected close");
        };
        assert_eq!(signal.code, CLOSE_NO_STATUS);
        assert_eq!(signal.kind(), CloseKind::LostConnection);
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after_binary".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(
            transport.recv().await.unwrap(),
            Inbound::Text("after_binary".into())
        );
    }

    #[tokio::test]
    async fn send_after_close_returns_transport_closed() {
        let url = start_mock_server(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("oops".to_string()).await.unwrap_err();
        assert!(matches!(err, BuzzerError::TransportClosed));
    }

    #[tokio::test]
    async fn send_round_trip() {
        let url = start_mock_server(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(text)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport
            .send(r#"{"event":"BUZZ"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            transport.recv().await.unwrap(),
            Inbound::Text(r#"{"event":"BUZZ"}"#.into())
        );
    }

    #[tokio::test]
    async fn connect_with_timeout_times_out() {
        // Non-routable address guarantees the deadline is hit.
        let err = WebSocketTransport::connect_with_timeout(
            "ws://192.0.2.1:1",
            std::time::Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BuzzerError::Timeout));
    }
}
