#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for buzzer client integration tests.
//!
//! Provides a scripted [`MockTransport`] and helpers for building server
//! message JSON.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use buzzer_client::protocol::{ButtonState, Participant, ServerMessage, UpdatePayload};
use buzzer_client::{
    BuzzerError, BuzzerEvent, ClientConfig, ClientMessage, CloseSignal, Endpoints, HostView,
    Inbound, ParticipantView, Seat, SessionView, Transport,
};
use tokio::sync::mpsc;

// ── MockTransport ───────────────────────────────────────────────────

/// Scripted server responses are consumed in order by `recv()`; once the
/// script runs out `recv()` hangs forever. Everything the client sends is
/// recorded in `sent`.
pub struct MockTransport {
    incoming: VecDeque<Result<Inbound, BuzzerError>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new(
        incoming: Vec<Result<Inbound, BuzzerError>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), BuzzerError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Inbound, BuzzerError> {
        match self.incoming.pop_front() {
            Some(item) => item,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), BuzzerError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── ChannelTransport ────────────────────────────────────────────────

/// A transport driven live from the test through a [`ServerHandle`], for
/// flows where the server must react after the client acts.
pub struct ChannelTransport {
    to_server: mpsc::UnboundedSender<String>,
    from_server: mpsc::UnboundedReceiver<Result<Inbound, BuzzerError>>,
}

/// The test's end of a [`ChannelTransport`].
pub struct ServerHandle {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<Result<Inbound, BuzzerError>>,
}

impl ServerHandle {
    pub fn push(&self, msg: &ServerMessage) {
        self.tx.send(text(msg)).unwrap();
    }

    pub fn close(&self, code: u16, reason: &str) {
        self.tx.send(closed(code, reason)).unwrap();
    }

    /// Next intent the client sent, waiting at most one second.
    pub async fn next_intent(&mut self) -> ClientMessage {
        let json = tokio::time::timeout(std::time::Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for an intent")
            .expect("client side dropped");
        serde_json::from_str(&json).expect("client message")
    }
}

pub fn channel_pair() -> (ChannelTransport, ServerHandle) {
    let (to_server, rx) = mpsc::unbounded_channel();
    let (tx, from_server) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            to_server,
            from_server,
        },
        ServerHandle { rx, tx },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, message: String) -> Result<(), BuzzerError> {
        self.to_server
            .send(message)
            .map_err(|e| BuzzerError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Inbound, BuzzerError> {
        match self.from_server.recv().await {
            Some(item) => item,
            None => Ok(Inbound::Closed(CloseSignal::abnormal())),
        }
    }

    async fn close(&mut self) -> Result<(), BuzzerError> {
        Ok(())
    }
}

// ── Event helpers ───────────────────────────────────────────────────

/// Next event, waiting at most one second.
pub async fn next_event(events: &mut mpsc::Receiver<BuzzerEvent>) -> BuzzerEvent {
    tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Consume `Connected` and the initial `Render`.
pub async fn drain_start(events: &mut mpsc::Receiver<BuzzerEvent>) {
    let ev = next_event(events).await;
    assert!(
        matches!(ev, BuzzerEvent::Connected),
        "expected Connected, got {ev:?}"
    );
    let ev = next_event(events).await;
    assert!(
        matches!(ev, BuzzerEvent::Render(_)),
        "expected Render, got {ev:?}"
    );
}

pub async fn next_participant_view(
    events: &mut mpsc::Receiver<BuzzerEvent>,
) -> ParticipantView {
    match next_event(events).await {
        BuzzerEvent::Render(SessionView::Participant(view)) => view,
        other => panic!("expected participant Render, got {other:?}"),
    }
}

pub async fn next_host_view(events: &mut mpsc::Receiver<BuzzerEvent>) -> HostView {
    match next_event(events).await {
        BuzzerEvent::Render(SessionView::Host(view)) => view,
        other => panic!("expected host Render, got {other:?}"),
    }
}

// ── Script helpers ──────────────────────────────────────────────────

pub fn text(msg: &ServerMessage) -> Result<Inbound, BuzzerError> {
    Ok(Inbound::Text(
        serde_json::to_string(msg).expect("server message serialization"),
    ))
}

pub fn raw(json: &str) -> Result<Inbound, BuzzerError> {
    Ok(Inbound::Text(json.to_string()))
}

pub fn closed(code: u16, reason: &str) -> Result<Inbound, BuzzerError> {
    Ok(Inbound::Closed(CloseSignal::new(code, reason)))
}

pub fn update(users: Vec<Participant>, state: ButtonState) -> ServerMessage {
    ServerMessage::Update(UpdatePayload {
        users,
        button_state: Some(state),
        ..Default::default()
    })
}

pub fn alice() -> Participant {
    Participant::new("Alice", "https://cdn.example/alice.png")
}

pub fn participant_config() -> ClientConfig {
    ClientConfig::new(
        Endpoints::from_page_url("http://quiz.example/buzzer/AB12", Seat::Participant)
            .expect("participant endpoints"),
    )
}

pub fn host_config() -> ClientConfig {
    ClientConfig::new(
        Endpoints::from_page_url("http://quiz.example/host/AB12", Seat::Host)
            .expect("host endpoints"),
    )
}

/// Parse every recorded outgoing message.
pub fn sent_messages(sent: &Arc<StdMutex<Vec<String>>>) -> Vec<ClientMessage> {
    sent.lock()
        .unwrap()
        .iter()
        .map(|json| serde_json::from_str(json).expect("client message"))
        .collect()
}
