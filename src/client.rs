//! Async client for the buzzer session protocol.
//!
//! [`BuzzerClient`] is a thin handle that talks to a background transport
//! loop over an unbounded MPSC channel. The loop owns the transport and the
//! role's state machines; it is the single thread of control that applies
//! inbound messages, user commands and the close signal one at a time, in
//! arrival order. Events are emitted on a bounded channel returned from
//! [`BuzzerClient::start`]; a full channel applies backpressure to the loop.
//!
//! # Example
//!
//! ```rust,ignore
//! let endpoints = Endpoints::from_page_url(page_url, Seat::Participant)?;
//! let config = ClientConfig::new(endpoints).with_audio_enabled(true);
//! let (client, mut events) = ParticipantClient::connect(config).await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         BuzzerEvent::Render(view) => draw(view),
//!         BuzzerEvent::Closed(outcome) => { show(outcome); break }
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioCue, AudioSink};
use crate::close::{CloseOutcome, CloseSignal};
use crate::endpoints::Endpoints;
use crate::error::{BuzzerError, Result};
use crate::event::BuzzerEvent;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::roster::{RosterOptions, DEFAULT_AVATAR_SIZE};
use crate::session::{
    Effect, HostCommand, HostSession, ParticipantCommand, ParticipantSession, Role,
};
use crate::transport::{Inbound, Transport};

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default deadline for opening the WebSocket.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`BuzzerClient`].
///
/// The only required part is the session's [`Endpoints`]; all others have
/// sensible defaults.
///
/// # Example
///
/// ```
/// use buzzer_client::client::ClientConfig;
/// use buzzer_client::endpoints::{Endpoints, Seat};
/// use std::time::Duration;
///
/// let endpoints =
///     Endpoints::from_page_url("http://localhost:8000/buzzer/AB12", Seat::Participant)?;
/// let config = ClientConfig::new(endpoints)
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5))
///     .with_audio_enabled(true);
/// assert_eq!(config.event_channel_capacity, 512);
/// # Ok::<(), buzzer_client::BuzzerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URLs of the session this client belongs to.
    pub endpoints: Endpoints,
    /// Capacity of the bounded event channel.
    ///
    /// No event is ever dropped. When the channel is full the loop waits for
    /// the consumer before handling the next message or command.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Deadline for opening the WebSocket in `connect`. Defaults to
    /// **10 seconds**.
    pub connect_timeout: Duration,
    /// How long [`BuzzerClient::shutdown`] waits for the loop before aborting
    /// it. Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Initial state of the audio opt-in. Defaults to **off**.
    pub audio_enabled: bool,
    /// The buzz cue and its sink. Defaults to a silent sink.
    pub audio: AudioCue,
    /// Avatar size requested in roster rows. Defaults to **32**.
    pub avatar_size: u32,
}

impl ClientConfig {
    /// Create a configuration for `endpoints` with default values.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            audio_enabled: false,
            audio: AudioCue::default(),
            avatar_size: DEFAULT_AVATAR_SIZE,
        }
    }

    /// Set the capacity of the bounded event channel (min 1).
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the deadline for opening the WebSocket.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the initial audio opt-in.
    #[must_use]
    pub fn with_audio_enabled(mut self, enabled: bool) -> Self {
        self.audio_enabled = enabled;
        self
    }

    /// Play the buzz cue through `sink`.
    #[must_use]
    pub fn with_audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio = AudioCue::new(sink);
        self
    }

    /// Set the avatar size requested in roster rows.
    #[must_use]
    pub fn with_avatar_size(mut self, size: u32) -> Self {
        self.avatar_size = size;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

struct ClientState {
    connected: AtomicBool,
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle, generic over the side of the session it plays.
///
/// Intents are queued to the transport loop and return immediately. Once
/// the loop has exited every intent fails with
/// [`BuzzerError::NotConnected`]; nothing is buffered for a later
/// connection.
pub struct BuzzerClient<R: Role> {
    cmd_tx: mpsc::UnboundedSender<R::Command>,
    state: Arc<ClientState>,
    audio: AudioCue,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

/// A participant's client.
pub type ParticipantClient = BuzzerClient<ParticipantSession>;

/// The host's client.
pub type HostClient = BuzzerClient<HostSession>;

impl<R: Role> BuzzerClient<R> {
    /// Start the transport loop for `role` and return a handle plus the
    /// event receiver.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        role: R,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<BuzzerEvent>) {
        if config.endpoints.seat != R::SEAT {
            warn!(
                endpoints = ?config.endpoints.seat,
                role = ?R::SEAT,
                "endpoints belong to the other seat"
            );
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<R::Command>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<BuzzerEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let state = Arc::new(ClientState {
            connected: AtomicBool::new(true),
        });
        config.audio.set_enabled(config.audio_enabled);

        let task = tokio::spawn(transport_loop(
            transport,
            role,
            LoopContext {
                cmd_rx,
                event_tx,
                state: Arc::clone(&state),
                audio: config.audio.clone(),
                endpoints: config.endpoints,
                shutdown_rx,
            },
        ));

        let client = Self {
            cmd_tx,
            state,
            audio: config.audio,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    /// Queue a role command.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn command(&self, cmd: R::Command) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(BuzzerError::NotConnected);
        }
        self.cmd_tx
            .send(cmd)
            .map_err(|_| BuzzerError::NotConnected)
    }

    /// Flip the audio opt-in. Takes effect for the next cue.
    pub fn set_audio_enabled(&self, enabled: bool) {
        self.audio.set_enabled(enabled);
    }

    /// Whether the audio opt-in is on.
    pub fn audio_enabled(&self) -> bool {
        self.audio.is_enabled()
    }

    /// Returns `true` until the connection closes or the client shuts down.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// Close the transport and stop the background loop.
    ///
    /// The event receiver yields a final [`BuzzerEvent::Stopped`] (unless
    /// the connection had already closed) and then `None`.
    pub async fn shutdown(&mut self) {
        debug!("BuzzerClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }
}

#[cfg(feature = "transport-websocket")]
impl<R: Role> BuzzerClient<R> {
    /// Connect to `config.endpoints.websocket` within
    /// `config.connect_timeout` and start the loop.
    ///
    /// # Errors
    ///
    /// Any error of
    /// [`WebSocketTransport::connect_with_timeout`](crate::transports::WebSocketTransport::connect_with_timeout).
    pub async fn connect_with(
        role: R,
        config: ClientConfig,
    ) -> Result<(Self, mpsc::Receiver<BuzzerEvent>)> {
        let transport = crate::transports::WebSocketTransport::connect_with_timeout(
            &config.endpoints.websocket,
            config.connect_timeout,
        )
        .await?;
        Ok(Self::start(transport, role, config))
    }
}

impl ParticipantClient {
    /// Start a participant with the roster options taken from `config`.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn participant(
        transport: impl Transport,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<BuzzerEvent>) {
        let role = ParticipantSession::new(
            RosterOptions::participant().with_avatar_size(config.avatar_size),
        );
        Self::start(transport, role, config)
    }

    /// Connect over WebSocket as a participant.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Io`] if the socket cannot be opened, or
    /// [`BuzzerError::Timeout`] if `config.connect_timeout` elapses first.
    #[cfg(feature = "transport-websocket")]
    pub async fn connect(config: ClientConfig) -> Result<(Self, mpsc::Receiver<BuzzerEvent>)> {
        let role = ParticipantSession::new(
            RosterOptions::participant().with_avatar_size(config.avatar_size),
        );
        Self::connect_with(role, config).await
    }

    /// Click the buzzer. Only an open button sends `BUZZ`.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn buzz(&self) -> Result<()> {
        self.command(ParticipantCommand::Buzz)
    }

    /// Forward a key press; the space bar buzzes.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn press_key(&self, key: char) -> Result<()> {
        self.command(ParticipantCommand::Key(key))
    }

    /// Leave the session. Ask the user to confirm before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn leave(&self) -> Result<()> {
        self.command(ParticipantCommand::Leave)
    }

    /// Answer the open prompt with one of its options.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn answer(&self, answer: impl Into<String>) -> Result<()> {
        self.command(ParticipantCommand::Answer(answer.into()))
    }
}

impl HostClient {
    /// Start a host with the roster options taken from `config`.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn host(
        transport: impl Transport,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<BuzzerEvent>) {
        let role = HostSession::new(RosterOptions::host().with_avatar_size(config.avatar_size));
        Self::start(transport, role, config)
    }

    /// Connect over WebSocket as the host.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Io`] if the socket cannot be opened, or
    /// [`BuzzerError::Timeout`] if `config.connect_timeout` elapses first.
    #[cfg(feature = "transport-websocket")]
    pub async fn connect(config: ClientConfig) -> Result<(Self, mpsc::Receiver<BuzzerEvent>)> {
        let role = HostSession::new(RosterOptions::host().with_avatar_size(config.avatar_size));
        Self::connect_with(role, config).await
    }

    /// Flip the lock. The view flips immediately.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn toggle_lock(&self) -> Result<()> {
        self.command(HostCommand::ToggleLock)
    }

    /// Clear every buzz.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn reset(&self) -> Result<()> {
        self.command(HostCommand::Reset)
    }

    /// Open a prompt; `choices` holds one option per line.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn prompt_choices(&self, choices: impl Into<String>) -> Result<()> {
        self.command(HostCommand::PromptChoices(choices.into()))
    }

    /// Discard the prompt and every answer.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn clear_choices(&self) -> Result<()> {
        self.command(HostCommand::ClearChoices)
    }

    /// Stop accepting answers.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::NotConnected`] once the connection has closed.
    pub fn end_choices(&self) -> Result<()> {
        self.command(HostCommand::EndChoices)
    }
}

impl<R: Role> std::fmt::Debug for BuzzerClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuzzerClient")
            .field("seat", &R::SEAT)
            .field("connected", &self.is_connected())
            .field("audio", &self.audio)
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl<R: Role> Drop for BuzzerClient<R> {
    fn drop(&mut self) {
        // No executor to drive a graceful close from `Drop`; abort instead.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

struct LoopContext<C> {
    cmd_rx: mpsc::UnboundedReceiver<C>,
    event_tx: mpsc::Sender<BuzzerEvent>,
    state: Arc<ClientState>,
    audio: AudioCue,
    endpoints: Endpoints,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// How the select loop ended.
enum Exit {
    /// The server or the network closed the connection.
    Remote(CloseSignal),
    /// The handle shut down or was dropped.
    Local,
}

/// Background loop multiplexing commands and inbound messages.
///
/// Exits when the transport yields its close signal, fails, or the handle
/// shuts down.
async fn transport_loop<R: Role>(
    mut transport: impl Transport,
    mut role: R,
    ctx: LoopContext<R::Command>,
) {
    let LoopContext {
        mut cmd_rx,
        event_tx,
        state,
        audio,
        endpoints,
        mut shutdown_rx,
    } = ctx;

    debug!(seat = ?R::SEAT, "transport loop started");

    emit_event(&event_tx, BuzzerEvent::Connected).await;
    emit_event(&event_tx, BuzzerEvent::Render(role.view())).await;

    let exit = loop {
        tokio::select! {
            // Branch 1: local user action
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        debug!(?cmd, "applying command");
                        let effects = role.on_command(cmd);
                        apply_effects(effects, &mut transport, &role, &event_tx, &audio).await;
                    }
                    // Command channel closed; client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        break Exit::Local;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                break Exit::Local;
            }

            // Branch 3: incoming message or close
            incoming = transport.recv() => {
                match incoming {
                    Ok(Inbound::Text(text)) => {
                        match ServerMessage::from_json(&text) {
                            Ok(msg) => {
                                debug!(event = msg.event_name(), "server message");
                                let effects = role.on_server(msg);
                                apply_effects(effects, &mut transport, &role, &event_tx, &audio).await;
                            }
                            Err(e) => {
                                warn!("failed to deserialize server message: {e}; raw: {text}");
                            }
                        }
                    }
                    Ok(Inbound::Closed(signal)) => break Exit::Remote(signal),
                    Err(e) => {
                        error!("transport receive error: {e}");
                        break Exit::Remote(CloseSignal::abnormal());
                    }
                }
            }
        }
    };

    state.connected.store(false, Ordering::Release);

    match exit {
        Exit::Local => {
            if let Err(e) = transport.close().await {
                debug!("transport close failed: {e}");
            }
            emit_event(&event_tx, BuzzerEvent::Stopped).await;
        }
        Exit::Remote(signal) => {
            let outcome = CloseOutcome::for_signal(&signal, &endpoints);
            info!(
                code = signal.code,
                reason = %signal.reason,
                kind = ?outcome.kind(),
                "connection closed"
            );
            role.on_close(&outcome);
            match &outcome {
                CloseOutcome::HostEnded { landing } => {
                    emit_event(&event_tx, BuzzerEvent::Navigate(landing.clone())).await;
                }
                _ => emit_event(&event_tx, BuzzerEvent::Render(role.view())).await,
            }
            emit_event(&event_tx, BuzzerEvent::Closed(outcome)).await;
        }
    }

    debug!("transport loop exited");
}

/// Carry out a reducer's effects in order.
async fn apply_effects<R: Role>(
    effects: Vec<Effect>,
    transport: &mut impl Transport,
    role: &R,
    event_tx: &mpsc::Sender<BuzzerEvent>,
    audio: &AudioCue,
) {
    for effect in effects {
        match effect {
            Effect::Send(msg) => send_message(transport, &msg).await,
            Effect::PlaySound => {
                audio.cue();
            }
            Effect::Render => emit_event(event_tx, BuzzerEvent::Render(role.view())).await,
        }
    }
}

/// Serialize and send one intent. Failures drop the intent.
async fn send_message(transport: &mut impl Transport, msg: &ClientMessage) {
    let json = match msg.to_json() {
        Ok(json) => json,
        Err(e) => {
            error!(event = msg.event_name(), "{e}");
            return;
        }
    };
    debug!(event = msg.event_name(), "sending client message");
    if let Err(e) = transport.send(json).await {
        warn!(event = msg.event_name(), "dropping intent: {e}");
    }
}

/// Emit an event, waiting for room in the channel.
///
/// Every `Render` carries the whole view, so none may be dropped: a slow
/// consumer holds the loop back instead of missing a state change.
async fn emit_event(event_tx: &mpsc::Sender<BuzzerEvent>, event: BuzzerEvent) {
    if let Err(mpsc::error::SendError(dropped)) = event_tx.send(event).await {
        debug!(
            "event channel closed, receiver dropped: {:?}",
            std::mem::discriminant(&dropped)
        );
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
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
    use crate::endpoints::Seat;
    use async_trait::async_trait;

    /// Never yields anything; records nothing.
    struct IdleTransport;

    #[async_trait]
    impl Transport for IdleTransport {
        async fn send(&mut self, _message: String) -> Result<()> {
            Ok(())
        }

        async fn recv(&mut self) -> Result<Inbound> {
            std::future::pending().await
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new(
            Endpoints::from_page_url("http://q.example/buzzer/AB12", Seat::Participant).unwrap(),
        )
    }

    #[test]
    fn config_defaults() {
        let config = config();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(!config.audio_enabled);
        assert_eq!(config.avatar_size, 32);
        assert_eq!(config.with_event_channel_capacity(0).event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn shutdown_emits_stopped_and_rejects_commands() {
        let (mut client, mut events) = ParticipantClient::participant(IdleTransport, config());
        assert!(matches!(events.recv().await, Some(BuzzerEvent::Connected)));
        assert!(matches!(events.recv().await, Some(BuzzerEvent::Render(_))));

        client.shutdown().await;
        assert_eq!(events.recv().await, Some(BuzzerEvent::Stopped));
        assert_eq!(events.recv().await, None);
        assert!(!client.is_connected());
        assert!(matches!(client.buzz(), Err(BuzzerError::NotConnected)));
    }

    #[cfg(feature = "transport-websocket")]
    #[tokio::test]
    async fn connect_honours_connect_timeout() {
        // Non-routable address guarantees the deadline is hit.
        let endpoints =
            Endpoints::from_page_url("http://192.0.2.1:1/buzzer/AB12", Seat::Participant).unwrap();
        let config = ClientConfig::new(endpoints).with_connect_timeout(Duration::from_millis(50));
        let err = ParticipantClient::connect(config).await.unwrap_err();
        assert!(matches!(err, BuzzerError::Timeout));
    }

    #[tokio::test]
    async fn audio_toggle_is_live() {
        let (mut client, _events) =
            ParticipantClient::participant(IdleTransport, config().with_audio_enabled(true));
        assert!(client.audio_enabled());
        client.set_audio_enabled(false);
        assert!(!client.audio_enabled());
        client.shutdown().await;
    }
}
