//! # Scripted Host Example
//!
//! Drives a [`HostClient`] against an in-process loopback "server" that
//! answers each host intent with the snapshot a real server would broadcast.
//! Useful for trying out a control panel without running a session server.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example scripted_host
//! ```

use async_trait::async_trait;
use buzzer_client::close::CloseSignal;
use buzzer_client::protocol::UpdatePayload;
use buzzer_client::{
    BuzzerError, BuzzerEvent, ButtonState, ClientConfig, ClientMessage, Endpoints, HostClient,
    Inbound, Participant, Seat, ServerMessage, SessionView, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: A channel-based loopback transport
// ─────────────────────────────────────────────────────────────────────

/// Client half: handed to `HostClient::host`.
struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Server half: reads intents and pushes snapshots.
struct LoopbackServer {
    rx: mpsc::UnboundedReceiver<String>,
    tx: mpsc::UnboundedSender<Inbound>,
}

fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), BuzzerError> {
        self.tx
            .send(message)
            .map_err(|e| BuzzerError::TransportSend(e.to_string()))
    }

    /// A dropped server half looks like a connection lost without a close
    /// frame.
    async fn recv(&mut self) -> Result<Inbound, BuzzerError> {
        Ok(self
            .rx
            .recv()
            .await
            .unwrap_or_else(|| Inbound::Closed(CloseSignal::abnormal())))
    }

    async fn close(&mut self) -> Result<(), BuzzerError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A tiny session server
// ─────────────────────────────────────────────────────────────────────

struct FakeSession {
    users: Vec<Participant>,
    locked: bool,
    choices: Option<Vec<String>>,
}

impl FakeSession {
    fn snapshot(&self) -> Result<Inbound, BuzzerError> {
        let state = if self.locked {
            ButtonState::Locked
        } else {
            ButtonState::Open
        };
        let msg = ServerMessage::Update(UpdatePayload {
            users: self.users.clone(),
            button_state: Some(state),
            choices: self.choices.clone(),
            ..Default::default()
        });
        Ok(Inbound::Text(serde_json::to_string(&msg)?))
    }

    fn apply(&mut self, intent: &ClientMessage) {
        match intent {
            ClientMessage::ToggleLock => self.locked = !self.locked,
            ClientMessage::Reset => self.users.iter_mut().for_each(|u| u.buzzed = false),
            ClientMessage::PromptChoices { choices } => {
                self.choices = Some(
                    choices
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            ClientMessage::ClearMc | ClientMessage::EndMc => self.choices = None,
            other => tracing::debug!("server ignores {}", other.event_name()),
        }
    }
}

async fn run_server(mut server: LoopbackServer) -> Result<(), BuzzerError> {
    let mut session = FakeSession {
        users: vec![
            Participant::new("Alice", "https://cdn.example/alice.png").with_buzzed(true),
            Participant::new("Bob", "https://cdn.example/bob.png").with_connected(false),
        ],
        locked: false,
        choices: None,
    };
    let send = |tx: &mpsc::UnboundedSender<Inbound>, item: Inbound| {
        tx.send(item).map_err(|_| BuzzerError::TransportClosed)
    };

    send(&server.tx, session.snapshot()?)?;
    while let Some(raw) = server.rx.recv().await {
        let intent: ClientMessage = serde_json::from_str(&raw)?;
        tracing::info!("server received {}", intent.event_name());
        session.apply(&intent);
        if matches!(intent, ClientMessage::EndMc) {
            // Ending the round ends the demo: close as the host would.
            send(&server.tx, Inbound::Closed(CloseSignal::new(1000, "")))?;
            break;
        }
        send(&server.tx, session.snapshot()?)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Wire the host client to the fake server
// ─────────────────────────────────────────────────────────────────────

fn print_view(view: &SessionView) {
    let SessionView::Host(host) = view else {
        return;
    };
    println!("[{}]", host.lock_button.label);
    if host.roster.is_empty() {
        println!("  {}", buzzer_client::roster::EMPTY_ROSTER_NOTICE);
    }
    for entry in host.roster.entries() {
        let lost = if entry.connection_lost { " (lost)" } else { "" };
        println!("  {} {}{lost}", entry.class.as_str(), entry.display_name);
    }
    if let Some(prompt) = &host.active_prompt {
        println!("  prompt: {}", prompt.join(" / "));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, server) = loopback_pair();
    let server_task = tokio::spawn(run_server(server));

    let endpoints = Endpoints::from_page_url("http://localhost:8000/host/DEMO", Seat::Host)?;
    let (client, mut events) = HostClient::host(transport, ClientConfig::new(endpoints));

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BuzzerEvent::Render(view) => print_view(&view),
                BuzzerEvent::Navigate(url) => tracing::info!("host ended, navigating to {url}"),
                BuzzerEvent::Closed(outcome) => {
                    tracing::info!("closed: {:?}", outcome.kind());
                    break;
                }
                other => tracing::debug!("event: {other:?}"),
            }
        }
    });

    let pause = || tokio::time::sleep(std::time::Duration::from_millis(200));
    pause().await;
    client.toggle_lock()?;
    pause().await;
    client.reset()?;
    pause().await;
    client.prompt_choices("Red\nBlue\n\nGreen")?;
    pause().await;
    client.end_choices()?;

    printer.await?;
    server_task.await??;
    Ok(())
}
