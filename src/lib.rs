//! # Buzzer Client
//!
//! Transport-agnostic Rust client for a live quiz buzzer session.
//!
//! One host runs the session; many participants press a buzzer or answer
//! multiple-choice prompts. The server is the single source of truth: this
//! crate keeps each client's view in step with it over one persistent
//! connection, using JSON text messages tagged by an `event` field.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any backend
//! - **WebSocket built-in**: default `transport-websocket` feature provides `WebSocketTransport`
//! - **Pure state machines**: button, roster, prompt and close handling are
//!   plain reducers producing view descriptions, testable without a network
//! - **Event-driven**: receive [`BuzzerEvent`]s via a channel
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), buzzer_client::BuzzerError> {
//! use buzzer_client::{BuzzerEvent, ClientConfig, Endpoints, ParticipantClient, Seat};
//!
//! let endpoints = Endpoints::from_page_url("https://quiz.example/buzzer/AB12", Seat::Participant)?;
//! let (client, mut events) = ParticipantClient::connect(ClientConfig::new(endpoints)).await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         BuzzerEvent::Render(view) => println!("{view:?}"),
//!         BuzzerEvent::Closed(outcome) => {
//!             println!("{outcome:?}");
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # drop(client);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod button;
pub mod choice;
pub mod client;
pub mod close;
pub mod endpoints;
pub mod error;
pub mod event;
pub mod protocol;
pub mod roster;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use client::{BuzzerClient, ClientConfig, HostClient, ParticipantClient};
pub use close::{CloseKind, CloseOutcome, CloseSignal};
pub use endpoints::{Endpoints, Seat};
pub use error::BuzzerError;
pub use event::BuzzerEvent;
pub use protocol::{ButtonState, ClientMessage, Participant, ServerMessage};
pub use session::{HostView, ParticipantView, Role, SessionView};
pub use transport::{Inbound, Transport};

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
