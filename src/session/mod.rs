//! Per-role session reducers.
//!
//! A role consumes inbound [`ServerMessage`]s, local user commands and the
//! final close outcome, strictly one at a time, and answers with
//! [`Effect`]s for the transport loop to carry out. The role never touches
//! the connection itself, so every reducer can be driven in plain unit tests.
//!
//! The rendered view is always derived fresh from the role's state by
//! [`Role::view`]; nothing is patched incrementally.

mod host;
mod participant;

pub use host::{HostCommand, HostSession, HostView};
pub use participant::{ParticipantCommand, ParticipantSession, ParticipantView};

use crate::close::CloseOutcome;
use crate::endpoints::Seat;
use crate::protocol::{ClientMessage, Participant, ServerMessage};

/// Something a reducer asks the transport loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send an intent to the server.
    Send(ClientMessage),
    /// Play the buzz cue (subject to the user's opt-in).
    PlaySound,
    /// The view changed and should be re-rendered.
    Render,
}

/// A complete view of either role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    /// A participant's screen.
    Participant(ParticipantView),
    /// The host's control panel.
    Host(HostView),
}

/// One side of the session protocol.
pub trait Role: Send + Sync + 'static {
    /// Local user actions this role accepts.
    type Command: Send + std::fmt::Debug + 'static;

    /// Which side this role sits on.
    const SEAT: Seat;

    /// Handle one inbound server message.
    fn on_server(&mut self, msg: ServerMessage) -> Vec<Effect>;

    /// Handle one local user action.
    fn on_command(&mut self, cmd: Self::Command) -> Vec<Effect>;

    /// The connection ended. Called once; no other calls follow.
    fn on_close(&mut self, outcome: &CloseOutcome);

    /// Derive the current view.
    fn view(&self) -> SessionView;
}

/// Keepalive: echo a `PING` id back unchanged.
pub fn keepalive(id: serde_json::Value) -> Effect {
    Effect::Send(ClientMessage::Pong { id })
}

/// Clear every buzz in a held snapshot.
fn clear_buzzes(roster: &mut [Participant]) {
    for participant in roster {
        participant.buzzed = false;
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keepalive_echoes_id_unchanged() {
        assert_eq!(
            keepalive(json!("x")),
            Effect::Send(ClientMessage::Pong { id: json!("x") })
        );
        assert_eq!(
            keepalive(json!(17)),
            Effect::Send(ClientMessage::Pong { id: json!(17) })
        );
    }

    #[test]
    fn clear_buzzes_keeps_members() {
        let mut roster = vec![
            Participant::new("Alice", "a").with_buzzed(true),
            Participant::new("Bob", "b"),
        ];
        clear_buzzes(&mut roster);
        assert_eq!(roster.len(), 2);
        assert!(roster.iter().all(|p| !p.buzzed));
    }
}
