//! Wire-compatible protocol types for the buzzer session protocol.
//!
//! Every message is one UTF-8 JSON object per transport message, tagged by an
//! `event` field carrying a `SCREAMING_SNAKE_CASE` name:
//!
//! ```json
//! {"event": "UPDATE", "users": [], "button_state": "OPEN", "sound": false}
//! {"event": "BUZZ"}
//! ```
//!
//! Server events the client does not know deserialize to
//! [`ServerMessage::Unknown`] so that newer servers never break older clients.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Enums ───────────────────────────────────────────────────────────

/// Authoritative state of a participant's buzzer button.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonState {
    /// Buzzing is allowed.
    #[default]
    Open,
    /// This participant has already buzzed in the current round.
    Buzzed,
    /// The host has locked all buzzers.
    Locked,
    /// The connection is gone. Never sent by the server; local and terminal.
    #[serde(alias = "DISCONNECT")]
    Disconnected,
}

impl ButtonState {
    /// Wire name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Buzzed => "BUZZED",
            Self::Locked => "LOCKED",
            Self::Disconnected => "DISCONNECTED",
        }
    }
}

impl std::fmt::Display for ButtonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Structs ─────────────────────────────────────────────────────────

/// One entry of a roster snapshot.
///
/// Identity is implicit in list position; the client never keeps a
/// participant across snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Display name.
    pub name: String,
    /// Avatar image URL, without the size query.
    pub avatar: String,
    /// Whether this participant has buzzed.
    #[serde(default)]
    pub buzzed: bool,
    /// Whether this participant's connection is live. Servers that omit the
    /// field are treated as reporting every participant connected.
    #[serde(default = "default_connected")]
    pub connected: bool,
    /// Recorded multiple-choice answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
}

fn default_connected() -> bool {
    true
}

impl Participant {
    /// Create a connected, unbuzzed participant with no recorded answer.
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
            buzzed: false,
            connected: true,
            choice: None,
        }
    }

    /// Mark the participant as buzzed.
    #[must_use]
    pub fn with_buzzed(mut self, buzzed: bool) -> Self {
        self.buzzed = buzzed;
        self
    }

    /// Set the connection flag.
    #[must_use]
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Set the recorded answer.
    #[must_use]
    pub fn with_choice(mut self, choice: impl Into<String>) -> Self {
        self.choice = Some(choice.into());
        self
    }
}

/// Body of an `UPDATE` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdatePayload {
    /// Full roster; replaces whatever the client showed before.
    #[serde(default)]
    pub users: Vec<Participant>,
    /// Authoritative button state for the receiving client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_state: Option<ButtonState>,
    /// Whether a buzz just happened and the cue should play.
    #[serde(default)]
    pub sound: bool,
    /// The receiving participant's recorded answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    /// Options of the prompt that is currently open, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Intents sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Press the buzzer.
    Buzz,
    /// Keepalive echo carrying the probe's id unchanged.
    Pong { id: serde_json::Value },
    /// Leave the session. The server answers by closing with 1013.
    Leave,
    /// Answer the open multiple-choice prompt.
    McAnswer { answer: String },
    /// Host: clear all buzzes.
    Reset,
    /// Host: lock or unlock all buzzers.
    ToggleLock,
    /// Host: open a prompt. `choices` is free text, one option per line;
    /// splitting is the server's job.
    PromptChoices { choices: String },
    /// Host: discard the prompt and every recorded answer.
    ClearMc,
    /// Host: stop accepting answers.
    EndMc,
}

impl ClientMessage {
    /// Encode for the wire.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Serialization`](crate::BuzzerError::Serialization)
    /// if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the `event` tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Buzz => "BUZZ",
            Self::Pong { .. } => "PONG",
            Self::Leave => "LEAVE",
            Self::McAnswer { .. } => "MC_ANSWER",
            Self::Reset => "RESET",
            Self::ToggleLock => "TOGGLE_LOCK",
            Self::PromptChoices { .. } => "PROMPT_CHOICES",
            Self::ClearMc => "CLEAR_MC",
            Self::EndMc => "END_MC",
        }
    }
}

/// Events sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full session snapshot.
    Update(UpdatePayload),
    /// All buzzes cleared; buttons reopen.
    Reset,
    /// Liveness probe. The id is opaque and echoed back verbatim.
    Ping { id: serde_json::Value },
    /// A multiple-choice prompt opens.
    MultipleChoice { choices: Vec<String> },
    /// The prompt is over.
    EndMultipleChoice,
    /// Any event this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode one inbound text message.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::Serialization`](crate::BuzzerError::Serialization)
    /// for malformed JSON or a message without a valid `event` envelope.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Wire name of the `event` tag (`"UNKNOWN"` for unrecognised events).
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Update(_) => "UPDATE",
            Self::Reset => "RESET",
            Self::Ping { .. } => "PING",
            Self::MultipleChoice { .. } => "MULTIPLE_CHOICE",
            Self::EndMultipleChoice => "END_MULTIPLE_CHOICE",
            Self::Unknown => "UNKNOWN",
        }
    }
}
