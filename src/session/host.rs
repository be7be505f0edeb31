//! The host's side: roster, lock switch and prompt controls.

use tracing::debug;

use super::{clear_buzzes, keepalive, Effect, Role, SessionView};
use crate::button::{LockToggle, Presentation};
use crate::close::{Banner, CloseOutcome};
use crate::endpoints::Seat;
use crate::protocol::{ClientMessage, Participant, ServerMessage};
use crate::roster::{self, RosterOptions, RosterView};

/// Actions available on the host's control panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Flip the lock; shown immediately, reconciled by the next `UPDATE`.
    ToggleLock,
    /// Clear every buzz.
    Reset,
    /// Open a prompt from free text, one option per line.
    PromptChoices(String),
    /// Discard the prompt and all answers.
    ClearChoices,
    /// Stop accepting answers.
    EndChoices,
}

/// Everything the host's screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostView {
    /// Whether buzzers are locked, as last predicted or reported.
    pub locked: bool,
    /// Label and colors of the lock toggle.
    pub lock_button: Presentation,
    /// Everyone in the session, with lost connections marked.
    pub roster: RosterView,
    /// Options of the prompt the server reports as open.
    pub active_prompt: Option<Vec<String>>,
    /// A prompt was submitted and the server has not answered yet; the
    /// prompt form stays disabled meanwhile.
    pub prompt_pending: bool,
    /// False once the connection has ended.
    pub connected: bool,
    /// Message box shown after the connection ended.
    pub banner: Option<Banner>,
}

/// Reducer for the host client.
#[derive(Debug, Clone)]
pub struct HostSession {
    lock: LockToggle,
    roster: Vec<Participant>,
    active_prompt: Option<Vec<String>>,
    prompt_pending: bool,
    options: RosterOptions,
    connected: bool,
    banner: Option<Banner>,
}

impl HostSession {
    /// An unlocked, connected host with an empty roster.
    pub fn new(options: RosterOptions) -> Self {
        Self {
            lock: LockToggle::new(),
            roster: Vec::new(),
            active_prompt: None,
            prompt_pending: false,
            options,
            connected: true,
            banner: None,
        }
    }

    /// Current lock prediction.
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl Default for HostSession {
    fn default() -> Self {
        Self::new(RosterOptions::host())
    }
}

impl Role for HostSession {
    type Command = HostCommand;

    const SEAT: Seat = Seat::Host;

    fn on_server(&mut self, msg: ServerMessage) -> Vec<Effect> {
        match msg {
            ServerMessage::Update(update) => {
                self.roster = update.users;
                if let Some(state) = update.button_state {
                    self.lock.apply_server(state);
                }
                self.active_prompt = update.choices;
                self.prompt_pending = false;
                if update.sound {
                    vec![Effect::PlaySound, Effect::Render]
                } else {
                    vec![Effect::Render]
                }
            }
            ServerMessage::Reset => {
                clear_buzzes(&mut self.roster);
                vec![Effect::Render]
            }
            ServerMessage::Ping { id } => vec![keepalive(id)],
            ServerMessage::MultipleChoice { choices } => {
                self.active_prompt = Some(choices);
                self.prompt_pending = false;
                vec![Effect::Render]
            }
            ServerMessage::EndMultipleChoice => {
                self.active_prompt = None;
                vec![Effect::Render]
            }
            ServerMessage::Unknown => {
                debug!("ignoring unknown server event");
                Vec::new()
            }
        }
    }

    fn on_command(&mut self, cmd: HostCommand) -> Vec<Effect> {
        match cmd {
            HostCommand::ToggleLock => {
                self.lock.toggle();
                vec![Effect::Send(ClientMessage::ToggleLock), Effect::Render]
            }
            HostCommand::Reset => vec![Effect::Send(ClientMessage::Reset)],
            HostCommand::PromptChoices(choices) => {
                if self.prompt_pending || choices.trim().is_empty() {
                    debug!(pending = self.prompt_pending, "prompt ignored");
                    return Vec::new();
                }
                self.prompt_pending = true;
                vec![
                    Effect::Send(ClientMessage::PromptChoices { choices }),
                    Effect::Render,
                ]
            }
            HostCommand::ClearChoices => vec![Effect::Send(ClientMessage::ClearMc)],
            HostCommand::EndChoices => vec![Effect::Send(ClientMessage::EndMc)],
        }
    }

    fn on_close(&mut self, outcome: &CloseOutcome) {
        self.connected = false;
        self.prompt_pending = false;
        self.banner = outcome.banner().cloned();
    }

    fn view(&self) -> SessionView {
        SessionView::Host(HostView {
            locked: self.lock.is_locked(),
            lock_button: self.lock.presentation(),
            roster: roster::render(&self.roster, self.options),
            active_prompt: self.active_prompt.clone(),
            prompt_pending: self.prompt_pending,
            connected: self.connected,
            banner: self.banner.clone(),
        })
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
    use crate::close::CloseSignal;
    use crate::endpoints::Endpoints;
    use crate::protocol::{ButtonState, UpdatePayload};

    fn view(session: &HostSession) -> HostView {
        match session.view() {
            SessionView::Host(view) => view,
            other => panic!("expected host view, got {other:?}"),
        }
    }

    fn update(state: ButtonState) -> ServerMessage {
        ServerMessage::Update(UpdatePayload {
            button_state: Some(state),
            ..Default::default()
        })
    }

    #[test]
    fn toggle_is_optimistic_then_reconciled() {
        let mut host = HostSession::default();
        let effects = host.on_command(HostCommand::ToggleLock);
        assert_eq!(
            effects,
            vec![Effect::Send(ClientMessage::ToggleLock), Effect::Render]
        );
        assert!(view(&host).locked);
        assert_eq!(view(&host).lock_button.label, "LOCKED");

        host.on_server(update(ButtonState::Open));
        assert!(!view(&host).locked);
        assert_eq!(view(&host).lock_button.label, "UNLOCKED");
    }

    #[test]
    fn fire_and_forget_intents() {
        let mut host = HostSession::default();
        assert_eq!(
            host.on_command(HostCommand::Reset),
            vec![Effect::Send(ClientMessage::Reset)]
        );
        assert_eq!(
            host.on_command(HostCommand::ClearChoices),
            vec![Effect::Send(ClientMessage::ClearMc)]
        );
        assert_eq!(
            host.on_command(HostCommand::EndChoices),
            vec![Effect::Send(ClientMessage::EndMc)]
        );
        assert!(!host.is_locked());
    }

    #[test]
    fn prompt_is_not_resubmitted_until_server_answers() {
        let mut host = HostSession::default();
        let effects = host.on_command(HostCommand::PromptChoices("A\nB".into()));
        assert_eq!(effects.len(), 2);
        assert!(view(&host).prompt_pending);
        assert!(host
            .on_command(HostCommand::PromptChoices("A\nB".into()))
            .is_empty());

        host.on_server(ServerMessage::MultipleChoice {
            choices: vec!["A".into(), "B".into()],
        });
        let v = view(&host);
        assert!(!v.prompt_pending);
        assert_eq!(v.active_prompt, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn blank_prompt_is_ignored() {
        let mut host = HostSession::default();
        assert!(host
            .on_command(HostCommand::PromptChoices("  \n ".into()))
            .is_empty());
    }

    #[test]
    fn roster_marks_dropped_participants() {
        let mut host = HostSession::default();
        host.on_server(ServerMessage::Update(UpdatePayload {
            users: vec![Participant::new("Alice", "a").with_connected(false)],
            button_state: Some(ButtonState::Locked),
            ..Default::default()
        }));
        let v = view(&host);
        assert!(v.locked);
        assert!(v.roster.entries()[0].connection_lost);
    }

    #[test]
    fn end_multiple_choice_clears_prompt() {
        let mut host = HostSession::default();
        host.on_server(ServerMessage::MultipleChoice {
            choices: vec!["A".into()],
        });
        host.on_server(ServerMessage::EndMultipleChoice);
        assert!(view(&host).active_prompt.is_none());
    }

    #[test]
    fn close_shows_banner() {
        let mut host = HostSession::default();
        let endpoints = Endpoints::from_page_url("http://q.example/host/AB12", Seat::Host).unwrap();
        let outcome =
            CloseOutcome::for_signal(&CloseSignal::new(1011, "restarting"), &endpoints);
        host.on_close(&outcome);
        let v = view(&host);
        assert!(!v.connected);
        assert_eq!(v.banner.unwrap().text, "restarting (1011)");
    }
}
