//! The participant's side: buzzer, roster and multiple-choice prompt.

use tracing::debug;

use super::{clear_buzzes, keepalive, Effect, Role, SessionView};
use crate::button::{ButtonMachine, Presentation};
use crate::choice::{ChoiceFlow, ChoiceModal};
use crate::close::{Banner, CloseOutcome};
use crate::endpoints::Seat;
use crate::protocol::{ButtonState, ClientMessage, Participant, ServerMessage};
use crate::roster::{self, RosterOptions, RosterView};

/// Key that buzzes, like a click on the button.
pub const BUZZ_KEY: char = ' ';

/// Actions a participant can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantCommand {
    /// Click the buzzer.
    Buzz,
    /// A key was pressed; [`BUZZ_KEY`] buzzes, anything else is ignored.
    Key(char),
    /// Leave the session (already confirmed by the user).
    Leave,
    /// Pick an option of the open prompt.
    Answer(String),
}

/// Everything a participant's screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    /// The button's current state.
    pub button_state: ButtonState,
    /// Label and colors for `button_state`.
    pub button: Presentation,
    /// Everyone in the session.
    pub roster: RosterView,
    /// The open multiple-choice dialogue, if any.
    pub modal: Option<ChoiceModal>,
    /// "Your Choice: ..." line.
    pub indicator: Option<String>,
    /// Background scrolling is suspended while the modal is open.
    pub scroll_locked: bool,
    /// Message box shown after the connection ended.
    pub banner: Option<Banner>,
}

/// Reducer for a participant client.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    button: ButtonMachine,
    roster: Vec<Participant>,
    choice: ChoiceFlow,
    options: RosterOptions,
    banner: Option<Banner>,
}

impl ParticipantSession {
    /// An open button, empty roster and no prompt.
    pub fn new(options: RosterOptions) -> Self {
        Self {
            button: ButtonMachine::new(),
            roster: Vec::new(),
            choice: ChoiceFlow::new(),
            options,
            banner: None,
        }
    }

    /// Current button state.
    pub fn button_state(&self) -> ButtonState {
        self.button.state()
    }

    fn buzz(&mut self) -> Vec<Effect> {
        if self.button.try_buzz() {
            vec![Effect::Send(ClientMessage::Buzz), Effect::Render]
        } else {
            debug!(state = %self.button.state(), "buzz ignored");
            Vec::new()
        }
    }
}

impl Default for ParticipantSession {
    fn default() -> Self {
        Self::new(RosterOptions::participant())
    }
}

impl Role for ParticipantSession {
    type Command = ParticipantCommand;

    const SEAT: Seat = Seat::Participant;

    fn on_server(&mut self, msg: ServerMessage) -> Vec<Effect> {
        match msg {
            ServerMessage::Update(update) => {
                self.roster = update.users;
                if let Some(state) = update.button_state {
                    self.button.apply_server(state);
                }
                self.choice
                    .apply_update(update.choice.as_deref(), update.choices.as_deref());
                if update.sound {
                    vec![Effect::PlaySound, Effect::Render]
                } else {
                    vec![Effect::Render]
                }
            }
            ServerMessage::Reset => {
                clear_buzzes(&mut self.roster);
                self.button.apply_server(ButtonState::Open);
                vec![Effect::Render]
            }
            ServerMessage::Ping { id } => vec![keepalive(id)],
            ServerMessage::MultipleChoice { choices } => {
                self.button.apply_server(ButtonState::Locked);
                self.choice.prompt(choices);
                vec![Effect::Render]
            }
            ServerMessage::EndMultipleChoice => {
                self.choice.end();
                vec![Effect::Render]
            }
            ServerMessage::Unknown => {
                debug!("ignoring unknown server event");
                Vec::new()
            }
        }
    }

    fn on_command(&mut self, cmd: ParticipantCommand) -> Vec<Effect> {
        match cmd {
            ParticipantCommand::Buzz | ParticipantCommand::Key(BUZZ_KEY) => self.buzz(),
            ParticipantCommand::Key(_) => Vec::new(),
            ParticipantCommand::Leave => vec![Effect::Send(ClientMessage::Leave)],
            ParticipantCommand::Answer(answer) => match self.choice.select(&answer) {
                Some(msg) => vec![Effect::Send(msg), Effect::Render],
                None => {
                    debug!(%answer, "answer ignored");
                    Vec::new()
                }
            },
        }
    }

    fn on_close(&mut self, outcome: &CloseOutcome) {
        self.choice.end();
        if outcome.disconnects() {
            self.button.disconnect();
        }
        self.banner = outcome.banner().cloned();
    }

    fn view(&self) -> SessionView {
        SessionView::Participant(ParticipantView {
            button_state: self.button.state(),
            button: self.button.presentation(),
            roster: roster::render(&self.roster, self.options),
            modal: self.choice.modal(),
            indicator: self.choice.indicator(),
            scroll_locked: self.choice.scroll_locked(),
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
    use crate::close::{CloseKind, CloseSignal};
    use crate::endpoints::Endpoints;
    use crate::protocol::UpdatePayload;
    use serde_json::json;

    fn view(session: &ParticipantSession) -> ParticipantView {
        match session.view() {
            SessionView::Participant(view) => view,
            other => panic!("expected participant view, got {other:?}"),
        }
    }

    fn update(state: ButtonState) -> ServerMessage {
        ServerMessage::Update(UpdatePayload {
            button_state: Some(state),
            ..Default::default()
        })
    }

    fn sends(effects: &[Effect]) -> Vec<&ClientMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn close(session: &mut ParticipantSession, code: u16) -> CloseOutcome {
        let endpoints =
            Endpoints::from_page_url("http://q.example/buzzer/AB12", Seat::Participant).unwrap();
        let outcome = CloseOutcome::for_signal(&CloseSignal::new(code, ""), &endpoints);
        session.on_close(&outcome);
        outcome
    }

    #[test]
    fn buzz_from_open_sends_once() {
        let mut session = ParticipantSession::default();
        let effects = session.on_command(ParticipantCommand::Buzz);
        assert_eq!(sends(&effects), vec![&ClientMessage::Buzz]);
        assert_eq!(session.button_state(), ButtonState::Buzzed);

        assert!(session.on_command(ParticipantCommand::Buzz).is_empty());
    }

    #[test]
    fn space_key_buzzes_other_keys_do_not() {
        let mut session = ParticipantSession::default();
        assert!(session.on_command(ParticipantCommand::Key('x')).is_empty());
        assert_eq!(session.button_state(), ButtonState::Open);
        let effects = session.on_command(ParticipantCommand::Key(' '));
        assert_eq!(sends(&effects), vec![&ClientMessage::Buzz]);
    }

    #[test]
    fn buzz_while_locked_is_noop() {
        let mut session = ParticipantSession::default();
        session.on_server(update(ButtonState::Locked));
        assert!(session.on_command(ParticipantCommand::Buzz).is_empty());
        assert_eq!(session.button_state(), ButtonState::Locked);
    }

    #[test]
    fn update_overwrites_optimistic_buzz() {
        let mut session = ParticipantSession::default();
        session.on_command(ParticipantCommand::Buzz);
        session.on_server(update(ButtonState::Open));
        assert_eq!(session.button_state(), ButtonState::Open);
    }

    #[test]
    fn update_with_sound_requests_cue() {
        let mut session = ParticipantSession::default();
        let effects = session.on_server(ServerMessage::Update(UpdatePayload {
            sound: true,
            ..Default::default()
        }));
        assert!(effects.contains(&Effect::PlaySound));
    }

    #[test]
    fn reset_reopens_and_clears_buzzes() {
        let mut session = ParticipantSession::default();
        session.on_server(ServerMessage::Update(UpdatePayload {
            users: vec![Participant::new("Alice", "a").with_buzzed(true)],
            button_state: Some(ButtonState::Buzzed),
            ..Default::default()
        }));
        session.on_server(ServerMessage::Reset);
        let v = view(&session);
        assert_eq!(v.button_state, ButtonState::Open);
        assert!(v.roster.entries().iter().all(|e| e.class.as_str() == "unbuzzed"));
    }

    #[test]
    fn reset_with_empty_roster_shows_placeholder() {
        let mut session = ParticipantSession::default();
        session.on_server(update(ButtonState::Locked));
        session.on_server(ServerMessage::Reset);
        let v = view(&session);
        assert_eq!(v.button_state, ButtonState::Open);
        assert!(v.roster.is_empty());
    }

    #[test]
    fn ping_only_pongs() {
        let mut session = ParticipantSession::default();
        let before = session.view();
        let effects = session.on_server(ServerMessage::Ping { id: json!("x") });
        assert_eq!(
            effects,
            vec![Effect::Send(ClientMessage::Pong { id: json!("x") })]
        );
        assert_eq!(session.view(), before);
    }

    #[test]
    fn unknown_event_is_ignored() {
        let mut session = ParticipantSession::default();
        assert!(session.on_server(ServerMessage::Unknown).is_empty());
    }

    #[test]
    fn multiple_choice_round_trip() {
        let mut session = ParticipantSession::default();
        session.on_server(ServerMessage::MultipleChoice {
            choices: vec!["A".into(), "B".into()],
        });
        let v = view(&session);
        assert_eq!(v.button_state, ButtonState::Locked);
        assert!(v.modal.is_some());
        assert!(v.scroll_locked);

        let effects = session.on_command(ParticipantCommand::Answer("A".into()));
        assert_eq!(
            sends(&effects),
            vec![&ClientMessage::McAnswer {
                answer: "A".into()
            }]
        );
        let v = view(&session);
        assert!(v.modal.is_none());
        assert!(!v.scroll_locked);
        assert_eq!(v.indicator.as_deref(), Some("Your Choice: A"));

        let before = session.view();
        session.on_server(ServerMessage::EndMultipleChoice);
        assert_eq!(session.view(), before);

        assert!(session
            .on_command(ParticipantCommand::Answer("B".into()))
            .is_empty());
    }

    #[test]
    fn plain_update_clears_indicator() {
        let mut session = ParticipantSession::default();
        session.on_server(ServerMessage::MultipleChoice {
            choices: vec!["A".into()],
        });
        session.on_command(ParticipantCommand::Answer("A".into()));
        session.on_server(update(ButtonState::Open));
        assert!(view(&session).indicator.is_none());
    }

    #[test]
    fn user_left_disconnects_with_banner() {
        let mut session = ParticipantSession::default();
        let outcome = close(&mut session, 1013);
        assert_eq!(outcome.kind(), CloseKind::UserLeft);
        let v = view(&session);
        assert_eq!(v.button_state, ButtonState::Disconnected);
        assert_eq!(v.button.label, "LOST CONN");
        assert_eq!(v.banner.unwrap().text, "You left.");
        assert!(session.on_command(ParticipantCommand::Buzz).is_empty());
    }

    #[test]
    fn lost_connection_disconnects_from_any_state() {
        let mut session = ParticipantSession::default();
        session.on_command(ParticipantCommand::Buzz);
        close(&mut session, 1006);
        assert_eq!(session.button_state(), ButtonState::Disconnected);
    }

    #[test]
    fn host_ended_leaves_button_alone() {
        let mut session = ParticipantSession::default();
        close(&mut session, 1000);
        let v = view(&session);
        assert_eq!(v.button_state, ButtonState::Open);
        assert!(v.banner.is_none());
    }
}
