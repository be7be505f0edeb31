//! Multiple-choice prompt flow.
//!
//! ```text
//!             MULTIPLE_CHOICE                 select(answer)
//!  Inactive ──────────────────▶ Prompting ────────────────────▶ Answered
//!     ▲                              │                              │
//!     └──── END_MULTIPLE_CHOICE ─────┴──────────────────────────────┘
//! ```
//!
//! The modal is open exactly while the flow is `Prompting`; background
//! scrolling is suspended for as long as the modal is open. The "Your Choice"
//! indicator is a local prediction until an `UPDATE` carrying `choice`
//! confirms or overwrites it.

use crate::protocol::ClientMessage;

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoicePhase {
    /// No prompt is open.
    #[default]
    Inactive,
    /// The modal is open and waiting for an answer.
    Prompting,
    /// An answer was submitted; the modal is closed.
    Answered,
}

/// The modal shown while prompting: one selectable control per option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceModal {
    /// Option labels in server order.
    pub options: Vec<String>,
}

/// Local state of the prompt dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceFlow {
    phase: ChoicePhase,
    options: Vec<String>,
    answer: Option<String>,
}

impl ChoiceFlow {
    /// A flow with no prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> ChoicePhase {
        self.phase
    }

    /// The open modal, if any.
    pub fn modal(&self) -> Option<ChoiceModal> {
        (self.phase == ChoicePhase::Prompting).then(|| ChoiceModal {
            options: self.options.clone(),
        })
    }

    /// Whether background scrolling is suspended.
    pub fn scroll_locked(&self) -> bool {
        self.phase == ChoicePhase::Prompting
    }

    /// The recorded or predicted answer.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Text of the "Your Choice" indicator.
    pub fn indicator(&self) -> Option<String> {
        self.answer
            .as_deref()
            .map(|answer| format!("Your Choice: {answer}"))
    }

    /// `MULTIPLE_CHOICE` arrived. A new prompt replaces any previous one and
    /// discards the previous answer.
    pub fn prompt(&mut self, choices: Vec<String>) {
        self.options = choices;
        self.answer = None;
        self.phase = ChoicePhase::Prompting;
    }

    /// The user picked `answer`.
    ///
    /// Returns the `MC_ANSWER` intent the first time a listed option is picked
    /// while prompting, and `None` otherwise, so at most one answer is ever
    /// sent per prompt.
    pub fn select(&mut self, answer: &str) -> Option<ClientMessage> {
        if self.phase != ChoicePhase::Prompting || !self.options.iter().any(|o| o == answer) {
            return None;
        }
        self.phase = ChoicePhase::Answered;
        self.answer = Some(answer.to_string());
        Some(ClientMessage::McAnswer {
            answer: answer.to_string(),
        })
    }

    /// `END_MULTIPLE_CHOICE` arrived. Safe to receive in any phase.
    pub fn end(&mut self) {
        self.phase = ChoicePhase::Inactive;
    }

    /// Reconcile with the `choice`/`choices` fields of an `UPDATE`.
    ///
    /// - `choice` present: the server's record wins; the modal closes.
    /// - only `choices` present: the prompt is kept open, or reopened after
    ///   it ended, unless an answer to it is still pending; an answer left
    ///   over from an ended prompt is dropped on reopening.
    /// - neither: no prompt is running server-side; the modal closes and the
    ///   indicator is cleared.
    pub fn apply_update(&mut self, choice: Option<&str>, choices: Option<&[String]>) {
        match (choice, choices) {
            (Some(choice), choices) => {
                if let Some(choices) = choices {
                    self.options = choices.to_vec();
                }
                self.answer = Some(choice.to_string());
                if self.phase == ChoicePhase::Prompting {
                    self.phase = ChoicePhase::Answered;
                }
            }
            (None, Some(choices)) => match self.phase {
                ChoicePhase::Answered => {}
                ChoicePhase::Prompting => self.options = choices.to_vec(),
                ChoicePhase::Inactive => {
                    self.options = choices.to_vec();
                    self.answer = None;
                    self.phase = ChoicePhase::Prompting;
                }
            },
            (None, None) => {
                self.answer = None;
                self.phase = ChoicePhase::Inactive;
            }
        }
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

    fn ab() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn round_trip_prompt_answer_end() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        assert_eq!(flow.modal(), Some(ChoiceModal { options: ab() }));
        assert!(flow.scroll_locked());

        let sent = flow.select("A");
        assert_eq!(
            sent,
            Some(ClientMessage::McAnswer {
                answer: "A".into()
            })
        );
        assert_eq!(flow.phase(), ChoicePhase::Answered);
        assert!(flow.modal().is_none());
        assert!(!flow.scroll_locked());
        assert_eq!(flow.indicator().as_deref(), Some("Your Choice: A"));

        flow.end();
        assert_eq!(flow.phase(), ChoicePhase::Inactive);
        assert!(flow.modal().is_none());
        assert_eq!(flow.indicator().as_deref(), Some("Your Choice: A"));
    }

    #[test]
    fn answer_is_sent_at_most_once() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        assert!(flow.select("A").is_some());
        assert!(flow.select("B").is_none());
        assert_eq!(flow.answer(), Some("A"));
    }

    #[test]
    fn select_ignores_unlisted_option_and_inactive_flow() {
        let mut flow = ChoiceFlow::new();
        assert!(flow.select("A").is_none());
        flow.prompt(ab());
        assert!(flow.select("C").is_none());
        assert_eq!(flow.phase(), ChoicePhase::Prompting);
    }

    #[test]
    fn end_is_idempotent() {
        let mut flow = ChoiceFlow::new();
        flow.end();
        flow.end();
        assert_eq!(flow, ChoiceFlow::new());
    }

    #[test]
    fn update_choice_overwrites_prediction() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        flow.select("A");
        flow.apply_update(Some("B"), Some(&ab()));
        assert_eq!(flow.indicator().as_deref(), Some("Your Choice: B"));
        assert!(flow.modal().is_none());
    }

    #[test]
    fn update_choices_without_choice_reopens_prompt() {
        let mut flow = ChoiceFlow::new();
        flow.apply_update(None, Some(&ab()));
        assert_eq!(flow.modal(), Some(ChoiceModal { options: ab() }));
    }

    #[test]
    fn update_choices_without_choice_keeps_pending_answer() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        flow.select("A");
        flow.apply_update(None, Some(&ab()));
        assert_eq!(flow.phase(), ChoicePhase::Answered);
        assert_eq!(flow.indicator().as_deref(), Some("Your Choice: A"));
    }

    #[test]
    fn update_choices_after_end_reopens_without_stale_answer() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        flow.select("A");
        flow.end();

        flow.apply_update(None, Some(&ab()));
        assert_eq!(flow.phase(), ChoicePhase::Prompting);
        assert_eq!(flow.modal(), Some(ChoiceModal { options: ab() }));
        assert!(flow.indicator().is_none());
        assert!(flow.select("B").is_some());
    }

    #[test]
    fn update_choices_while_prompting_refreshes_options() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(vec!["A".into()]);
        flow.apply_update(None, Some(&ab()));
        assert_eq!(flow.modal(), Some(ChoiceModal { options: ab() }));
    }

    #[test]
    fn update_without_choice_fields_clears_stale_indicator() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        flow.select("A");
        flow.apply_update(None, None);
        assert!(flow.indicator().is_none());
        assert_eq!(flow.phase(), ChoicePhase::Inactive);
    }

    #[test]
    fn new_prompt_discards_previous_answer() {
        let mut flow = ChoiceFlow::new();
        flow.prompt(ab());
        flow.select("A");
        flow.prompt(vec!["X".into()]);
        assert!(flow.indicator().is_none());
        assert_eq!(flow.phase(), ChoicePhase::Prompting);
    }
}
