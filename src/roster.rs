//! Roster rendering.
//!
//! [`render`] is a pure function from one snapshot to one view. It keeps no
//! state and never patches a previous view, so rendering the same snapshot
//! twice yields equal views.

use crate::protocol::Participant;

/// Shown instead of an empty list.
pub const EMPTY_ROSTER_NOTICE: &str = "No users have buzzed...";

/// Default avatar edge length in pixels.
pub const DEFAULT_AVATAR_SIZE: u32 = 32;

/// Knobs that differ between the participant and host views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterOptions {
    /// Mark participants whose connection dropped. Host view only.
    pub show_connection: bool,
    /// Requested avatar size.
    pub avatar_size: u32,
}

impl RosterOptions {
    /// Options for a participant's view.
    pub fn participant() -> Self {
        Self {
            show_connection: false,
            avatar_size: DEFAULT_AVATAR_SIZE,
        }
    }

    /// Options for the host's view.
    pub fn host() -> Self {
        Self {
            show_connection: true,
            avatar_size: DEFAULT_AVATAR_SIZE,
        }
    }

    /// Override the avatar size.
    #[must_use]
    pub fn with_avatar_size(mut self, size: u32) -> Self {
        self.avatar_size = size;
        self
    }
}

/// CSS-like class of a roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzClass {
    /// The participant has buzzed.
    Buzzed,
    /// The participant has not buzzed.
    Unbuzzed,
}

impl BuzzClass {
    /// Class name, `"buzzed"` or `"unbuzzed"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buzzed => "buzzed",
            Self::Unbuzzed => "unbuzzed",
        }
    }
}

/// One rendered roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Avatar URL including the size query.
    pub avatar_url: String,
    /// Name, with the recorded answer appended when there is one.
    pub display_name: String,
    /// Buzzed or not.
    pub class: BuzzClass,
    /// Set only in the host view, for participants who dropped.
    pub connection_lost: bool,
}

/// A complete roster view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterView {
    /// Placeholder notice instead of an empty list.
    Empty { notice: &'static str },
    /// One row per participant, in snapshot order.
    Entries(Vec<RosterEntry>),
}

impl RosterView {
    /// Whether the placeholder is shown.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// The rows; empty for the placeholder.
    pub fn entries(&self) -> &[RosterEntry] {
        match self {
            Self::Empty { .. } => &[],
            Self::Entries(entries) => entries,
        }
    }
}

impl Default for RosterView {
    fn default() -> Self {
        Self::Empty {
            notice: EMPTY_ROSTER_NOTICE,
        }
    }
}

/// Render a full snapshot.
pub fn render(participants: &[Participant], options: RosterOptions) -> RosterView {
    if participants.is_empty() {
        return RosterView::default();
    }
    RosterView::Entries(
        participants
            .iter()
            .map(|p| render_entry(p, options))
            .collect(),
    )
}

fn render_entry(participant: &Participant, options: RosterOptions) -> RosterEntry {
    let display_name = match &participant.choice {
        Some(choice) => format!("{} ({choice})", participant.name),
        None => participant.name.clone(),
    };
    RosterEntry {
        avatar_url: format!("{}?size={}", participant.avatar, options.avatar_size),
        display_name,
        class: if participant.buzzed {
            BuzzClass::Buzzed
        } else {
            BuzzClass::Unbuzzed
        },
        connection_lost: options.show_connection && !participant.connected,
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

    fn alice() -> Participant {
        Participant::new("Alice", "https://cdn.example/a.png")
    }

    #[test]
    fn empty_snapshot_shows_placeholder() {
        let view = render(&[], RosterOptions::participant());
        assert_eq!(
            view,
            RosterView::Empty {
                notice: EMPTY_ROSTER_NOTICE
            }
        );
        assert!(view.entries().is_empty());
    }

    #[test]
    fn buzzed_participant_is_marked() {
        let view = render(&[alice().with_buzzed(true)], RosterOptions::participant());
        assert!(!view.is_empty());
        let entry = &view.entries()[0];
        assert_eq!(entry.class, BuzzClass::Buzzed);
        assert_eq!(entry.class.as_str(), "buzzed");
        assert_eq!(entry.avatar_url, "https://cdn.example/a.png?size=32");
        assert_eq!(entry.display_name, "Alice");
    }

    #[test]
    fn choice_is_appended_to_name() {
        let view = render(&[alice().with_choice("B")], RosterOptions::participant());
        assert_eq!(view.entries()[0].display_name, "Alice (B)");
        assert_eq!(view.entries()[0].class, BuzzClass::Unbuzzed);
    }

    #[test]
    fn connection_modifier_only_in_host_view() {
        let roster = [alice().with_connected(false)];
        assert!(!render(&roster, RosterOptions::participant()).entries()[0].connection_lost);
        assert!(render(&roster, RosterOptions::host()).entries()[0].connection_lost);
    }

    #[test]
    fn rendering_is_idempotent_and_ordered() {
        let roster = [
            alice().with_buzzed(true),
            Participant::new("Bob", "https://cdn.example/b.png"),
        ];
        let options = RosterOptions::host().with_avatar_size(64);
        let first = render(&roster, options);
        let second = render(&roster, options);
        assert_eq!(first, second);
        assert_eq!(first.entries()[1].display_name, "Bob");
        assert_eq!(first.entries()[1].avatar_url, "https://cdn.example/b.png?size=64");
    }
}
