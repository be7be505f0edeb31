//! Close-code classification.
//!
//! The server uses WebSocket close codes as a small signalling channel:
//!
//! | Code      | Outcome                           |
//! |-----------|-----------------------------------|
//! | 1000      | [`CloseKind::HostEnded`]          |
//! | 1013      | [`CloseKind::UserLeft`]           |
//! | any other | [`CloseKind::LostConnection`]     |
//!
//! Nothing here retries. Every outcome is terminal for the connection; the
//! user must follow a link to get a new one.

use crate::endpoints::Endpoints;

/// Normal closure; the host ended the session.
pub const CLOSE_NORMAL: u16 = 1000;
/// No status code was present in the close frame.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// The connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;
/// "Try again later"; the participant left (or connected elsewhere).
pub const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

/// Text shown when an abnormal close carries no reason.
pub const LOST_CONNECTION_TEXT: &str = "Lost Connection";

/// The final code and reason of a connection. Produced once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSignal {
    /// Numeric close code.
    pub code: u16,
    /// Reason text; may be empty.
    pub reason: String,
}

impl CloseSignal {
    /// Create a close signal.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// The signal for a connection that vanished without a close frame.
    pub fn abnormal() -> Self {
        Self::new(CLOSE_ABNORMAL, "")
    }

    /// Classify this signal.
    pub fn kind(&self) -> CloseKind {
        classify(self.code)
    }
}

/// The three ways a connection can end, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseKind {
    /// The host ended the session on purpose.
    HostEnded,
    /// The local user left (or the server moved them elsewhere).
    UserLeft,
    /// Anything else: network or server failure.
    LostConnection,
}

/// Map a close code to its outcome.
pub fn classify(code: u16) -> CloseKind {
    match code {
        CLOSE_NORMAL => CloseKind::HostEnded,
        CLOSE_TRY_AGAIN_LATER => CloseKind::UserLeft,
        _ => CloseKind::LostConnection,
    }
}

/// A link shown inside a [`Banner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link caption, e.g. `"Retry."`.
    pub label: &'static str,
    /// Absolute target URL.
    pub href: String,
}

/// The message box shown after the connection ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// The headline, e.g. `"Lost Connection (1006)"`.
    pub text: String,
    /// Recovery links, in display order.
    pub links: Vec<Link>,
}

/// What the UI should do once a connection has closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Navigate away to the "session over" landing page. No retry offered.
    HostEnded {
        /// Where to navigate.
        landing: String,
    },
    /// Show "You left." with rejoin and home links.
    UserLeft { banner: Banner },
    /// Show the server's reason and the code with a retry link.
    LostConnection {
        /// The close code shown next to the reason.
        code: u16,
        /// Reason text and the retry link.
        banner: Banner,
    },
}

impl CloseOutcome {
    /// Build the outcome for `signal` using the session's URLs.
    pub fn for_signal(signal: &CloseSignal, endpoints: &Endpoints) -> Self {
        match signal.kind() {
            CloseKind::HostEnded => Self::HostEnded {
                landing: endpoints.ended.clone(),
            },
            CloseKind::UserLeft => Self::UserLeft {
                banner: Banner {
                    text: "You left.".to_string(),
                    links: vec![
                        Link {
                            label: "Rejoin.",
                            href: endpoints.session_page.clone(),
                        },
                        Link {
                            label: "Go home.",
                            href: endpoints.home.clone(),
                        },
                    ],
                },
            },
            CloseKind::LostConnection => {
                let reason = if signal.reason.is_empty() {
                    LOST_CONNECTION_TEXT
                } else {
                    signal.reason.as_str()
                };
                Self::LostConnection {
                    code: signal.code,
                    banner: Banner {
                        text: format!("{reason} ({})", signal.code),
                        links: vec![Link {
                            label: "Retry.",
                            href: endpoints.retry.clone(),
                        }],
                    },
                }
            }
        }
    }

    /// The kind this outcome was built from.
    pub fn kind(&self) -> CloseKind {
        match self {
            Self::HostEnded { .. } => CloseKind::HostEnded,
            Self::UserLeft { .. } => CloseKind::UserLeft,
            Self::LostConnection { .. } => CloseKind::LostConnection,
        }
    }

    /// The banner to display, if the outcome stays on the page.
    pub fn banner(&self) -> Option<&Banner> {
        match self {
            Self::HostEnded { .. } => None,
            Self::UserLeft { banner } | Self::LostConnection { banner, .. } => Some(banner),
        }
    }

    /// Whether the page stays and the button must show DISCONNECTED.
    pub fn disconnects(&self) -> bool {
        !matches!(self, Self::HostEnded { .. })
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
    use crate::endpoints::Seat;

    fn endpoints() -> Endpoints {
        Endpoints::from_page_url("http://q.example/buzzer/AB12", Seat::Participant).unwrap()
    }

    #[test]
    fn classify_covers_all_three_branches() {
        assert_eq!(classify(1000), CloseKind::HostEnded);
        assert_eq!(classify(1013), CloseKind::UserLeft);
        for code in [1001, 1005, 1006, 1011, 1012, 1014, 4000, 0] {
            assert_eq!(classify(code), CloseKind::LostConnection, "code {code}");
        }
    }

    #[test]
    fn host_ended_navigates_without_banner() {
        let outcome = CloseOutcome::for_signal(&CloseSignal::new(1000, ""), &endpoints());
        assert_eq!(
            outcome,
            CloseOutcome::HostEnded {
                landing: "http://q.example/buzzer?error=4".into()
            }
        );
        assert!(outcome.banner().is_none());
        assert!(!outcome.disconnects());
    }

    #[test]
    fn user_left_offers_rejoin_and_home() {
        let outcome = CloseOutcome::for_signal(&CloseSignal::new(1013, "You left."), &endpoints());
        assert_eq!(outcome.kind(), CloseKind::UserLeft);
        assert!(outcome.disconnects());
        let banner = outcome.banner().unwrap();
        assert_eq!(banner.text, "You left.");
        assert_eq!(banner.links[0].href, "http://q.example/buzzer/AB12");
        assert_eq!(banner.links[1].href, "http://q.example/");
    }

    #[test]
    fn lost_connection_surfaces_reason_verbatim() {
        let signal = CloseSignal::new(1011, "server exploded");
        let outcome = CloseOutcome::for_signal(&signal, &endpoints());
        let CloseOutcome::LostConnection { code, banner } = &outcome else {
            panic!("expected LostConnection, got {outcome:?}");
        };
        assert_eq!(*code, 1011);
        assert_eq!(banner.text, "server exploded (1011)");
        assert_eq!(banner.links.len(), 1);
        assert_eq!(banner.links[0].label, "Retry.");
        assert_eq!(banner.links[0].href, "http://q.example/buzzer");
    }

    #[test]
    fn lost_connection_falls_back_to_default_text() {
        let outcome = CloseOutcome::for_signal(&CloseSignal::abnormal(), &endpoints());
        assert_eq!(outcome.banner().unwrap().text, "Lost Connection (1006)");
        assert!(outcome.disconnects());
    }
}
