//! Session URLs derived from the page a client was opened on.
//!
//! A participant opened on `https://quiz.example/buzzer/AB12` talks to
//! `wss://quiz.example/buzzer/ws`, rejoins through the page URL itself,
//! retries through `/buzzer` and lands on `/buzzer?error=4` when the host
//! ends the session. The host uses `/host` in place of `/buzzer`.

use url::Url;

use crate::error::{BuzzerError, Result};

/// Landing-page error code the server renders as "the session was closed by
/// the host".
pub const HOST_ENDED_ERROR_CODE: u8 = 4;

/// Which side of the session a client sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    /// A participant with a buzzer.
    Participant,
    /// The host controlling the session.
    Host,
}

impl Seat {
    /// First path segment of this seat's pages and socket.
    pub fn root(self) -> &'static str {
        match self {
            Self::Participant => "buzzer",
            Self::Host => "host",
        }
    }
}

/// Every URL a client needs during one connection lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Which side these URLs belong to.
    pub seat: Seat,
    /// WebSocket endpoint to connect to.
    pub websocket: String,
    /// The session page; used as the "Rejoin." link.
    pub session_page: String,
    /// Target of the "Retry." link after a lost connection.
    pub retry: String,
    /// Target of the "Go home." link.
    pub home: String,
    /// Where to navigate once the host has ended the session.
    pub ended: String,
}

impl Endpoints {
    /// Derive all endpoints from the `http(s)` URL of the session page.
    ///
    /// `ws`/`wss` page URLs are accepted as well and keep their scheme for
    /// the socket.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::InvalidUrl`] if `page` does not parse, has no
    /// host, or uses a scheme other than `http`, `https`, `ws` or `wss`.
    pub fn from_page_url(page: &str, seat: Seat) -> Result<Self> {
        let mut page =
            Url::parse(page).map_err(|e| BuzzerError::InvalidUrl(format!("{page}: {e}")))?;
        if page.host_str().is_none() {
            return Err(BuzzerError::InvalidUrl(format!("{page}: missing host")));
        }
        page.set_fragment(None);

        let (socket_scheme, page_scheme) = match page.scheme() {
            "http" | "ws" => ("ws", "http"),
            "https" | "wss" => ("wss", "https"),
            other => {
                return Err(BuzzerError::InvalidUrl(format!(
                    "{page}: unsupported scheme `{other}`"
                )))
            }
        };
        // Special-to-special scheme changes always succeed.
        let _ = page.set_scheme(page_scheme);

        let root = seat.root();
        let join = |path: &str| -> Result<String> {
            page.join(path)
                .map(String::from)
                .map_err(|e| BuzzerError::InvalidUrl(format!("{path}: {e}")))
        };

        let mut websocket = page.clone();
        let _ = websocket.set_scheme(socket_scheme);
        websocket.set_path(&format!("/{root}/ws"));
        websocket.set_query(None);

        Ok(Self {
            seat,
            websocket: websocket.into(),
            session_page: page.to_string(),
            retry: join(&format!("/{}", Seat::Participant.root()))?,
            home: join("/")?,
            ended: join(&format!("/{root}?error={HOST_ENDED_ERROR_CODE}"))?,
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

    #[test]
    fn participant_endpoints_over_plain_http() {
        let ep = Endpoints::from_page_url("http://localhost:8000/buzzer/AB12", Seat::Participant)
            .unwrap();
        assert_eq!(ep.websocket, "ws://localhost:8000/buzzer/ws");
        assert_eq!(ep.session_page, "http://localhost:8000/buzzer/AB12");
        assert_eq!(ep.retry, "http://localhost:8000/buzzer");
        assert_eq!(ep.home, "http://localhost:8000/");
        assert_eq!(ep.ended, "http://localhost:8000/buzzer?error=4");
    }

    #[test]
    fn host_endpoints_over_tls() {
        let ep = Endpoints::from_page_url("https://quiz.example/host/AB12#top", Seat::Host).unwrap();
        assert_eq!(ep.websocket, "wss://quiz.example/host/ws");
        assert_eq!(ep.session_page, "https://quiz.example/host/AB12");
        assert_eq!(ep.retry, "https://quiz.example/buzzer");
        assert_eq!(ep.ended, "https://quiz.example/host?error=4");
    }

    #[test]
    fn socket_url_drops_page_query() {
        let ep = Endpoints::from_page_url("http://q.example/buzzer/AB12?user=7", Seat::Participant)
            .unwrap();
        assert_eq!(ep.websocket, "ws://q.example/buzzer/ws");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = Endpoints::from_page_url("ftp://q.example/buzzer/AB12", Seat::Participant)
            .unwrap_err();
        assert!(matches!(err, BuzzerError::InvalidUrl(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = Endpoints::from_page_url("not a url", Seat::Host).unwrap_err();
        assert!(matches!(err, BuzzerError::InvalidUrl(_)));
    }
}
