//! Events delivered from the transport loop to the consumer.

use crate::close::CloseOutcome;
use crate::session::SessionView;

/// Everything the consumer needs to keep its display in sync.
///
/// Ordering on one client:
///
/// 1. `Connected`, followed by a `Render` of the initial view.
/// 2. Zero or more `Render`s, one per state change, in arrival order.
/// 3. Either `Closed` (the server or network ended the connection) or
///    `Stopped` (the local handle shut down). Nothing follows it.
///
/// A `HostEnded` close is preceded by `Navigate`; the other close outcomes
/// are preceded by a `Render` showing the banner and the disconnected button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzerEvent {
    /// The transport loop is running.
    Connected,
    /// The view changed; replace whatever is displayed.
    Render(SessionView),
    /// Leave the page for this URL.
    Navigate(String),
    /// The connection ended. Terminal; no reconnect is attempted.
    Closed(CloseOutcome),
    /// The client was shut down locally.
    Stopped,
}
