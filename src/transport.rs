//! Transport abstraction for the buzzer session protocol.
//!
//! The [`Transport`] trait is a message-oriented, full-duplex text channel
//! that also reports how the connection ended. Connection setup is not part
//! of the trait; construct a connected transport and hand it to
//! [`BuzzerClient::start`](crate::client::BuzzerClient::start).
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use buzzer_client::error::BuzzerError;
//! use buzzer_client::transport::{Inbound, Transport};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), BuzzerError> {
//!         // Send one JSON text message
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Result<Inbound, BuzzerError> {
//!         // Next text message, or the close code and reason
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), BuzzerError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::close::CloseSignal;
use crate::error::BuzzerError;

/// One item read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete text message.
    Text(String),
    /// The connection ended with this code and reason. Nothing follows.
    Closed(CloseSignal),
}

/// A bidirectional text message transport.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe; the client loop calls it
/// inside `tokio::select!`.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one JSON text message.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::TransportSend`] or [`BuzzerError::TransportClosed`]
    /// if the message could not be sent. The client drops the message; it is
    /// never retried.
    async fn send(&mut self, message: String) -> Result<(), BuzzerError>;

    /// Receive the next message or the close signal.
    ///
    /// # Errors
    ///
    /// Returns [`BuzzerError::TransportReceive`] on a broken connection. The
    /// client treats this as an abnormal close (code 1006).
    async fn recv(&mut self) -> Result<Inbound, BuzzerError>;

    /// Close the connection from the client side.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails. Implementations should
    /// still release resources in that case.
    async fn close(&mut self) -> Result<(), BuzzerError>;
}
