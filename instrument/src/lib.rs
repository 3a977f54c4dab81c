//! footswitch-instrument: request/response control of lab instruments from Rust
//!
//! This crate provides the pieces every instrument driver of the footswitch needs: a [`Driver`]
//! trait that a concrete instrument implements, an [`Instrument`] wrapper that owns the session,
//! formats every command and paces the traffic, and a set of [`Transport`]s that move the
//! formatted commands over the wire.
//!
//! # Currently implemented transports are:
//! - WebSocket (blocking) using the [`tungstenite`] crate, behind the `websocket` feature.
//! - TCP/IP (blocking) using [`std::net::TcpStream`].
//! - Serial (blocking) using the [`serialport`] crate, behind the `serial` feature.
//! - A loopback transport to test drivers without hardware.
//!
//! # Writing a driver
//!
//! A driver supplies six primitives. Four of them move bytes (`open`, `close`, `write`, `query`)
//! and are usually forwarded to a [`Transport`]. The other two (`setup`, `action`) describe what
//! the instrument should do and receive the [`Instrument`] they belong to, so they can issue
//! commands through the formatting and pacing layer. Every primitive that a driver does not
//! implement fails with [`InstrumentError::Unimplemented`].
//!
//! ```
//! use footswitch_instrument::{
//!     Driver, Instrument, InstrumentError, InstrumentSettings, LoopbackTransport, Transport,
//! };
//!
//! struct Meter<T: Transport> {
//!     transport: T,
//! }
//!
//! impl<T: Transport> Driver for Meter<T> {
//!     type Session = T::Session;
//!
//!     fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
//!         self.transport.open(resource)
//!     }
//!
//!     fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError> {
//!         self.transport.close(session)
//!     }
//!
//!     fn write(&mut self, session: &mut Self::Session, cmd: &str) -> Result<usize, InstrumentError> {
//!         self.transport.write(session, cmd)
//!     }
//!
//!     fn query(&mut self, session: &mut Self::Session, cmd: &str) -> Result<String, InstrumentError> {
//!         self.transport.query(session, cmd)
//!     }
//!
//!     fn set_read_terminator(&mut self, terminator: &str) {
//!         self.transport.set_read_terminator(terminator)
//!     }
//!
//!     fn setup(inst: &mut Instrument<Self>) -> Result<(), InstrumentError> {
//!         inst.with_session(|inst| inst.write("*RST").map(|_| ()))
//!     }
//!
//!     fn action(inst: &mut Instrument<Self>) -> Result<String, InstrumentError> {
//!         inst.with_session(|inst| inst.query("MEAS?"))
//!     }
//! }
//!
//! let transport = LoopbackTransport::new(vec!["*RST", "MEAS?"], vec!["42"], "\n");
//! let settings = InstrumentSettings {
//!     write_termination: "\n".to_string(),
//!     ..Default::default()
//! };
//! let mut inst = Instrument::new(Meter { transport }, "loop://meter", settings);
//!
//! inst.setup().unwrap();
//! assert_eq!(inst.action().unwrap(), "42");
//! ```
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

mod instrument;
mod loopback;
#[cfg(feature = "serial")]
mod serial;
mod stream;
mod tcp_ip;
#[cfg(feature = "websocket")]
mod websocket;

pub use instrument::{Instrument, InstrumentSettings};
pub use loopback::{LoopbackSession, LoopbackTransport};
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
pub use tcp_ip::TcpIpTransport;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use std::time::Duration;

use thiserror::Error;

/// The error enum for all instruments.
///
/// Every primitive of a [`Driver`] and every method of an [`Instrument`] returns this error as
/// the alternative, so that failures of the transport, the session lifecycle and the driver
/// itself all propagate with the `?` operator to whoever triggered the operation. Nothing in
/// this crate retries or reconnects.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// The driver does not implement the named primitive.
    #[error("{0}() is not implemented by this instrument driver")]
    Unimplemented(&'static str),
    /// `open()` was called while a session was already held.
    #[error("A session to the instrument is already open")]
    SessionAlreadyOpen,
    /// A command was sent or a session was closed while no session was open.
    #[error("No session to the instrument is open")]
    NotConnected,
    /// `action()` was called before the instrument was set up.
    #[error("The instrument has not been set up, call setup() before action()")]
    NotConfigured,
    /// The resource locator cannot be used by the transport.
    #[error("Invalid resource locator: {0}")]
    InvalidResource(String),
    /// A given integer value is out of the specified range. The error contains the value that was
    /// sent, the minimum value that is allowed, and the maximum value that is allowed.
    #[error("Integer value {value} is out of range. Allowed range is [{min}, {max}]")]
    IntValueOutOfRange {
        /// The value that is out of range.
        value: i64,
        /// The minimum value that is allowed.
        min: i64,
        /// The maximum value that is allowed.
        max: i64,
    },
    /// Error when reading from/writing to a transport. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Instrument response could not be parsed because it was unexpected by the driver. This
    /// error contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial transport. See the
    /// [`serialport::Error`] documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    #[cfg(feature = "websocket")]
    /// Errors of an established WebSocket connection. See [`tungstenite::Error`].
    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
    #[cfg(feature = "websocket")]
    /// The WebSocket opening handshake failed.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
}

/// The `Driver` trait is the extension point for supporting an instrument.
///
/// A driver supplies the six primitives listed below. The [`Instrument`] wrapper calls them;
/// user code talks to the [`Instrument`] only. The default implementation of every primitive
/// fails with [`InstrumentError::Unimplemented`], so a driver that forgets one finds out the
/// first time it is used.
///
/// `open`, `close`, `write` and `query` receive strings that are already fully formatted, i.e.,
/// prefix and write terminator are part of them. They must send them unchanged.
pub trait Driver: Sized {
    /// The live connection to the instrument.
    type Session;

    /// Connect to the instrument identified by `resource` and return the session.
    fn open(&mut self, _resource: &str) -> Result<Self::Session, InstrumentError> {
        Err(InstrumentError::Unimplemented("open"))
    }

    /// Tear down a session that was returned by [`Driver::open`].
    fn close(&mut self, _session: Self::Session) -> Result<(), InstrumentError> {
        Err(InstrumentError::Unimplemented("close"))
    }

    /// Send a formatted command and return the number of bytes written.
    fn write(&mut self, _session: &mut Self::Session, _cmd: &str) -> Result<usize, InstrumentError> {
        Err(InstrumentError::Unimplemented("write"))
    }

    /// Send a formatted command, receive exactly one response and return it.
    fn query(
        &mut self,
        _session: &mut Self::Session,
        _cmd: &str,
    ) -> Result<String, InstrumentError> {
        Err(InstrumentError::Unimplemented("query"))
    }

    /// Use `terminator` to find the end of a response.
    ///
    /// Called by [`Instrument::new`] with the read termination of the settings. Drivers that
    /// forward to a [`Transport`] should hand it on to [`Transport::set_read_terminator`].
    fn set_read_terminator(&mut self, _terminator: &str) {}

    /// Bring the instrument into the state that [`Driver::action`] expects.
    fn setup(_inst: &mut Instrument<Self>) -> Result<(), InstrumentError> {
        Err(InstrumentError::Unimplemented("setup"))
    }

    /// Perform the instrument's operation (trigger, read, ...) and return the result as text.
    fn action(_inst: &mut Instrument<Self>) -> Result<String, InstrumentError> {
        Err(InstrumentError::Unimplemented("action"))
    }
}

/// A `Transport` moves formatted commands to an instrument and responses back.
///
/// Transports are the byte-moving half of a [`Driver`]: a driver for one instrument family can
/// be generic over its transport and forward `open`, `close`, `write`, and `query` to it.
pub trait Transport {
    /// The live connection handle.
    type Session;

    /// Connect to `resource`.
    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError>;

    /// Tear down the connection.
    fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError>;

    /// Send `data` as-is and return the number of bytes written.
    fn write(&mut self, session: &mut Self::Session, data: &str) -> Result<usize, InstrumentError>;

    /// Send `data` as-is, then perform exactly one receive and return the response.
    fn query(&mut self, session: &mut Self::Session, data: &str)
    -> Result<String, InstrumentError>;

    /// Set the terminator that ends a response, for transports that read line by line.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that marks the end of a response.
    fn set_read_terminator(&mut self, _terminator: &str) {}
}
