//! This module provides a transport for instruments controlled via a raw TCP/IP socket.
//!
//! It includes a blocking implementation of the [`Transport`] trait using the
//! [`std::net::TcpStream`] struct.

use std::{
    net::{Shutdown, TcpStream},
    time::Duration,
};

use crate::{InstrumentError, Transport, stream};

/// A blocking TCP/IP transport using the [`std::net::TcpStream`] struct.
///
/// Commands are written as they are and flushed immediately, the socket is opened with
/// `TCP_NODELAY` so small commands are not held back. Responses are read until the read
/// terminator, which is stripped.
///
/// Resource locators are socket addresses, optionally with a `tcp://` scheme, e.g.,
/// `"192.168.127.42:5025"` or `"tcp://keithley.lan:5025"`.
#[derive(Debug)]
pub struct TcpIpTransport {
    terminator: String,
    timeout: Duration,
}

impl TcpIpTransport {
    /// Create a new `TcpIpTransport`.
    ///
    /// The read terminator is by default set to `"\n"`, but can be changed using the
    /// `set_read_terminator` function.
    ///
    /// If no read timeout was set, we would block forever on an instrument that does not answer.
    /// The timeout is therefore three seconds by default and can be adjusted with `set_timeout`.
    pub fn new() -> Self {
        Self {
            terminator: "\n".to_string(),
            timeout: Duration::from_secs(3),
        }
    }

    /// Get the read and write timeout of the socket.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the read and write timeout of the socket. Applies to sessions opened afterwards.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Default for TcpIpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpIpTransport {
    type Session = TcpStream;

    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
        let addr = resource.strip_prefix("tcp://").unwrap_or(resource);
        if addr.is_empty() {
            return Err(InstrumentError::InvalidResource(resource.to_string()));
        }
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_read_timeout(Some(self.timeout))?;
        Ok(stream)
    }

    fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError> {
        match session.shutdown(Shutdown::Both) {
            Err(err) if err.kind() != std::io::ErrorKind::NotConnected => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn write(&mut self, session: &mut Self::Session, data: &str) -> Result<usize, InstrumentError> {
        stream::write_all(session, data)
    }

    fn query(
        &mut self,
        session: &mut Self::Session,
        data: &str,
    ) -> Result<String, InstrumentError> {
        stream::write_all(session, data)?;
        stream::read_until_terminator(session, &self.terminator, self.timeout, data)
    }

    fn set_read_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}
