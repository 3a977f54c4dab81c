//! This module provides a transport for instruments behind a WebSocket bridge.
//!
//! Serial-to-WiFi bridges commonly expose the instrument's serial line as a WebSocket, where every
//! command is one text message and every response arrives as one message. The implementation is
//! blocking and uses the [`tungstenite`] crate on top of a [`std::net::TcpStream`].

use std::{io::ErrorKind, net::TcpStream, time::Duration};

use log::{debug, trace};
use tungstenite::{Message, WebSocket, client::IntoClientRequest};

use crate::{InstrumentError, Transport, stream::timeout_error};

/// A blocking WebSocket transport.
///
/// The resource locator is a `ws://host:port/path` URI. Secure WebSockets (`wss://`) are not
/// supported.
///
/// The underlying socket is opened with `TCP_NODELAY`, so that each command is sent the moment it
/// is written. Instruments answer strictly one response per query, so nothing is gained from
/// coalescing.
#[derive(Debug)]
pub struct WebSocketTransport {
    timeout: Duration,
}

impl WebSocketTransport {
    /// Create a new `WebSocketTransport` with a socket timeout of three seconds.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }

    /// Get the read and write timeout of the underlying socket.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the read and write timeout of the underlying socket. Applies to sessions opened
    /// afterwards.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    type Session = WebSocket<TcpStream>;

    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
        let request = resource.into_client_request()?;
        let uri = request.uri();
        if uri.scheme_str() != Some("ws") {
            return Err(InstrumentError::InvalidResource(resource.to_string()));
        }
        let host = uri
            .host()
            .ok_or_else(|| InstrumentError::InvalidResource(resource.to_string()))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        let stream = TcpStream::connect((host.as_str(), port))?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let (socket, response) = tungstenite::client(request, stream)
            .map_err(|err| InstrumentError::Handshake(err.to_string()))?;
        debug!("WebSocket handshake with {resource}: {}", response.status());
        Ok(socket)
    }

    fn close(&mut self, mut session: Self::Session) -> Result<(), InstrumentError> {
        session.close(None)?;
        // Wait for the peer to acknowledge the close frame.
        loop {
            match session.read() {
                Ok(msg) => trace!("Discarding message while closing: {msg:?}"),
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(());
                }
                Err(tungstenite::Error::Io(err))
                    if matches!(
                        err.kind(),
                        ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof
                    ) =>
                {
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn write(&mut self, session: &mut Self::Session, data: &str) -> Result<usize, InstrumentError> {
        session.send(Message::Text(data.to_string()))?;
        Ok(data.len())
    }

    fn query(
        &mut self,
        session: &mut Self::Session,
        data: &str,
    ) -> Result<String, InstrumentError> {
        session.send(Message::Text(data.to_string()))?;
        loop {
            let message = match session.read() {
                Ok(message) => message,
                Err(tungstenite::Error::Io(err)) => {
                    return Err(timeout_error(err, data, self.timeout));
                }
                Err(err) => return Err(err.into()),
            };
            match message {
                Message::Text(text) => return Ok(text),
                Message::Binary(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Message::Close(_) => return Err(tungstenite::Error::ConnectionClosed.into()),
                // Ping, pong and raw frames carry no response.
                other => trace!("Skipping non-data message: {other:?}"),
            }
        }
    }
}
