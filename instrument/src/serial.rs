//! This module provides a transport for instruments controlled via a serial port.
//!
//! It includes a blocking implementation of the [`Transport`] trait using the `serialport`
//! crate.

use std::time::Duration;

use serialport::SerialPort;

use crate::{InstrumentError, Transport, stream};

/// A blocking serial port transport using the `serialport` crate.
///
/// The resource locator is the name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`. The
/// port is opened with 8 data bits, no parity and one stop bit at the configured baud rate.
#[derive(Debug)]
pub struct SerialTransport {
    baud_rate: u32,
    terminator: String,
    timeout: Duration,
}

impl SerialTransport {
    /// Create a new `SerialTransport` with the given baud rate.
    ///
    /// The read terminator is by default set to `"\n"` and the timeout to three seconds.
    ///
    /// # Arguments
    /// * `baud_rate` - The baud rate of the serial port, e.g., `9600`.
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            terminator: "\n".to_string(),
            timeout: Duration::from_secs(3),
        }
    }

    /// Get the configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Set the timeout of the serial port. Applies to sessions opened afterwards.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Transport for SerialTransport {
    type Session = Box<dyn SerialPort>;

    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
        if resource.is_empty() {
            return Err(InstrumentError::InvalidResource(resource.to_string()));
        }
        let port = serialport::new(resource, self.baud_rate)
            .timeout(self.timeout)
            .open()?;
        Ok(port)
    }

    fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError> {
        // The port is released when dropped.
        drop(session);
        Ok(())
    }

    fn write(&mut self, session: &mut Self::Session, data: &str) -> Result<usize, InstrumentError> {
        stream::write_all(session.as_mut(), data)
    }

    fn query(
        &mut self,
        session: &mut Self::Session,
        data: &str,
    ) -> Result<String, InstrumentError> {
        stream::write_all(session.as_mut(), data)?;
        let timeout = session.timeout();
        stream::read_until_terminator(session.as_mut(), &self.terminator, timeout, data)
    }

    fn set_read_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}
