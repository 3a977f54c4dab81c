//! This module provides the [`Instrument`] wrapper that every driver is used through.
//!
//! The wrapper owns the driver, the resource locator and the session. It formats every command
//! as `prefix + body + terminator`, forwards it to the driver's primitives and sleeps the
//! configured inter-command delay afterwards.

use std::{thread, time::Duration};

use log::{debug, info, trace, warn};

use crate::{Driver, InstrumentError};

/// Static configuration of an [`Instrument`].
///
/// The defaults correspond to a single channel instrument without command prefix, without
/// terminators and without a delay between commands. Drivers usually provide their own settings.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentSettings {
    /// Number of the selected channel if the instrument has several. Starts with 1.
    pub channel: usize,
    /// Time to wait after every write and every query, or `None` to not wait at all.
    pub wait: Option<Duration>,
    /// Prepended to every command body, e.g. `":"` for many SCPI instruments.
    pub cmd_prefix: String,
    /// Terminator that ends a response from the instrument, passed on to the driver by
    /// [`Instrument::new`].
    pub read_termination: String,
    /// Appended to every command body.
    pub write_termination: String,
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            channel: 1,
            wait: None,
            cmd_prefix: String::new(),
            read_termination: String::new(),
            write_termination: String::new(),
        }
    }
}

/// An instrument, i.e., a [`Driver`] together with the resource it talks to.
///
/// The session to the instrument only exists between [`Instrument::open`] and
/// [`Instrument::close`]. Drivers usually do not keep sessions around but open one for every
/// [`Instrument::setup`] and [`Instrument::action`] via [`Instrument::with_session`].
///
/// An instrument is meant to be used by one caller at a time. It does not guard against a second
/// `action()` being started from somewhere else while one is running.
///
/// # Example
///
/// ```
/// use footswitch_instrument::{
///     Driver, Instrument, InstrumentError, InstrumentSettings, LoopbackTransport, Transport,
/// };
///
/// struct Echo(LoopbackTransport);
///
/// impl Driver for Echo {
///     type Session = <LoopbackTransport as Transport>::Session;
///
///     fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
///         self.0.open(resource)
///     }
///
///     fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError> {
///         self.0.close(session)
///     }
///
///     fn query(&mut self, session: &mut Self::Session, cmd: &str) -> Result<String, InstrumentError> {
///         self.0.query(session, cmd)
///     }
/// }
///
/// let transport = LoopbackTransport::new(vec!["*IDN?"], vec!["ECHO,1"], "\r\n").with_prefix(":");
/// let settings = InstrumentSettings {
///     cmd_prefix: ":".to_string(),
///     write_termination: "\r\n".to_string(),
///     ..Default::default()
/// };
/// let mut inst = Instrument::new(Echo(transport), "loop://echo", settings);
///
/// inst.open().unwrap();
/// assert_eq!(inst.query("*IDN?").unwrap(), "ECHO,1");
/// inst.close().unwrap();
/// ```
pub struct Instrument<D: Driver> {
    driver: D,
    resource: String,
    settings: InstrumentSettings,
    session: Option<D::Session>,
    configured: bool,
}

impl<D: Driver> Instrument<D> {
    /// Create a new instrument. No connection is made until [`Instrument::open`] is called.
    ///
    /// # Arguments
    /// * `driver` - The driver that implements the primitives for this instrument.
    /// * `resource` - Resource locator, e.g., `"ws://192.168.1.10:8000"`. It is handed to the
    ///   driver's `open` primitive as is.
    /// * `settings` - Channel, delay, prefix and terminators. The read termination is handed to
    ///   the driver right away.
    pub fn new(mut driver: D, resource: &str, settings: InstrumentSettings) -> Self {
        driver.set_read_terminator(&settings.read_termination);
        Self {
            driver,
            resource: resource.to_string(),
            settings,
            session: None,
            configured: false,
        }
    }

    /// Open a session to the instrument.
    ///
    /// Fails with [`InstrumentError::SessionAlreadyOpen`] if a session is already held.
    pub fn open(&mut self) -> Result<(), InstrumentError> {
        if self.session.is_some() {
            return Err(InstrumentError::SessionAlreadyOpen);
        }
        debug!("Opening session to {}", self.resource);
        let session = self.driver.open(&self.resource)?;
        self.session = Some(session);
        Ok(())
    }

    /// Close the session to the instrument.
    ///
    /// The session is gone afterwards, even if the driver fails to tear it down cleanly.
    pub fn close(&mut self) -> Result<(), InstrumentError> {
        let session = self.session.take().ok_or(InstrumentError::NotConnected)?;
        debug!("Closing session to {}", self.resource);
        self.driver.close(session)
    }

    /// Run `f` inside a fresh session.
    ///
    /// The session is opened before `f` runs and closed after it returns, whether it succeeded or
    /// not. If `f` fails, its error is returned and a failure to close is only logged.
    pub fn with_session<T, F>(&mut self, f: F) -> Result<T, InstrumentError>
    where
        F: FnOnce(&mut Self) -> Result<T, InstrumentError>,
    {
        self.open()?;
        let result = f(self);
        let closed = if self.session.is_some() {
            self.close()
        } else {
            Ok(())
        };
        match (result, closed) {
            (Ok(val), Ok(())) => Ok(val),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!("Failed to close session to {}: {close_err}", self.resource);
                Err(err)
            }
        }
    }

    /// Send a command to the instrument.
    ///
    /// The command is formatted with [`Instrument::format_command`] and handed to the driver's
    /// `write` primitive. Afterwards, the configured delay is waited. Returns whatever the
    /// primitive returns, usually the number of bytes written.
    ///
    /// # Arguments
    /// * `body` - The command without prefix and terminator, e.g., `"SYST:LOC"`.
    pub fn write(&mut self, body: &str) -> Result<usize, InstrumentError> {
        let cmd = self.format_command(body);
        let session = self.session.as_mut().ok_or(InstrumentError::NotConnected)?;
        trace!("WRITE: {cmd:?}");
        let written = self.driver.write(session, &cmd)?;
        self.pause();
        Ok(written)
    }

    /// Query the instrument and return its response.
    ///
    /// Formatting and delay are the same as for [`Instrument::write`]. The response is returned
    /// exactly as the driver's `query` primitive produced it.
    ///
    /// # Arguments
    /// * `body` - The query without prefix and terminator, e.g., `"READ?"`.
    pub fn query(&mut self, body: &str) -> Result<String, InstrumentError> {
        let cmd = self.format_command(body);
        let session = self.session.as_mut().ok_or(InstrumentError::NotConnected)?;
        trace!("QUERY: {cmd:?}");
        let response = self.driver.query(session, &cmd)?;
        trace!("RESPONSE: {response:?}");
        self.pause();
        Ok(response)
    }

    /// Set up the instrument using the driver's setup sequence.
    ///
    /// Once this succeeded, [`Instrument::action`] can be used.
    pub fn setup(&mut self) -> Result<(), InstrumentError> {
        D::setup(self)?;
        self.configured = true;
        info!("Instrument at {} is set up", self.resource);
        Ok(())
    }

    /// Perform the driver's action and return its result.
    ///
    /// Fails with [`InstrumentError::NotConfigured`] if [`Instrument::setup`] has not succeeded
    /// before. In this case, the instrument is not contacted.
    pub fn action(&mut self) -> Result<String, InstrumentError> {
        if !self.configured {
            return Err(InstrumentError::NotConfigured);
        }
        D::action(self)
    }

    /// Format a command body the way it goes over the wire: `prefix + body + terminator`.
    pub fn format_command(&self, body: &str) -> String {
        format!(
            "{}{body}{}",
            self.settings.cmd_prefix, self.settings.write_termination
        )
    }

    /// Get the resource locator.
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Get the selected channel.
    pub fn channel(&self) -> usize {
        self.settings.channel
    }

    /// Get the command prefix.
    pub fn cmd_prefix(&self) -> &str {
        self.settings.cmd_prefix.as_str()
    }

    /// Get the terminator that ends responses.
    pub fn read_termination(&self) -> &str {
        self.settings.read_termination.as_str()
    }

    /// Get the terminator appended to commands.
    pub fn write_termination(&self) -> &str {
        self.settings.write_termination.as_str()
    }

    /// Get the delay waited after every command.
    pub fn wait(&self) -> Option<Duration> {
        self.settings.wait
    }

    /// Set the delay waited after every command, `None` to not wait.
    pub fn set_wait(&mut self, wait: Option<Duration>) {
        self.settings.wait = wait;
    }

    /// Return `true` while a session is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Return `true` once [`Instrument::setup`] has succeeded.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver, e.g., to change driver options.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn pause(&self) {
        if let Some(wait) = self.settings.wait {
            thread::sleep(wait);
        }
    }
}

// Tests of internal functionality
#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl Driver for Nothing {
        type Session = ();
    }

    #[test]
    fn test_default_settings() {
        let settings = InstrumentSettings::default();
        assert_eq!(settings.channel, 1);
        assert_eq!(settings.wait, None);
        assert!(settings.cmd_prefix.is_empty());
        assert!(settings.read_termination.is_empty());
        assert!(settings.write_termination.is_empty());
    }

    #[test]
    fn test_format_command() {
        let settings = InstrumentSettings {
            cmd_prefix: ":".to_string(),
            write_termination: "\n".to_string(),
            ..Default::default()
        };
        let inst = Instrument::new(Nothing, "none", settings);
        assert_eq!(inst.format_command("READ?"), ":READ?\n");
        assert_eq!(inst.format_command(""), ":\n");
    }

    #[test]
    fn test_write_without_session() {
        let mut inst = Instrument::new(Nothing, "none", InstrumentSettings::default());
        assert!(matches!(
            inst.write("CMD"),
            Err(InstrumentError::NotConnected)
        ));
        assert!(matches!(
            inst.query("CMD?"),
            Err(InstrumentError::NotConnected)
        ));
        assert!(matches!(inst.close(), Err(InstrumentError::NotConnected)));
    }
}
