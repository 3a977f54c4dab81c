//! A rust driver for the Keithley 2400 SourceMeter.
//!
//! The driver prepares the SourceMeter for single readings and then takes one reading per
//! [`Instrument::action`] call. Every call opens its own connection, triggers the reading,
//! hands the front panel back to the user (`SYST:LOC`) and disconnects again, so that the
//! instrument can be operated manually between two readings and a dropped connection only
//! costs the reading that was in flight.
//!
//! # Example
//!
//! This example shows the usage via a WebSocket serial bridge.
//! ```no_run
//! use keithley_2400::{Keithley2400, Reading};
//!
//! let mut inst = Keithley2400::websocket("ws://wifi-uart.lan:8000");
//!
//! // Configure averaging, ranging, and triggering once.
//! inst.setup().unwrap();
//!
//! // Take a reading and print the raw response of the instrument.
//! let line = inst.action().unwrap();
//! println!("{line}");
//!
//! // The default response can also be parsed.
//! let reading: Reading = line.parse().unwrap();
//! println!("{} V", reading.voltage().as_volts());
//! ```

#![deny(warnings, missing_docs)]

mod reading;

pub use reading::Reading;

use std::time::Duration;

use footswitch_instrument::{Driver, Instrument, InstrumentError, InstrumentSettings, Transport};

#[cfg(feature = "websocket")]
use footswitch_instrument::WebSocketTransport;

use log::debug;

/// Number of readings the SourceMeter averages over by default.
pub const DEFAULT_AVERAGE_COUNT: u32 = 10;

/// Smallest and largest filter count the SourceMeter accepts.
const AVERAGE_COUNT_RANGE: (u32, u32) = (1, 100);

/// A rust driver for the Keithley 2400.
///
/// The driver is generic over the [`Transport`] that carries the commands. By default, the
/// instrument is reached through a WebSocket, see [`Keithley2400::websocket`]. Any other
/// transport can be used with [`Keithley2400::with_transport`].
///
/// The driver itself is only used through the [`Instrument`] that the constructors return.
#[derive(Debug)]
pub struct Keithley2400<T: Transport> {
    transport: T,
    average_count: u32,
    filter_enabled: bool,
}

#[cfg(feature = "websocket")]
impl Keithley2400<WebSocketTransport> {
    /// Create a Keithley 2400 instrument reached through a WebSocket.
    ///
    /// No connection is made until the instrument is used.
    ///
    /// # Arguments
    /// * `resource` - WebSocket URI of the instrument, e.g., `"ws://192.168.1.10:8000"`.
    pub fn websocket(resource: &str) -> Instrument<Self> {
        Self::with_transport(WebSocketTransport::new(), resource)
    }
}

impl<T: Transport> Keithley2400<T> {
    /// Create a Keithley 2400 instrument on the given transport.
    ///
    /// The instrument is a single channel instrument, commands are prefixed with `:` and
    /// terminated with `"\n"`, and after each command the driver waits 0.3 s to give the
    /// SourceMeter time to process it.
    ///
    /// # Arguments
    /// * `transport` - A transport that implements the [`Transport`] trait.
    /// * `resource` - Resource locator that the transport understands.
    pub fn with_transport(transport: T, resource: &str) -> Instrument<Self> {
        let driver = Keithley2400 {
            transport,
            average_count: DEFAULT_AVERAGE_COUNT,
            filter_enabled: false,
        };
        let settings = InstrumentSettings {
            channel: 1,
            wait: Some(Duration::from_millis(300)),
            cmd_prefix: ":".to_string(),
            read_termination: "\n".to_string(),
            write_termination: "\n".to_string(),
        };
        Instrument::new(driver, resource, settings)
    }

    /// Get the number of readings the SourceMeter averages over.
    pub fn average_count(&self) -> u32 {
        self.average_count
    }

    /// Set the number of readings the SourceMeter averages over.
    ///
    /// The value is sent to the instrument on the next setup.
    ///
    /// # Arguments
    /// * `count` - Number of readings, between 1 and 100.
    pub fn set_average_count(&mut self, count: u32) -> Result<(), InstrumentError> {
        let (min, max) = AVERAGE_COUNT_RANGE;
        if !(min..=max).contains(&count) {
            return Err(InstrumentError::IntValueOutOfRange {
                value: count.into(),
                min: min.into(),
                max: max.into(),
            });
        }
        self.average_count = count;
        Ok(())
    }

    /// Return `true` if the averaging filter is switched on during setup.
    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    /// Switch the averaging filter on or off during the next setup.
    ///
    /// The filter is off by default and can then still be switched on at the front panel.
    pub fn set_filter_enabled(&mut self, enabled: bool) {
        self.filter_enabled = enabled;
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The commands sent by setup, in order.
    pub fn setup_commands(&self) -> Vec<String> {
        let filter = if self.filter_enabled { "ON" } else { "OFF" };
        vec![
            // High accuracy for all measurements, not just voltage.
            "SENS:VOLT:NPLC 10".to_string(),
            // Output goes idle after each measurement.
            "SOUR:CLE:AUTO ON".to_string(),
            "ARM:COUN 1".to_string(),
            "ARM:SOUR IMM".to_string(),
            "TRIG:COUN 1".to_string(),
            "TRIG:SOUR IMM".to_string(),
            "SENS:AVER:TCON REP".to_string(),
            format!("SENS:AVER:COUNT {}", self.average_count),
            format!("SENS:AVER {filter}"),
            "SENS:CURR:RANG:AUTO ON".to_string(),
            "SENS:VOLT:RANG:AUTO ON".to_string(),
            // Settle time between enabling the source and measuring.
            "SOUR:DEL 0.25".to_string(),
            // Back to front panel operation.
            "SYST:LOC".to_string(),
        ]
    }
}

impl<T: Transport> Driver for Keithley2400<T> {
    type Session = T::Session;

    fn open(&mut self, resource: &str) -> Result<Self::Session, InstrumentError> {
        self.transport.open(resource)
    }

    fn close(&mut self, session: Self::Session) -> Result<(), InstrumentError> {
        self.transport.close(session)
    }

    fn write(&mut self, session: &mut Self::Session, cmd: &str) -> Result<usize, InstrumentError> {
        self.transport.write(session, cmd)
    }

    fn query(&mut self, session: &mut Self::Session, cmd: &str) -> Result<String, InstrumentError> {
        self.transport.query(session, cmd)
    }

    fn set_read_terminator(&mut self, terminator: &str) {
        self.transport.set_read_terminator(terminator);
    }

    fn setup(inst: &mut Instrument<Self>) -> Result<(), InstrumentError> {
        let commands = inst.driver().setup_commands();
        debug!(
            "Setting up Keithley 2400, averaging over {} readings",
            inst.driver().average_count()
        );
        inst.with_session(|inst| {
            for cmd in &commands {
                inst.write(cmd)?;
            }
            Ok(())
        })
    }

    fn action(inst: &mut Instrument<Self>) -> Result<String, InstrumentError> {
        inst.with_session(|inst| {
            let result = inst.query("READ?")?;
            inst.write("SYST:LOC")?;
            Ok(result)
        })
    }
}
