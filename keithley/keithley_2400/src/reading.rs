//! Parsing of the SourceMeter's `READ?` response.

use std::{fmt::Display, str::FromStr};

use footswitch_instrument::InstrumentError;
use measurements::{Current, Resistance, Voltage};

/// Value the SourceMeter reports for quantities that were not measured.
const NOT_A_NUMBER: f64 = 9.91e37;

/// One reading of the Keithley 2400.
///
/// With the default data elements, the instrument answers `READ?` with five comma separated
/// values: voltage, current, resistance, timestamp, and status word. Resistance is only measured
/// in ohms mode, otherwise the instrument reports its not-a-number value and
/// [`Reading::resistance`] returns `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    voltage: Voltage,
    current: Current,
    resistance: Option<Resistance>,
    timestamp: f64,
    status: u32,
}

impl Reading {
    /// Measured voltage.
    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    /// Measured current.
    pub fn current(&self) -> Current {
        self.current
    }

    /// Measured resistance, if any.
    pub fn resistance(&self) -> Option<Resistance> {
        self.resistance
    }

    /// Seconds since the instrument's timer was reset.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Status word, see the SourceMeter manual for the meaning of the bits.
    pub fn status(&self) -> u32 {
        self.status
    }
}

impl FromStr for Reading {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || InstrumentError::ResponseParseError(s.to_string());

        let values = s
            .trim()
            .split(',')
            .map(|val| val.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| parse_err())?;

        let &[voltage, current, resistance, timestamp, status] = values.as_slice() else {
            return Err(parse_err());
        };
        if !status.is_finite()
            || status.fract() != 0.0
            || status < 0.0
            || status > f64::from(u32::MAX)
        {
            return Err(parse_err());
        }

        Ok(Reading {
            voltage: Voltage::from_volts(voltage),
            current: Current::from_amperes(current),
            resistance: (resistance < NOT_A_NUMBER).then(|| Resistance::from_ohms(resistance)),
            timestamp,
            status: status as u32,
        })
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:e} V, {:e} A",
            self.voltage.as_volts(),
            self.current.as_amperes()
        )?;
        if let Some(resistance) = self.resistance {
            write!(f, ", {:e} Ohm", resistance.as_ohms())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_whitespace() {
        let reading: Reading = " +1.0E+00 , +2.0E-03 , +9.91E+37 , +3.0E+00 , +4.0E+00 \n"
            .parse()
            .unwrap();
        assert_eq!(reading.voltage().as_volts(), 1.0);
        assert_eq!(reading.current().as_amperes(), 2.0e-3);
        assert_eq!(reading.resistance(), None);
        assert_eq!(reading.status(), 4);
    }

    #[test]
    fn test_display() {
        let reading: Reading = "+1.0E+00,+2.0E-03,+5.0E+02,+3.0E+00,+4.0E+00".parse().unwrap();
        assert_eq!(format!("{reading}"), "1e0 V, 2e-3 A, 5e2 Ohm");
    }
}
