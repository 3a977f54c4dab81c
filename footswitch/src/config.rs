//! Command line configuration of the footswitch binary.
//!
//! Every option can also be set through a `FOOTSWITCH_*` environment variable.

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Take a SourceMeter reading at the press of a button.
#[derive(Parser, Debug)]
#[command(name = "footswitch", version, about, long_about = None)]
pub struct Args {
    /// Resource of the instrument, e.g., `ws://wifi-uart.lan:8000` or `192.168.1.10:5025`
    #[arg(short, long, env = "FOOTSWITCH_RESOURCE")]
    pub resource: String,

    /// How to talk to the instrument
    #[arg(short, long, value_enum, env = "FOOTSWITCH_TRANSPORT", default_value_t = TransportKind::Websocket)]
    pub transport: TransportKind,

    /// Baud rate of the serial port
    #[arg(long, env = "FOOTSWITCH_BAUD_RATE", default_value_t = 9600)]
    pub baud_rate: u32,

    /// Number of readings the SourceMeter averages (1 to 100)
    #[arg(long, env = "FOOTSWITCH_AVERAGE_COUNT", default_value_t = 10)]
    pub average_count: u32,

    /// Switch on the SourceMeter's averaging filter
    #[arg(long, env = "FOOTSWITCH_FILTER")]
    pub filter: bool,

    /// Delay after every command in milliseconds, overrides the driver's default
    #[arg(long, env = "FOOTSWITCH_WAIT_MS")]
    pub wait_ms: Option<u64>,

    /// Where button presses come from
    #[arg(short, long, value_enum, env = "FOOTSWITCH_INPUT", default_value_t = InputKind::default())]
    pub input: InputKind,

    /// GPIO character device the buttons are connected to
    #[arg(long, env = "FOOTSWITCH_GPIO_CHIP", default_value = "/dev/gpiochip0")]
    pub gpio_chip: String,

    /// Time between two polls of the buttons in milliseconds
    #[arg(long, env = "FOOTSWITCH_POLL_MS", default_value_t = 10)]
    pub poll_ms: u64,
}

impl Args {
    /// Time between two polls of the buttons.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    /// Delay after every command, if it was set on the command line.
    pub fn wait(&self) -> Option<Duration> {
        self.wait_ms.map(Duration::from_millis)
    }
}

/// Transport to the instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// WebSocket bridge, e.g., a WiFi to UART adapter
    Websocket,
    /// Raw TCP/IP socket
    Tcp,
    /// Local serial port
    #[cfg(feature = "serial")]
    Serial,
}

/// Source of button presses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    /// Buttons of the bonnet, read via GPIO
    #[cfg(feature = "gpio")]
    Gpio,
    /// Keys typed on standard input, one line per poll
    Keyboard,
}

impl Default for InputKind {
    #[cfg(feature = "gpio")]
    fn default() -> Self {
        InputKind::Gpio
    }

    #[cfg(not(feature = "gpio"))]
    fn default() -> Self {
        InputKind::Keyboard
    }
}
