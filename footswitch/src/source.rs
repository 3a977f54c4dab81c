//! Sources of button presses.

use std::io::BufRead;

use log::{debug, warn};

use crate::{Button, FootswitchError};

/// Something that can be asked which buttons were pressed.
pub trait ButtonSource {
    /// Return the buttons pressed since the last poll.
    ///
    /// An empty vector means nothing happened. `None` means the source is exhausted and no
    /// further presses will ever arrive.
    fn poll(&mut self) -> Result<Option<Vec<Button>>, FootswitchError>;
}

/// Buttons typed on a keyboard, or read from any other line based input.
///
/// Every line is one poll. Each character of the line that names a button (see
/// [`Button::from_key`]) is a press of that button. Reaching the end of the input exhausts the
/// source.
///
/// Reading a line blocks until it is complete.
pub struct KeyboardButtons<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> KeyboardButtons<R> {
    /// Create a new keyboard source from a reader, e.g., `std::io::stdin().lock()`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> ButtonSource for KeyboardButtons<R> {
    fn poll(&mut self) -> Result<Option<Vec<Button>>, FootswitchError> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            debug!("End of keyboard input");
            return Ok(None);
        }

        let mut presses = Vec::new();
        for key in self.line.trim().chars() {
            match Button::from_key(key) {
                Some(button) => presses.push(button),
                None if key.is_whitespace() => {}
                None => warn!("Key {key:?} is not a button"),
            }
        }
        Ok(Some(presses))
    }
}

#[cfg(feature = "gpio")]
pub use gpio::GpioButtons;

#[cfg(feature = "gpio")]
mod gpio {
    use gpiod::{Active, Bias, Chip, Input, Lines, Options};
    use log::info;

    use crate::{Button, ButtonSource, EdgeDetector, FootswitchError};

    /// The buttons of the bonnet, read from the GPIO character device.
    ///
    /// All buttons pull their line to ground when pressed. The lines are requested as active low
    /// inputs with the internal pull-up resistors enabled, so a pressed button reads as `true`.
    pub struct GpioButtons {
        lines: Lines<Input>,
        edges: EdgeDetector,
    }

    impl GpioButtons {
        /// Request the button lines from a GPIO chip, e.g., `/dev/gpiochip0`.
        pub fn open(path: &str) -> Result<Self, FootswitchError> {
            let chip = Chip::new(path)?;
            let pins = Button::ALL.map(|button| button.bcm_pin());
            let lines = chip.request_lines(
                Options::input(pins)
                    .consumer(env!("CARGO_PKG_NAME"))
                    .active(Active::Low)
                    .bias(Bias::PullUp),
            )?;
            info!("Requested button lines {pins:?} from {path}");

            Ok(Self {
                lines,
                edges: EdgeDetector::default(),
            })
        }
    }

    impl ButtonSource for GpioButtons {
        fn poll(&mut self) -> Result<Option<Vec<Button>>, FootswitchError> {
            let levels = self.lines.get_values([false; 7])?;
            Ok(Some(self.edges.update(levels)))
        }
    }
}
