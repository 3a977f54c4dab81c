//! Footswitch: take instrument readings at the press of a button.
//!
//! This crate contains the thin layer between the buttons of a Raspberry Pi bonnet and the
//! instrument drivers: a [`Button`] model, [`ButtonSource`]s that report button presses, and the
//! [`Footswitch`] dispatcher that runs a handler for every press. The `footswitch` binary wires
//! button A to a Keithley 2400 reading.
//!
//! Handlers own whatever they act on. An instrument is moved into the closure that is registered
//! for its button, so there is no shared device handle that several handlers could race for.
//!
//! ```
//! use footswitch::{Button, Footswitch, KeyboardButtons};
//!
//! let mut presses = 0;
//! {
//!     let mut footswitch = Footswitch::default();
//!     footswitch.on(Button::A, || {
//!         presses += 1;
//!         Ok(())
//!     });
//!
//!     // Two presses of A and one of B, which has no handler.
//!     let mut source = KeyboardButtons::new("a\nab\n".as_bytes());
//!     footswitch.run(&mut source).unwrap();
//! }
//! assert_eq!(presses, 2);
//! ```

#![warn(missing_docs)]

mod button;
pub mod config;
mod dispatch;
mod source;

pub use button::{Button, EdgeDetector};
pub use dispatch::{Footswitch, Handler};
#[cfg(feature = "gpio")]
pub use source::GpioButtons;
pub use source::{ButtonSource, KeyboardButtons};

use footswitch_instrument::InstrumentError;
use thiserror::Error;

/// The error enum of the footswitch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FootswitchError {
    /// The instrument failed, see [`InstrumentError`].
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    /// Reading buttons failed, e.g., because the GPIO chip could not be opened.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
