//! Run handlers for button presses.

use std::{collections::HashMap, thread::sleep, time::Duration};

use log::{debug, error, info};

use crate::{Button, ButtonSource, FootswitchError};

/// A handler that is run when its button is pressed.
pub type Handler<'a> = Box<dyn FnMut() -> Result<(), FootswitchError> + 'a>;

/// Dispatches button presses to their handlers.
///
/// At most one handler is registered per button. Presses of buttons without a handler are
/// ignored. If a handler fails, the error is logged and the footswitch keeps running.
pub struct Footswitch<'a> {
    handlers: HashMap<Button, Handler<'a>>,
    poll_interval: Duration,
}

impl Default for Footswitch<'_> {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl<'a> Footswitch<'a> {
    /// Create a new footswitch without any handlers.
    ///
    /// # Arguments
    /// * `poll_interval` - Time to sleep between two polls of the button source.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            poll_interval,
        }
    }

    /// Register the handler for a button, replacing any previous one.
    pub fn on<F>(&mut self, button: Button, handler: F)
    where
        F: FnMut() -> Result<(), FootswitchError> + 'a,
    {
        if self.handlers.insert(button, Box::new(handler)).is_some() {
            debug!("Replaced handler of button {button}");
        }
    }

    /// Run the handler of a button.
    ///
    /// Returns `Ok(false)` if no handler is registered for the button.
    pub fn press(&mut self, button: Button) -> Result<bool, FootswitchError> {
        match self.handlers.get_mut(&button) {
            Some(handler) => {
                debug!("Button {button} pressed");
                handler()?;
                Ok(true)
            }
            None => {
                debug!("Button {button} pressed, no handler registered");
                Ok(false)
            }
        }
    }

    /// Poll the source and dispatch presses until the source is exhausted.
    ///
    /// Handler errors are logged and do not end the loop. An error of the source itself is
    /// returned.
    pub fn run<S: ButtonSource + ?Sized>(&mut self, source: &mut S) -> Result<(), FootswitchError> {
        info!("Waiting for button presses");
        while let Some(presses) = source.poll()? {
            for button in presses {
                if let Err(err) = self.press(button) {
                    error!("Handler of button {button} failed: {err}");
                }
            }
            if !self.poll_interval.is_zero() {
                sleep(self.poll_interval);
            }
        }
        info!("Button source exhausted");
        Ok(())
    }
}
