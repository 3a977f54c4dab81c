//! The buttons of the footswitch and detection of presses.

use std::fmt::Display;

/// A button of the Raspberry Pi bonnet.
///
/// The bonnet has a joystick with five directions (left, right, up, down, center) and two round
/// buttons A and B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    /// Round button A.
    A,
    /// Round button B.
    B,
    /// Joystick left.
    Left,
    /// Joystick right.
    Right,
    /// Joystick up.
    Up,
    /// Joystick down.
    Down,
    /// Joystick center press.
    Center,
}

impl Button {
    /// All buttons, in the order sources report their levels.
    pub const ALL: [Button; 7] = [
        Button::A,
        Button::B,
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
        Button::Center,
    ];

    /// BCM number of the GPIO line the button is wired to.
    pub fn bcm_pin(&self) -> u32 {
        match self {
            Button::A => 5,
            Button::B => 6,
            Button::Left => 27,
            Button::Right => 23,
            Button::Up => 17,
            Button::Down => 22,
            Button::Center => 4,
        }
    }

    /// Get the button for a key of the keyboard, e.g., `'a'` for [`Button::A`].
    ///
    /// Keys are case insensitive. Returns `None` for keys that do not name a button.
    pub fn from_key(key: char) -> Option<Button> {
        match key.to_ascii_lowercase() {
            'a' => Some(Button::A),
            'b' => Some(Button::B),
            'l' => Some(Button::Left),
            'r' => Some(Button::Right),
            'u' => Some(Button::Up),
            'd' => Some(Button::Down),
            'c' => Some(Button::Center),
            _ => None,
        }
    }
}

impl Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Button::A => "A",
            Button::B => "B",
            Button::Left => "L",
            Button::Right => "R",
            Button::Up => "U",
            Button::Down => "D",
            Button::Center => "C",
        };
        write!(f, "{name}")
    }
}

/// Turns sampled button levels into presses.
///
/// A press is reported once, when a button changes from released to pressed between two
/// samples. Holding a button does not repeat the press. Contact bounce is not filtered.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    pressed: [bool; 7],
}

impl EdgeDetector {
    /// Feed a new sample and return the buttons that were pressed since the last one.
    ///
    /// # Arguments
    /// * `levels` - `true` for every button that is held down, in the order of [`Button::ALL`].
    pub fn update(&mut self, levels: [bool; 7]) -> Vec<Button> {
        let presses = Button::ALL
            .iter()
            .zip(self.pressed.iter().zip(levels.iter()))
            .filter(|(_, (was, is))| !**was && **is)
            .map(|(button, _)| *button)
            .collect();
        self.pressed = levels;
        presses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pins_unique() {
        let mut pins: Vec<u32> = Button::ALL.iter().map(Button::bcm_pin).collect();
        pins.sort_unstable();
        pins.dedup();
        assert_eq!(pins.len(), Button::ALL.len());
    }

    #[test]
    fn test_from_key() {
        assert_eq!(Button::from_key('a'), Some(Button::A));
        assert_eq!(Button::from_key('B'), Some(Button::B));
        assert_eq!(Button::from_key('c'), Some(Button::Center));
        assert_eq!(Button::from_key('x'), None);
        for button in Button::ALL {
            let key = button.to_string().chars().next().unwrap();
            assert_eq!(Button::from_key(key), Some(button));
        }
    }

    #[test]
    fn test_edge_detector() {
        let mut edges = EdgeDetector::default();
        let a = [true, false, false, false, false, false, false];
        let ab = [true, true, false, false, false, false, false];
        let none = [false; 7];

        assert_eq!(edges.update(a), vec![Button::A]);
        // Holding A does not repeat the press.
        assert_eq!(edges.update(ab), vec![Button::B]);
        assert!(edges.update(ab).is_empty());
        assert!(edges.update(none).is_empty());
        assert_eq!(edges.update(a), vec![Button::A]);
    }
}
