//! Keyboard to joypad mapping

use serde::{Deserialize, Serialize};

use super::JoypadButton;
use super::keycode::Key;
use crate::error::HostError;

/// One optional physical key per joypad button.
///
/// Buttons left unbound always read as released. Every field has a serde
/// default, so a partial `[input.keyboard]` table only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l3: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r3: Option<Key>,
}

impl Default for KeyboardMapping {
    fn default() -> Self {
        Self {
            // Face buttons on the left hand
            a: Some(Key::X),
            b: Some(Key::Z),
            y: Some(Key::A),
            x: Some(Key::S),

            up: Some(Key::ArrowUp),
            down: Some(Key::ArrowDown),
            left: Some(Key::ArrowLeft),
            right: Some(Key::ArrowRight),

            start: Some(Key::Enter),
            select: Some(Key::Backspace),

            l: Some(Key::Q),
            r: Some(Key::W),

            l2: None,
            r2: None,
            l3: None,
            r3: None,
        }
    }
}

impl KeyboardMapping {
    /// The key bound to `button`, if any
    pub fn key_for(&self, button: JoypadButton) -> Option<Key> {
        match button {
            JoypadButton::B => self.b,
            JoypadButton::Y => self.y,
            JoypadButton::Select => self.select,
            JoypadButton::Start => self.start,
            JoypadButton::Up => self.up,
            JoypadButton::Down => self.down,
            JoypadButton::Left => self.left,
            JoypadButton::Right => self.right,
            JoypadButton::A => self.a,
            JoypadButton::X => self.x,
            JoypadButton::L => self.l,
            JoypadButton::R => self.r,
            JoypadButton::L2 => self.l2,
            JoypadButton::R2 => self.r2,
            JoypadButton::L3 => self.l3,
            JoypadButton::R3 => self.r3,
        }
    }

    /// Resolve the mapping into an explicit bind table.
    ///
    /// Rejects a key bound to more than one button and a quit key that is also
    /// bound to a button.
    pub fn bindings(&self, quit: Key) -> Result<Vec<(Key, JoypadButton)>, HostError> {
        let mut table: Vec<(Key, JoypadButton)> = Vec::with_capacity(JoypadButton::ALL.len());

        for &button in JoypadButton::ALL {
            let Some(key) = self.key_for(button) else {
                continue;
            };

            if key == quit {
                return Err(HostError::InvalidBinding(format!(
                    "{} is the quit key and cannot also be bound to {:?}",
                    key, button
                )));
            }

            if let Some((_, other)) = table.iter().find(|(bound, _)| *bound == key) {
                return Err(HostError::InvalidBinding(format!(
                    "{} is bound to both {:?} and {:?}",
                    key, other, button
                )));
            }

            table.push((key, button));
        }

        Ok(table)
    }
}
