//! Keyboard to joypad input bridge
//!
//! The host keeps a snapshot of which physical keys are down ([`KeyboardState`]),
//! updated from window events during the frame pump's event drain. Each poll
//! samples that snapshot through the validated bind table into a fixed
//! [`ButtonStateTable`] that the core reads via its input-state callback.

mod keyboard_mapping;
pub mod keycode;

pub use keyboard_mapping::KeyboardMapping;
pub use keycode::Key;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::ffi::c_uint;

use crate::abi;
use crate::error::HostError;

/// Number of joypad button ids the host tracks (`R3 + 1`).
pub const BUTTON_COUNT: usize = 16;

/// Logical joypad buttons, numbered as `RETRO_DEVICE_ID_JOYPAD_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum JoypadButton {
    B = 0,
    Y = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    A = 8,
    X = 9,
    L = 10,
    R = 11,
    L2 = 12,
    R2 = 13,
    L3 = 14,
    R3 = 15,
}

impl JoypadButton {
    pub const ALL: &'static [JoypadButton] = &[
        JoypadButton::B,
        JoypadButton::Y,
        JoypadButton::Select,
        JoypadButton::Start,
        JoypadButton::Up,
        JoypadButton::Down,
        JoypadButton::Left,
        JoypadButton::Right,
        JoypadButton::A,
        JoypadButton::X,
        JoypadButton::L,
        JoypadButton::R,
        JoypadButton::L2,
        JoypadButton::R2,
        JoypadButton::L3,
        JoypadButton::R3,
    ];

    #[inline]
    pub fn id(self) -> usize {
        self as usize
    }
}

/// Input settings (`[input]` in `config.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Key that ends the session (default: Escape)
    #[serde(default = "default_quit_key")]
    pub quit: Key,
    /// Joypad bindings for port 0
    #[serde(default)]
    pub keyboard: KeyboardMapping,
}

fn default_quit_key() -> Key {
    Key::Escape
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            quit: default_quit_key(),
            keyboard: KeyboardMapping::default(),
        }
    }
}

/// Set of physical keys currently held down
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    pressed: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}

/// Current pressed/released sample, indexed by joypad button id
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStateTable {
    buttons: [bool; BUTTON_COUNT],
}

impl ButtonStateTable {
    /// Stored state for a raw button id; ids outside the table read as released
    pub fn get(&self, id: c_uint) -> bool {
        self.buttons.get(id as usize).copied().unwrap_or(false)
    }

    pub fn is_pressed(&self, button: JoypadButton) -> bool {
        self.buttons[button.id()]
    }
}

/// Maps the keyboard snapshot into the joypad table for port 0
#[derive(Debug, Clone)]
pub struct InputBridge {
    bindings: Vec<(Key, JoypadButton)>,
    quit: Key,
    table: ButtonStateTable,
}

impl InputBridge {
    /// Validate `config` into a bind table.
    pub fn new(config: &InputConfig) -> Result<Self, HostError> {
        let bindings = config.keyboard.bindings(config.quit)?;
        Ok(Self {
            bindings,
            quit: config.quit,
            table: ButtonStateTable::default(),
        })
    }

    /// Resample every button from `keyboard`.
    ///
    /// Returns `true` when the quit key is held.
    pub fn poll(&mut self, keyboard: &KeyboardState) -> bool {
        let mut next = ButtonStateTable::default();
        for &(key, button) in &self.bindings {
            next.buttons[button.id()] = keyboard.is_pressed(key);
        }
        self.table = next;

        keyboard.is_pressed(self.quit)
    }

    /// Answer the core's input-state query.
    ///
    /// Only port 0, index 0 of the joypad device is wired; everything else
    /// reads as 0.
    pub fn state(&self, port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
        if port != 0 || index != 0 || device != abi::device::JOYPAD {
            return 0;
        }
        i16::from(self.table.get(id))
    }

    pub fn table(&self) -> &ButtonStateTable {
        &self.table
    }

    pub fn quit_key(&self) -> Key {
        self.quit
    }
}
