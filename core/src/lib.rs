//! hwretro core - host for hardware-rendered libretro cores
//!
//! This crate loads a libretro core from a shared library, answers its
//! environment requests, negotiates an OpenGL render context for it and runs
//! it frame by frame against a window.
//!
//! # Architecture
//!
//! - [`DylibCore`] - Core module opened with every entry point resolved up front
//! - [`HostContext`] - State the core's callbacks read and write
//! - [`VideoBackend`] - Window, GL context and render target ([`GlfwBackend`])
//! - [`InputBridge`] - Keyboard snapshot to joypad table for port 0
//! - [`CoreSession`] - Lifecycle: init, load, frame pump, ordered shutdown

pub mod abi;
pub mod config;
pub mod content;
pub mod error;
pub mod frame;
pub mod host;
pub mod input;
#[cfg(test)]
mod integration;
pub mod plugin;
pub mod session;
#[cfg(test)]
pub mod test_utils;
pub mod video;

pub use config::Config;
pub use content::GameContent;
pub use error::HostError;
pub use frame::{FramePump, PumpState};
pub use host::{FrameStats, HostCallbacks, HostContext, HostPaths, SharedHost};
pub use input::{InputBridge, InputConfig, JoypadButton, Key, KeyboardMapping};
pub use plugin::{Core, DylibCore, SystemAvInfo, SystemInfo};
pub use session::CoreSession;
pub use video::{BackendError, GlfwBackend, HwRenderState, PixelFormat, VideoBackend};
