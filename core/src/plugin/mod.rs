//! The core capability set
//!
//! [`Core`] is everything the host can ask of a loaded core. [`DylibCore`] is
//! the real implementation backed by a shared library; tests drive the same
//! session code with an in-process fake.

pub mod dylib;

pub use dylib::DylibCore;

use std::ffi::c_uint;

use crate::abi::RetroGameInfo;
use crate::host::HostCallbacks;
use crate::video::VideoGeometry;

/// Static description of a core (`retro_get_system_info`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    pub valid_extensions: String,
    /// The core loads content from its path and never wants the bytes
    pub need_fullpath: bool,
    pub block_extract: bool,
}

/// Timing declared for the loaded content
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

/// Audio/video parameters of the loaded content (`retro_get_system_av_info`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemAvInfo {
    pub geometry: VideoGeometry,
    pub timing: SystemTiming,
}

/// Entry points every core exports.
///
/// Calls map one-to-one onto the `retro_*` functions. Implementations must not
/// retain `&mut self` borrows across calls back into the host.
pub trait Core {
    /// ABI version the core was built against
    fn api_version(&self) -> c_uint;

    /// Hand the host's callbacks to the core (`retro_set_*`)
    fn register_host(&mut self, callbacks: &HostCallbacks);

    fn init(&mut self);

    fn deinit(&mut self);

    fn system_info(&self) -> SystemInfo;

    fn system_av_info(&self) -> SystemAvInfo;

    fn set_controller_port_device(&mut self, port: c_uint, device: c_uint);

    fn reset(&mut self);

    /// Run exactly one frame
    fn run(&mut self);

    /// Returns whether the core accepted the content
    fn load_game(&mut self, game: &RetroGameInfo) -> bool;

    fn unload_game(&mut self);

    /// Release the module; no entry point may be called afterwards
    fn unload(self)
    where
        Self: Sized;
}
