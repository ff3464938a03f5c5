//! Retro core ABI definitions
//!
//! `#[repr(C)]` mirrors of the structs, callback signatures and numeric ids a
//! loaded core exchanges with its host. Only the subset this host speaks is
//! defined here.
//!
//! Enumerations that travel across the boundary (`retro_pixel_format`,
//! `retro_hw_context_type`, log levels) are kept as raw `c_uint` values: a core
//! may hand us any integer and we must not materialize an invalid Rust enum.

use std::ffi::{c_char, c_uint, c_void};

/// ABI version implemented by this host (`RETRO_API_VERSION`).
pub const API_VERSION: c_uint = 1;

/// Environment command ids (`RETRO_ENVIRONMENT_*`).
pub mod environment {
    use std::ffi::c_uint;

    pub const GET_CAN_DUPE: c_uint = 3;
    pub const GET_SYSTEM_DIRECTORY: c_uint = 9;
    pub const SET_PIXEL_FORMAT: c_uint = 10;
    pub const SET_HW_RENDER: c_uint = 14;
    pub const GET_LOG_INTERFACE: c_uint = 27;
    pub const GET_SAVE_DIRECTORY: c_uint = 31;
}

/// Input device classes (`RETRO_DEVICE_*`).
pub mod device {
    use std::ffi::c_uint;

    pub const NONE: c_uint = 0;
    pub const JOYPAD: c_uint = 1;
}

/// Pixel format ids (`RETRO_PIXEL_FORMAT_*`).
pub mod pixel_format {
    use std::ffi::c_uint;

    pub const XRGB1555: c_uint = 0;
    pub const XRGB8888: c_uint = 1;
    pub const RGB565: c_uint = 2;
}

/// Hardware context types (`RETRO_HW_CONTEXT_*`).
pub mod hw_context {
    use std::ffi::c_uint;

    pub const NONE: c_uint = 0;
    pub const OPENGL: c_uint = 1;
    pub const OPENGLES2: c_uint = 2;
    pub const OPENGL_CORE: c_uint = 3;
    pub const OPENGLES3: c_uint = 4;
    pub const OPENGLES_VERSION: c_uint = 5;
    pub const VULKAN: c_uint = 6;
}

/// Log levels (`RETRO_LOG_*`).
pub mod log_level {
    use std::ffi::c_uint;

    pub const DEBUG: c_uint = 0;
    pub const INFO: c_uint = 1;
    pub const WARN: c_uint = 2;
    pub const ERROR: c_uint = 3;
}

/// Data pointer passed to video refresh when the frame was rendered through
/// the hardware context (`RETRO_HW_FRAME_BUFFER_VALID`).
pub const HW_FRAME_BUFFER_VALID: *const c_void = usize::MAX as *const c_void;

// ---------------------------------------------------------------------------
// Host callbacks (registered through the core's retro_set_* entry points)
// ---------------------------------------------------------------------------

pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type InputPollFn = unsafe extern "C" fn();
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;

/// `retro_log_printf_t`. Variadic on the core side.
pub type LogPrintfFn = unsafe extern "C" fn(level: c_uint, fmt: *const c_char, ...);

// ---------------------------------------------------------------------------
// Hardware render callbacks
// ---------------------------------------------------------------------------

pub type HwContextResetFn = unsafe extern "C" fn();
pub type HwGetCurrentFramebufferFn = unsafe extern "C" fn() -> usize;
pub type HwGetProcAddressFn = unsafe extern "C" fn(sym: *const c_char) -> *const c_void;

// ---------------------------------------------------------------------------
// Core entry points
// ---------------------------------------------------------------------------

pub type InitFn = unsafe extern "C" fn();
pub type DeinitFn = unsafe extern "C" fn();
pub type ApiVersionFn = unsafe extern "C" fn() -> c_uint;
pub type GetSystemInfoFn = unsafe extern "C" fn(info: *mut RetroSystemInfo);
pub type GetSystemAvInfoFn = unsafe extern "C" fn(info: *mut RetroSystemAvInfo);
pub type SetControllerPortDeviceFn = unsafe extern "C" fn(port: c_uint, device: c_uint);
pub type ResetFn = unsafe extern "C" fn();
pub type RunFn = unsafe extern "C" fn();
pub type LoadGameFn = unsafe extern "C" fn(game: *const RetroGameInfo) -> bool;
pub type UnloadGameFn = unsafe extern "C" fn();

pub type SetEnvironmentFn = unsafe extern "C" fn(cb: EnvironmentFn);
pub type SetVideoRefreshFn = unsafe extern "C" fn(cb: VideoRefreshFn);
pub type SetInputPollFn = unsafe extern "C" fn(cb: InputPollFn);
pub type SetInputStateFn = unsafe extern "C" fn(cb: InputStateFn);
pub type SetAudioSampleFn = unsafe extern "C" fn(cb: AudioSampleFn);
pub type SetAudioSampleBatchFn = unsafe extern "C" fn(cb: AudioSampleBatchFn);

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// `struct retro_system_info`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroSystemInfo {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl Default for RetroSystemInfo {
    fn default() -> Self {
        Self {
            library_name: std::ptr::null(),
            library_version: std::ptr::null(),
            valid_extensions: std::ptr::null(),
            need_fullpath: false,
            block_extract: false,
        }
    }
}

/// `struct retro_game_geometry`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RetroGameGeometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

/// `struct retro_system_timing`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RetroSystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

/// `struct retro_system_av_info`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RetroSystemAvInfo {
    pub geometry: RetroGameGeometry,
    pub timing: RetroSystemTiming,
}

/// `struct retro_game_info`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroGameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

/// `struct retro_log_callback`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RetroLogCallback {
    pub log: Option<LogPrintfFn>,
}

/// `struct retro_hw_render_callback`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroHwRenderCallback {
    pub context_type: c_uint,
    pub context_reset: Option<HwContextResetFn>,
    pub get_current_framebuffer: Option<HwGetCurrentFramebufferFn>,
    pub get_proc_address: Option<HwGetProcAddressFn>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub cache_context: bool,
    pub context_destroy: Option<HwContextResetFn>,
    pub debug_context: bool,
}

impl Default for RetroHwRenderCallback {
    fn default() -> Self {
        Self {
            context_type: hw_context::NONE,
            context_reset: None,
            get_current_framebuffer: None,
            get_proc_address: None,
            depth: false,
            stencil: false,
            bottom_left_origin: false,
            version_major: 0,
            version_minor: 0,
            cache_context: false,
            context_destroy: None,
            debug_context: false,
        }
    }
}
