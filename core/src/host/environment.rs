//! Environment command dispatcher
//!
//! The core negotiates host capabilities by calling the environment callback
//! with a command id and a payload pointer whose shape depends on the id.
//! Unknown ids are an expected outcome: they are logged at debug level and
//! answered with `false`, and the core falls back to its defaults.

use std::ffi::{c_char, c_uint, c_void};

use tracing::{debug, trace};

use super::HostContext;
use super::callbacks;
use super::log;
use crate::abi::{self, RetroHwRenderCallback, RetroLogCallback};
use crate::video::{HwRenderState, PixelFormat};

/// Environment commands the host understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentCommand {
    GetCanDupe,
    GetSystemDirectory,
    SetPixelFormat,
    SetHwRender,
    GetLogInterface,
    GetSaveDirectory,
    Unsupported(c_uint),
}

impl EnvironmentCommand {
    pub fn from_id(id: c_uint) -> Self {
        match id {
            abi::environment::GET_CAN_DUPE => Self::GetCanDupe,
            abi::environment::GET_SYSTEM_DIRECTORY => Self::GetSystemDirectory,
            abi::environment::SET_PIXEL_FORMAT => Self::SetPixelFormat,
            abi::environment::SET_HW_RENDER => Self::SetHwRender,
            abi::environment::GET_LOG_INTERFACE => Self::GetLogInterface,
            abi::environment::GET_SAVE_DIRECTORY => Self::GetSaveDirectory,
            other => Self::Unsupported(other),
        }
    }
}

/// Answer one environment command.
///
/// # Safety
///
/// `data` must be null or point to the payload type the core ABI defines for
/// `cmd`, valid for reads and writes for the duration of the call.
pub unsafe fn dispatch(host: &mut HostContext, cmd: c_uint, data: *mut c_void) -> bool {
    let command = EnvironmentCommand::from_id(cmd);

    if let EnvironmentCommand::Unsupported(id) = command {
        debug!("unhandled environment command #{}", id);
        return false;
    }

    if data.is_null() {
        debug!("environment command {:?} with null payload", command);
        return false;
    }

    // SAFETY: non-null and typed per command by the caller's contract
    unsafe {
        match command {
            EnvironmentCommand::GetLogInterface => {
                let cb = &mut *(data as *mut RetroLogCallback);
                cb.log = Some(log::log_printf());
                true
            }
            EnvironmentCommand::GetCanDupe => {
                *(data as *mut bool) = true;
                true
            }
            EnvironmentCommand::SetPixelFormat => {
                let raw = *(data as *const c_uint);
                set_pixel_format(host, raw)
            }
            EnvironmentCommand::SetHwRender => {
                let hw = &mut *(data as *mut RetroHwRenderCallback);
                set_hw_render(host, hw)
            }
            EnvironmentCommand::GetSystemDirectory => {
                write_directory(data, host.system_dir().map(|dir| dir.as_ptr()))
            }
            EnvironmentCommand::GetSaveDirectory => {
                write_directory(data, host.save_dir().map(|dir| dir.as_ptr()))
            }
            EnvironmentCommand::Unsupported(_) => false,
        }
    }
}

fn set_pixel_format(host: &mut HostContext, raw: c_uint) -> bool {
    let Some(format) = PixelFormat::from_raw(raw) else {
        debug!("core requested unsupported pixel format {}", raw);
        return false;
    };

    let descriptor = format.descriptor();
    trace!("pixel format negotiated: {:?}", descriptor);
    host.set_pixel_format(descriptor);
    true
}

fn set_hw_render(host: &mut HostContext, hw: &mut RetroHwRenderCallback) -> bool {
    hw.get_current_framebuffer = Some(callbacks::get_current_framebuffer);
    hw.get_proc_address = Some(callbacks::get_proc_address);

    let state = HwRenderState::from(&*hw);
    debug!(
        "hardware render requested: context type {} v{}.{} depth={} stencil={}",
        state.context_type, state.version_major, state.version_minor, state.depth, state.stencil
    );
    host.set_hw_render(state);
    true
}

/// # Safety
///
/// `data` must be a valid `const char **` slot.
unsafe fn write_directory(data: *mut c_void, dir: Option<*const c_char>) -> bool {
    match dir {
        Some(ptr) => {
            // SAFETY: caller guarantees the slot
            unsafe { *(data as *mut *const c_char) = ptr };
            true
        }
        None => false,
    }
}
