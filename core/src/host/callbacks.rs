//! C callbacks registered with the core
//!
//! Each trampoline looks up the active [`HostContext`](super::HostContext) and
//! forwards to it. With no active host (or a re-entrant call while the host is
//! busy) they answer with a neutral value instead of faulting.

use std::ffi::{CStr, c_char, c_uint, c_void};

use tracing::debug;

use super::with_active;
use crate::abi::{self, AudioSampleBatchFn, AudioSampleFn, EnvironmentFn, InputPollFn};
use crate::abi::{InputStateFn, VideoRefreshFn};

/// The callback set handed to the core through its `retro_set_*` entry points
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks {
    pub environment: EnvironmentFn,
    pub video_refresh: VideoRefreshFn,
    pub input_poll: InputPollFn,
    pub input_state: InputStateFn,
    pub audio_sample: AudioSampleFn,
    pub audio_sample_batch: AudioSampleBatchFn,
}

impl HostCallbacks {
    /// Callbacks that route to the host active on the calling thread
    pub fn trampolines() -> Self {
        Self {
            environment,
            video_refresh,
            input_poll,
            input_state,
            audio_sample,
            audio_sample_batch,
        }
    }
}

pub unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    // SAFETY: the core passes the payload its ABI defines for `cmd`
    with_active(|host| unsafe { super::environment::dispatch(host, cmd, data) }).unwrap_or(false)
}

pub unsafe extern "C" fn video_refresh(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    with_active(|host| {
        let stats = host.stats_mut();
        if data == abi::HW_FRAME_BUFFER_VALID {
            stats.hw_frames += 1;
        } else if data.is_null() {
            stats.duped_frames += 1;
        } else {
            if stats.software_frames == 0 {
                debug!(
                    "ignoring software frame {}x{} (pitch {}); only hardware frames are shown",
                    width, height, pitch
                );
            }
            stats.software_frames += 1;
        }
    });
}

pub unsafe extern "C" fn input_poll() {
    with_active(|host| host.poll_input());
}

pub unsafe extern "C" fn input_state(
    port: c_uint,
    device: c_uint,
    index: c_uint,
    id: c_uint,
) -> i16 {
    with_active(|host| host.input().state(port, device, index, id)).unwrap_or(0)
}

pub unsafe extern "C" fn audio_sample(_left: i16, _right: i16) {
    with_active(|host| host.stats_mut().audio_frames += 1);
}

pub unsafe extern "C" fn audio_sample_batch(_data: *const i16, frames: usize) -> usize {
    with_active(|host| host.stats_mut().audio_frames += frames as u64);
    frames
}

/// `get_current_framebuffer` handed to the core during SET_HW_RENDER
pub unsafe extern "C" fn get_current_framebuffer() -> usize {
    with_active(|host| host.framebuffer().0).unwrap_or(0)
}

/// `get_proc_address` handed to the core during SET_HW_RENDER
pub unsafe extern "C" fn get_proc_address(sym: *const c_char) -> *const c_void {
    if sym.is_null() {
        return std::ptr::null();
    }
    let Some(resolver) = with_active(|host| host.proc_resolver()).flatten() else {
        return std::ptr::null();
    };
    // SAFETY: the core passes a NUL-terminated symbol name
    let name = unsafe { CStr::from_ptr(sym) };
    resolver(name)
}
