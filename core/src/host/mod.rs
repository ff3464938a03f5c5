//! Host state shared with the loaded core
//!
//! The core talks back to the host through plain C function pointers that carry
//! no user data. [`HostContext`] owns everything those callbacks read or write,
//! and the callbacks reach it through a per-thread "active host" slot that the
//! session installs with [`activate`] for as long as the core is loaded.
//!
//! Borrow discipline: the host context is only borrowed for the duration of a
//! single callback or host-side step. Nothing calls into the core while holding
//! a borrow, so a core that calls back from inside any entry point always finds
//! the context available.

pub mod callbacks;
pub mod environment;
pub mod log;

pub use callbacks::HostCallbacks;
pub use environment::EnvironmentCommand;

use std::cell::RefCell;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::HostError;
use crate::input::{InputBridge, Key, KeyboardState};
use crate::video::{FramebufferHandle, HwRenderState, PixelFormatDescriptor, ProcResolver};

pub type SharedHost = Rc<RefCell<HostContext>>;

/// Directories reported to the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub system_dir: PathBuf,
    pub save_dir: PathBuf,
}

/// Frame and audio counters collected from the core's callbacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames rendered through the hardware context
    pub hw_frames: u64,
    /// Frames the core reported as unchanged
    pub duped_frames: u64,
    /// Software framebuffers, which this host does not display
    pub software_frames: u64,
    /// Audio frames accepted and discarded
    pub audio_frames: u64,
}

/// Negotiation, input and lifecycle state for one loaded core
pub struct HostContext {
    pixel_format: Option<PixelFormatDescriptor>,
    hw_render: HwRenderState,
    hw_render_requested: bool,
    framebuffer: FramebufferHandle,
    proc_resolver: Option<ProcResolver>,
    input: InputBridge,
    keyboard: KeyboardState,
    running: bool,
    pending_fatal: Option<String>,
    stats: FrameStats,
    system_dir: Option<CString>,
    save_dir: Option<CString>,
}

fn path_to_cstring(path: &Path) -> Option<CString> {
    CString::new(path.to_string_lossy().into_owned()).ok()
}

impl HostContext {
    pub fn new(input: InputBridge, paths: &HostPaths) -> Self {
        Self {
            pixel_format: None,
            hw_render: HwRenderState::default(),
            hw_render_requested: false,
            framebuffer: FramebufferHandle::default(),
            proc_resolver: None,
            input,
            keyboard: KeyboardState::new(),
            running: true,
            pending_fatal: None,
            stats: FrameStats::default(),
            system_dir: path_to_cstring(&paths.system_dir),
            save_dir: path_to_cstring(&paths.save_dir),
        }
    }

    pub fn into_shared(self) -> SharedHost {
        Rc::new(RefCell::new(self))
    }

    // -------------------------------------------------------------------------
    // Negotiated video state
    // -------------------------------------------------------------------------

    /// Pixel format set by the core, if any
    pub fn pixel_format(&self) -> Option<PixelFormatDescriptor> {
        self.pixel_format
    }

    pub fn set_pixel_format(&mut self, descriptor: PixelFormatDescriptor) {
        self.pixel_format = Some(descriptor);
    }

    pub fn hw_render(&self) -> &HwRenderState {
        &self.hw_render
    }

    /// Whether the core sent SET_HW_RENDER
    pub fn hw_render_requested(&self) -> bool {
        self.hw_render_requested
    }

    pub fn set_hw_render(&mut self, hw: HwRenderState) {
        self.hw_render = hw;
        self.hw_render_requested = true;
    }

    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    pub fn set_framebuffer(&mut self, handle: FramebufferHandle) {
        self.framebuffer = handle;
    }

    pub fn proc_resolver(&self) -> Option<ProcResolver> {
        self.proc_resolver.clone()
    }

    pub fn set_proc_resolver(&mut self, resolver: ProcResolver) {
        self.proc_resolver = Some(resolver);
    }

    pub(crate) fn system_dir(&self) -> Option<&CString> {
        self.system_dir.as_ref()
    }

    pub(crate) fn save_dir(&self) -> Option<&CString> {
        self.save_dir.as_ref()
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    pub fn input(&self) -> &InputBridge {
        &self.input
    }

    /// Record a key press or release from the window
    pub fn set_key(&mut self, key: Key, pressed: bool) {
        self.keyboard.set(key, pressed);
    }

    /// Resample the joypad table; the quit key stops the session
    pub fn poll_input(&mut self) {
        if self.input.poll(&self.keyboard) {
            tracing::info!("quit key {} pressed", self.input.quit_key());
            self.running = false;
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_stop(&mut self) {
        self.running = false;
    }

    /// Remember an error the core reported; the session surfaces it after the
    /// current core call returns.
    pub fn record_fatal(&mut self, message: String) {
        if self.pending_fatal.is_none() {
            self.pending_fatal = Some(message);
        }
        self.running = false;
    }

    pub fn take_fatal(&mut self) -> Result<(), HostError> {
        match self.pending_fatal.take() {
            Some(message) => Err(HostError::CoreFatal { message }),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut FrameStats {
        &mut self.stats
    }
}

// =============================================================================
// Active host slot
// =============================================================================

thread_local! {
    static ACTIVE_HOST: RefCell<Option<SharedHost>> = const { RefCell::new(None) };
}

/// Keeps a host installed as the target of core callbacks on this thread.
///
/// Dropping the guard restores whatever host was active before.
#[must_use = "the host is only active while the guard is alive"]
pub struct ActiveHostGuard {
    previous: Option<SharedHost>,
}

/// Route core callbacks on this thread to `host`
pub fn activate(host: &SharedHost) -> ActiveHostGuard {
    let previous = ACTIVE_HOST.with(|slot| slot.borrow_mut().replace(Rc::clone(host)));
    ActiveHostGuard { previous }
}

impl Drop for ActiveHostGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE_HOST.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `f` against the active host.
///
/// Returns `None` when no host is active or the context is already borrowed.
pub(crate) fn with_active<R>(f: impl FnOnce(&mut HostContext) -> R) -> Option<R> {
    let host = ACTIVE_HOST.with(|slot| slot.borrow().clone())?;
    let mut ctx = match host.try_borrow_mut() {
        Ok(ctx) => ctx,
        Err(_) => {
            tracing::warn!("core callback re-entered the host while it was busy");
            return None;
        }
    };
    Some(f(&mut ctx))
}
