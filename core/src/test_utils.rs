//! Test utilities for the core host
//!
//! Provides an in-process [`FakeCore`] that behaves like a hardware-rendered
//! core (it negotiates through the real environment callback, polls input and
//! reports frames) and a [`FakeBackend`] that records what the host asked of
//! the window system.
//!
//! Core activity is recorded per thread, so it survives the core being
//! consumed by `unload` and parallel tests never see each other's calls.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, c_uint, c_void};
use std::path::PathBuf;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::abi::{self, HwGetCurrentFramebufferFn, LogPrintfFn, RetroGameInfo};
use crate::abi::{RetroHwRenderCallback, RetroLogCallback};
use crate::host::{HostCallbacks, HostContext, HostPaths};
use crate::input::{InputBridge, InputConfig};
use crate::plugin::{Core, SystemAvInfo, SystemInfo, SystemTiming};
use crate::video::{
    BackendError, ContextApi, ContextRequest, DepthStencil, FramebufferHandle, HostEvent,
    HostEvents, Orientation, ProcResolver, VideoBackend, VideoGeometry,
};

/// Host with default bindings and fixed directories
pub fn test_host() -> HostContext {
    let input = InputBridge::new(&InputConfig::default()).unwrap();
    HostContext::new(
        input,
        &HostPaths {
            system_dir: PathBuf::from("/tmp/system"),
            save_dir: PathBuf::from("/tmp/saves"),
        },
    )
}

// ============================================================================
// Recorded core activity
// ============================================================================

/// Something the fake core did or had done to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCall {
    RegisterHost,
    Init,
    Deinit,
    SystemInfo,
    SystemAvInfo,
    SetControllerPortDevice(c_uint, c_uint),
    Reset,
    Run,
    LoadGame {
        path: String,
        data: Option<Vec<u8>>,
        size: usize,
    },
    UnloadGame,
    Unload,
    /// The host invoked the core's context-reset callback
    ContextReset { framebuffer: usize },
    /// The host invoked the core's context-destroy callback
    ContextDestroy,
}

thread_local! {
    static CALLS: RefCell<Vec<CoreCall>> = const { RefCell::new(Vec::new()) };
    static RENDER_TARGET_BOUND: Cell<bool> = const { Cell::new(false) };
    static FRAMEBUFFER_ACCESSOR: Cell<Option<HwGetCurrentFramebufferFn>> = const { Cell::new(None) };
}

fn record(call: CoreCall) {
    CALLS.with(|calls| calls.borrow_mut().push(call));
}

/// Everything recorded on this thread so far
pub fn recorded_calls() -> Vec<CoreCall> {
    CALLS.with(|calls| calls.borrow().clone())
}

/// Position of the first recorded call matching `pred`
pub fn call_index(pred: impl Fn(&CoreCall) -> bool) -> Option<usize> {
    recorded_calls().iter().position(pred)
}

unsafe extern "C" fn fake_context_reset() {
    // Real cores fetch their framebuffer name as soon as the context is reset
    let framebuffer = FRAMEBUFFER_ACCESSOR
        .with(Cell::get)
        .map_or(0, |accessor| unsafe { accessor() });
    record(CoreCall::ContextReset { framebuffer });
}

unsafe extern "C" fn fake_context_destroy() {
    record(CoreCall::ContextDestroy);
}

// ============================================================================
// FakeCore
// ============================================================================

/// In-process stand-in for a dynamically loaded core
pub struct FakeCore {
    pub info: SystemInfo,
    pub av_info: SystemAvInfo,
    /// Result of `load_game`
    pub accept_game: bool,
    /// Raw pixel format sent with SET_PIXEL_FORMAT during `load_game`
    pub pixel_format: Option<c_uint>,
    /// Descriptor sent with SET_HW_RENDER during `load_game`
    pub hw_render: Option<RetroHwRenderCallback>,
    /// Log an error from inside `init`
    pub error_on_init: bool,
    /// Log an error during this (0-based) frame
    pub error_on_frame: Option<u64>,
    /// Reply to the last SET_PIXEL_FORMAT
    pub pixel_format_accepted: Option<bool>,
    pub(crate) callbacks: Option<HostCallbacks>,
    pub(crate) logger: Option<LogPrintfFn>,
    pub(crate) runs: u64,
    pub(crate) bound_during_run: Vec<bool>,
    pub(crate) input_seen: Vec<(c_uint, i16)>,
}

impl Default for FakeCore {
    fn default() -> Self {
        Self {
            info: SystemInfo {
                library_name: "FakeCore".into(),
                library_version: "1.2.3".into(),
                valid_extensions: "bin".into(),
                need_fullpath: false,
                block_extract: false,
            },
            av_info: SystemAvInfo {
                geometry: VideoGeometry {
                    base_width: 320,
                    base_height: 240,
                    max_width: 640,
                    max_height: 480,
                    aspect_ratio: 4.0 / 3.0,
                },
                timing: SystemTiming {
                    fps: 60.0,
                    sample_rate: 48_000.0,
                },
            },
            accept_game: true,
            pixel_format: None,
            hw_render: None,
            error_on_init: false,
            error_on_frame: None,
            pixel_format_accepted: None,
            callbacks: None,
            logger: None,
            runs: 0,
            bound_during_run: Vec::new(),
            input_seen: Vec::new(),
        }
    }
}

impl FakeCore {
    /// A core requesting an OpenGL core-profile context with depth, with
    /// reset/destroy callbacks that record themselves
    pub fn hardware_rendered() -> Self {
        Self {
            pixel_format: Some(abi::pixel_format::XRGB8888),
            hw_render: Some(RetroHwRenderCallback {
                context_type: abi::hw_context::OPENGL_CORE,
                context_reset: Some(fake_context_reset),
                context_destroy: Some(fake_context_destroy),
                depth: true,
                stencil: false,
                version_major: 3,
                version_minor: 3,
                ..RetroHwRenderCallback::default()
            }),
            ..Self::default()
        }
    }

    pub fn run_count(&self) -> u64 {
        self.runs
    }

    /// Whether the render target was bound during each `run`
    pub fn bound_during_run(&self) -> Vec<bool> {
        self.bound_during_run.clone()
    }

    /// Pressed (id, value) pairs the core read during its last frame
    pub fn input_seen(&self) -> Vec<(c_uint, i16)> {
        self.input_seen.clone()
    }

    fn log_error(&self, message: &CStr) {
        if let Some(log) = self.logger {
            unsafe { log(abi::log_level::ERROR, message.as_ptr()) };
        }
    }

    fn environment(&self, cmd: c_uint, data: *mut c_void) -> bool {
        match &self.callbacks {
            Some(cb) => unsafe { (cb.environment)(cmd, data) },
            None => false,
        }
    }
}

impl Core for FakeCore {
    fn api_version(&self) -> c_uint {
        abi::API_VERSION
    }

    fn register_host(&mut self, callbacks: &HostCallbacks) {
        record(CoreCall::RegisterHost);
        self.callbacks = Some(*callbacks);
    }

    fn init(&mut self) {
        record(CoreCall::Init);

        let mut log = RetroLogCallback { log: None };
        if self.environment(
            abi::environment::GET_LOG_INTERFACE,
            &mut log as *mut RetroLogCallback as *mut c_void,
        ) {
            self.logger = log.log;
        }

        if self.error_on_init {
            self.log_error(c"fake core has no BIOS");
        }
    }

    fn deinit(&mut self) {
        record(CoreCall::Deinit);
    }

    fn system_info(&self) -> SystemInfo {
        record(CoreCall::SystemInfo);
        self.info.clone()
    }

    fn system_av_info(&self) -> SystemAvInfo {
        record(CoreCall::SystemAvInfo);
        self.av_info
    }

    fn set_controller_port_device(&mut self, port: c_uint, device: c_uint) {
        record(CoreCall::SetControllerPortDevice(port, device));
    }

    fn reset(&mut self) {
        record(CoreCall::Reset);
    }

    fn run(&mut self) {
        record(CoreCall::Run);
        self.bound_during_run.push(RENDER_TARGET_BOUND.with(Cell::get));

        if let Some(cb) = self.callbacks {
            self.input_seen.clear();
            unsafe {
                (cb.input_poll)();
                for id in 0..16 {
                    let value = (cb.input_state)(0, abi::device::JOYPAD, 0, id);
                    if value != 0 {
                        self.input_seen.push((id, value));
                    }
                }
                (cb.video_refresh)(abi::HW_FRAME_BUFFER_VALID, 320, 240, 0);
                let silence = [0i16; 4];
                (cb.audio_sample_batch)(silence.as_ptr(), 2);
            }
        }

        if self.error_on_frame == Some(self.runs) {
            self.log_error(c"fake core exploded\n");
        }

        self.runs += 1;
    }

    fn load_game(&mut self, game: &RetroGameInfo) -> bool {
        let path = if game.path.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(game.path) }
                .to_string_lossy()
                .into_owned()
        };
        let data = (!game.data.is_null()).then(|| {
            unsafe { std::slice::from_raw_parts(game.data as *const u8, game.size) }.to_vec()
        });
        record(CoreCall::LoadGame {
            path,
            data,
            size: game.size,
        });

        if let Some(raw) = self.pixel_format {
            let mut value = raw;
            self.pixel_format_accepted = Some(self.environment(
                abi::environment::SET_PIXEL_FORMAT,
                &mut value as *mut c_uint as *mut c_void,
            ));
        }

        if let Some(mut hw) = self.hw_render {
            if self.environment(
                abi::environment::SET_HW_RENDER,
                &mut hw as *mut RetroHwRenderCallback as *mut c_void,
            ) {
                FRAMEBUFFER_ACCESSOR.with(|slot| slot.set(hw.get_current_framebuffer));
            }
        }

        self.accept_game
    }

    fn unload_game(&mut self) {
        record(CoreCall::UnloadGame);
    }

    fn unload(self) {
        record(CoreCall::Unload);
    }
}

// ============================================================================
// FakeBackend
// ============================================================================

/// A host-side request made of the fake backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    /// width, height, context type
    CreateContext(u32, u32, c_uint),
    SetSize(u32, u32),
    SetTitle(String),
    CreateRenderTarget(u32, u32, DepthStencil),
    Bind,
    Unbind,
    Present(Orientation),
    PollEvents,
}

/// Polls after which the fake window closes itself, so a broken quit path
/// ends a test instead of hanging it
const MAX_POLLS: u64 = 10_000;

/// Records backend operations and replays scripted events
pub struct FakeBackend {
    pub ops: Vec<BackendOp>,
    pub context: bool,
    pub framebuffer: FramebufferHandle,
    pub title: Option<String>,
    scripted: HashMap<u64, Vec<HostEvent>>,
    polls: u64,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        RENDER_TARGET_BOUND.with(|bound| bound.set(false));
        Self {
            ops: Vec::new(),
            context: false,
            framebuffer: FramebufferHandle(42),
            title: None,
            scripted: HashMap::new(),
            polls: 0,
        }
    }

    /// Deliver `events` on the `poll`-th (0-based) event drain
    pub fn script_events(&mut self, poll: u64, events: Vec<HostEvent>) {
        self.scripted.entry(poll).or_default().extend(events);
    }
}

fn null_resolver(_: &CStr) -> *const c_void {
    std::ptr::null()
}

impl VideoBackend for FakeBackend {
    fn has_context(&self) -> bool {
        self.context
    }

    fn create_context(&mut self, request: &ContextRequest) -> Result<(), BackendError> {
        ContextApi::from_context_type(request.context_type)?;
        self.ops.push(BackendOp::CreateContext(
            request.width,
            request.height,
            request.context_type,
        ));
        self.context = true;
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.ops.push(BackendOp::SetSize(width, height));
    }

    fn set_title(&mut self, title: &str) {
        self.ops.push(BackendOp::SetTitle(title.to_string()));
        self.title = Some(title.to_string());
    }

    fn proc_resolver(&self) -> ProcResolver {
        Rc::new(null_resolver)
    }

    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        attachments: DepthStencil,
    ) -> Result<FramebufferHandle, BackendError> {
        if !self.context {
            return Err(BackendError::NoContext);
        }
        self.ops
            .push(BackendOp::CreateRenderTarget(width, height, attachments));
        RENDER_TARGET_BOUND.with(|bound| bound.set(true));
        Ok(self.framebuffer)
    }

    fn bind_render_target(&mut self) {
        self.ops.push(BackendOp::Bind);
        RENDER_TARGET_BOUND.with(|bound| bound.set(true));
    }

    fn unbind_render_target(&mut self) {
        self.ops.push(BackendOp::Unbind);
        RENDER_TARGET_BOUND.with(|bound| bound.set(false));
    }

    fn present(&mut self, orientation: Orientation) {
        self.ops.push(BackendOp::Present(orientation));
    }

    fn poll_events(&mut self) -> HostEvents {
        self.ops.push(BackendOp::PollEvents);
        let mut events: HostEvents = self
            .scripted
            .remove(&self.polls)
            .unwrap_or_default()
            .into_iter()
            .collect();
        if self.polls >= MAX_POLLS {
            events.push(HostEvent::CloseRequested);
        }
        self.polls += 1;
        events
    }
}
