//! Video state and the rendering backend boundary
//!
//! Holds what the core negotiates through the environment (pixel format,
//! hardware render parameters) and the [`VideoBackend`] trait the negotiator
//! and frame pump drive. The window, GL context and framebuffer objects all
//! live behind that trait.

pub mod glfw_backend;
pub mod negotiator;

pub use glfw_backend::GlfwBackend;
pub use negotiator::negotiate;

use std::ffi::{CStr, c_uint, c_void};
use std::rc::Rc;

use gl::types::GLenum;
use smallvec::SmallVec;
use thiserror::Error;

use crate::abi::{self, HwContextResetFn, RetroGameGeometry, RetroHwRenderCallback};
use crate::input::Key;

// =============================================================================
// Pixel formats
// =============================================================================

/// Framebuffer pixel encodings a core may select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Xrgb1555,
    Xrgb8888,
    Rgb565,
}

impl PixelFormat {
    /// Parse a raw `retro_pixel_format`; values past RGB565 are unsupported
    pub fn from_raw(raw: c_uint) -> Option<Self> {
        match raw {
            abi::pixel_format::XRGB1555 => Some(Self::Xrgb1555),
            abi::pixel_format::XRGB8888 => Some(Self::Xrgb8888),
            abi::pixel_format::RGB565 => Some(Self::Rgb565),
            _ => None,
        }
    }

    pub fn descriptor(self) -> PixelFormatDescriptor {
        let (gl_type, gl_format, bytes_per_pixel) = match self {
            Self::Xrgb1555 => (gl::UNSIGNED_SHORT_5_5_5_1, gl::BGRA, 2),
            Self::Xrgb8888 => (gl::UNSIGNED_INT_8_8_8_8_REV, gl::BGRA, 4),
            Self::Rgb565 => (gl::UNSIGNED_SHORT_5_6_5, gl::RGB, 2),
        };
        PixelFormatDescriptor {
            format: self,
            gl_type,
            gl_format,
            bytes_per_pixel,
        }
    }
}

/// Pixel layout resolved from the negotiated format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub format: PixelFormat,
    /// GL component type (`GL_UNSIGNED_*`)
    pub gl_type: GLenum,
    /// GL channel order (`GL_BGRA` / `GL_RGB`)
    pub gl_format: GLenum,
    pub bytes_per_pixel: u32,
}

impl Default for PixelFormatDescriptor {
    fn default() -> Self {
        PixelFormat::Xrgb8888.descriptor()
    }
}

// =============================================================================
// Hardware rendering
// =============================================================================

/// Declared image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoGeometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
}

impl From<RetroGameGeometry> for VideoGeometry {
    fn from(g: RetroGameGeometry) -> Self {
        Self {
            base_width: g.base_width,
            base_height: g.base_height,
            max_width: g.max_width,
            max_height: g.max_height,
            aspect_ratio: g.aspect_ratio,
        }
    }
}

/// Depth/stencil renderbuffers attached to the render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStencil {
    None,
    Depth,
    Stencil,
    DepthStencil,
}

impl DepthStencil {
    pub fn from_flags(depth: bool, stencil: bool) -> Self {
        match (depth, stencil) {
            (false, false) => Self::None,
            (true, false) => Self::Depth,
            (false, true) => Self::Stencil,
            (true, true) => Self::DepthStencil,
        }
    }
}

/// Hardware render parameters negotiated with the core.
///
/// Starts out as an OpenGL 3.3 core profile request with no core callbacks and
/// is replaced wholesale when the core sends SET_HW_RENDER.
#[derive(Debug, Clone, Copy)]
pub struct HwRenderState {
    pub context_type: c_uint,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub cache_context: bool,
    pub debug_context: bool,
    pub context_reset: Option<HwContextResetFn>,
    pub context_destroy: Option<HwContextResetFn>,
}

impl Default for HwRenderState {
    fn default() -> Self {
        Self {
            context_type: abi::hw_context::OPENGL_CORE,
            version_major: 3,
            version_minor: 3,
            depth: false,
            stencil: false,
            bottom_left_origin: false,
            cache_context: false,
            debug_context: false,
            context_reset: None,
            context_destroy: None,
        }
    }
}

impl From<&RetroHwRenderCallback> for HwRenderState {
    fn from(hw: &RetroHwRenderCallback) -> Self {
        Self {
            context_type: hw.context_type,
            version_major: hw.version_major,
            version_minor: hw.version_minor,
            depth: hw.depth,
            stencil: hw.stencil,
            bottom_left_origin: hw.bottom_left_origin,
            cache_context: hw.cache_context,
            debug_context: hw.debug_context,
            context_reset: hw.context_reset,
            context_destroy: hw.context_destroy,
        }
    }
}

impl HwRenderState {
    pub fn depth_stencil(&self) -> DepthStencil {
        DepthStencil::from_flags(self.depth, self.stencil)
    }

    pub fn context_request(&self, width: u32, height: u32) -> ContextRequest {
        ContextRequest {
            context_type: self.context_type,
            version_major: self.version_major,
            version_minor: self.version_minor,
            debug: self.debug_context,
            width,
            height,
        }
    }
}

/// The framebuffer name the core renders into.
///
/// Reported once by the backend when the render target is created and handed
/// to the core through `get_current_framebuffer` from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FramebufferHandle(pub usize);

/// Graphics API family a context type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextApi {
    /// Desktop OpenGL, compatibility profile
    OpenGl,
    /// Desktop OpenGL, core profile
    OpenGlCore,
    /// OpenGL ES
    OpenGlEs,
}

impl ContextApi {
    /// Map a raw `retro_hw_context_type`; Vulkan and "none" have no GL context
    pub fn from_context_type(context_type: c_uint) -> Result<Self, BackendError> {
        match context_type {
            abi::hw_context::OPENGL => Ok(Self::OpenGl),
            abi::hw_context::OPENGL_CORE => Ok(Self::OpenGlCore),
            abi::hw_context::OPENGLES2
            | abi::hw_context::OPENGLES3
            | abi::hw_context::OPENGLES_VERSION => Ok(Self::OpenGlEs),
            other => Err(BackendError::UnsupportedContext(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenGl => "OpenGL",
            Self::OpenGlCore => "OpenGL core",
            Self::OpenGlEs => "OpenGL ES",
        }
    }
}

/// What the backend needs to create a window and graphics context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub context_type: c_uint,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub debug: bool,
    pub width: u32,
    pub height: u32,
}

/// Orientation correction applied when presenting the render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    FlipVertical,
}

/// Window/input events the frame pump reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Key { key: Key, pressed: bool },
    CloseRequested,
}

pub type HostEvents = SmallVec<[HostEvent; 8]>;

/// Looks up a graphics entry point in the current context
pub type ProcResolver = Rc<dyn Fn(&CStr) -> *const c_void>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to initialize windowing: {0}")]
    Init(String),

    #[error("failed to create {width}x{height} window with a {api} context")]
    WindowCreation {
        width: u32,
        height: u32,
        api: &'static str,
    },

    #[error("unsupported hardware context type {0}")]
    UnsupportedContext(c_uint),

    #[error("graphics function table failed to load ({0} missing)")]
    FunctionLoad(&'static str),

    #[error("no window or graphics context has been created")]
    NoContext,

    #[error("render target framebuffer is incomplete (status {0:#x})")]
    IncompleteFramebuffer(u32),
}

/// Window + graphics context + render target provider.
///
/// Every method runs on the thread that owns the context.
pub trait VideoBackend {
    /// Whether a window and context already exist
    fn has_context(&self) -> bool;

    /// Create the window and make the requested context current, then load
    /// the graphics function table for it.
    fn create_context(&mut self, request: &ContextRequest) -> Result<(), BackendError>;

    fn set_size(&mut self, width: u32, height: u32);

    fn set_title(&mut self, title: &str);

    /// Resolver handed to the core through `get_proc_address`
    fn proc_resolver(&self) -> ProcResolver;

    /// Create the render target sized `width` x `height` with the requested
    /// attachments and leave it bound.
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        attachments: DepthStencil,
    ) -> Result<FramebufferHandle, BackendError>;

    fn bind_render_target(&mut self);

    fn unbind_render_target(&mut self);

    /// Show the render target and wait for the next refresh when vsync is on
    fn present(&mut self, orientation: Orientation);

    /// Drain pending window events
    fn poll_events(&mut self) -> HostEvents;
}
