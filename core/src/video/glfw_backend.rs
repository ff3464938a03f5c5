//! GLFW window + OpenGL render target
//!
//! The core renders into a colour texture attached to a framebuffer object.
//! Presenting blits that framebuffer onto the window's default framebuffer,
//! flipped as requested, then swaps buffers.

use std::ffi::{CStr, c_char, c_void};
use std::rc::Rc;

use gl::types::{GLenum, GLint, GLsizei, GLuint};
use glfw::{
    Action, ClientApiHint, Context as _, Glfw, GlfwReceiver, OpenGlProfileHint, PWindow,
    SwapInterval, WindowEvent, WindowHint, WindowMode,
};
use tracing::{error, info, warn};

use super::{
    BackendError, ContextApi, ContextRequest, DepthStencil, FramebufferHandle, HostEvent,
    HostEvents, Orientation, ProcResolver, VideoBackend,
};
use crate::input::Key;

fn log_glfw_error(err: glfw::Error, description: String) {
    error!("GLFW error ({:?}): {}", err, description);
}

struct Window {
    handle: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

/// Framebuffer object plus its attachments
struct RenderTarget {
    fbo: GLuint,
    texture: GLuint,
    renderbuffer: Option<GLuint>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// # Safety
    ///
    /// The context that created the target must be current.
    unsafe fn delete(&self) {
        unsafe {
            gl::DeleteFramebuffers(1, &self.fbo);
            gl::DeleteTextures(1, &self.texture);
            if let Some(rbo) = self.renderbuffer {
                gl::DeleteRenderbuffers(1, &rbo);
            }
        }
    }
}

pub struct GlfwBackend {
    glfw: Glfw,
    window: Option<Window>,
    target: Option<RenderTarget>,
    title: String,
    vsync: bool,
}

impl GlfwBackend {
    /// Initialize GLFW. The window is created later, during negotiation.
    pub fn new(title: &str, vsync: bool) -> Result<Self, BackendError> {
        let glfw = glfw::init(log_glfw_error).map_err(|e| BackendError::Init(e.to_string()))?;
        Ok(Self {
            glfw,
            window: None,
            target: None,
            title: title.to_string(),
            vsync,
        })
    }

    fn apply_hints(&mut self, api: ContextApi, request: &ContextRequest) {
        self.glfw.default_window_hints();
        self.glfw.window_hint(WindowHint::Resizable(false));
        for hint in context_hints(api, request) {
            self.glfw.window_hint(hint);
        }
    }

    fn window(&mut self) -> Option<&mut Window> {
        self.window.as_mut()
    }
}

/// Lowest GLES version the render target and blit present work on
const MIN_GLES_VERSION: (u32, u32) = (3, 0);

/// Version to request for a context type, `None` to let the driver choose.
///
/// GLES2 cores get a GLES 3.0 context: it runs GLES2 code unchanged and has
/// the sized formats and framebuffer blit the render target needs.
fn context_version(api: ContextApi, request: &ContextRequest) -> Option<(u32, u32)> {
    let requested = (request.version_major, request.version_minor);
    match api {
        ContextApi::OpenGlCore => Some(requested),
        ContextApi::OpenGl => (request.version_major > 0).then_some(requested),
        ContextApi::OpenGlEs => match request.context_type {
            crate::abi::hw_context::OPENGLES_VERSION => Some(requested.max(MIN_GLES_VERSION)),
            _ => Some(MIN_GLES_VERSION),
        },
    }
}

/// Window hints selecting the client API, profile and version
fn context_hints(api: ContextApi, request: &ContextRequest) -> Vec<WindowHint> {
    let mut hints = vec![WindowHint::OpenGlDebugContext(request.debug)];

    hints.push(WindowHint::ClientApi(match api {
        ContextApi::OpenGlEs => ClientApiHint::OpenGlEs,
        ContextApi::OpenGl | ContextApi::OpenGlCore => ClientApiHint::OpenGl,
    }));

    if let Some((major, minor)) = context_version(api, request) {
        hints.push(WindowHint::ContextVersion(major, minor));
    }

    if api == ContextApi::OpenGlCore {
        hints.push(WindowHint::OpenGlProfile(OpenGlProfileHint::Core));
        hints.push(WindowHint::OpenGlForwardCompat(true));
    }
    hints
}

fn gl_string(name: GLenum) -> String {
    // SAFETY: called with a current context; GetString returns a static string or null
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return String::from("<unknown>");
        }
        CStr::from_ptr(ptr as *const c_char)
            .to_string_lossy()
            .into_owned()
    }
}

impl VideoBackend for GlfwBackend {
    fn has_context(&self) -> bool {
        self.window.is_some()
    }

    fn create_context(&mut self, request: &ContextRequest) -> Result<(), BackendError> {
        let api = ContextApi::from_context_type(request.context_type)?;
        self.apply_hints(api, request);

        let (mut handle, events) = self
            .glfw
            .create_window(
                request.width,
                request.height,
                &self.title,
                WindowMode::Windowed,
            )
            .ok_or(BackendError::WindowCreation {
                width: request.width,
                height: request.height,
                api: api.name(),
            })?;

        handle.make_current();
        handle.set_key_polling(true);
        handle.set_close_polling(true);

        gl::load_with(|symbol| handle.get_proc_address(symbol) as *const _);
        if !gl::GenFramebuffers::is_loaded() {
            return Err(BackendError::FunctionLoad("glGenFramebuffers"));
        }
        if !gl::BlitFramebuffer::is_loaded() {
            return Err(BackendError::FunctionLoad("glBlitFramebuffer"));
        }

        self.glfw.set_swap_interval(if self.vsync {
            SwapInterval::Sync(1)
        } else {
            SwapInterval::None
        });

        info!("GL_SHADING_LANGUAGE_VERSION: {}", gl_string(gl::SHADING_LANGUAGE_VERSION));
        info!("GL_VERSION: {}", gl_string(gl::VERSION));

        self.window = Some(Window { handle, events });
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if let Some(window) = self.window() {
            window.handle.set_size(width as i32, height as i32);
        }
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        if let Some(window) = self.window() {
            window.handle.set_title(title);
        }
    }

    fn proc_resolver(&self) -> ProcResolver {
        let glfw = self.glfw.clone();
        Rc::new(move |name: &CStr| match name.to_str() {
            Ok(name) => glfw.get_proc_address_raw(name) as *const c_void,
            Err(_) => std::ptr::null(),
        })
    }

    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        attachments: DepthStencil,
    ) -> Result<FramebufferHandle, BackendError> {
        if self.window.is_none() {
            return Err(BackendError::NoContext);
        }

        if let Some(old) = self.target.take() {
            // SAFETY: our context is current
            unsafe { old.delete() };
        }

        let (w, h) = (width as GLsizei, height as GLsizei);

        // SAFETY: our context is current and the function table is loaded
        let target = unsafe {
            let mut texture: GLuint = 0;
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as GLint,
                w,
                h,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                std::ptr::null(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);

            let mut fbo: GLuint = 0;
            gl::GenFramebuffers(1, &mut fbo);
            gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                texture,
                0,
            );

            let storage = match attachments {
                DepthStencil::None => None,
                DepthStencil::Depth => Some((gl::DEPTH_COMPONENT24, gl::DEPTH_ATTACHMENT)),
                DepthStencil::Stencil => Some((gl::STENCIL_INDEX8, gl::STENCIL_ATTACHMENT)),
                DepthStencil::DepthStencil => {
                    Some((gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL_ATTACHMENT))
                }
            };

            let renderbuffer = storage.map(|(format, attachment)| {
                let mut rbo: GLuint = 0;
                gl::GenRenderbuffers(1, &mut rbo);
                gl::BindRenderbuffer(gl::RENDERBUFFER, rbo);
                gl::RenderbufferStorage(gl::RENDERBUFFER, format, w, h);
                gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, attachment, gl::RENDERBUFFER, rbo);
                gl::BindRenderbuffer(gl::RENDERBUFFER, 0);
                rbo
            });

            let target = RenderTarget {
                fbo,
                texture,
                renderbuffer,
                width,
                height,
            };

            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            if status != gl::FRAMEBUFFER_COMPLETE {
                gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
                target.delete();
                return Err(BackendError::IncompleteFramebuffer(status));
            }

            gl::Viewport(0, 0, w, h);
            target
        };

        let handle = FramebufferHandle(target.fbo as usize);
        self.target = Some(target);
        Ok(handle)
    }

    fn bind_render_target(&mut self) {
        if let Some(target) = &self.target {
            // SAFETY: our context is current
            unsafe {
                gl::BindFramebuffer(gl::FRAMEBUFFER, target.fbo);
                gl::Viewport(0, 0, target.width as GLsizei, target.height as GLsizei);
            }
        }
    }

    fn unbind_render_target(&mut self) {
        if self.window.is_some() {
            // SAFETY: our context is current
            unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, 0) };
        }
    }

    fn present(&mut self, orientation: Orientation) {
        let Some(window) = self.window.as_mut() else {
            return;
        };

        if let Some(target) = &self.target {
            let (win_w, win_h) = window.handle.get_framebuffer_size();
            let (src_w, src_h) = (target.width as GLint, target.height as GLint);
            let (dst_y0, dst_y1) = match orientation {
                Orientation::Upright => (0, win_h),
                Orientation::FlipVertical => (win_h, 0),
            };

            // SAFETY: our context is current
            unsafe {
                gl::BindFramebuffer(gl::READ_FRAMEBUFFER, target.fbo);
                gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, 0);
                gl::Viewport(0, 0, win_w, win_h);
                gl::ClearColor(0.0, 0.0, 0.0, 1.0);
                gl::Clear(gl::COLOR_BUFFER_BIT);
                gl::BlitFramebuffer(
                    0,
                    0,
                    src_w,
                    src_h,
                    0,
                    dst_y0,
                    win_w,
                    dst_y1,
                    gl::COLOR_BUFFER_BIT,
                    gl::LINEAR,
                );
                gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            }
        }

        window.handle.swap_buffers();
    }

    fn poll_events(&mut self) -> HostEvents {
        let mut out = HostEvents::new();
        self.glfw.poll_events();

        let Some(window) = &self.window else {
            return out;
        };

        for (_, event) in glfw::flush_messages(&window.events) {
            match event {
                WindowEvent::Key(key, _, action, _) => {
                    let Some(key) = translate_key(key) else {
                        continue;
                    };
                    match action {
                        Action::Press => out.push(HostEvent::Key { key, pressed: true }),
                        Action::Release => out.push(HostEvent::Key {
                            key,
                            pressed: false,
                        }),
                        Action::Repeat => {}
                    }
                }
                WindowEvent::Close => out.push(HostEvent::CloseRequested),
                _ => {}
            }
        }

        if window.handle.should_close() && !out.contains(&HostEvent::CloseRequested) {
            out.push(HostEvent::CloseRequested);
        }
        out
    }
}

impl Drop for GlfwBackend {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            if self.window.is_some() {
                // SAFETY: the window, and with it our context, is still alive
                unsafe { target.delete() };
            } else {
                warn!("render target outlived its window");
            }
        }
    }
}

/// Map a GLFW key to a host key; unbindable keys yield `None`
pub fn translate_key(key: glfw::Key) -> Option<Key> {
    use glfw::Key as G;

    let key = match key {
        G::A => Key::A,
        G::B => Key::B,
        G::C => Key::C,
        G::D => Key::D,
        G::E => Key::E,
        G::F => Key::F,
        G::G => Key::G,
        G::H => Key::H,
        G::I => Key::I,
        G::J => Key::J,
        G::K => Key::K,
        G::L => Key::L,
        G::M => Key::M,
        G::N => Key::N,
        G::O => Key::O,
        G::P => Key::P,
        G::Q => Key::Q,
        G::R => Key::R,
        G::S => Key::S,
        G::T => Key::T,
        G::U => Key::U,
        G::V => Key::V,
        G::W => Key::W,
        G::X => Key::X,
        G::Y => Key::Y,
        G::Z => Key::Z,

        G::Num0 => Key::Digit0,
        G::Num1 => Key::Digit1,
        G::Num2 => Key::Digit2,
        G::Num3 => Key::Digit3,
        G::Num4 => Key::Digit4,
        G::Num5 => Key::Digit5,
        G::Num6 => Key::Digit6,
        G::Num7 => Key::Digit7,
        G::Num8 => Key::Digit8,
        G::Num9 => Key::Digit9,

        G::Up => Key::ArrowUp,
        G::Down => Key::ArrowDown,
        G::Left => Key::ArrowLeft,
        G::Right => Key::ArrowRight,

        G::F1 => Key::F1,
        G::F2 => Key::F2,
        G::F3 => Key::F3,
        G::F4 => Key::F4,
        G::F5 => Key::F5,
        G::F6 => Key::F6,
        G::F7 => Key::F7,
        G::F8 => Key::F8,
        G::F9 => Key::F9,
        G::F10 => Key::F10,
        G::F11 => Key::F11,
        G::F12 => Key::F12,

        G::LeftShift => Key::ShiftLeft,
        G::RightShift => Key::ShiftRight,
        G::LeftControl => Key::ControlLeft,
        G::RightControl => Key::ControlRight,
        G::LeftAlt => Key::AltLeft,
        G::RightAlt => Key::AltRight,

        G::Space => Key::Space,
        G::Enter => Key::Enter,
        G::Escape => Key::Escape,
        G::Backspace => Key::Backspace,
        G::Tab => Key::Tab,

        _ => return None,
    };
    Some(key)
}
