//! Hardware render negotiation
//!
//! Runs once per loaded game, right after `retro_load_game` succeeds: only
//! then is the geometry known, yet the core expects a live context before it
//! draws anything.

use tracing::{debug, info};

use super::{FramebufferHandle, PixelFormatDescriptor, VideoBackend, VideoGeometry};
use crate::error::HostError;
use crate::host::SharedHost;

/// Bring up the context and render target for `geometry` and tell the core it
/// may start issuing graphics calls.
///
/// The host must be active on this thread so the core's reset callback can
/// reach the framebuffer and proc-address accessors.
pub fn negotiate<B: VideoBackend>(
    host: &SharedHost,
    backend: &mut B,
    geometry: &VideoGeometry,
) -> Result<FramebufferHandle, HostError> {
    let (width, height) = (geometry.base_width, geometry.base_height);
    let hw = *host.borrow().hw_render();

    if !backend.has_context() {
        let request = hw.context_request(width, height);
        debug!("creating graphics context: {:?}", request);
        backend.create_context(&request)?;
    }
    backend.set_size(width, height);

    {
        let mut ctx = host.borrow_mut();
        ctx.set_proc_resolver(backend.proc_resolver());
        if ctx.pixel_format().is_none() {
            debug!("core did not set a pixel format, using XRGB8888");
            ctx.set_pixel_format(PixelFormatDescriptor::default());
        }
    }

    let handle = backend.create_render_target(width, height, hw.depth_stencil())?;
    host.borrow_mut().set_framebuffer(handle);

    info!(
        "Texture: {}w * {}h, {} * {}",
        geometry.base_width, geometry.base_height, geometry.max_width, geometry.max_height
    );

    // No host borrow is held here: the core calls back into the accessors
    if let Some(context_reset) = hw.context_reset {
        unsafe { context_reset() };
    }

    backend.unbind_render_target();

    host.borrow_mut().take_fatal()?;
    Ok(handle)
}
