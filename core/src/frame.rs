//! Frame pump
//!
//! One iteration per display refresh: drain window events, poll input, bind
//! the render target, run the core for one frame, unbind, present. A quit
//! request seen while draining events takes effect after the iteration
//! finishes.

use tracing::{trace, warn};

use crate::error::HostError;
use crate::host::SharedHost;
use crate::plugin::Core;
use crate::video::{HostEvent, Orientation, VideoBackend};

/// Hardware-rendered frames are row-inverted relative to the window
const PRESENT_ORIENTATION: Orientation = Orientation::FlipVertical;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// No game loaded yet
    Idle,
    /// Render context exists; frames may run
    Running,
}

#[derive(Debug)]
pub struct FramePump {
    state: PumpState,
    frames: u64,
}

impl Default for FramePump {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePump {
    pub fn new() -> Self {
        Self {
            state: PumpState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Frames run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Enter the running state once a game is loaded and negotiated
    pub fn start(&mut self) {
        self.state = PumpState::Running;
    }

    /// Run one iteration. Returns whether the host wants another.
    pub fn step<C: Core, B: VideoBackend>(
        &mut self,
        host: &SharedHost,
        core: &mut C,
        backend: &mut B,
    ) -> Result<bool, HostError> {
        if self.state != PumpState::Running {
            warn!("frame pump stepped before a game was loaded");
            return Ok(false);
        }

        // 1. drain events
        let events = backend.poll_events();
        {
            let mut ctx = host.borrow_mut();
            for event in events {
                match event {
                    HostEvent::Key { key, pressed } => ctx.set_key(key, pressed),
                    HostEvent::CloseRequested => {
                        trace!("window close requested");
                        ctx.request_stop();
                    }
                }
            }

            // 2. input
            ctx.poll_input();
        }

        // 3-5. one core frame against the bound target
        backend.bind_render_target();
        core.run();
        backend.unbind_render_target();

        // 6. present
        backend.present(PRESENT_ORIENTATION);
        self.frames += 1;

        let mut ctx = host.borrow_mut();
        ctx.take_fatal()?;
        Ok(ctx.is_running())
    }

    /// Step until the host stops running. Returns the number of frames run.
    pub fn run<C: Core, B: VideoBackend>(
        &mut self,
        host: &SharedHost,
        core: &mut C,
        backend: &mut B,
    ) -> Result<u64, HostError> {
        let start = self.frames;
        while self.step(host, core, backend)? {}
        Ok(self.frames - start)
    }
}
