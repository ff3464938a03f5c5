//! Core lifecycle
//!
//! [`CoreSession`] owns the loaded core, the video backend and the host
//! context, and drives them in a fixed order:
//!
//! 1. register callbacks, `init`
//! 2. `load_game`: open content, hand it to the core, negotiate the render
//!    context, set the window title, plug a joypad into port 0
//! 3. frame pump until the host stops running
//! 4. `shutdown`: context destroy, `unload_game`, `deinit`, module unload

use std::path::Path;

use tracing::{debug, info, warn};

use crate::abi;
use crate::content::GameContent;
use crate::error::HostError;
use crate::frame::FramePump;
use crate::host::{self, ActiveHostGuard, FrameStats, HostCallbacks, HostContext, SharedHost};
use crate::plugin::{Core, SystemInfo};
use crate::video::{self, VideoBackend};

/// Window title shown once a game is loaded
pub fn window_title(program: &str, info: &SystemInfo) -> String {
    format!("{} {} {}", program, info.library_name, info.library_version)
}

pub struct CoreSession<C: Core, B: VideoBackend> {
    core: C,
    backend: B,
    host: SharedHost,
    pump: FramePump,
    program: String,
    initialized: bool,
    game_loaded: bool,
    system_info: Option<SystemInfo>,
    // Dropped last so callbacks reach the host for the whole session
    _active: ActiveHostGuard,
}

impl<C: Core, B: VideoBackend> CoreSession<C, B> {
    /// Wire the host's callbacks into `core` and initialize it.
    ///
    /// `program` prefixes the window title.
    pub fn start(
        mut core: C,
        backend: B,
        host: HostContext,
        program: &str,
    ) -> Result<Self, HostError> {
        let host = host.into_shared();
        let active = host::activate(&host);

        core.register_host(&HostCallbacks::trampolines());

        let version = core.api_version();
        if version != abi::API_VERSION {
            warn!(
                "core reports API version {}, host implements {}",
                version,
                abi::API_VERSION
            );
        }

        core.init();
        info!("Core loaded");
        host.borrow_mut().take_fatal()?;

        Ok(Self {
            core,
            backend,
            host,
            pump: FramePump::new(),
            program: program.to_string(),
            initialized: true,
            game_loaded: false,
            system_info: None,
            _active: active,
        })
    }

    /// Load `path` into the core and bring up the render context.
    pub fn load_game(&mut self, path: &Path) -> Result<(), HostError> {
        let info = self.core.system_info();
        debug!(
            "{} {} (need_fullpath={}, extensions={})",
            info.library_name, info.library_version, info.need_fullpath, info.valid_extensions
        );

        let content = GameContent::open(path, info.need_fullpath)?;
        let accepted = {
            let game = content.as_game_info();
            self.core.load_game(&game)
        };
        // The core copies what it needs during load_game
        drop(content);
        // The core holds the game from here on, even if a later step fails
        self.game_loaded = accepted;

        self.host.borrow_mut().take_fatal()?;
        if !accepted {
            return Err(HostError::LoadRejected {
                path: path.to_path_buf(),
            });
        }

        let av = self.core.system_av_info();
        debug!(
            "timing: {:.3} fps, {:.0} Hz",
            av.timing.fps, av.timing.sample_rate
        );
        video::negotiate(&self.host, &mut self.backend, &av.geometry)?;

        self.backend.set_title(&window_title(&self.program, &info));
        self.system_info = Some(info);

        self.core.set_controller_port_device(0, abi::device::JOYPAD);
        self.pump.start();
        Ok(())
    }

    /// Pump frames until the quit key, a window close, or a core error.
    ///
    /// Returns the number of frames run.
    pub fn run(&mut self) -> Result<u64, HostError> {
        let frames = self.pump.run(&self.host, &mut self.core, &mut self.backend)?;
        info!("frame pump stopped after {} frames", frames);
        Ok(frames)
    }

    /// Run a single frame; returns whether the host wants another
    pub fn step(&mut self) -> Result<bool, HostError> {
        self.pump.step(&self.host, &mut self.core, &mut self.backend)
    }

    pub fn reset(&mut self) {
        self.core.reset();
    }

    /// Tear the core down in order and release the module.
    pub fn shutdown(self) {
        let Self {
            mut core,
            backend,
            host,
            initialized,
            game_loaded,
            _active: active,
            ..
        } = self;

        // The core saw a context reset once the render target exists
        if host.borrow().framebuffer().0 != 0 {
            let destroy = host.borrow().hw_render().context_destroy;
            if let Some(context_destroy) = destroy {
                unsafe { context_destroy() };
            }
        }
        if game_loaded {
            core.unload_game();
        }

        if initialized {
            core.deinit();
        }
        core.unload();

        let stats = host.borrow().stats();
        debug!(
            "frames: {} hardware, {} duplicated, {} software; {} audio frames discarded",
            stats.hw_frames, stats.duped_frames, stats.software_frames, stats.audio_frames
        );

        drop(active);
        drop(backend);
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_ref()
    }

    pub fn stats(&self) -> FrameStats {
        self.host.borrow().stats()
    }
}
