//! Integration tests for the core host
//!
//! Drives a full session (start, load, frame pump, shutdown) against the
//! in-process fake core and backend, checking the ordering guarantees the
//! host makes to a real core.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use tempfile::NamedTempFile;

    use crate::abi;
    use crate::error::HostError;
    use crate::input::Key;
    use crate::session::CoreSession;
    use crate::test_utils::{
        BackendOp, CoreCall, FakeBackend, FakeCore, call_index, recorded_calls, test_host,
    };
    use crate::video::{BackendError, DepthStencil, HostEvent, PixelFormat};

    const PROGRAM: &str = "hwretro";
    const CONTENT: &[u8] = b"\x7fROM fake cartridge bytes";

    fn content_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CONTENT).unwrap();
        file.flush().unwrap();
        file
    }

    fn quit_on_poll(backend: &mut FakeBackend, poll: u64) {
        backend.script_events(
            poll,
            vec![HostEvent::Key {
                key: Key::Escape,
                pressed: true,
            }],
        );
    }

    fn start(core: FakeCore, backend: FakeBackend) -> CoreSession<FakeCore, FakeBackend> {
        CoreSession::start(core, backend, test_host(), PROGRAM).unwrap()
    }

    fn loaded_game(path: &Path) -> Option<CoreCall> {
        recorded_calls()
            .into_iter()
            .find(|call| matches!(call, CoreCall::LoadGame { .. }))
            .filter(|call| match call {
                CoreCall::LoadGame { path: seen, .. } => Path::new(seen) == path,
                _ => false,
            })
    }

    // ============================================================================
    // Full lifecycle
    // ============================================================================

    #[test]
    fn test_window_title_names_core() {
        let file = content_file();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());
        session.load_game(file.path()).unwrap();

        assert_eq!(
            session.backend().title.as_deref(),
            Some("hwretro FakeCore 1.2.3")
        );
        assert_eq!(
            session.system_info().map(|info| info.library_name.as_str()),
            Some("FakeCore")
        );
        session.shutdown();
    }

    #[test]
    fn test_quit_key_ends_session_in_order() {
        let file = content_file();
        let mut backend = FakeBackend::new();
        quit_on_poll(&mut backend, 1);

        let mut session = start(FakeCore::hardware_rendered(), backend);
        session.load_game(file.path()).unwrap();
        let frames = session.run().unwrap();
        assert_eq!(frames, 2);
        session.shutdown();

        let calls = recorded_calls();
        let runs = calls.iter().filter(|c| **c == CoreCall::Run).count();
        assert_eq!(runs, 2);

        let last_run = calls.iter().rposition(|c| *c == CoreCall::Run).unwrap();
        let destroy = call_index(|c| *c == CoreCall::ContextDestroy).unwrap();
        let unload_game = call_index(|c| *c == CoreCall::UnloadGame).unwrap();
        let deinit = call_index(|c| *c == CoreCall::Deinit).unwrap();
        let unload = call_index(|c| *c == CoreCall::Unload).unwrap();
        assert!(last_run < destroy);
        assert!(destroy < unload_game);
        assert!(unload_game < deinit);
        assert!(deinit < unload);
        assert_eq!(calls.last(), Some(&CoreCall::Unload));
    }

    #[test]
    fn test_startup_order() {
        let file = content_file();
        let mut backend = FakeBackend::new();
        quit_on_poll(&mut backend, 0);

        let mut session = start(FakeCore::hardware_rendered(), backend);
        session.load_game(file.path()).unwrap();
        session.run().unwrap();
        session.shutdown();

        let register = call_index(|c| *c == CoreCall::RegisterHost).unwrap();
        let init = call_index(|c| *c == CoreCall::Init).unwrap();
        let load = call_index(|c| matches!(c, CoreCall::LoadGame { .. })).unwrap();
        let reset = call_index(|c| matches!(c, CoreCall::ContextReset { .. })).unwrap();
        let port = call_index(|c| {
            *c == CoreCall::SetControllerPortDevice(0, abi::device::JOYPAD)
        })
        .unwrap();
        let run = call_index(|c| *c == CoreCall::Run).unwrap();

        assert!(register < init);
        assert!(init < load);
        assert!(load < reset);
        assert!(reset < port);
        assert!(port < run);
    }

    #[test]
    fn test_frames_counted_as_hardware() {
        let file = content_file();
        let mut backend = FakeBackend::new();
        quit_on_poll(&mut backend, 2);

        let mut session = start(FakeCore::hardware_rendered(), backend);
        session.load_game(file.path()).unwrap();
        session.run().unwrap();

        let stats = session.stats();
        assert_eq!(stats.hw_frames, 3);
        assert_eq!(stats.software_frames, 0);
        assert_eq!(stats.audio_frames, 6);
        session.shutdown();
    }

    #[test]
    fn test_every_frame_runs_against_bound_target() {
        let file = content_file();
        let mut backend = FakeBackend::new();
        quit_on_poll(&mut backend, 3);

        let mut session = start(FakeCore::hardware_rendered(), backend);
        session.load_game(file.path()).unwrap();
        session.run().unwrap();

        let ops = &session.backend().ops;
        let binds = ops.iter().filter(|op| **op == BackendOp::Bind).count();
        let presents = ops
            .iter()
            .filter(|op| matches!(op, BackendOp::Present(_)))
            .count();
        assert_eq!(binds, 4);
        assert_eq!(presents, 4);
        session.shutdown();
    }

    // ============================================================================
    // Content handoff
    // ============================================================================

    #[test]
    fn test_in_memory_content() {
        let file = content_file();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());
        session.load_game(file.path()).unwrap();
        session.shutdown();

        match loaded_game(file.path()) {
            Some(CoreCall::LoadGame { data, size, .. }) => {
                assert_eq!(data.as_deref(), Some(CONTENT));
                assert_eq!(size, CONTENT.len());
            }
            other => panic!("unexpected load: {:?}", other),
        }
    }

    #[test]
    fn test_need_fullpath_content_is_not_read() {
        let file = content_file();
        let mut core = FakeCore::hardware_rendered();
        core.info.need_fullpath = true;

        let mut session = start(core, FakeBackend::new());
        session.load_game(file.path()).unwrap();
        session.shutdown();

        match loaded_game(file.path()) {
            Some(CoreCall::LoadGame { data, .. }) => assert!(data.is_none()),
            other => panic!("unexpected load: {:?}", other),
        }
    }

    #[test]
    fn test_missing_content_fails_before_core_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());

        let err = session.load_game(&dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, HostError::ContentRead { .. }));
        session.shutdown();

        let calls = recorded_calls();
        assert!(!calls.iter().any(|c| matches!(c, CoreCall::LoadGame { .. })));
        // Nothing was loaded, so nothing is unloaded; the core is still torn down
        assert!(!calls.contains(&CoreCall::UnloadGame));
        assert!(calls.contains(&CoreCall::Deinit));
        assert_eq!(calls.last(), Some(&CoreCall::Unload));
    }

    #[test]
    fn test_rejected_content() {
        let file = content_file();
        let core = FakeCore {
            accept_game: false,
            ..FakeCore::hardware_rendered()
        };
        let mut session = start(core, FakeBackend::new());

        let err = session.load_game(file.path()).unwrap_err();
        assert!(matches!(err, HostError::LoadRejected { .. }));
        assert!(
            !session
                .backend()
                .ops
                .iter()
                .any(|op| matches!(op, BackendOp::CreateContext(..)))
        );
        assert!(!session.step().unwrap());
        session.shutdown();

        assert!(!recorded_calls().contains(&CoreCall::Run));
    }

    // ============================================================================
    // Render negotiation
    // ============================================================================

    #[test]
    fn test_context_created_from_core_request() {
        let file = content_file();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());
        session.load_game(file.path()).unwrap();

        let ops = &session.backend().ops;
        assert_eq!(
            ops[0],
            BackendOp::CreateContext(320, 240, abi::hw_context::OPENGL_CORE)
        );
        assert!(ops.contains(&BackendOp::CreateRenderTarget(320, 240, DepthStencil::Depth)));
        session.shutdown();
    }

    #[test]
    fn test_context_reset_sees_framebuffer() {
        let file = content_file();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());
        session.load_game(file.path()).unwrap();

        assert_eq!(session.host().borrow().framebuffer().0, 42);
        assert!(recorded_calls().contains(&CoreCall::ContextReset { framebuffer: 42 }));
        session.shutdown();
    }

    #[test]
    fn test_pixel_format_negotiated_during_load() {
        let file = content_file();
        let core = FakeCore {
            pixel_format: Some(abi::pixel_format::RGB565),
            ..FakeCore::hardware_rendered()
        };
        let mut session = start(core, FakeBackend::new());
        session.load_game(file.path()).unwrap();

        let descriptor = session.host().borrow().pixel_format().unwrap();
        assert_eq!(descriptor.format, PixelFormat::Rgb565);
        assert_eq!(descriptor.bytes_per_pixel, 2);
        session.shutdown();
    }

    #[test]
    fn test_pixel_format_defaults_when_core_is_silent() {
        let file = content_file();
        let core = FakeCore {
            pixel_format: None,
            ..FakeCore::hardware_rendered()
        };
        let mut session = start(core, FakeBackend::new());
        assert!(session.host().borrow().pixel_format().is_none());
        session.load_game(file.path()).unwrap();

        let descriptor = session.host().borrow().pixel_format().unwrap();
        assert_eq!(descriptor.format, PixelFormat::Xrgb8888);
        assert_eq!(descriptor.bytes_per_pixel, 4);
        session.shutdown();
    }

    #[test]
    fn test_unsupported_context_type_is_fatal() {
        let file = content_file();
        let mut core = FakeCore::hardware_rendered();
        if let Some(hw) = core.hw_render.as_mut() {
            hw.context_type = abi::hw_context::VULKAN;
        }
        let mut session = start(core, FakeBackend::new());

        let err = session.load_game(file.path()).unwrap_err();
        assert!(matches!(
            err,
            HostError::Backend(BackendError::UnsupportedContext(abi::hw_context::VULKAN))
        ));
        session.shutdown();

        let calls = recorded_calls();
        assert!(!calls.iter().any(|c| matches!(c, CoreCall::ContextReset { .. })));
        assert!(!calls.contains(&CoreCall::ContextDestroy));

        // The core accepted the game, so it is unloaded before deinit
        let unload_game = call_index(|c| *c == CoreCall::UnloadGame).unwrap();
        let deinit = call_index(|c| *c == CoreCall::Deinit).unwrap();
        assert!(unload_game < deinit);
    }

    // ============================================================================
    // Core-reported errors
    // ============================================================================

    #[test]
    fn test_error_log_during_init_fails_start() {
        let core = FakeCore {
            error_on_init: true,
            ..FakeCore::default()
        };
        let result = CoreSession::start(core, FakeBackend::new(), test_host(), PROGRAM);

        match result {
            Err(HostError::CoreFatal { message }) => {
                assert_eq!(message, "fake core has no BIOS");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("start succeeded"),
        }
    }

    #[test]
    fn test_error_log_during_frame_stops_pump() {
        let file = content_file();
        let core = FakeCore {
            error_on_frame: Some(0),
            ..FakeCore::hardware_rendered()
        };
        let mut session = start(core, FakeBackend::new());
        session.load_game(file.path()).unwrap();

        let err = session.run().unwrap_err();
        assert!(matches!(err, HostError::CoreFatal { .. }));
        session.shutdown();

        let calls = recorded_calls();
        assert_eq!(calls.iter().filter(|c| **c == CoreCall::Run).count(), 1);
        assert_eq!(calls.last(), Some(&CoreCall::Unload));
    }

    #[test]
    fn test_reset_reaches_core() {
        let file = content_file();
        let mut session = start(FakeCore::hardware_rendered(), FakeBackend::new());
        session.load_game(file.path()).unwrap();
        session.reset();
        session.shutdown();

        assert!(recorded_calls().contains(&CoreCall::Reset));
    }
}
