//! Cores loaded from a shared library
//!
//! Every required entry point is resolved when the library is opened. A single
//! missing symbol fails [`DylibCore::open`]; there is no partially loaded core.

use std::ffi::{CStr, c_char, c_uint};
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info, warn};

use super::{Core, SystemAvInfo, SystemInfo, SystemTiming};
use crate::abi::*;
use crate::error::HostError;
use crate::host::HostCallbacks;

/// Resolved `retro_*` entry points
///
/// Function pointers are copied out of the library; they stay valid for as
/// long as the owning [`DylibCore`] keeps the library open.
struct CoreApi {
    init: InitFn,
    deinit: DeinitFn,
    api_version: ApiVersionFn,
    get_system_info: GetSystemInfoFn,
    get_system_av_info: GetSystemAvInfoFn,
    set_controller_port_device: SetControllerPortDeviceFn,
    reset: ResetFn,
    run: RunFn,
    load_game: LoadGameFn,
    unload_game: UnloadGameFn,

    set_environment: SetEnvironmentFn,
    set_video_refresh: SetVideoRefreshFn,
    set_input_poll: SetInputPollFn,
    set_input_state: SetInputStateFn,
    set_audio_sample: SetAudioSampleFn,
    set_audio_sample_batch: SetAudioSampleBatchFn,
}

/// Where entry points are looked up by name
trait SymbolSource {
    /// Look up `name` and copy out the function pointer.
    ///
    /// # Safety
    ///
    /// `T` must be the function pointer type the core ABI declares for `name`.
    unsafe fn lookup<T: Copy>(&self, name: &'static str) -> Result<T, libloading::Error>;
}

impl SymbolSource for Library {
    unsafe fn lookup<T: Copy>(&self, name: &'static str) -> Result<T, libloading::Error> {
        // SAFETY: forwarded from the caller
        let sym = unsafe { self.get::<T>(name.as_bytes()) }?;
        Ok(*sym)
    }
}

/// # Safety
///
/// Same as [`SymbolSource::lookup`].
unsafe fn symbol<T: Copy>(exports: &impl SymbolSource, name: &'static str) -> Result<T, HostError> {
    // SAFETY: forwarded from the caller
    unsafe { exports.lookup(name) }
        .map_err(|source| HostError::MissingSymbol { symbol: name, source })
}

impl CoreApi {
    /// # Safety
    ///
    /// `source` must belong to a core built against this ABI.
    unsafe fn resolve(source: &impl SymbolSource) -> Result<Self, HostError> {
        // SAFETY: each type matches the ABI declaration of its symbol
        unsafe {
            Ok(Self {
                init: symbol(source, "retro_init")?,
                deinit: symbol(source, "retro_deinit")?,
                api_version: symbol(source, "retro_api_version")?,
                get_system_info: symbol(source, "retro_get_system_info")?,
                get_system_av_info: symbol(source, "retro_get_system_av_info")?,
                set_controller_port_device: symbol(source, "retro_set_controller_port_device")?,
                reset: symbol(source, "retro_reset")?,
                run: symbol(source, "retro_run")?,
                load_game: symbol(source, "retro_load_game")?,
                unload_game: symbol(source, "retro_unload_game")?,

                set_environment: symbol(source, "retro_set_environment")?,
                set_video_refresh: symbol(source, "retro_set_video_refresh")?,
                set_input_poll: symbol(source, "retro_set_input_poll")?,
                set_input_state: symbol(source, "retro_set_input_state")?,
                set_audio_sample: symbol(source, "retro_set_audio_sample")?,
                set_audio_sample_batch: symbol(source, "retro_set_audio_sample_batch")?,
            })
        }
    }
}

/// A core loaded from a shared library
pub struct DylibCore {
    // Field order matters: `api` must not outlive `library`
    api: CoreApi,
    library: Library,
    path: PathBuf,
}

impl DylibCore {
    /// Open the library at `path` and resolve every required entry point.
    pub fn open(path: &Path) -> Result<Self, HostError> {
        // SAFETY: running a library's initializers is inherent to loading a core
        let library = unsafe { Library::new(path) }.map_err(|source| HostError::ModuleOpen {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the library is expected to be a core; types match the ABI
        let api = unsafe { CoreApi::resolve(&library)? };

        debug!("resolved core entry points from {}", path.display());
        Ok(Self {
            api,
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Copy a possibly-null C string owned by the core
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn core_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: forwarded from the caller
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl Core for DylibCore {
    fn api_version(&self) -> c_uint {
        unsafe { (self.api.api_version)() }
    }

    fn register_host(&mut self, callbacks: &HostCallbacks) {
        unsafe {
            (self.api.set_environment)(callbacks.environment);
            (self.api.set_video_refresh)(callbacks.video_refresh);
            (self.api.set_input_poll)(callbacks.input_poll);
            (self.api.set_input_state)(callbacks.input_state);
            (self.api.set_audio_sample)(callbacks.audio_sample);
            (self.api.set_audio_sample_batch)(callbacks.audio_sample_batch);
        }
    }

    fn init(&mut self) {
        unsafe { (self.api.init)() }
    }

    fn deinit(&mut self) {
        unsafe { (self.api.deinit)() }
    }

    fn system_info(&self) -> SystemInfo {
        let mut raw = RetroSystemInfo::default();
        unsafe {
            (self.api.get_system_info)(&mut raw);
            SystemInfo {
                library_name: core_string(raw.library_name),
                library_version: core_string(raw.library_version),
                valid_extensions: core_string(raw.valid_extensions),
                need_fullpath: raw.need_fullpath,
                block_extract: raw.block_extract,
            }
        }
    }

    fn system_av_info(&self) -> SystemAvInfo {
        let mut raw = RetroSystemAvInfo::default();
        unsafe { (self.api.get_system_av_info)(&mut raw) };
        SystemAvInfo {
            geometry: raw.geometry.into(),
            timing: SystemTiming {
                fps: raw.timing.fps,
                sample_rate: raw.timing.sample_rate,
            },
        }
    }

    fn set_controller_port_device(&mut self, port: c_uint, device: c_uint) {
        unsafe { (self.api.set_controller_port_device)(port, device) }
    }

    fn reset(&mut self) {
        unsafe { (self.api.reset)() }
    }

    fn run(&mut self) {
        unsafe { (self.api.run)() }
    }

    fn load_game(&mut self, game: &RetroGameInfo) -> bool {
        unsafe { (self.api.load_game)(game) }
    }

    fn unload_game(&mut self) {
        unsafe { (self.api.unload_game)() }
    }

    fn unload(self) {
        let Self { api, library, path } = self;
        drop(api);
        match library.close() {
            Ok(()) => info!("unloaded core {}", path.display()),
            Err(e) => warn!("failed to unload core {}: {}", path.display(), e),
        }
    }
}
