//! Core log interface
//!
//! Messages from the core are forwarded to `tracing` under the `core` target.
//! An error-level message is recorded on the active host as a pending fatal
//! condition, which stops the session once the current core call returns.

use std::ffi::{CStr, c_char, c_uint};
use std::sync::Once;

use crate::abi::{LogPrintfFn, log_level};

use super::with_active;

type LogSink = unsafe extern "C" fn(level: c_uint, message: *const c_char);

unsafe extern "C" {
    /// Formats with `vsnprintf` and passes the result to the installed sink
    fn hwretro_core_log(level: c_uint, fmt: *const c_char, ...);
    fn hwretro_set_log_sink(sink: LogSink);
}

static INSTALL_SINK: Once = Once::new();

/// Logger handed to the core through GET_LOG_INTERFACE
pub fn log_printf() -> LogPrintfFn {
    // SAFETY: the shim only stores the pointer; `forward` lives for the process
    INSTALL_SINK.call_once(|| unsafe { hwretro_set_log_sink(forward) });
    hwretro_core_log
}

unsafe extern "C" fn forward(level: c_uint, message: *const c_char) {
    if message.is_null() {
        return;
    }
    // SAFETY: the shim passes a NUL-terminated, already formatted buffer
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    emit(level, text.trim_end_matches(['\r', '\n']));
}

/// Forward one core message to `tracing`
pub fn emit(level: c_uint, message: &str) {
    match level {
        log_level::DEBUG => tracing::debug!(target: "core", "{}", message),
        log_level::INFO => tracing::info!(target: "core", "{}", message),
        log_level::WARN => tracing::warn!(target: "core", "{}", message),
        log_level::ERROR => {
            tracing::error!(target: "core", "{}", message);
            with_active(|host| host.record_fatal(message.to_owned()));
        }
        other => tracing::warn!(target: "core", "[level {}] {}", other, message),
    }
}
