//! Host error types
//!
//! Every fatal condition is surfaced as a [`HostError`] and propagated up to the
//! launcher, which logs it and exits nonzero. The only soft failure, an
//! unsupported environment command, never becomes an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::video::BackendError;

#[derive(Debug, Error)]
pub enum HostError {
    /// The core module could not be opened
    #[error("failed to open core '{path}'")]
    ModuleOpen {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A required entry point is not exported by the core
    #[error("core is missing required symbol '{symbol}'")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// Window, context or render target creation failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Content could not be opened or read
    #[error("failed to read content '{path}'")]
    ContentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content path cannot be handed to the core as a C string
    #[error("content path '{path}' contains an interior NUL byte")]
    ContentPath { path: PathBuf },

    /// The core's load-game entry point returned false
    #[error("core rejected content '{path}'")]
    LoadRejected { path: PathBuf },

    /// The core reported an error through its log interface
    #[error("core reported a fatal error: {message}")]
    CoreFatal { message: String },

    /// Key bindings failed validation
    #[error("invalid key binding: {0}")]
    InvalidBinding(String),

    /// An explicitly requested configuration file is unusable
    #[error("failed to load configuration '{path}'")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
