//! hwretro - run a hardware-rendered libretro core
//!
//! # Usage
//!
//! ```bash
//! hwretro path/to/core.so path/to/game.bin
//! hwretro core.so game.bin --config my-bindings.toml -v
//! ```
//!
//! Escape (configurable) or closing the window quits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hwretro_core::{CoreSession, DylibCore, GlfwBackend, HostContext, InputBridge, config};

#[derive(Parser)]
#[command(name = "hwretro")]
#[command(
    author,
    version,
    about = "Run a hardware-rendered libretro core on a content file"
)]
struct Cli {
    /// Core shared library (.so / .dylib / .dll)
    core: PathBuf,

    /// Content file handed to the core
    content: PathBuf,

    /// Configuration file (default: <config dir>/config.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Program name as invoked, for the window title
fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hwretro".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };

    let input = InputBridge::new(&config.input).context("invalid [input] configuration")?;
    let host = HostContext::new(input, &config.host_paths());

    let program = program_name();
    let backend = GlfwBackend::new(&program, config.video.vsync)?;
    let core = DylibCore::open(&cli.core)?;
    tracing::info!("Loaded core {}", cli.core.display());

    let mut session = CoreSession::start(core, backend, host, &program)?;

    // The core is torn down in order even when loading or a frame fails
    let result = session
        .load_game(&cli.content)
        .and_then(|()| session.run());
    session.shutdown();

    let frames = result.with_context(|| format!("running '{}'", cli.content.display()))?;
    tracing::info!("Exited cleanly after {} frames", frames);
    Ok(())
}
