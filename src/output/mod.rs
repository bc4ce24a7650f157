//! Terminal output for the CLI
//!
//! User-facing output goes through the `display_*` macros so that `--quiet`
//! can silence it in one place. Diagnostics go through `tracing` to stderr.

mod config;
mod display;
#[doc(hidden)]
pub mod writer;

pub use config::{OutputConfig, OutputMode};

use once_cell::sync::OnceCell;
use std::sync::RwLock;

static OUTPUT_CONFIG: OnceCell<RwLock<OutputConfig>> = OnceCell::new();

/// Initialize the output system with the specified mode and verbosity
pub fn init_with_verbosity(mode: OutputMode, verbose: bool) {
    let mut config = OutputConfig::new(mode);
    if verbose {
        config.set_verbose();
    }

    config.init_tracing();

    if OUTPUT_CONFIG.set(RwLock::new(config)).is_err() {
        tracing::debug!("Output system already initialized");
    }
}

/// Get current output mode
pub fn current_mode() -> OutputMode {
    OUTPUT_CONFIG
        .get()
        .and_then(|config| config.read().ok().map(|c| c.mode()))
        // Library callers that never initialised output still get CLI output
        .unwrap_or(OutputMode::Cli)
}
