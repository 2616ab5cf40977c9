//! Logger setup

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialise the global logger.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects debug output, with
/// info as the default. Safe to call more than once.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    // Fails only when a logger is already installed
    let _ = Builder::from_env(env).format_timestamp_millis().try_init();
}
