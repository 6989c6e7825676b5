//! Utilities: diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; user-facing output goes
//! through `crate::printer`. `-v`/`-q` pick the level, `RUST_LOG` overrides it.
//!
//!   -q     error
//!   (none) warn
//!   -v     info
//!   -vv    debug
//!   -vvv   trace

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
