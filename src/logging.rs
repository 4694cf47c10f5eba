//! Log output for the command-line binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary so embedders can route events elsewhere.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Level used when `RUST_LOG` is not set
pub fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::from_level(Level::DEBUG)
    } else {
        LevelFilter::from_level(Level::INFO)
    }
}

/// Install the global subscriber: human-readable or JSON lines on stderr.
///
/// Calling this twice is harmless; the first subscriber stays in place.
pub fn init(debug: bool, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(debug).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
