//! Merge S11/S21 sweep exports from an RF simulator and extract per-design
//! passband metrics (center frequency, 3dB bandwidth, edges, in-band S11
//! minimum, S21 peak).

pub mod config;
pub mod data;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod pipeline;

/// Initialise `env_logger` at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
