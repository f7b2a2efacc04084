#![forbid(unsafe_code)]

//! Logging facade.
//!
//! With the `tracing` feature enabled the `tracing` macros are re-exported so
//! downstream crates can log through `nearby_core::debug!` and friends without
//! a direct dependency. With `tracing-json` enabled, [`init`] installs a JSON
//! subscriber filtered by `RUST_LOG` (default `info`).
//!
//! Without either feature this module is empty and logging compiles away.

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Default filter directive when `RUST_LOG` is unset or invalid.
#[cfg(feature = "tracing-json")]
pub const DEFAULT_FILTER: &str = "info";

/// Install the process-wide JSON subscriber.
///
/// Safe to call multiple times; only the first call installs a subscriber.
/// Returns `true` if this call performed the installation.
#[cfg(feature = "tracing-json")]
pub fn init() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .try_init()
        .is_ok()
}
