#![forbid(unsafe_code)]

//! Core: coordinates, distance display, and logging setup.
//!
//! # Role in the workspace
//! `nearby-core` is the leaf layer. It knows nothing about observation or
//! subscriptions; it provides the plain value types and formatting helpers
//! that the reactive runtime (`nearby-runtime`) pushes through its
//! observables.
//!
//! # Primary responsibilities
//! - **Coordinate**: validated latitude/longitude pairs with great-circle
//!   distance.
//! - **Formatting**: human-readable distance labels and address lines.
//! - **Logging**: optional `tracing` re-exports and subscriber setup.

pub mod format;
pub mod geo;
pub mod logging;

pub use format::{DistanceFormat, address_line, format_distance};
pub use geo::{Coordinate, GeoError};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
