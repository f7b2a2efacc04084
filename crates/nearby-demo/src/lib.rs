#![forbid(unsafe_code)]

//! Demo library.
//!
//! Exposes the demo internals so tests can drive a scripted walk and assert
//! on the rendered frames without spawning the binary.
//!
//! # How it fits in the workspace
//! The demo is the only consumer that wires every piece together: a
//! [`LocationController`](nearby_runtime::LocationController) fed by a
//! scripted walk, a [`StoreList`](nearby_runtime::StoreList) backed by an
//! in-memory catalog, and optional JSON logging from `nearby-core`.

pub mod app;
pub mod cli;
