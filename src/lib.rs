//! METAR Lightworks firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod pins;
pub mod platform;
pub mod runtime;
pub mod safety;

// Host builds get the simulated adapters; the real implementations are
// guarded by cfg attributes inside.
pub mod adapters;
