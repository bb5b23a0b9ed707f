//! TankBot controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; host builds run
//! against in-memory peripheral simulations.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod net;
pub mod pins;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod sensors;
