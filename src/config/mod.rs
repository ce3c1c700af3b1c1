//! Engine Configuration Module
//!
//! Provides the single configuration surface for the signal engine, loaded
//! from TOML and replacing every hardcoded threshold with an analyst-tunable
//! value.
//!
//! ## Loading Order
//!
//! 1. `ADSCOPE_CONFIG` environment variable (path to TOML file)
//! 2. `adscope.toml` in the current working directory
//! 3. Built-in defaults (`defaults.rs` plus per-family calibration)
//!
//! The config is passed explicitly to `SignalEngine::new`; nothing reads it
//! from global state, so two engines with different calibrations can run
//! side by side.

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;
