//! Beatcam library
//!
//! This provides the core functionality of beatcam as a library
//! to enable integration testing.

pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod plugins;
pub mod prelude;
pub mod resources;
pub mod states;
