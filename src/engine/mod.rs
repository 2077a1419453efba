//! Core camera-behavior machinery
//!
//! Plain data structures and algorithms with no scheduling concerns; the
//! plugins under `crate::plugins` drive them from game telemetry.

pub mod curve;
pub mod delay;
pub mod effect;
pub mod look;
pub mod rig;
pub mod source;
pub mod transition;
