//! Beatcam prelude module
//!
//! This module re-exports the most commonly used types, traits, and functions
//! across the Beatcam application to reduce import boilerplate.

// External crate re-exports
pub use bevy::prelude::*;
pub use rand::Rng;

// Internal re-exports - Config
pub use crate::config::BeatcamConfig;

// Internal re-exports - States
pub use crate::states::MapPhase;

// Internal re-exports - Events
pub use crate::events::{FinishRank, GameEvent};

// Internal re-exports - Resources (most commonly used)
pub use crate::resources::{
    CameraPose, EffectSources, FovDelay, FoveBroadcast, MapState, SceneCameras, SessionClock,
    SharedRng, TickDelta,
};

// Internal re-exports - Engine
pub use crate::engine::rig::CameraRig;
