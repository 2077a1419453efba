//! Centralized event definitions
//!
//! Game telemetry arrives over the wire, is decoded by the telemetry plugin,
//! and enters the engine exclusively as these events. Systems never read the
//! wire format directly.

use bevy::prelude::*;

/// How a finished map was graded by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishRank {
    Cleared,
    Failed,
    Quit,
}

/// One decoded telemetry fact.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    MenuEntered,
    MapStarted {
        bpm: f32,
        song_time_offset_ms: f32,
        is_360: bool,
        is_90: bool,
    },
    MapPaused,
    MapResumed,
    MapFinished(FinishRank),
    NoteHit,
    NoteMissed,
    BombHit,
    WallEntered,
    WallExited,
    ComboUpdated(u32),
    RingsZoomPulse,
}
