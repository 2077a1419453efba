use crate::engine::delay::FovDelayer;
use crate::engine::rig::{CameraRig, MapPhaseSnapshot};
use crate::engine::source::EffectSource;
use crate::events::GameEvent;
use crate::prelude::*;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

#[derive(Resource, Deref, DerefMut, Debug, Clone, PartialEq)]
pub struct SharedRng(pub ChaCha8Rng);

impl SharedRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::default(),
        }
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_rng(&mut rand::rng()))
    }
}

/// Everything the engine knows about the current map, mirrored from
/// telemetry events.
#[derive(Resource, Debug, Clone)]
pub struct MapState {
    pub is_map_phase: bool,
    pub is_360: bool,
    pub is_90: bool,
    pub paused: bool,
    pub bpm: f32,
    pub time_between_beats: f32,
    /// Seconds the beat grid is shifted relative to audio start.
    pub song_time_offset: f32,
    pub elapsed_map_time: f32,
    pub elapsed_beats: f32,
    pub current_combo: u32,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            is_map_phase: false,
            is_360: false,
            is_90: false,
            paused: false,
            bpm: 120.0,
            time_between_beats: 0.5,
            song_time_offset: 0.0,
            elapsed_map_time: 0.0,
            elapsed_beats: 0.0,
            current_combo: 0,
        }
    }
}

impl MapState {
    pub fn set_bpm(&mut self, bpm: f32) {
        if bpm > 0.0 {
            self.bpm = bpm;
            self.time_between_beats = 60.0 / bpm;
        } else {
            warn!("ignoring non-positive bpm {bpm}");
        }
    }

    pub fn is_map_playing(&self) -> bool {
        self.is_map_phase && !self.paused
    }

    /// Establishes song parameters at map start. The beat grid is shifted by
    /// the song time offset, so the elapsed counters start in the negative
    /// and reach zero when the first beat lands.
    pub fn start_map(&mut self, bpm: f32, song_time_offset: f32, is_360: bool, is_90: bool) {
        self.is_map_phase = true;
        self.set_bpm(bpm);
        self.song_time_offset = song_time_offset;
        self.elapsed_map_time = -self.song_time_offset;
        self.elapsed_beats = self.elapsed_map_time / self.time_between_beats;
        self.is_360 = is_360;
        self.is_90 = is_90;
    }

    /// Back to menu defaults. Map parameters are re-established by the next
    /// map-start event.
    pub fn menu_reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase_snapshot(&self) -> MapPhaseSnapshot {
        MapPhaseSnapshot {
            is_map_phase: self.is_map_phase,
            is_360: self.is_360,
            is_90: self.is_90,
        }
    }
}

/// Per-tick advancement in both counting units, derived once per frame and
/// read by every accumulation system.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct TickDelta {
    pub seconds: f32,
    pub beats: f32,
}

/// Monotonic session time, accumulated from tick deltas. Drives the FOV
/// delay buffer so behavior does not depend on wall clock.
#[derive(Resource, Deref, DerefMut, Debug, Default, Clone, Copy, PartialEq)]
pub struct SessionClock(pub f64);

#[derive(Resource, Deref, DerefMut, Debug, Clone)]
pub struct SceneCameras(pub CameraRig);

#[derive(Resource, Deref, DerefMut, Debug, Default, Clone)]
pub struct EffectSources(pub Vec<EffectSource>);

#[derive(Resource, Deref, DerefMut, Debug, Default, Clone)]
pub struct FovDelay(pub FovDelayer);

/// The pose handed to the capture host every frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov: 80.0,
        }
    }
}

/// FOV multiplier shared with the broadcast server thread.
#[derive(Resource, Debug, Clone)]
pub struct FoveBroadcast {
    value: Arc<Mutex<f32>>,
}

impl Default for FoveBroadcast {
    fn default() -> Self {
        Self {
            value: Arc::new(Mutex::new(1.0)),
        }
    }
}

impl FoveBroadcast {
    pub fn handle(&self) -> Arc<Mutex<f32>> {
        Arc::clone(&self.value)
    }

    pub fn set(&self, value: f32) {
        if let Ok(mut guard) = self.value.lock() {
            *guard = value;
        }
    }

    pub fn get(&self) -> f32 {
        self.value.lock().map(|guard| *guard).unwrap_or(1.0)
    }
}

/// Receiving end of the telemetry channel. The receiver itself is not Sync,
/// so it sits behind a mutex; only the inbox system locks it.
#[derive(Resource)]
pub struct TelemetryInbox(pub Mutex<Receiver<GameEvent>>);

/// Cloneable sender handed to network threads (and to tests).
#[derive(Resource, Clone)]
pub struct TelemetrySender(pub Sender<GameEvent>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_rng_deterministic_with_seed() {
        let seed = 12345u64;
        let mut rng1 = SharedRng::from_seed(seed);
        let mut rng2 = SharedRng::from_seed(seed);

        let values1: Vec<f64> = (0..10).map(|_| rng1.random_range(0.0..1.0)).collect();
        let values2: Vec<f64> = (0..10).map(|_| rng2.random_range(0.0..1.0)).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_shared_rng_from_optional_seed() {
        let seed = 54321u64;
        let mut rng_with_seed = SharedRng::from_optional_seed(Some(seed));
        let mut rng_with_same_seed = SharedRng::from_seed(seed);

        let value1: f64 = rng_with_seed.random_range(0.0..1.0);
        let value2: f64 = rng_with_same_seed.random_range(0.0..1.0);

        assert_eq!(value1, value2);
    }

    #[test]
    fn bpm_drives_beat_length() {
        let mut state = MapState::default();
        state.set_bpm(150.0);
        assert!((state.time_between_beats - 0.4).abs() < 1e-6);

        state.set_bpm(0.0);
        assert_eq!(state.bpm, 150.0, "non-positive bpm is ignored");
    }

    #[test]
    fn map_start_seeds_elapsed_counters_from_the_song_offset() {
        let mut state = MapState::default();
        state.start_map(120.0, 0.25, false, true);

        assert!(state.is_map_phase);
        assert!(state.is_90);
        assert!((state.elapsed_map_time + 0.25).abs() < 1e-6);
        assert!((state.elapsed_beats + 0.5).abs() < 1e-6);
    }

    #[test]
    fn menu_reset_restores_defaults() {
        let mut state = MapState {
            is_map_phase: true,
            is_360: true,
            elapsed_beats: 64.0,
            current_combo: 51,
            ..MapState::default()
        };
        state.menu_reset();
        assert_eq!(state.current_combo, 0);
        assert!(!state.is_map_phase);
        assert_eq!(state.bpm, 120.0);
    }

    #[test]
    fn broadcast_value_round_trips_through_the_shared_handle() {
        let broadcast = FoveBroadcast::default();
        let handle = broadcast.handle();
        broadcast.set(1.25);
        assert_eq!(*handle.lock().unwrap(), 1.25);
    }
}
