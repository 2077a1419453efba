//! Camera rig - the roster of looks and the switch state machine
//!
//! The roster is fixed at startup. At most one switch is in flight at a time;
//! while it runs, the emitted pose blends the current and target looks and
//! new switch requests are dropped.

use crate::engine::curve::CurveKind;
use crate::engine::look::{CameraLook, ChangeMode, SwitchRequest, UsageFlags};
use crate::engine::transition::Transition;
use bevy::log::{debug, warn};
use bevy::math::Vec3;
use rand::Rng;

/// Game-phase facts a look's usage flags are checked against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapPhaseSnapshot {
    pub is_map_phase: bool,
    pub is_360: bool,
    pub is_90: bool,
}

impl MapPhaseSnapshot {
    pub fn allows(&self, usage: &UsageFlags) -> bool {
        if !self.is_map_phase {
            usage.menu
        } else if self.is_360 {
            usage.song_360
        } else if self.is_90 {
            usage.song_90
        } else {
            usage.normal_song
        }
    }
}

/// An in-flight camera switch. The transition runs 0 to 1 and doubles as the
/// blend weight toward the target look.
#[derive(Debug, Clone)]
pub struct CameraSwitch {
    pub target: usize,
    pub transition: Transition,
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    looks: Vec<CameraLook>,
    current: usize,
    switch: Option<CameraSwitch>,
}

impl CameraRig {
    /// Builds a rig from a roster. An empty roster gets a single default
    /// look so the engine always has a pose to emit.
    pub fn new(looks: Vec<CameraLook>) -> Self {
        let looks = if looks.is_empty() {
            warn!("empty camera roster, substituting a single default look");
            vec![CameraLook::new(Vec3::new(0.0, 1.7, -3.0), Vec3::new(0.0, 1.7, 0.0))]
        } else {
            looks
        };
        Self {
            looks,
            current: 0,
            switch: None,
        }
    }

    pub fn looks(&self) -> &[CameraLook] {
        &self.looks
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_look(&self) -> &CameraLook {
        &self.looks[self.current]
    }

    pub fn current_look_mut(&mut self) -> &mut CameraLook {
        &mut self.looks[self.current]
    }

    pub fn is_switching(&self) -> bool {
        self.switch.is_some()
    }

    pub fn switch_target(&self) -> Option<usize> {
        self.switch.as_ref().map(|switch| switch.target)
    }

    /// Largest base field of view across the roster. The emitted pose always
    /// carries this value; per-look framing travels as a multiplier instead.
    pub fn max_base_fov(&self) -> f32 {
        self.looks
            .iter()
            .map(|look| look.base_fov)
            .fold(f32::MIN, f32::max)
    }

    /// Consumes a switch request. No-op while a switch is already running,
    /// when nothing qualifies, or when the request resolves to the current
    /// look.
    pub fn resolve_request(
        &mut self,
        request: SwitchRequest,
        phase: MapPhaseSnapshot,
        rng: &mut impl Rng,
    ) {
        if self.switch.is_some() {
            return;
        }

        let target = match request.mode {
            ChangeMode::NotChanging => return,
            ChangeMode::ToSpecified(index) => {
                if index < self.looks.len() {
                    index
                } else {
                    warn!(
                        "switch target {index} outside roster of {}, picking next suitable",
                        self.looks.len()
                    );
                    self.search_from(self.current, false, phase)
                }
            }
            ChangeMode::NextSuitable => self.search_from(self.current, false, phase),
            ChangeMode::RandomSuitable => {
                self.search_from(rng.random_range(0..self.looks.len()), false, phase)
            }
            ChangeMode::NextAny => self.search_from(self.current, true, phase),
            ChangeMode::RandomAny => {
                self.search_from(rng.random_range(0..self.looks.len()), true, phase)
            }
        };

        if target == self.current {
            return;
        }

        debug!(
            "camera switch: {} -> {} at speed {}",
            self.current, target, request.speed
        );
        let mut transition = Transition::new(CurveKind::ExpOut, 0.0);
        transition.speed = request.speed;
        transition.start_transition_to(1.0);
        self.switch = Some(CameraSwitch { target, transition });
    }

    /// Picks the first qualifying index after `start`, visiting each roster
    /// slot at most once and never the current look. Falls back to the
    /// current index when nothing qualifies, which callers treat as
    /// "no switch".
    fn search_from(&self, start: usize, ignore_usage: bool, phase: MapPhaseSnapshot) -> usize {
        let count = self.looks.len();
        for step in 1..=count {
            let index = (start + step) % count;
            if index == self.current {
                continue;
            }
            if ignore_usage || phase.allows(&self.looks[index].usage) {
                return index;
            }
        }
        self.current
    }

    /// Advances the switch blend; on completion promotes the target look to
    /// current. Returns true on the completing tick.
    pub fn tick_switch(&mut self, delta_seconds: f32) -> bool {
        let Some(switch) = self.switch.as_mut() else {
            return false;
        };

        switch.transition.tick(delta_seconds);
        if switch.transition.take_just_completed() {
            self.current = switch.target;
            self.switch = None;
            debug!("camera switch complete, now at {}", self.current);
            return true;
        }
        false
    }

    /// Scratch look blending current toward the switch target at the current
    /// switch progress. `None` when no switch is running.
    pub fn blended_scratch(&self) -> Option<CameraLook> {
        let switch = self.switch.as_ref()?;
        Some(
            self.looks[self.current]
                .blended_with(&self.looks[switch.target], switch.transition.current()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    fn song_phase() -> MapPhaseSnapshot {
        MapPhaseSnapshot {
            is_map_phase: true,
            is_360: false,
            is_90: false,
        }
    }

    fn look_at(x: f32, menu_only: bool) -> CameraLook {
        let mut look = CameraLook::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO);
        if menu_only {
            look.usage = UsageFlags {
                menu: true,
                normal_song: false,
                song_360: false,
                song_90: false,
            };
        }
        look
    }

    fn three_look_rig() -> CameraRig {
        // only index 1 is usable during a normal song
        CameraRig::new(vec![
            look_at(0.0, true),
            look_at(1.0, false),
            look_at(2.0, true),
        ])
    }

    #[test]
    fn random_suitable_finds_the_only_candidate_regardless_of_seed() {
        for seed in 0..16 {
            let mut rig = three_look_rig();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rig.resolve_request(
                SwitchRequest {
                    mode: ChangeMode::RandomSuitable,
                    speed: 1.0,
                },
                song_phase(),
                &mut rng,
            );
            assert_eq!(rig.switch_target(), Some(1), "seed {seed}");
        }
    }

    #[test]
    fn out_of_range_target_falls_back_to_next_suitable() {
        let mut rig = three_look_rig();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::ToSpecified(17),
                speed: 1.0,
            },
            song_phase(),
            &mut rng,
        );
        assert_eq!(rig.switch_target(), Some(1));
    }

    #[test]
    fn search_terminates_when_nothing_qualifies() {
        // all looks menu-only, checked during a song
        let mut rig = CameraRig::new(vec![look_at(0.0, true), look_at(1.0, true)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::NextSuitable,
                speed: 1.0,
            },
            song_phase(),
            &mut rng,
        );
        assert!(!rig.is_switching());
        assert_eq!(rig.current_index(), 0);
    }

    #[test]
    fn ignore_usage_modes_skip_only_the_current_look() {
        let mut rig = three_look_rig();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::NextAny,
                speed: 1.0,
            },
            song_phase(),
            &mut rng,
        );
        assert_eq!(rig.switch_target(), Some(1));
    }

    #[test]
    fn completion_promotes_the_target() {
        let mut rig = three_look_rig();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::ToSpecified(1),
                speed: 2.0,
            },
            song_phase(),
            &mut rng,
        );
        assert!(rig.is_switching());

        assert!(!rig.tick_switch(0.25));
        assert!(rig.is_switching());
        assert!(rig.tick_switch(0.25)); // progress saturates at 0.5 * speed 2
        assert_eq!(rig.current_index(), 1);
        assert!(!rig.is_switching());
    }

    #[test]
    fn requests_are_dropped_while_a_switch_is_running() {
        let mut rig = CameraRig::new(vec![
            look_at(0.0, false),
            look_at(1.0, false),
            look_at(2.0, false),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::ToSpecified(1),
                speed: 0.1,
            },
            song_phase(),
            &mut rng,
        );
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::ToSpecified(2),
                speed: 0.1,
            },
            song_phase(),
            &mut rng,
        );
        assert_eq!(rig.switch_target(), Some(1));
    }

    #[test]
    fn blended_scratch_tracks_switch_progress() {
        let mut rig = CameraRig::new(vec![look_at(0.0, false), look_at(4.0, false)]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        rig.resolve_request(
            SwitchRequest {
                mode: ChangeMode::ToSpecified(1),
                speed: 1.0,
            },
            song_phase(),
            &mut rng,
        );

        // force a known blend weight through the transition
        if let Some(switch) = rig.switch.as_mut() {
            switch.transition.set_value(0.5);
        }
        let scratch = rig.blended_scratch().unwrap();
        assert_eq!(scratch.position(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn max_base_fov_spans_the_roster() {
        let mut rig = three_look_rig();
        rig.looks[2].base_fov = 110.0;
        assert_eq!(rig.max_base_fov(), 110.0);
    }
}
