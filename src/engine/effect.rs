//! Camera effects - one animated modifier per instance
//!
//! An effect wraps a single [`Transition`] and knows which camera quantity it
//! drives. Effect sources trigger and untrigger effects; the engine applies
//! each effect's current value onto the active camera look once per frame.

use crate::engine::curve::CurveKind;
use crate::engine::look::{CameraLook, ChangeMode};
use crate::engine::transition::Transition;
use bevy::log::debug;
use bevy::math::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Guard against dividing camera multipliers by a value near zero.
const MULTIPLIER_EPSILON: f32 = 1e-4;

/// Which camera quantity the effect drives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Disable,
    /// Value selects the switch target: -1 next suitable, -2 random suitable,
    /// -3 no change, any non-negative value a specific roster index.
    CameraChange,
    Fove,
    Zoom,
    RotationTilt,
    RotationHorizontal,
    RotationVertical,
    PositionForward,
    PositionHorizontal,
    PositionVertical,
}

impl EffectKind {
    /// Neutral value for the quantity: multipliers rest at 1, the switch
    /// request at "no change", everything else at 0.
    pub fn default_value(self) -> f32 {
        match self {
            EffectKind::Fove | EffectKind::Zoom => 1.0,
            EffectKind::CameraChange => -3.0,
            _ => 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerMode {
    #[default]
    InstantChange,
    OneWay,
    TwoWay,
    /// Jump to the target, then decay back to the default value. A "shake" is
    /// a pulse with `is_periodic` set.
    Pulse,
}

#[derive(Debug, Clone)]
pub struct CameraEffect {
    pub kind: EffectKind,
    pub mode: TriggerMode,
    pub default_value: f32,
    pub intensity: f32,
    pub use_random_values: bool,
    pub allow_negative_random_values: bool,
    pub is_relative_to_default_value: bool,
    pub is_periodic: bool,
    pub phasing_speed: f32,
    pub current_phase: f32,
    pub transition: Transition,
}

impl CameraEffect {
    pub fn new(kind: EffectKind, curve: CurveKind) -> Self {
        Self::with_default_value(kind, kind.default_value(), curve)
    }

    pub fn with_default_value(kind: EffectKind, default_value: f32, curve: CurveKind) -> Self {
        Self {
            kind,
            mode: TriggerMode::default(),
            default_value,
            intensity: 1.5,
            use_random_values: false,
            allow_negative_random_values: false,
            is_relative_to_default_value: false,
            is_periodic: false,
            phasing_speed: 32.0,
            current_phase: 0.0,
            transition: Transition::new(curve, default_value),
        }
    }

    /// The value the effect contributes this frame. Periodic effects use the
    /// transition value as an envelope around a sine oscillation.
    pub fn current_value(&self) -> f32 {
        if self.is_periodic {
            self.transition.current() * (self.current_phase * self.phasing_speed).sin()
        } else {
            self.transition.current()
        }
    }

    /// Advances the transition and, for periodic effects, the oscillation
    /// phase.
    pub fn tick(&mut self, delta_seconds: f32) {
        self.transition.tick(delta_seconds);
        if self.is_periodic {
            self.current_phase += delta_seconds;
        }
    }

    pub fn trigger(&mut self, rng: &mut impl Rng) {
        let target = self.generate_target_value(rng);
        debug!(
            "camera effect triggered: {:?} from {} to {}",
            self.kind,
            self.current_value(),
            target
        );

        match self.mode {
            TriggerMode::InstantChange => self.transition.set_value(target),
            TriggerMode::OneWay | TriggerMode::TwoWay => {
                self.transition.start_transition_to(target);
            }
            TriggerMode::Pulse => {
                self.transition.set_value(target);
                self.transition.start_transition_to(self.default_value);
            }
        }
    }

    pub fn untrigger(&mut self) {
        match self.mode {
            TriggerMode::TwoWay | TriggerMode::Pulse => {
                self.transition.start_transition_to(self.default_value);
            }
            TriggerMode::InstantChange | TriggerMode::OneWay => {
                self.transition.set_value(self.default_value);
            }
        }
    }

    /// Hard reset used at map and menu boundaries: snap to default, cancel
    /// any in-flight transition, zero the oscillation phase.
    pub fn reset(&mut self) {
        self.transition.set_value(self.default_value);
        self.transition.cancel();
        self.current_phase = 0.0;
    }

    fn generate_target_value(&self, rng: &mut impl Rng) -> f32 {
        let mut target = if self.use_random_values && self.intensity > 0.0 {
            let low = if self.allow_negative_random_values {
                -self.intensity
            } else {
                0.0
            };
            rng.random_range(low..self.intensity)
        } else {
            self.intensity
        };

        if self.is_relative_to_default_value {
            target += self.default_value;
        }

        target
    }

    /// Folds the effect's current value into the look's per-frame aggregates.
    /// Called once per frame per effect by the compose step; no other code
    /// mutates the look's accumulator fields.
    pub fn apply(&self, look: &mut CameraLook) {
        let value = self.current_value();
        match self.kind {
            EffectKind::Disable => {}
            EffectKind::CameraChange => {
                let mode = match value.round() as i64 {
                    -1 => Some(ChangeMode::NextSuitable),
                    -2 => Some(ChangeMode::RandomSuitable),
                    index if index >= 0 => Some(ChangeMode::ToSpecified(index as usize)),
                    _ => None, // -3 and below: no change requested
                };
                if let Some(mode) = mode {
                    look.switch_request.mode = mode;
                    look.switch_request.speed = self.transition.speed;
                }
            }
            EffectKind::Fove => {
                if value.abs() > MULTIPLIER_EPSILON {
                    look.fove_multiplier /= value;
                }
            }
            EffectKind::Zoom => {
                if value.abs() > MULTIPLIER_EPSILON {
                    look.zoom_multiplier /= value;
                }
            }
            EffectKind::RotationTilt => {
                look.effects_rotation *=
                    Quat::from_axis_angle(look.forward(), value.to_radians());
            }
            EffectKind::RotationHorizontal => {
                look.effects_rotation *= Quat::from_axis_angle(Vec3::Y, value.to_radians());
            }
            EffectKind::RotationVertical => {
                let axis = look.forward().cross(Vec3::Y).normalize_or_zero();
                look.effects_rotation *= Quat::from_axis_angle(axis, value.to_radians());
            }
            EffectKind::PositionForward => {
                look.effects_vector += value * look.forward();
            }
            EffectKind::PositionHorizontal => {
                look.effects_vector += value * look.forward().cross(Vec3::Y).normalize_or_zero();
            }
            EffectKind::PositionVertical => {
                look.effects_vector += value * Vec3::Y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn instant_change_applies_within_the_same_tick() {
        let mut effect = CameraEffect::new(EffectKind::Zoom, CurveKind::ExpOut);
        effect.mode = TriggerMode::InstantChange;
        effect.intensity = 2.0;
        effect.trigger(&mut rng());
        assert_eq!(effect.current_value(), 2.0);
    }

    #[test]
    fn pulse_spikes_then_decays_to_default() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::PositionVertical, 0.0, CurveKind::ExpOut);
        effect.mode = TriggerMode::Pulse;
        effect.intensity = 2.0;
        effect.transition.speed = 1.0;

        effect.trigger(&mut rng());
        assert_eq!(effect.current_value(), 2.0, "spike lands immediately");

        effect.tick(0.5);
        let halfway = effect.current_value();
        assert!(halfway < 2.0 && halfway > 0.0);

        effect.tick(0.5); // progress reaches 1, clamps to default
        assert_eq!(effect.current_value(), 0.0);
    }

    #[test]
    fn two_way_returns_on_untrigger() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::RotationTilt, 0.0, CurveKind::Linear);
        effect.mode = TriggerMode::TwoWay;
        effect.intensity = 10.0;
        effect.transition.speed = 1.0;

        effect.trigger(&mut rng());
        effect.tick(1.0);
        assert_eq!(effect.current_value(), 10.0);

        effect.untrigger();
        effect.tick(1.0);
        assert_eq!(effect.current_value(), 0.0);
    }

    #[test]
    fn one_way_snaps_back_on_untrigger() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::PositionForward, 0.0, CurveKind::Linear);
        effect.mode = TriggerMode::OneWay;
        effect.intensity = 3.0;
        effect.transition.speed = 1.0;

        effect.trigger(&mut rng());
        effect.tick(1.0);
        assert_eq!(effect.current_value(), 3.0);

        effect.untrigger();
        assert_eq!(effect.current_value(), 0.0);
    }

    #[test]
    fn periodic_value_is_enveloped_sine() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::PositionHorizontal, 0.0, CurveKind::Linear);
        effect.is_periodic = true;
        effect.phasing_speed = 1.0;
        effect.transition.set_value(2.0);
        effect.current_phase = std::f32::consts::FRAC_PI_2;
        assert!((effect.current_value() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn random_targets_stay_within_intensity_bounds() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::PositionVertical, 0.0, CurveKind::Linear);
        effect.mode = TriggerMode::InstantChange;
        effect.intensity = 1.5;
        effect.use_random_values = true;
        effect.allow_negative_random_values = true;

        let mut rng = rng();
        for _ in 0..100 {
            effect.trigger(&mut rng);
            let value = effect.current_value();
            assert!((-1.5..1.5).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn reset_zeroes_phase_and_cancels_transition() {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::RotationTilt, 0.0, CurveKind::Linear);
        effect.mode = TriggerMode::TwoWay;
        effect.is_periodic = true;
        effect.trigger(&mut rng());
        effect.tick(0.25);

        effect.reset();
        assert_eq!(effect.current_value(), 0.0);
        assert_eq!(effect.current_phase, 0.0);
        assert!(!effect.transition.is_transitioning());
    }
}
