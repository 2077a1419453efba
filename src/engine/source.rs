//! Effect sources - event-driven trigger rules
//!
//! A source owns a set of camera effects and fires them when its counter
//! crosses a boundary, or directly off a discrete game event. Counter units
//! are seconds, beats, notes, or combo depending on the source kind.

use crate::engine::effect::CameraEffect;
use crate::engine::look::CameraLook;
use bevy::log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    OnSongStart,
    OnSongEnd,

    OnNthSecond,
    OnNthBeat,
    OnNthCombo,

    EveryNthSecond,
    EveryNthBeat,
    EveryNthCombo,

    XnComboBreak,
    NthNoteMiss,
    NthNoteHit,
    NthBombHit,
    WallStuck,

    RingsZoom,
}

impl SourceKind {
    /// Repeating kinds fire on every crossed period boundary; one-shot kinds
    /// fire once when the first threshold is crossed and then stay quiet
    /// until reset.
    pub fn is_repeating(self) -> bool {
        matches!(
            self,
            SourceKind::EveryNthSecond
                | SourceKind::EveryNthBeat
                | SourceKind::EveryNthCombo
                | SourceKind::NthNoteMiss
                | SourceKind::NthNoteHit
                | SourceKind::NthBombHit
                | SourceKind::RingsZoom
        )
    }

    pub fn counts_seconds(self) -> bool {
        matches!(self, SourceKind::OnNthSecond | SourceKind::EveryNthSecond)
    }

    pub fn counts_beats(self) -> bool {
        matches!(self, SourceKind::OnNthBeat | SourceKind::EveryNthBeat)
    }

    pub fn counts_combo(self) -> bool {
        matches!(self, SourceKind::OnNthCombo | SourceKind::EveryNthCombo)
    }
}

#[derive(Debug, Clone)]
pub struct EffectSource {
    pub kind: SourceKind,
    pub use_in_menu: bool,
    pub is_global: bool,

    /// Period (or threshold) in the kind's units.
    pub rarity: f32,
    /// Shifts the first boundary.
    pub offset: f32,
    /// Auto-untrigger window counted from the most recent trigger, in the
    /// same units as `rarity`. `None` disables it.
    pub duration: Option<f32>,

    current_count: f32,
    current_duration: Option<f32>,

    pub effects: Vec<CameraEffect>,
}

impl EffectSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            use_in_menu: false,
            is_global: false,
            rarity: 1.0,
            offset: 0.0,
            duration: None,
            current_count: 0.0,
            current_duration: None,
            effects: Vec::new(),
        }
    }

    pub fn current_count(&self) -> f32 {
        self.current_count
    }

    pub fn is_triggered(&self) -> bool {
        self.current_duration.is_some()
    }

    pub fn trigger(&mut self, rng: &mut impl Rng) {
        debug!(
            "effect source triggered: {:?}, rarity {}",
            self.kind, self.rarity
        );
        self.current_duration = Some(0.0);
        for effect in &mut self.effects {
            effect.trigger(rng);
        }
    }

    pub fn untrigger(&mut self) {
        self.current_duration = None;
        for effect in &mut self.effects {
            effect.untrigger();
        }
    }

    /// Clears triggered state and counters. Global sources ignore non-forced
    /// resets so ambient periodic effects survive map and menu boundaries.
    pub fn reset(&mut self, forced: bool) {
        if self.is_global && !forced {
            return;
        }
        self.untrigger();
        self.current_count = 0.0;
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Ticks every owned effect's transition (and oscillation phase).
    pub fn tick_effects(&mut self, delta_seconds: f32) {
        for effect in &mut self.effects {
            effect.tick(delta_seconds);
        }
    }

    /// Accumulates `delta` units, auto-untriggering once the duration window
    /// since the last trigger is exceeded, then checks for a boundary
    /// crossing per the kind's firing policy.
    pub fn add_units(&mut self, delta: f32, rng: &mut impl Rng) {
        if let (Some(window), Some(elapsed)) = (self.duration, self.current_duration.as_mut()) {
            *elapsed += delta;
            if *elapsed >= window {
                self.untrigger();
            }
        }

        self.check_units(self.current_count + delta, rng);
        self.current_count += delta;
    }

    /// Checks a reported absolute count (combo kinds) against the stored
    /// counter, then adopts it as the new counter.
    pub fn observe_count(&mut self, count: f32, rng: &mut impl Rng) {
        self.check_units(count, rng);
        self.current_count = count;
    }

    fn check_units(&mut self, new_count: f32, rng: &mut impl Rng) {
        if self.kind.is_repeating() {
            // Only a single crossed boundary is detected per step: a delta
            // that skips several multiples of `rarity` at once still fires
            // one trigger.
            let before = ((self.current_count - self.offset) / self.rarity).floor() as i64;
            let after = ((new_count - self.offset) / self.rarity).floor() as i64;
            if before < after {
                self.trigger(rng);
            }
        } else if self.current_count - self.offset < self.rarity
            && new_count - self.offset >= self.rarity
        {
            self.trigger(rng);
        }
    }

    /// Lost-combo threshold check for combo-break sources.
    pub fn on_combo_break(&mut self, lost_combo: u32, rng: &mut impl Rng) {
        if lost_combo as f32 > self.rarity {
            self.trigger(rng);
        }
    }

    /// Folds every owned effect into the look's per-frame aggregates.
    pub fn apply(&self, look: &mut CameraLook) {
        for effect in &self.effects {
            effect.apply(look);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::curve::CurveKind;
    use crate::engine::effect::{EffectKind, TriggerMode};
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn tracer_effect() -> CameraEffect {
        let mut effect =
            CameraEffect::with_default_value(EffectKind::PositionVertical, 0.0, CurveKind::Linear);
        effect.mode = TriggerMode::InstantChange;
        effect.intensity = 1.0;
        effect
    }

    fn trigger_count(source: &EffectSource) -> bool {
        source.effects[0].current_value() != 0.0
    }

    #[test]
    fn repeating_source_fires_on_each_period_boundary() {
        let mut source = EffectSource::new(SourceKind::EveryNthBeat);
        source.rarity = 4.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        let mut fired_at = Vec::new();
        for beat in 1..=8 {
            source.effects[0].reset();
            source.add_units(1.0, &mut rng);
            if trigger_count(&source) {
                fired_at.push(beat);
            }
        }
        assert_eq!(fired_at, vec![4, 8]);
    }

    #[test]
    fn one_shot_source_fires_exactly_once() {
        let mut source = EffectSource::new(SourceKind::OnNthBeat);
        source.rarity = 8.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        let mut fired_at = Vec::new();
        for beat in 1..=16 {
            source.effects[0].reset();
            source.add_units(1.0, &mut rng);
            if trigger_count(&source) {
                fired_at.push(beat);
            }
        }
        assert_eq!(fired_at, vec![8]);
    }

    #[test]
    fn repeating_source_detects_single_boundary_per_step() {
        // Documented behavior: a delta spanning several periods still fires
        // only once.
        let mut source = EffectSource::new(SourceKind::EveryNthBeat);
        source.rarity = 2.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        source.add_units(9.0, &mut rng);
        assert!(trigger_count(&source));

        source.effects[0].reset();
        source.add_units(1.0, &mut rng); // crosses the 10-beat boundary
        assert!(trigger_count(&source));
    }

    #[test]
    fn offset_shifts_the_first_boundary() {
        let mut source = EffectSource::new(SourceKind::EveryNthBeat);
        source.rarity = 4.0;
        source.offset = 2.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        let mut fired_at = Vec::new();
        for beat in 1..=10 {
            source.effects[0].reset();
            source.add_units(1.0, &mut rng);
            if trigger_count(&source) {
                fired_at.push(beat);
            }
        }
        assert_eq!(fired_at, vec![6, 10]);
    }

    #[test]
    fn duration_window_auto_untriggers() {
        let mut source = EffectSource::new(SourceKind::EveryNthSecond);
        source.rarity = 10.0;
        source.duration = Some(2.0);
        source.effects.push(tracer_effect());
        let mut rng = rng();

        source.add_units(10.0, &mut rng);
        assert!(source.is_triggered());
        assert!(trigger_count(&source));

        source.add_units(1.0, &mut rng);
        assert!(source.is_triggered(), "window not yet exceeded");

        // the window expires well before the next boundary at 20 units, so
        // the only way out of the triggered state is the auto-untrigger
        source.add_units(3.0, &mut rng);
        assert!(!source.is_triggered());
        assert!(!trigger_count(&source), "effect snapped back to default");
    }

    #[test]
    fn combo_break_threshold_gates_trigger() {
        let mut source = EffectSource::new(SourceKind::XnComboBreak);
        source.rarity = 10.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        source.on_combo_break(5, &mut rng);
        assert!(!trigger_count(&source));

        source.on_combo_break(25, &mut rng);
        assert!(trigger_count(&source));
    }

    #[test]
    fn combo_observation_adopts_the_reported_count() {
        let mut source = EffectSource::new(SourceKind::EveryNthCombo);
        source.rarity = 10.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        source.observe_count(9.0, &mut rng);
        assert!(!trigger_count(&source));

        source.observe_count(11.0, &mut rng);
        assert!(trigger_count(&source));

        // same combo region reported again must not re-fire
        source.effects[0].reset();
        source.observe_count(12.0, &mut rng);
        assert!(!trigger_count(&source));
    }

    #[test]
    fn global_sources_ignore_soft_resets() {
        let mut source = EffectSource::new(SourceKind::EveryNthBeat);
        source.is_global = true;
        source.rarity = 4.0;
        source.effects.push(tracer_effect());
        let mut rng = rng();

        source.add_units(3.0, &mut rng);
        source.reset(false);
        assert_eq!(source.current_count(), 3.0, "counter survives soft reset");

        source.reset(true);
        assert_eq!(source.current_count(), 0.0, "forced reset clears it");
    }
}
