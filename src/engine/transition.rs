//! Per-quantity animated value with a one-shot completion signal

use crate::engine::curve::CurveKind;

/// A single animated scalar. Owned exclusively by one camera effect or by the
/// rig's switch state; only the owner ticks it.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: CurveKind,
    pub speed: f32,
    current: f32,
    old: f32,
    target: f32,
    progress: f32,
    transitioning: bool,
    just_completed: bool,
}

impl Transition {
    pub fn new(kind: CurveKind, initial: f32) -> Self {
        Self {
            kind,
            speed: 1.0,
            current: initial,
            old: initial,
            target: initial,
            progress: 0.0,
            transitioning: false,
            just_completed: false,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Instantaneous assignment, bypassing the curve entirely.
    pub fn set_value(&mut self, value: f32) {
        self.current = value;
    }

    /// Cancels any in-flight transition without moving the current value.
    pub fn cancel(&mut self) {
        self.transitioning = false;
        self.just_completed = false;
    }

    /// Retargeting mid-transition is supported and expected: the new
    /// transition starts fresh from the *current* value.
    pub fn start_transition_to(&mut self, target: f32) {
        self.old = self.current;
        self.target = target;
        self.progress = 0.0;
        self.transitioning = true;
    }

    /// Advances the transition. No-op when idle. Raises the one-shot
    /// completion signal when progress saturates.
    pub fn tick(&mut self, delta_seconds: f32) {
        if !self.transitioning {
            return;
        }

        self.progress += delta_seconds * self.speed;
        self.current = self.kind.blend(self.old, self.target, self.progress);

        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.current = self.target;
            self.transitioning = false;
            self.just_completed = true;
        }
    }

    /// Consumes the completion signal. Returns true exactly once per
    /// completed transition.
    pub fn take_just_completed(&mut self) -> bool {
        std::mem::take(&mut self.just_completed)
    }
}
