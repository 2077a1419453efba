//! Easing curves for effect and camera transitions
//!
//! Every animated quantity in the engine moves along one of these curves. The
//! curve shapes the normalized transition progress; `blend` then mixes the
//! endpoint values with the shaped progress.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurveKind {
    Linear,
    Cosine,
    Logistic,
    #[default]
    ExpOut,
    ExpIn,
}

impl CurveKind {
    /// Shapes normalized progress `t`. Not clamped outside `[0, 1]`; callers
    /// clamp `t` themselves when saturation is wanted.
    pub fn shape(self, t: f32) -> f32 {
        match self {
            CurveKind::Linear => t,
            CurveKind::Cosine => 0.5 - (PI * t).cos() / 2.0,
            CurveKind::Logistic => 1.0 - 1.0 / (1.0 + (24.0 * t - 12.0).exp()),
            CurveKind::ExpOut => 1.0 - (-8.0 * t).exp(),
            CurveKind::ExpIn => (-8.0 * (1.0 - t)).exp(),
        }
    }

    /// Blends `from` toward `to` at shaped progress `t`.
    pub fn blend(self, from: f32, to: f32, t: f32) -> f32 {
        let shaped = self.shape(t);
        from * (1.0 - shaped) + to * shaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [CurveKind; 5] = [
        CurveKind::Linear,
        CurveKind::Cosine,
        CurveKind::Logistic,
        CurveKind::ExpOut,
        CurveKind::ExpIn,
    ];

    #[test]
    fn endpoints_match_within_tolerance() {
        // The exponential kinds saturate to within e^-8 of the endpoint; the
        // owning transition clamps to the exact target on completion.
        for kind in KINDS {
            let at_start = kind.blend(0.0, 1.0, 0.0);
            let at_end = kind.blend(0.0, 1.0, 1.0);
            assert!(at_start.abs() < 1e-3, "{kind:?} start: {at_start}");
            assert!((at_end - 1.0).abs() < 1e-3, "{kind:?} end: {at_end}");
        }
    }

    #[test]
    fn midpoint_stays_between_endpoints_for_monotonic_kinds() {
        for kind in KINDS {
            let mid = kind.blend(0.0, 1.0, 0.5);
            assert!((0.0..=1.0).contains(&mid), "{kind:?} mid: {mid}");
        }
    }

    #[test]
    fn linear_is_identity_on_progress() {
        assert_eq!(CurveKind::Linear.blend(0.0, 10.0, 0.25), 2.5);
    }

    #[test]
    fn progress_is_not_clamped_outside_unit_interval() {
        // Linear extrapolates past the target; callers own clamping.
        assert!(CurveKind::Linear.blend(0.0, 1.0, 1.5) > 1.0);
    }

    #[test]
    fn serde_names_match_config_vocabulary() {
        let kind: CurveKind = serde_json_like("EXP_OUT");
        assert_eq!(kind, CurveKind::ExpOut);
    }

    fn serde_json_like(name: &str) -> CurveKind {
        toml::from_str::<std::collections::HashMap<String, CurveKind>>(&format!(
            "kind = \"{name}\""
        ))
        .unwrap()["kind"]
    }
}
