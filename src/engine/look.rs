//! Camera looks - named viewpoints and the per-frame composition point
//!
//! A look is a 3D pose (position + aim target) plus usage and constraint
//! metadata. Every active effect folds its value into the look's aggregate
//! fields each frame; `finish_applying_effects` then collapses the aggregates
//! into the final pose and returns them to neutral.

use bevy::math::{Mat3, Quat, Vec3};

/// Tolerance below which two multipliers count as equal.
const TOLERANCE: f32 = 1e-4;

/// How the next camera switch target is selected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    #[default]
    NotChanging,
    ToSpecified(usize),
    NextSuitable,
    RandomSuitable,
    NextAny,
    RandomAny,
}

/// Pending camera-switch request, written by camera-change effects and
/// consumed by the rig's switch resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchRequest {
    pub mode: ChangeMode,
    pub speed: f32,
}

impl Default for SwitchRequest {
    fn default() -> Self {
        Self {
            mode: ChangeMode::NotChanging,
            speed: 0.2,
        }
    }
}

/// Which game phases a look may be shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageFlags {
    pub menu: bool,
    pub normal_song: bool,
    pub song_360: bool,
    pub song_90: bool,
}

impl Default for UsageFlags {
    fn default() -> Self {
        Self {
            menu: true,
            normal_song: true,
            song_360: true,
            song_90: true,
        }
    }
}

impl UsageFlags {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.menu && self.normal_song && self.song_360 && self.song_90
    }

    pub fn is_all_songs(&self) -> bool {
        !self.menu && self.normal_song && self.song_360 && self.song_90
    }
}

/// Per-axis freeze flags for a pose component.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AxisConstraints {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisConstraints {
    /// Keeps the constrained components of `current`, takes the rest from
    /// `incoming`.
    fn mask(&self, current: Vec3, incoming: Vec3) -> Vec3 {
        Vec3::new(
            if self.x { current.x } else { incoming.x },
            if self.y { current.y } else { incoming.y },
            if self.z { current.z } else { incoming.z },
        )
    }
}

#[derive(Debug, Clone)]
pub struct CameraLook {
    pub alias: String,
    pub base_fov: f32,
    pub zoom_multiplier: f32,
    pub fove_multiplier: f32,
    pub usage: UsageFlags,
    pub constrain_position: AxisConstraints,
    pub constrain_target: AxisConstraints,
    pub follow_head_rotation: bool,
    pub follow_head_position_multiplier: f32,
    pub follow_head_target_multiplier: f32,
    pub switch_request: SwitchRequest,
    pub effects_vector: Vec3,
    pub effects_rotation: Quat,

    position: Vec3,
    position_backup: Vec3,
    target: Vec3,
    target_backup: Vec3,

    // derived, always consistent with position/target
    distance: f32,
    forward: Vec3,
    look_rotation: Quat,
}

impl CameraLook {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut look = Self {
            alias: String::new(),
            base_fov: 80.0,
            zoom_multiplier: 1.0,
            fove_multiplier: 1.0,
            usage: UsageFlags::default(),
            constrain_position: AxisConstraints::default(),
            constrain_target: AxisConstraints::default(),
            follow_head_rotation: false,
            follow_head_position_multiplier: 0.0,
            follow_head_target_multiplier: -1.0,
            switch_request: SwitchRequest::default(),
            effects_vector: Vec3::ZERO,
            effects_rotation: Quat::IDENTITY,
            position,
            position_backup: position,
            target,
            target_backup: target,
            distance: 0.0,
            forward: Vec3::ZERO,
            look_rotation: Quat::IDENTITY,
        };
        look.recalculate();
        look
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn position_backup(&self) -> Vec3 {
        self.position_backup
    }

    pub fn target_backup(&self) -> Vec3 {
        self.target_backup
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn look_rotation(&self) -> Quat {
        self.look_rotation
    }

    /// Moves the pose, honoring the per-axis constraint flags, and refreshes
    /// the derived vectors.
    pub fn set_pos_target(&mut self, new_position: Vec3, new_target: Vec3) {
        self.position = self.constrain_position.mask(self.position, new_position);
        self.target = self.constrain_target.mask(self.target, new_target);
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.distance = self.position.distance(self.target);
        self.forward = (self.target - self.position).normalize_or_zero();
        self.look_rotation = look_rotation_towards(self.target - self.position);
    }

    /// Collapses the per-frame aggregates into the pose and resets them to
    /// neutral.
    ///
    /// A field-of-view change alone must not displace the camera, so the
    /// accumulated offset is first corrected by the FOV back-slide term.
    pub fn finish_applying_effects(&mut self) {
        if (self.fove_multiplier - 1.0).abs() > TOLERANCE {
            self.effects_vector -= self.forward * (self.fove_multiplier - 1.0);
        }

        self.apply_committed_effects(self.effects_vector, self.effects_rotation);

        self.zoom_multiplier = 1.0;
        self.fove_multiplier = 1.0;
        self.effects_vector = Vec3::ZERO;
        self.effects_rotation = Quat::IDENTITY;
    }

    /// Applies the committed effect offset and rotation on top of the
    /// backed-up pose.
    fn apply_committed_effects(&mut self, offset: Vec3, rotation: Quat) {
        self.set_pos_target(self.position_backup + offset, self.target_backup);
        self.look_rotation *= rotation;
    }

    /// World-space blend of two looks' backed-up poses and multipliers,
    /// weighted by switch progress. Rotation is re-derived from the blended
    /// pose rather than interpolated.
    pub fn blended_with(&self, other: &CameraLook, progress: f32) -> CameraLook {
        let old = 1.0 - progress;
        let mut blended = CameraLook::new(
            self.position_backup * old + other.position_backup * progress,
            self.target_backup * old + other.target_backup * progress,
        );
        blended.base_fov = self.base_fov * old + other.base_fov * progress;
        blended.fove_multiplier = self.fove_multiplier * old + other.fove_multiplier * progress;
        blended.zoom_multiplier = self.zoom_multiplier * old + other.zoom_multiplier * progress;
        blended
    }
}

/// Rotation aiming +Z along `direction` with Y-up, identity for degenerate
/// directions.
fn look_rotation_towards(direction: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = Vec3::Y.cross(forward).normalize_or_zero();
    if right == Vec3::ZERO {
        // looking straight up or down
        return Quat::IDENTITY;
    }
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}
