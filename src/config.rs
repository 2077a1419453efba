use crate::engine::curve::CurveKind;
use crate::engine::effect::{CameraEffect, EffectKind, TriggerMode};
use crate::engine::look::{AxisConstraints, CameraLook, UsageFlags};
use crate::engine::rig::CameraRig;
use crate::engine::source::{EffectSource, SourceKind};
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Resource, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct BeatcamConfig {
    pub max_base_fov: f32,
    /// Smoothing window for the pose-folded FOV multiplier, seconds.
    pub fov_delay: f32,
    #[serde(rename = "foveServerIP")]
    pub fove_server_ip: String,
    pub fove_server_port: u16,
    pub cameras: Vec<CameraLookConfig>,
    pub effect_sources: Vec<EffectSourceConfig>,
}

impl Default for BeatcamConfig {
    fn default() -> Self {
        Self {
            max_base_fov: 80.0,
            fov_delay: 0.02,
            fove_server_ip: "127.0.0.1".to_string(),
            fove_server_port: 50734,
            cameras: default_cameras(),
            effect_sources: default_effect_sources(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraLookConfig {
    pub position: String,
    pub target: String,
    pub alias: String,
    pub fov: f32,
    pub constrain_position_axis: Vec<Axis>,
    pub constrain_target_axis: Vec<Axis>,
    /// Absent means usable everywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Vec<UsageTag>>,
    pub follow_head_rotation: bool,
    pub follow_head_position_multiplier: f32,
    pub follow_head_target_multiplier: f32,
}

impl Default for CameraLookConfig {
    fn default() -> Self {
        Self {
            position: "(0, 1.7, -3)".to_string(),
            target: "(0, 1.7, 0)".to_string(),
            alias: String::new(),
            fov: 80.0,
            constrain_position_axis: Vec::new(),
            constrain_target_axis: Vec::new(),
            usage: None,
            follow_head_rotation: false,
            follow_head_position_multiplier: 0.0,
            follow_head_target_multiplier: -1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageTag {
    #[serde(rename = "MENU")]
    Menu,
    #[serde(rename = "NORMAL_SONG")]
    NormalSong,
    #[serde(rename = "360_SONG")]
    Song360,
    #[serde(rename = "90_SONG")]
    Song90,
    #[serde(rename = "ALL_SONGS")]
    AllSongs,
    #[serde(rename = "ALL")]
    All,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectSourceConfig {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub rarity: f32,
    pub offset: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    pub use_in_menu: bool,
    pub is_global: bool,
    pub effects: Vec<CameraEffectConfig>,
}

impl Default for EffectSourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::EveryNthBeat,
            rarity: 1.0,
            offset: 0.0,
            duration: None,
            use_in_menu: false,
            is_global: false,
            effects: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraEffectConfig {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub mode: TriggerMode,
    /// Absent means the kind's neutral value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f32>,
    pub intensity: f32,
    pub curve_type: CurveKind,
    pub is_periodic: bool,
    pub phasing_speed: f32,
    pub use_random_values: bool,
    pub allow_negative_values: bool,
    pub is_relative_to_default_value: bool,
    pub speed: f32,
}

impl Default for CameraEffectConfig {
    fn default() -> Self {
        Self {
            kind: EffectKind::Zoom,
            mode: TriggerMode::default(),
            default_value: None,
            intensity: 1.5,
            curve_type: CurveKind::default(),
            is_periodic: false,
            phasing_speed: 32.0,
            use_random_values: false,
            allow_negative_values: false,
            is_relative_to_default_value: false,
            speed: 1.0,
        }
    }
}

impl BeatcamConfig {
    /// Load configuration from a file, falling back to defaults if the file
    /// doesn't exist or fails to parse. The effective max FOV is always
    /// raised to cover the roster.
    pub fn load_or_default(path: &str) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config file {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("Config file {} not found. Using defaults.", path);
                Self::default()
            }
        };
        config.raise_max_fov();
        config
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Per-user config location, e.g. `~/.config/beatcam/settings.toml`.
    pub fn default_user_path() -> Option<PathBuf> {
        ProjectDirs::from("", "nyanbre", "beatcam")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// A look with a wider FOV than `maxBaseFov` would clip, so the cap
    /// follows the roster.
    pub fn raise_max_fov(&mut self) {
        for camera in &self.cameras {
            self.max_base_fov = self.max_base_fov.max(camera.fov);
        }
    }

    pub fn build_rig(&self) -> CameraRig {
        CameraRig::new(self.cameras.iter().map(CameraLookConfig::to_look).collect())
    }

    pub fn build_sources(&self) -> Vec<EffectSource> {
        self.effect_sources
            .iter()
            .map(EffectSourceConfig::build)
            .collect()
    }
}

impl CameraLookConfig {
    pub fn to_look(&self) -> CameraLook {
        let fallback = Self::default();
        let position = parse_vec3(&self.position).unwrap_or_else(|| {
            warn!("unparsable camera position {:?}, using default", self.position);
            parse_vec3(&fallback.position).unwrap_or(Vec3::ZERO)
        });
        let target = parse_vec3(&self.target).unwrap_or_else(|| {
            warn!("unparsable camera target {:?}, using default", self.target);
            parse_vec3(&fallback.target).unwrap_or(Vec3::ZERO)
        });

        let mut look = CameraLook::new(position, target);
        look.alias = self.alias.clone();
        look.base_fov = self.fov;
        look.constrain_position = axes_to_constraints(&self.constrain_position_axis);
        look.constrain_target = axes_to_constraints(&self.constrain_target_axis);
        look.usage = usage_from_tags(self.usage.as_deref());
        look.follow_head_rotation = self.follow_head_rotation;
        look.follow_head_position_multiplier = self.follow_head_position_multiplier;
        look.follow_head_target_multiplier = self.follow_head_target_multiplier;
        look
    }

    pub fn from_look(look: &CameraLook) -> Self {
        Self {
            position: format_vec3(look.position_backup()),
            target: format_vec3(look.target_backup()),
            alias: look.alias.clone(),
            fov: look.base_fov,
            constrain_position_axis: constraints_to_axes(look.constrain_position),
            constrain_target_axis: constraints_to_axes(look.constrain_target),
            usage: tags_from_usage(look.usage),
            follow_head_rotation: look.follow_head_rotation,
            follow_head_position_multiplier: look.follow_head_position_multiplier,
            follow_head_target_multiplier: look.follow_head_target_multiplier,
        }
    }
}

impl EffectSourceConfig {
    pub fn build(&self) -> EffectSource {
        let mut source = EffectSource::new(self.kind);
        if self.rarity > 0.0 {
            source.rarity = self.rarity;
        } else {
            warn!("non-positive rarity {} for {:?}, using 1", self.rarity, self.kind);
        }
        source.offset = self.offset;
        source.duration = self.duration;
        source.use_in_menu = self.use_in_menu;
        source.is_global = self.is_global;
        source.effects = self.effects.iter().map(CameraEffectConfig::build).collect();
        source
    }
}

impl CameraEffectConfig {
    pub fn build(&self) -> CameraEffect {
        let default_value = self.default_value.unwrap_or_else(|| self.kind.default_value());
        let mut effect = CameraEffect::with_default_value(self.kind, default_value, self.curve_type);
        effect.mode = self.mode;
        effect.intensity = self.intensity;
        effect.use_random_values = self.use_random_values;
        effect.allow_negative_random_values = self.allow_negative_values;
        effect.is_relative_to_default_value = self.is_relative_to_default_value;
        effect.is_periodic = self.is_periodic;
        effect.phasing_speed = self.phasing_speed;
        effect.transition.speed = self.speed;
        effect
    }
}

/// Parses a `"(x, y, z)"` vector string.
pub fn parse_vec3(text: &str) -> Option<Vec3> {
    let trimmed = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = trimmed.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    let z = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}

pub fn format_vec3(vector: Vec3) -> String {
    format!("({}, {}, {})", vector.x, vector.y, vector.z)
}

fn axes_to_constraints(axes: &[Axis]) -> AxisConstraints {
    let mut constraints = AxisConstraints::default();
    for axis in axes {
        match axis {
            Axis::X => constraints.x = true,
            Axis::Y => constraints.y = true,
            Axis::Z => constraints.z = true,
        }
    }
    constraints
}

fn constraints_to_axes(constraints: AxisConstraints) -> Vec<Axis> {
    let mut axes = Vec::new();
    if constraints.x {
        axes.push(Axis::X);
    }
    if constraints.y {
        axes.push(Axis::Y);
    }
    if constraints.z {
        axes.push(Axis::Z);
    }
    axes
}

/// An absent usage list means "usable everywhere"; a present list starts from
/// nothing and enables exactly what it names.
fn usage_from_tags(tags: Option<&[UsageTag]>) -> UsageFlags {
    let Some(tags) = tags else {
        return UsageFlags::all();
    };
    let mut flags = UsageFlags {
        menu: false,
        normal_song: false,
        song_360: false,
        song_90: false,
    };
    for tag in tags {
        match tag {
            UsageTag::Menu => flags.menu = true,
            UsageTag::NormalSong => flags.normal_song = true,
            UsageTag::Song360 => flags.song_360 = true,
            UsageTag::Song90 => flags.song_90 = true,
            UsageTag::AllSongs => {
                flags.normal_song = true;
                flags.song_360 = true;
                flags.song_90 = true;
            }
            UsageTag::All => return UsageFlags::all(),
        }
    }
    flags
}

fn tags_from_usage(flags: UsageFlags) -> Option<Vec<UsageTag>> {
    if flags.is_all() {
        return None;
    }
    if flags.is_all_songs() {
        return Some(vec![UsageTag::AllSongs]);
    }
    let mut tags = Vec::new();
    if flags.menu {
        tags.push(UsageTag::Menu);
    }
    if flags.normal_song {
        tags.push(UsageTag::NormalSong);
    }
    if flags.song_360 {
        tags.push(UsageTag::Song360);
    }
    if flags.song_90 {
        tags.push(UsageTag::Song90);
    }
    Some(tags)
}

fn default_cameras() -> Vec<CameraLookConfig> {
    let roster = [
        ("menu", "(2.0, 1.8, -3)", "(0, 1.2, 0.5)"),
        ("closeup", "(0.5, 1.15, -2.6)", "(0, 0.9, 1.8)"),
        ("side", "(0.4, 1, -1.9)", "(0.2, 0.8, 0.4)"),
        ("floor", "(2, 0.5, -2)", "(0.5, 0.65, 1.7)"),
        ("wide", "(-1, 1.2, -2.4)", "(-0.2, 0.8, 1)"),
    ];
    roster
        .into_iter()
        .map(|(alias, position, target)| CameraLookConfig {
            position: position.to_string(),
            target: target.to_string(),
            alias: alias.to_string(),
            ..CameraLookConfig::default()
        })
        .collect()
}

fn default_effect_sources() -> Vec<EffectSourceConfig> {
    let beat_sway = EffectSourceConfig {
        kind: SourceKind::OnNthBeat,
        rarity: 4.0,
        use_in_menu: true,
        effects: vec![CameraEffectConfig {
            kind: EffectKind::PositionHorizontal,
            mode: TriggerMode::TwoWay,
            is_periodic: true,
            use_random_values: true,
            allow_negative_values: true,
            ..CameraEffectConfig::default()
        }],
        ..EffectSourceConfig::default()
    };

    let beat_switch = EffectSourceConfig {
        kind: SourceKind::OnNthBeat,
        rarity: 8.0,
        use_in_menu: true,
        effects: vec![CameraEffectConfig {
            kind: EffectKind::CameraChange,
            // -2 requests a random suitable look
            intensity: -2.0,
            ..CameraEffectConfig::default()
        }],
        ..EffectSourceConfig::default()
    };

    vec![beat_sway, beat_switch]
}
