//! Frame and event dispatch
//!
//! Each frame runs a fixed phase order: drain the telemetry inbox, derive
//! the per-tick deltas, feed accumulating sources, handle discrete events,
//! resolve camera switching, compose the pose, publish the outputs. Every
//! phase is a chained system set so ordering never depends on scheduler luck.

use crate::config::BeatcamConfig;
use crate::engine::look::{CameraLook, ChangeMode, SwitchRequest};
use crate::engine::source::{EffectSource, SourceKind};
use crate::events::GameEvent;
use crate::prelude::*;
use crate::resources::{
    CameraPose, EffectSources, FovDelay, FoveBroadcast, MapState, SceneCameras, SessionClock,
    SharedRng, TickDelta,
};
use crate::states::MapPhase;

/// Near-zero guard for FOV ratios.
const FOV_EPSILON: f32 = 1e-4;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    Inbox,
    TimeDelta,
    BeatDelta,
    DiscreteEvents,
    ResolveSwitch,
    Compose,
    Emit,
}

/// Scalars computed during composition and published in the emit phase.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FrameScalars {
    pub broadcast_multiplier: f32,
}

impl Default for FrameScalars {
    fn default() -> Self {
        Self {
            broadcast_multiplier: 1.0,
        }
    }
}

pub struct EnginePlugin {
    pub config: BeatcamConfig,
    pub seed: Option<u64>,
}

impl Plugin for EnginePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SharedRng::from_optional_seed(self.seed));
        app.insert_resource(SceneCameras(self.config.build_rig()));
        app.insert_resource(EffectSources(self.config.build_sources()));
        app.insert_resource(self.config.clone());
        app.init_resource::<MapState>();
        app.init_resource::<TickDelta>();
        app.init_resource::<SessionClock>();
        app.init_resource::<FovDelay>();
        app.init_resource::<CameraPose>();
        app.init_resource::<FoveBroadcast>();
        app.init_resource::<FrameScalars>();
        app.init_state::<MapPhase>();

        app.add_event::<GameEvent>();

        app.configure_sets(
            Update,
            (
                EnginePhase::Inbox,
                EnginePhase::TimeDelta,
                EnginePhase::BeatDelta,
                EnginePhase::DiscreteEvents,
                EnginePhase::ResolveSwitch,
                EnginePhase::Compose,
                EnginePhase::Emit,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                (advance_clocks, tick_effect_transitions, accumulate_time_sources)
                    .chain()
                    .in_set(EnginePhase::TimeDelta),
                accumulate_beat_sources.in_set(EnginePhase::BeatDelta),
                (handle_phase_events, handle_gameplay_events)
                    .chain()
                    .in_set(EnginePhase::DiscreteEvents),
                resolve_camera_switch.in_set(EnginePhase::ResolveSwitch),
                compose_pose.in_set(EnginePhase::Compose),
                publish_frame.in_set(EnginePhase::Emit),
            ),
        );
    }
}

/// Whether a source receives units right now: during a song only while it is
/// playing, in the menu only when the source opts in.
fn source_active(source: &EffectSource, map: &MapState) -> bool {
    if map.is_map_phase {
        !map.paused
    } else {
        source.use_in_menu
    }
}

pub fn advance_clocks(
    time: Res<Time>,
    mut map: ResMut<MapState>,
    mut delta: ResMut<TickDelta>,
    mut clock: ResMut<SessionClock>,
) {
    let seconds = time.delta_secs();
    delta.seconds = seconds;
    delta.beats = if map.time_between_beats > 0.0 {
        seconds / map.time_between_beats
    } else {
        0.0
    };
    clock.0 += seconds as f64;

    if map.is_map_playing() {
        map.elapsed_map_time += seconds;
        let beats = delta.beats;
        map.elapsed_beats += beats;
    }
}

pub fn tick_effect_transitions(
    map: Res<MapState>,
    delta: Res<TickDelta>,
    mut sources: ResMut<EffectSources>,
) {
    if map.is_map_phase && map.paused {
        return;
    }
    for source in sources.iter_mut() {
        source.tick_effects(delta.seconds);
    }
}

pub fn accumulate_time_sources(
    map: Res<MapState>,
    delta: Res<TickDelta>,
    mut sources: ResMut<EffectSources>,
    mut rng: ResMut<SharedRng>,
) {
    for source in sources.iter_mut() {
        if source.kind.counts_seconds() && source_active(source, &map) {
            source.add_units(delta.seconds, &mut rng.0);
        }
    }
}

pub fn accumulate_beat_sources(
    map: Res<MapState>,
    delta: Res<TickDelta>,
    mut sources: ResMut<EffectSources>,
    mut rng: ResMut<SharedRng>,
) {
    for source in sources.iter_mut() {
        if source.kind.counts_beats() && source_active(source, &map) {
            source.add_units(delta.beats, &mut rng.0);
        }
    }
}

pub fn handle_phase_events(
    mut events: EventReader<GameEvent>,
    mut map: ResMut<MapState>,
    mut sources: ResMut<EffectSources>,
    mut cameras: ResMut<SceneCameras>,
    mut delay: ResMut<FovDelay>,
    mut rng: ResMut<SharedRng>,
    mut next_phase: ResMut<NextState<MapPhase>>,
) {
    for event in events.read() {
        match *event {
            GameEvent::MapStarted {
                bpm,
                song_time_offset_ms,
                is_360,
                is_90,
            } => {
                enter_menu(&mut map, &mut sources, &mut delay);
                map.start_map(bpm, song_time_offset_ms / 1000.0, is_360, is_90);
                next_phase.set(MapPhase::Song);
                info!("map started: {bpm} bpm, 360: {is_360}, 90: {is_90}");

                for source in sources.iter_mut() {
                    if source.kind == SourceKind::OnSongStart {
                        source.trigger(&mut rng.0);
                    }
                }
                ensure_suitable_camera(&mut cameras, &map, &mut rng);
            }
            GameEvent::MenuEntered | GameEvent::MapFinished(_) => {
                if let GameEvent::MapFinished(rank) = *event {
                    info!("map finished: {rank:?}");
                }
                let was_in_song = map.is_map_phase;
                enter_menu(&mut map, &mut sources, &mut delay);
                next_phase.set(MapPhase::Menu);

                if was_in_song {
                    for source in sources.iter_mut() {
                        if source.kind == SourceKind::OnSongEnd {
                            source.trigger(&mut rng.0);
                        }
                    }
                }
                ensure_suitable_camera(&mut cameras, &map, &mut rng);
            }
            GameEvent::MapPaused => map.paused = true,
            GameEvent::MapResumed => map.paused = false,
            _ => {}
        }
    }
}

fn enter_menu(map: &mut MapState, sources: &mut EffectSources, delay: &mut FovDelay) {
    map.menu_reset();
    for source in sources.iter_mut() {
        source.reset(false);
    }
    delay.clear();
}

/// The current look may be unusable after a phase change; if so, start a
/// switch to the next look the new phase allows.
fn ensure_suitable_camera(cameras: &mut SceneCameras, map: &MapState, rng: &mut SharedRng) {
    let snapshot = map.phase_snapshot();
    if !snapshot.allows(&cameras.current_look().usage) {
        cameras.resolve_request(
            SwitchRequest {
                mode: ChangeMode::NextSuitable,
                ..SwitchRequest::default()
            },
            snapshot,
            &mut rng.0,
        );
    }
}

pub fn handle_gameplay_events(
    mut events: EventReader<GameEvent>,
    mut map: ResMut<MapState>,
    mut sources: ResMut<EffectSources>,
    mut rng: ResMut<SharedRng>,
) {
    for event in events.read() {
        match *event {
            GameEvent::NoteHit => {
                add_unit_to_kind(&mut sources, &map, SourceKind::NthNoteHit, &mut rng);
            }
            GameEvent::NoteMissed => {
                add_unit_to_kind(&mut sources, &map, SourceKind::NthNoteMiss, &mut rng);
            }
            GameEvent::BombHit => {
                add_unit_to_kind(&mut sources, &map, SourceKind::NthBombHit, &mut rng);
            }
            GameEvent::RingsZoomPulse => {
                add_unit_to_kind(&mut sources, &map, SourceKind::RingsZoom, &mut rng);
            }
            GameEvent::WallEntered => {
                for source in sources.iter_mut() {
                    if source.kind == SourceKind::WallStuck && source_active(source, &map) {
                        source.trigger(&mut rng.0);
                    }
                }
            }
            GameEvent::WallExited => {
                for source in sources.iter_mut() {
                    if source.kind == SourceKind::WallStuck {
                        source.reset(false);
                    }
                }
            }
            GameEvent::ComboUpdated(value) => {
                if value == 0 && map.current_combo > 0 {
                    let lost = map.current_combo;
                    debug!("combo break, lost {lost}");
                    for source in sources.iter_mut() {
                        if source.kind == SourceKind::XnComboBreak && source_active(source, &map) {
                            source.on_combo_break(lost, &mut rng.0);
                        }
                    }
                }
                for source in sources.iter_mut() {
                    if source.kind.counts_combo() && source_active(source, &map) {
                        source.observe_count(value as f32, &mut rng.0);
                    }
                }
                map.current_combo = value;
            }
            _ => {}
        }
    }
}

fn add_unit_to_kind(
    sources: &mut EffectSources,
    map: &MapState,
    kind: SourceKind,
    rng: &mut SharedRng,
) {
    for source in sources.iter_mut() {
        if source.kind == kind && source_active(source, map) {
            source.add_units(1.0, &mut rng.0);
        }
    }
}

pub fn resolve_camera_switch(
    map: Res<MapState>,
    delta: Res<TickDelta>,
    mut cameras: ResMut<SceneCameras>,
    mut rng: ResMut<SharedRng>,
) {
    if map.is_map_phase && map.paused {
        return;
    }

    cameras.tick_switch(delta.seconds);

    // Requests composed onto the blend scratch while switching never reach
    // this point; only the stable current look can start a switch.
    if !cameras.is_switching() {
        let request = std::mem::take(&mut cameras.current_look_mut().switch_request);
        cameras.resolve_request(request, map.phase_snapshot(), &mut rng.0);
    }
}

pub fn compose_pose(
    config: Res<BeatcamConfig>,
    clock: Res<SessionClock>,
    sources: Res<EffectSources>,
    mut cameras: ResMut<SceneCameras>,
    mut delay: ResMut<FovDelay>,
    mut pose: ResMut<CameraPose>,
    mut scalars: ResMut<FrameScalars>,
) {
    if let Some(mut scratch) = cameras.blended_scratch() {
        finalize_look(
            &mut scratch,
            &sources,
            &config,
            clock.0,
            &mut delay,
            &mut pose,
            &mut scalars,
        );
    } else {
        let look = cameras.current_look_mut();
        finalize_look(
            look,
            &sources,
            &config,
            clock.0,
            &mut delay,
            &mut pose,
            &mut scalars,
        );
    }
}

fn finalize_look(
    look: &mut CameraLook,
    sources: &EffectSources,
    config: &BeatcamConfig,
    now: f64,
    delay: &mut FovDelay,
    pose: &mut CameraPose,
    scalars: &mut FrameScalars,
) {
    for source in sources.iter() {
        source.apply(look);
    }

    // The broadcast multiplier carries the zoom and is never delayed; the
    // multiplier folded into the pose is.
    let undelayed = look.fove_multiplier;
    scalars.broadcast_multiplier = if look.base_fov.abs() > FOV_EPSILON {
        config.max_base_fov / look.base_fov * undelayed * look.zoom_multiplier
    } else {
        1.0
    };
    delay.push(now, undelayed);
    look.fove_multiplier = delay.delayed(now, config.fov_delay as f64);

    look.finish_applying_effects();

    pose.position = look.position();
    pose.rotation = look.look_rotation();
    pose.fov = config.max_base_fov;
}

pub fn publish_frame(
    scalars: Res<FrameScalars>,
    broadcast: Res<FoveBroadcast>,
    pose: Res<CameraPose>,
) {
    broadcast.set(scalars.broadcast_multiplier);
    trace!(
        "pose {:?} fov {} broadcast {}",
        pose.position, pose.fov, scalars.broadcast_multiplier
    );
}
