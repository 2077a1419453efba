//! Telemetry inbox
//!
//! Game telemetry is produced on network threads and handed to the engine
//! through a channel. The inbox system drains the channel at the top of each
//! frame so every downstream phase sees the same event set.

use crate::events::GameEvent;
use crate::plugins::engine::EnginePhase;
use crate::prelude::*;
use crate::resources::{TelemetryInbox, TelemetrySender};
use std::sync::Mutex;
use std::sync::mpsc;

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        let (sender, receiver) = mpsc::channel();
        app.insert_resource(TelemetrySender(sender));
        app.insert_resource(TelemetryInbox(Mutex::new(receiver)));
        app.add_systems(Update, drain_inbox.in_set(EnginePhase::Inbox));
    }
}

pub fn drain_inbox(inbox: Res<TelemetryInbox>, mut events: EventWriter<GameEvent>) {
    let Ok(receiver) = inbox.0.lock() else {
        return;
    };
    for event in receiver.try_iter() {
        debug!("telemetry: {event:?}");
        events.write(event);
    }
}
