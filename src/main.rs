use beatcam::cli::{self, Args};
use beatcam::plugins::broadcast::BroadcastPlugin;
use beatcam::plugins::engine::EnginePlugin;
use beatcam::plugins::telemetry::TelemetryPlugin;
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use clap::Parser;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = cli::load_and_apply_config(&args)?;

    if args.print_config {
        cli::handle_print_config(&config)?;
        return Ok(());
    }

    let level = if args.verbose {
        bevy::log::Level::DEBUG
    } else {
        bevy::log::Level::INFO
    };

    let mut app = App::new();
    app.add_plugins((
        // headless, ticking at the capture-friendly 90 Hz
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 90.0,
        ))),
        LogPlugin {
            level,
            ..default()
        },
        StatesPlugin,
    ));
    app.add_plugins((
        EnginePlugin {
            config,
            seed: args.seed,
        },
        TelemetryPlugin,
        BroadcastPlugin,
    ));
    app.run();

    Ok(())
}
