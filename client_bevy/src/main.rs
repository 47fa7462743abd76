mod animation;
mod config;
mod game;
mod player;
mod shared;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use animation::ClipLibrary;
use config::ClientConfig;
use game::{CorePlugin, InputPlugin, NetworkPlugin, PlayersPlugin};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();
    config.validate()?;
    let library = ClipLibrary::builtin()?;
    let frame = Duration::from_secs_f64(config.tick_seconds());

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(LogPlugin::default())
        .insert_resource(library)
        .add_plugins(CorePlugin { config })
        .add_plugins(InputPlugin)
        .add_plugins(NetworkPlugin)
        .add_plugins(PlayersPlugin)
        .run();

    Ok(())
}
