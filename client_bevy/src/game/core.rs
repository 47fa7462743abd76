use bevy::prelude::*;

use crate::config::ClientConfig;
use crate::shared::connection::ServerConnection;

use super::ball::BallView;
use super::input::BotDriver;

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub(crate) enum UpdateSet {
    Network,
    Input,
    Simulate,
}

pub struct CorePlugin {
    pub config: ClientConfig,
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ServerConnection::new(self.config.ws_url.clone()))
            .init_resource::<BallView>()
            .configure_sets(
                Update,
                (UpdateSet::Network, UpdateSet::Input, UpdateSet::Simulate).chain(),
            );

        if self.config.bot {
            app.init_resource::<BotDriver>();
        }
    }
}
