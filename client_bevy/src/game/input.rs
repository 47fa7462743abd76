use bevy::prelude::*;

use super::ball::BallView;
use super::client_bot::VolleyBot;
use super::players::Roster;
use super::UpdateSet;

/// Bot-driven input for the headless client
pub struct InputPlugin;

/// Held keys for the local player, WASD plus jump
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl InputState {
    /// Unnormalised (dx, dz); forward is -Z
    pub fn direction(&self) -> (f64, f64) {
        let mut dx = 0.0;
        let mut dz = 0.0;
        if self.forward {
            dz -= 1.0;
        }
        if self.back {
            dz += 1.0;
        }
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        (dx, dz)
    }
}

/// Present only when the bot is enabled
#[derive(Resource, Default)]
pub(crate) struct BotDriver(pub(crate) VolleyBot);

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputState>().add_systems(
            Update,
            bot_input_system
                .run_if(resource_exists::<BotDriver>)
                .in_set(UpdateSet::Input),
        );
    }
}

fn bot_input_system(
    mut bot: ResMut<BotDriver>,
    mut input: ResMut<InputState>,
    roster: Res<Roster>,
    ball: Res<BallView>,
    time: Res<Time>,
) {
    let Some(me) = roster.local() else {
        *input = InputState::default();
        return;
    };
    *input = bot.0.update(time.delta_secs_f64(), me.position(), ball.position);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        let input = InputState {
            left: true,
            right: true,
            forward: true,
            ..Default::default()
        };
        assert_eq!(input.direction(), (0.0, -1.0));
    }
}
