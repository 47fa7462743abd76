use std::collections::HashMap;

use bevy::prelude::*;
use volley_shared::config::GameConfig;
use volley_shared::vec3::Vec3;

use crate::animation::ClipLibrary;
use crate::player::{Control, Player};
use crate::shared::connection::ServerConnection;

use super::ball::BallView;
use super::input::InputState;
use super::UpdateSet;

pub struct PlayersPlugin;

/// Every player this client knows about, keyed by server id
#[derive(Resource, Default)]
pub struct Roster {
    pub self_id: Option<u32>,
    pub config: GameConfig,
    pub players: HashMap<u32, Player>,
}

impl Roster {
    pub fn local(&self) -> Option<&Player> {
        self.self_id.and_then(|id| self.players.get(&id))
    }

    pub fn local_mut(&mut self) -> Option<&mut Player> {
        let id = self.self_id?;
        self.players.get_mut(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Adds a player unless the id is already known. Returns true if added.
    pub fn spawn(&mut self, id: u32, control: Control, position: Vec3, library: &ClipLibrary) -> bool {
        if self.players.contains_key(&id) {
            return false;
        }
        let player = Player::new(id, control, position, library, self.config);
        self.players.insert(id, player);
        true
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.players.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.self_id = None;
        self.players.clear();
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Plugin for PlayersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Roster>().add_systems(
            Update,
            (local_input_system, tick_players_system)
                .chain()
                .in_set(UpdateSet::Simulate),
        );
    }
}

fn local_input_system(
    input: Res<InputState>,
    ball: Res<BallView>,
    mut roster: ResMut<Roster>,
    conn: Res<ServerConnection>,
    time: Res<Time>,
) {
    let Some(me) = roster.local_mut() else {
        return;
    };
    for msg in me.handle_input(&input, ball.position, time.delta_secs_f64()) {
        conn.send(msg);
    }
}

fn tick_players_system(mut roster: ResMut<Roster>, time: Res<Time>) {
    let dt = time.delta_secs_f64();
    for player in roster.players.values_mut() {
        player.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MotionState;
    use volley_shared::protocol::ClientMsg;

    fn library() -> ClipLibrary {
        ClipLibrary::builtin().unwrap()
    }

    #[test]
    fn spawn_is_idempotent() {
        let mut roster = Roster::default();
        let library = library();
        assert!(roster.spawn(1, Control::Remote, Vec3::ZERO, &library));
        assert!(!roster.spawn(1, Control::Remote, Vec3::new(1.0, 0.0, 0.0), &library));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.players[&1].position(), Vec3::ZERO);
    }

    #[test]
    fn local_player_follows_self_id() {
        let mut roster = Roster::default();
        roster.spawn(3, Control::Local, Vec3::ZERO, &library());
        assert!(roster.local().is_none());
        roster.self_id = Some(3);
        assert_eq!(roster.local().map(|p| p.id), Some(3));
    }

    #[test]
    fn jump_at_served_ball_sends_hit() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        let (conn, _event_tx, mut outbox) = ServerConnection::test_stub_with_outbox();
        app.insert_resource(conn);
        app.insert_resource(BallView {
            position: Some(Vec3::new(0.0, 0.5, 0.0)),
        });
        app.insert_resource(InputState {
            jump: true,
            ..Default::default()
        });

        let mut roster = Roster::default();
        roster.spawn(1, Control::Local, Vec3::new(0.0, 0.0, 1.0), &library());
        roster.self_id = Some(1);
        app.insert_resource(roster);
        app.add_systems(Update, local_input_system);

        app.update();

        let mut sent = Vec::new();
        while let Ok(msg) = outbox.try_recv() {
            sent.push(msg);
        }
        assert!(sent.iter().any(|m| matches!(m, ClientMsg::ClientHitBall(_))));
    }

    #[test]
    fn input_system_sends_local_moves() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        let (conn, _event_tx, mut outbox) = ServerConnection::test_stub_with_outbox();
        app.insert_resource(conn);
        app.init_resource::<BallView>();
        app.insert_resource(InputState {
            right: true,
            ..Default::default()
        });

        let mut roster = Roster::default();
        roster.spawn(1, Control::Local, Vec3::ZERO, &library());
        roster.self_id = Some(1);
        app.insert_resource(roster);
        app.add_systems(Update, (local_input_system, tick_players_system).chain());

        app.update();
        app.update();

        let roster = app.world().resource::<Roster>();
        assert_eq!(roster.local().map(|p| p.state()), Some(MotionState::Moving));

        let mut sent = Vec::new();
        while let Ok(msg) = outbox.try_recv() {
            sent.push(msg);
        }
        assert!(sent.iter().any(|m| matches!(
            m,
            ClientMsg::ClientAnimation { animation } if animation == "slow_run"
        )));
    }
}
