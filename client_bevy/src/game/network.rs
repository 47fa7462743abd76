use bevy::prelude::*;
use volley_shared::protocol::ServerMsg;

use crate::animation::ClipLibrary;
use crate::player::Control;
use crate::shared::connection::{ConnectionState, NetEvent, ServerConnection};

use super::ball::BallView;
use super::input::BotDriver;
use super::players::Roster;
use super::UpdateSet;

pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, network_event_system.in_set(UpdateSet::Network));
    }
}

fn network_event_system(
    mut conn: ResMut<ServerConnection>,
    mut roster: ResMut<Roster>,
    mut ball: ResMut<BallView>,
    library: Res<ClipLibrary>,
    bot: Option<ResMut<BotDriver>>,
    mut app_exit: MessageWriter<AppExit>,
) {
    let mut reset_bot = false;

    for evt in conn.poll_events() {
        match evt {
            NetEvent::Connected => {
                info!("WebSocket connected");
                conn.state = ConnectionState::Connected;
            }
            NetEvent::Disconnected => {
                if conn.state == ConnectionState::Connected {
                    info!("WebSocket disconnected");
                }
                conn.state = ConnectionState::Disconnected;
                // Ids are reassigned on the next session
                roster.clear();
                ball.clear();
                reset_bot = true;
            }
            NetEvent::ProtocolMismatch { server, client } => {
                error!("Protocol mismatch: server {} != client {}, giving up", server, client);
                if !conn.protocol_mismatch {
                    conn.protocol_mismatch = true;
                    app_exit.write(AppExit::error());
                }
            }
            NetEvent::Message(msg) => apply_server_msg(msg, &mut roster, &mut ball, &library),
        }
    }

    if reset_bot {
        if let Some(mut bot) = bot {
            bot.0.reset();
        }
    }
}

fn apply_server_msg(msg: ServerMsg, roster: &mut Roster, ball: &mut BallView, library: &ClipLibrary) {
    match msg {
        ServerMsg::PlayerId(p) => {
            info!("Joined as player {}", p.id);
            match p.config.validate() {
                Ok(()) => roster.config = p.config,
                Err(e) => warn!("Keeping default game config, server sent invalid one: {}", e),
            }
            roster.self_id = Some(p.id);
            roster.spawn(p.id, Control::Local, p.position, library);
        }
        ServerMsg::InitialPlayers(p) => {
            for (id, wire) in p.players {
                if Some(id) != roster.self_id {
                    roster.spawn(id, Control::Remote, wire.position, library);
                }
            }
            info!("{} players in the game", roster.len());
        }
        ServerMsg::PlayerConnected(w) => {
            if Some(w.id) != roster.self_id && roster.spawn(w.id, Control::Remote, w.position, library) {
                info!("Player {} joined", w.id);
            }
        }
        ServerMsg::PlayerDisconnected(p) => {
            if roster.remove(p.id) {
                info!("Player {} left", p.id);
            }
        }
        ServerMsg::PositionUpdate(w) => match roster.get_mut(w.id) {
            Some(player) => player.apply_position_snapshot(w.position),
            None => debug!("Position for unknown player {}", w.id),
        },
        ServerMsg::AnimationUpdate(a) => match roster.get_mut(a.id) {
            Some(player) => player.apply_animation(&a.animation),
            None => debug!("Animation for unknown player {}", a.id),
        },
        ServerMsg::PlayerJump(j) => match roster.get_mut(j.id) {
            Some(player) => {
                player.apply_jump(j.payload());
            }
            None => debug!("Jump for unknown player {}", j.id),
        },
        ServerMsg::PlayerHitBall(h) => {
            debug!("Player {} hit the ball", h.id);
            ball.apply_snapshot(h.ball_position);
        }
        ServerMsg::BallPosition(b) => ball.apply_snapshot(b.position),
        ServerMsg::Error(e) => warn!("Server error: {}", e.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::player::MotionState;
    use volley_shared::config::GameConfig;
    use volley_shared::protocol::{
        AnimationUpdateMsg, BallPositionMsg, InitialPlayersMsg, PlayerIdMsg, PlayerJumpMsg,
        PlayerLeftMsg, PlayerWire, PROTOCOL_VERSION,
    };
    use volley_shared::vec3::Vec3;

    fn make_test_app_with_events() -> (App, std::sync::mpsc::Sender<NetEvent>) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<Roster>();
        app.init_resource::<BallView>();
        app.insert_resource(ClipLibrary::builtin().unwrap());

        let (conn, event_tx) = ServerConnection::test_stub_with_sender();
        app.insert_resource(conn);

        app.add_systems(Update, network_event_system);
        (app, event_tx)
    }

    fn send(event_tx: &std::sync::mpsc::Sender<NetEvent>, msg: ServerMsg) {
        event_tx.send(NetEvent::Message(msg)).unwrap();
    }

    fn join_as(app: &mut App, event_tx: &std::sync::mpsc::Sender<NetEvent>, id: u32) {
        send(
            event_tx,
            ServerMsg::PlayerId(PlayerIdMsg {
                protocol_version: PROTOCOL_VERSION,
                id,
                position: Vec3::new(0.0, 0.0, 4.0),
                config: GameConfig::default(),
            }),
        );
        let mut players = HashMap::new();
        players.insert(
            id,
            PlayerWire {
                id,
                position: Vec3::new(0.0, 0.0, 4.0),
            },
        );
        players.insert(
            id + 1,
            PlayerWire {
                id: id + 1,
                position: Vec3::new(0.0, 0.0, -4.0),
            },
        );
        send(event_tx, ServerMsg::InitialPlayers(InitialPlayersMsg { players }));
        send(
            event_tx,
            ServerMsg::BallPosition(BallPositionMsg {
                position: Vec3::new(0.0, 0.5, 0.0),
            }),
        );
        app.update();
    }

    #[test]
    fn greeting_spawns_local_and_remote_players() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        let roster = app.world().resource::<Roster>();
        assert_eq!(roster.self_id, Some(1));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.players[&1].control, Control::Local);
        assert_eq!(roster.players[&2].control, Control::Remote);
    }

    #[test]
    fn greeting_seeds_ball_position() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        assert_eq!(
            app.world().resource::<BallView>().position,
            Some(Vec3::new(0.0, 0.5, 0.0))
        );
    }

    #[test]
    fn protocol_mismatch_exits_the_app() {
        let (mut app, event_tx) = make_test_app_with_events();
        event_tx
            .send(NetEvent::ProtocolMismatch {
                server: PROTOCOL_VERSION + 1,
                client: PROTOCOL_VERSION,
            })
            .unwrap();
        event_tx.send(NetEvent::Disconnected).unwrap();
        app.update();

        assert!(app.world().resource::<ServerConnection>().protocol_mismatch);
        assert_eq!(app.should_exit(), Some(AppExit::error()));
    }

    #[test]
    fn duplicate_position_updates_are_idempotent() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        let update = PlayerWire {
            id: 2,
            position: Vec3::new(1.0, 0.0, -3.0),
        };
        send(&event_tx, ServerMsg::PositionUpdate(update));
        send(&event_tx, ServerMsg::PositionUpdate(update));
        app.update();

        let roster = app.world().resource::<Roster>();
        let remote = &roster.players[&2];
        assert_eq!(remote.position(), Vec3::new(1.0, 0.0, -3.0));
        assert_eq!(remote.state(), MotionState::Moving);
    }

    #[test]
    fn jump_before_idle_update_keeps_jump() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        send(
            &event_tx,
            ServerMsg::AnimationUpdate(AnimationUpdateMsg {
                id: 2,
                animation: "slow_run".to_string(),
            }),
        );
        send(
            &event_tx,
            ServerMsg::PlayerJump(PlayerJumpMsg {
                id: 2,
                rotation: -1.0,
                jump_velocity: 0.2,
            }),
        );
        send(
            &event_tx,
            ServerMsg::AnimationUpdate(AnimationUpdateMsg {
                id: 2,
                animation: "idle".to_string(),
            }),
        );
        app.update();

        let roster = app.world().resource::<Roster>();
        assert_eq!(roster.players[&2].state(), MotionState::NonInterruptible);
    }

    #[test]
    fn disconnect_removes_player() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        send(&event_tx, ServerMsg::PlayerDisconnected(PlayerLeftMsg { id: 2 }));
        app.update();

        assert_eq!(app.world().resource::<Roster>().len(), 1);
    }

    #[test]
    fn updates_for_unknown_players_are_ignored() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        send(
            &event_tx,
            ServerMsg::PositionUpdate(PlayerWire {
                id: 42,
                position: Vec3::ZERO,
            }),
        );
        app.update();

        assert_eq!(app.world().resource::<Roster>().len(), 2);
    }

    #[test]
    fn ball_position_is_tracked() {
        let (mut app, event_tx) = make_test_app_with_events();
        send(
            &event_tx,
            ServerMsg::BallPosition(BallPositionMsg {
                position: Vec3::new(0.0, 2.0, 1.0),
            }),
        );
        app.update();

        assert_eq!(
            app.world().resource::<BallView>().position,
            Some(Vec3::new(0.0, 2.0, 1.0))
        );
    }

    #[test]
    fn socket_loss_clears_roster() {
        let (mut app, event_tx) = make_test_app_with_events();
        join_as(&mut app, &event_tx, 1);

        event_tx.send(NetEvent::Connected).unwrap();
        event_tx.send(NetEvent::Disconnected).unwrap();
        app.update();

        let roster = app.world().resource::<Roster>();
        assert!(roster.is_empty());
        assert_eq!(roster.self_id, None);
        assert_eq!(
            app.world().resource::<ServerConnection>().state,
            ConnectionState::Disconnected
        );
    }
}
