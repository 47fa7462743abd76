use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use volley_shared::config::GameConfig;
use volley_shared::protocol::{
    round_vec3, AnimationUpdateMsg, BallPositionMsg, HitPayload, JumpPayload, PlayerHitBallMsg,
    PlayerJumpMsg, PlayerLeftMsg, PlayerWire, ServerMsg,
};
use volley_shared::vec3::Position;

use crate::ball::BallStep;
use crate::config::ServerConfig;
use crate::state::{GameState, JoinError};

/// Everything a freshly seated connection needs to greet its client
#[derive(Debug, Clone)]
pub struct JoinAccepted {
    pub id: u32,
    pub position: Position,
    pub players: std::collections::HashMap<u32, PlayerWire>,
    pub config: GameConfig,
    /// Where the ball is now, resting or in flight
    pub ball: Position,
}

/// Commands from client connections to the game loop
pub enum GameCommand {
    PlayerJoin {
        response: oneshot::Sender<Result<JoinAccepted, JoinError>>,
    },
    PlayerLeave {
        id: u32,
    },
    Movement {
        id: u32,
        position: Position,
    },
    Animation {
        id: u32,
        animation: String,
    },
    Jump {
        id: u32,
        payload: JumpPayload,
    },
    HitBall {
        id: u32,
        payload: HitPayload,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    /// Delivered to everyone except the originating player
    Relay { from: u32, msg: ServerMsg },
    /// Delivered to everyone
    All(ServerMsg),
}

/// Run the main game loop. Owns all game state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let mut state = GameState::new(&server_config, GameConfig::default());

    let tick_duration = Duration::from_secs_f64(1.0 / server_config.tick_rate_hz as f64);
    let broadcast_every_n = (server_config.tick_rate_hz / server_config.broadcast_rate_hz).max(1);
    let mut tick_count: u64 = 0;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                tick_count += 1;
                match state.tick() {
                    BallStep::Flying(position) => {
                        if tick_count % broadcast_every_n as u64 == 0 {
                            send_ball_position(&broadcast_tx, position);
                        }
                    }
                    BallStep::Landed(position) => {
                        tracing::info!("Ball landed at ({:.2}, {:.2})", position.x, position.z);
                        send_ball_position(&broadcast_tx, position);
                    }
                    BallStep::Resting => {}
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                handle_command(&mut state, &broadcast_tx, cmd);
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}

fn handle_command(
    state: &mut GameState,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
    cmd: GameCommand,
) {
    match cmd {
        GameCommand::PlayerJoin { response } => match state.join() {
            Ok((id, position)) => {
                let accepted = JoinAccepted {
                    id,
                    position,
                    players: state.players(),
                    config: state.config,
                    ball: round_vec3(state.ball.position),
                };
                if response.send(Ok(accepted)).is_err() {
                    // Connection went away before it could be greeted
                    state.leave(id);
                    return;
                }
                tracing::info!("Player {} seated ({} seated)", id, state.slots.len());
                let _ = broadcast_tx.send(GameBroadcast::Relay {
                    from: id,
                    msg: ServerMsg::PlayerConnected(PlayerWire { id, position }),
                });
            }
            Err(e) => {
                tracing::warn!("Rejecting player: {}", e);
                let _ = response.send(Err(e));
            }
        },
        GameCommand::PlayerLeave { id } => {
            if state.leave(id) {
                let _ = broadcast_tx.send(GameBroadcast::Relay {
                    from: id,
                    msg: ServerMsg::PlayerDisconnected(PlayerLeftMsg { id }),
                });
                tracing::info!("Player {} left", id);
            }
        }
        GameCommand::Movement { id, position } => {
            if state.move_player(id, position) {
                let _ = broadcast_tx.send(GameBroadcast::Relay {
                    from: id,
                    msg: ServerMsg::PositionUpdate(PlayerWire {
                        id,
                        position: round_vec3(position),
                    }),
                });
            }
        }
        GameCommand::Animation { id, animation } => {
            tracing::debug!("Player {} animation {}", id, animation);
            let _ = broadcast_tx.send(GameBroadcast::Relay {
                from: id,
                msg: ServerMsg::AnimationUpdate(AnimationUpdateMsg { id, animation }),
            });
        }
        GameCommand::Jump { id, payload } => {
            let _ = broadcast_tx.send(GameBroadcast::Relay {
                from: id,
                msg: ServerMsg::PlayerJump(PlayerJumpMsg {
                    id,
                    rotation: payload.rotation,
                    jump_velocity: payload.jump_velocity,
                }),
            });
        }
        GameCommand::HitBall { id, payload } => {
            tracing::debug!("Player {} hit the ball", id);
            state.hit_ball(&payload);
            let _ = broadcast_tx.send(GameBroadcast::Relay {
                from: id,
                msg: ServerMsg::PlayerHitBall(PlayerHitBallMsg {
                    id,
                    ball_position: payload.ball_position,
                    initial_velocity: payload.initial_velocity,
                }),
            });
        }
    }
}

fn send_ball_position(broadcast_tx: &broadcast::Sender<GameBroadcast>, position: Position) {
    let _ = broadcast_tx.send(GameBroadcast::All(ServerMsg::BallPosition(
        BallPositionMsg {
            position: round_vec3(position),
        },
    )));
}
