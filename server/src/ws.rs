use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use volley_shared::protocol::{
    BallPositionMsg, ClientMsg, ErrorMsg, InitialPlayersMsg, PlayerIdMsg, ServerMsg,
    PROTOCOL_VERSION,
};

use crate::game_loop::{GameBroadcast, GameCommand};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode server message: {}", e);
            true
        }
    }
}

/// Translate a client message into a game command for `id`.
fn to_command(id: u32, msg: ClientMsg) -> GameCommand {
    match msg {
        ClientMsg::ClientMovement(position) => GameCommand::Movement { id, position },
        ClientMsg::ClientAnimation { animation } => GameCommand::Animation { id, animation },
        ClientMsg::ClientJump(payload) => GameCommand::Jump { id, payload },
        ClientMsg::ClientHitBall(payload) => GameCommand::HitBall { id, payload },
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before joining so nothing sent right after the join is missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::PlayerJoin { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send PlayerJoin command");
        return;
    }

    let accepted = match resp_rx.await {
        Ok(Ok(accepted)) => accepted,
        Ok(Err(e)) => {
            let _ = send_msg(
                &mut sink,
                &ServerMsg::Error(ErrorMsg {
                    message: e.to_string(),
                }),
            )
            .await;
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
        Err(_) => {
            tracing::error!("Failed to receive join response");
            return;
        }
    };
    let my_id = accepted.id;

    tracing::info!("Player {} connected", my_id);

    let greeting = [
        ServerMsg::PlayerId(PlayerIdMsg {
            protocol_version: PROTOCOL_VERSION,
            id: my_id,
            position: accepted.position,
            config: accepted.config,
        }),
        ServerMsg::InitialPlayers(InitialPlayersMsg {
            players: accepted.players,
        }),
        ServerMsg::BallPosition(BallPositionMsg {
            position: accepted.ball,
        }),
    ];
    for msg in &greeting {
        if !send_msg(&mut sink, msg).await {
            let _ = app_state
                .game_tx
                .send(GameCommand::PlayerLeave { id: my_id })
                .await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => {
                                let _ = app_state.game_tx.send(to_command(my_id, client_msg)).await;
                            }
                            Err(e) => {
                                tracing::debug!("Player {} sent malformed message: {}", my_id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Player {} socket error: {}", my_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let msg = match broadcast {
                            GameBroadcast::Relay { from, .. } if from == my_id => continue,
                            GameBroadcast::Relay { msg, .. } => msg,
                            GameBroadcast::All(msg) => msg,
                        };
                        if !send_msg(&mut sink, &msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Player {} lagged by {} messages", my_id, n);
                        // Positions are full snapshots, the next one catches up
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::PlayerLeave { id: my_id })
        .await;
    tracing::info!("Player {} disconnected", my_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_shared::protocol::JumpPayload;

    #[test]
    fn client_jump_maps_to_jump_command() {
        let msg = ClientMsg::ClientJump(JumpPayload {
            rotation: 1.0,
            jump_velocity: 0.15,
        });
        match to_command(3, msg) {
            GameCommand::Jump { id, payload } => {
                assert_eq!(id, 3);
                assert_eq!(payload.rotation, 1.0);
            }
            _ => panic!("Expected Jump"),
        }
    }

    #[test]
    fn client_animation_maps_to_animation_command() {
        let msg = ClientMsg::ClientAnimation {
            animation: "slow_run".to_string(),
        };
        match to_command(5, msg) {
            GameCommand::Animation { id, animation } => {
                assert_eq!(id, 5);
                assert_eq!(animation, "slow_run");
            }
            _ => panic!("Expected Animation"),
        }
    }
}
