use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GameConfig;
use crate::vec3::{Position, Vec3};

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// `rotation` value meaning "keep the current facing".
pub const NO_ROTATION: f64 = -1.0;

/// Sent in an `error` message right before a rejected connection is closed.
pub const GAME_FULL_MESSAGE: &str = "The game is full";

// === Payloads ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JumpPayload {
    /// Final facing in radians, or `NO_ROTATION`
    pub rotation: f64,
    pub jump_velocity: f64,
}

impl JumpPayload {
    pub fn keeps_facing(&self) -> bool {
        self.rotation == NO_ROTATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HitPayload {
    pub ball_position: Vec3,
    pub initial_velocity: Vec3,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "player_id")]
    PlayerId(PlayerIdMsg),
    #[serde(rename = "initial_players")]
    InitialPlayers(InitialPlayersMsg),
    #[serde(rename = "player_connected")]
    PlayerConnected(PlayerWire),
    #[serde(rename = "player_disconnected")]
    PlayerDisconnected(PlayerLeftMsg),
    #[serde(rename = "position_update")]
    PositionUpdate(PlayerWire),
    #[serde(rename = "animation_update")]
    AnimationUpdate(AnimationUpdateMsg),
    #[serde(rename = "player_jump")]
    PlayerJump(PlayerJumpMsg),
    #[serde(rename = "player_hit_ball")]
    PlayerHitBall(PlayerHitBallMsg),
    #[serde(rename = "ball_position")]
    BallPosition(BallPositionMsg),
    #[serde(rename = "error")]
    Error(ErrorMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdMsg {
    pub protocol_version: u32,
    pub id: u32,
    pub position: Position,
    pub config: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InitialPlayersMsg {
    #[serde(deserialize_with = "id_keys::deserialize")]
    pub players: HashMap<u32, PlayerWire>,
}

/// JSON object keys arrive as strings, and the buffered decoding behind
/// internally tagged enums does not turn them back into integers.
mod id_keys {
    use std::collections::HashMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    use super::PlayerWire;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<u32, PlayerWire>, D::Error>
    where
        D: Deserializer<'de>,
    {
        HashMap::<String, PlayerWire>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, wire)| {
                key.parse::<u32>()
                    .map(|id| (id, wire))
                    .map_err(|e| D::Error::custom(format!("player id '{}': {}", key, e)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerWire {
    pub id: u32,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerLeftMsg {
    pub id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnimationUpdateMsg {
    pub id: u32,
    pub animation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJumpMsg {
    pub id: u32,
    pub rotation: f64,
    pub jump_velocity: f64,
}

impl PlayerJumpMsg {
    pub fn payload(&self) -> JumpPayload {
        JumpPayload {
            rotation: self.rotation,
            jump_velocity: self.jump_velocity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHitBallMsg {
    pub id: u32,
    pub ball_position: Vec3,
    pub initial_velocity: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BallPositionMsg {
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorMsg {
    pub message: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "client_movement")]
    ClientMovement(Vec3),
    #[serde(rename = "client_animation")]
    ClientAnimation { animation: String },
    #[serde(rename = "client_jump")]
    ClientJump(JumpPayload),
    #[serde(rename = "client_hit_ball")]
    ClientHitBall(HitPayload),
}

// === Conversion helpers ===

/// Round to 4 decimal places (plenty for court coordinates, keeps JSON small)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

pub fn round_vec3(v: Vec3) -> Vec3 {
    Vec3::new(round4(v.x), round4(v.y), round4(v.z))
}
