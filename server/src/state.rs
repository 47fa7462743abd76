use std::collections::HashMap;

use thiserror::Error;
use volley_shared::config::GameConfig;
use volley_shared::protocol::{HitPayload, PlayerWire, GAME_FULL_MESSAGE};
use volley_shared::vec3::{Position, Vec3};

use crate::ball::{BallSim, BallStep};
use crate::config::ServerConfig;
use crate::player::PlayerSlotTable;

/// Distance from the net at which players spawn
const SPAWN_DEPTH: f64 = 4.0;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("{}", GAME_FULL_MESSAGE)]
    Full,
}

/// Central game state owned by the game loop task.
pub struct GameState {
    pub slots: PlayerSlotTable,
    pub ball: BallSim,
    pub config: GameConfig,
    next_player_id: u32,
}

impl GameState {
    pub fn new(server_config: &ServerConfig, config: GameConfig) -> Self {
        Self {
            slots: PlayerSlotTable::new(server_config.player_slots),
            ball: BallSim::new(Vec3::new(0.0, config.ball_floor, 0.0)),
            config,
            next_player_id: 1,
        }
    }

    /// Seat a new player, alternating court sides. Returns (player_id, spawn position).
    pub fn join(&mut self) -> Result<(u32, Position), JoinError> {
        if self.slots.is_full() {
            return Err(JoinError::Full);
        }

        let id = self.next_player_id;
        let side = if self.slots.len() % 2 == 0 { 1.0 } else { -1.0 };
        let spawn = Vec3::new(0.0, self.config.ground_height, SPAWN_DEPTH * side);

        if !self.slots.add_player(id, spawn) {
            return Err(JoinError::Full);
        }
        self.next_player_id += 1;
        Ok((id, spawn))
    }

    pub fn leave(&mut self, id: u32) -> bool {
        self.slots.remove_player(id).is_some()
    }

    pub fn move_player(&mut self, id: u32, position: Position) -> bool {
        self.slots.update_player_position(id, position)
    }

    pub fn hit_ball(&mut self, hit: &HitPayload) {
        self.ball.hit(hit.ball_position, hit.initial_velocity);
    }

    /// Advance the ball one tick
    pub fn tick(&mut self) -> BallStep {
        self.ball.step(&self.config)
    }

    pub fn players(&self) -> HashMap<u32, PlayerWire> {
        self.slots.get_all_players()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(slots: usize) -> GameState {
        let server_config = ServerConfig {
            player_slots: slots,
            ..Default::default()
        };
        GameState::new(&server_config, GameConfig::default())
    }

    #[test]
    fn players_spawn_on_opposite_sides() {
        let mut state = test_state(2);
        let (_, a) = state.join().unwrap();
        let (_, b) = state.join().unwrap();
        assert!(a.z > 0.0);
        assert!(b.z < 0.0);
    }

    #[test]
    fn join_rejects_when_full() {
        let mut state = test_state(2);
        state.join().unwrap();
        state.join().unwrap();
        let err = state.join().unwrap_err();
        assert_eq!(err, JoinError::Full);
        assert_eq!(err.to_string(), "The game is full");
    }

    #[test]
    fn leave_frees_a_slot_and_ids_stay_unique() {
        let mut state = test_state(1);
        let (first, _) = state.join().unwrap();
        assert!(state.leave(first));
        let (second, _) = state.join().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn hit_starts_ball_flight() {
        let mut state = test_state(2);
        state.hit_ball(&HitPayload {
            ball_position: Vec3::new(0.0, 1.0, 1.0),
            initial_velocity: Vec3::new(0.0, 0.4, -0.6),
        });
        assert!(state.ball.is_active());
        assert!(matches!(state.tick(), BallStep::Flying(_)));
    }

    #[test]
    fn movement_for_unknown_player_is_ignored() {
        let mut state = test_state(2);
        assert!(!state.move_player(42, Vec3::ZERO));
    }
}
