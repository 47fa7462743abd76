use std::collections::HashMap;

use volley_shared::protocol::PlayerWire;
use volley_shared::vec3::Position;

/// A seated player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub id: u32,
    pub position: Position,
}

impl Player {
    pub fn to_wire(&self) -> PlayerWire {
        PlayerWire {
            id: self.id,
            position: self.position,
        }
    }
}

/// Fixed-capacity table of connected players, keyed by connection id.
#[derive(Debug)]
pub struct PlayerSlotTable {
    players: HashMap<u32, Player>,
    capacity: usize,
}

impl PlayerSlotTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            players: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Seat a player. Returns false if every slot is taken.
    ///
    /// Re-adding an id that is already seated only updates its position.
    pub fn add_player(&mut self, id: u32, position: Position) -> bool {
        if let Some(player) = self.players.get_mut(&id) {
            player.position = position;
            return true;
        }
        if self.players.len() >= self.capacity {
            return false;
        }
        self.players.insert(id, Player { id, position });
        true
    }

    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Overwrite a seated player's position. Unknown ids are ignored.
    pub fn update_player_position(&mut self, id: u32, position: Position) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.position = position;
                true
            }
            None => false,
        }
    }

    pub fn get_player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_all_players(&self) -> HashMap<u32, PlayerWire> {
        self.players
            .iter()
            .map(|(id, player)| (*id, player.to_wire()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
