use bevy::prelude::Resource;
use volley_shared::vec3::Vec3;

/// Last known ball position. The server owns the flight; the client only
/// applies what it is told.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct BallView {
    /// Seeded by the join greeting, `None` only before it arrives
    pub position: Option<Vec3>,
}

impl BallView {
    pub fn apply_snapshot(&mut self, position: Vec3) {
        self.position = Some(position);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
