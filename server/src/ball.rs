use volley_shared::config::GameConfig;
use volley_shared::vec3::{self, Vec3};

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallStep {
    /// Simulation is not running
    Resting,
    Flying(Vec3),
    /// Dropped below the floor this step; simulation stops
    Landed(Vec3),
}

/// Explicit-Euler ball flight, stepped once per server tick.
#[derive(Debug, Clone)]
pub struct BallSim {
    pub position: Vec3,
    pub velocity: Vec3,
    active: bool,
}

impl BallSim {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Place the ball and launch it with `velocity`.
    pub fn hit(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = velocity;
        self.active = true;
    }

    pub fn step(&mut self, config: &GameConfig) -> BallStep {
        if !self.active {
            return BallStep::Resting;
        }

        self.velocity.y -= config.gravity;
        self.position = vec3::add(self.position, self.velocity);

        if self.position.y < config.ball_floor {
            self.position.y = config.ball_floor;
            self.velocity = Vec3::ZERO;
            self.active = false;
            return BallStep::Landed(self.position);
        }

        self.velocity = vec3::scale(self.velocity, config.ball_drag);
        BallStep::Flying(self.position)
    }
}
