/// Gameplay constants shared by server and clients.
///
/// Jump and ball values are per simulation tick, matching the original
/// frame-stepped feel; `move_speed` is per second.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Downward acceleration applied to jumps and the ball each tick
    pub gravity: f64,
    /// Upper bound for a jump's initial vertical velocity
    pub max_jump_velocity: f64,
    /// Maximum distance between the jump point and the ball for a hit
    pub hit_range: f64,
    /// Balls above this height can't be reached
    pub max_hit_height: f64,
    /// Forward displacement applied when a jump starts
    pub jump_forward_distance: f64,
    /// Scale of the sideways ball velocity on a hit
    pub hit_horizontal_scale: f64,
    /// Vertical ball velocity on a hit
    pub hit_lift: f64,
    /// Ball speed across the net on a hit
    pub hit_depth_speed: f64,
    /// Ball rests when its center drops below this height
    pub ball_floor: f64,
    /// Per-tick velocity multiplier for the ball
    pub ball_drag: f64,
    pub ground_height: f64,
    /// Running speed (units per second)
    pub move_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity: 0.015,
            max_jump_velocity: 0.2,
            hit_range: 2.5,
            max_hit_height: 4.0,
            jump_forward_distance: 0.5,
            hit_horizontal_scale: 0.5,
            hit_lift: 0.4,
            hit_depth_speed: 0.6,
            ball_floor: 0.5,
            ball_drag: 0.99,
            ground_height: 0.0,
            move_speed: 6.0,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() || self.gravity <= 0.0 {
            return Err("gravity must be finite and > 0".to_string());
        }
        if !self.max_jump_velocity.is_finite() || self.max_jump_velocity <= 0.0 {
            return Err("max_jump_velocity must be finite and > 0".to_string());
        }
        if !self.hit_range.is_finite() || self.hit_range <= 0.0 {
            return Err("hit_range must be finite and > 0".to_string());
        }
        if !self.max_hit_height.is_finite() || self.max_hit_height < self.ground_height {
            return Err("max_hit_height must be finite and >= ground_height".to_string());
        }
        if !self.jump_forward_distance.is_finite() || self.jump_forward_distance < 0.0 {
            return Err("jump_forward_distance must be finite and >= 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.ball_drag) {
            return Err("ball_drag must be within [0, 1]".to_string());
        }
        if !self.move_speed.is_finite() || self.move_speed <= 0.0 {
            return Err("move_speed must be finite and > 0".to_string());
        }
        Ok(())
    }
}
