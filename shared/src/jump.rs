//! Jump trajectory and ball-contact planning for the controlling client.

use crate::config::GameConfig;
use crate::protocol::{HitPayload, JumpPayload, NO_ROTATION};
use crate::vec3::{self, Vec3};

/// Outcome of a jump trigger: what to send and whether the ball is struck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpPlan {
    pub jump: JumpPayload,
    pub hit: Option<HitPayload>,
}

/// Which way a player sends the ball across the net: -1 towards -Z, +1 towards +Z.
pub fn team_direction(position: Vec3) -> f64 {
    if position.z >= 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Forward displacement applied at take-off for a facing angle.
pub fn jump_offset(facing: f64, config: &GameConfig) -> Vec3 {
    vec3::scale(vec3::facing_direction(facing), config.jump_forward_distance)
}

/// Velocity needed to lift the player to `height_diff` above its current height,
/// capped at the configured maximum.
pub fn required_jump_velocity(height_diff: f64, config: &GameConfig) -> f64 {
    let needed = (2.0 * config.gravity * height_diff.max(0.0)).sqrt();
    needed.min(config.max_jump_velocity)
}

/// Plan a jump from `position` facing `facing`.
///
/// The contact check uses the point the player lands on after the forward
/// impulse, not its current position.
pub fn plan_jump(position: Vec3, facing: f64, ball: Option<Vec3>, config: &GameConfig) -> JumpPlan {
    let miss = JumpPlan {
        jump: JumpPayload {
            rotation: NO_ROTATION,
            jump_velocity: config.max_jump_velocity,
        },
        hit: None,
    };

    let Some(ball) = ball else {
        return miss;
    };

    let jump_point = vec3::add(position, jump_offset(facing, config));
    if vec3::distance(jump_point, ball) > config.hit_range || ball.y > config.max_hit_height {
        return miss;
    }

    let toward_ball = vec3::normalize(vec3::sub(ball, jump_point));
    let initial_velocity = Vec3::new(
        toward_ball.x * config.hit_horizontal_scale,
        config.hit_lift,
        config.hit_depth_speed * team_direction(jump_point),
    );

    JumpPlan {
        jump: JumpPayload {
            rotation: vec3::facing_from_direction(toward_ball.x, toward_ball.z),
            jump_velocity: required_jump_velocity(ball.y - jump_point.y, config),
        },
        hit: Some(HitPayload {
            ball_position: ball,
            initial_velocity,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::vec3;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn ball_in_front_is_hit() {
        let plan = plan_jump(Vec3::ZERO, 0.0, Some(vec3(0.0, 1.0, 1.0)), &config());
        assert!(plan.jump.rotation.abs() < 1e-9, "atan2(0, z) should be 0");
        assert!(!plan.jump.keeps_facing());
        assert!(plan.jump.jump_velocity <= config().max_jump_velocity);
        assert!(plan.jump.jump_velocity > 0.0);
        assert!(plan.hit.is_some());
    }

    #[test]
    fn distant_ball_is_missed() {
        let plan = plan_jump(Vec3::ZERO, 0.0, Some(vec3(5.0, 1.0, 5.0)), &config());
        assert_eq!(plan.jump.rotation, NO_ROTATION);
        assert!(plan.jump.keeps_facing());
        assert_eq!(plan.jump.jump_velocity, config().max_jump_velocity);
        assert!(plan.hit.is_none());
    }

    #[test]
    fn ball_above_ceiling_is_missed() {
        let plan = plan_jump(Vec3::ZERO, 0.0, Some(vec3(0.0, 4.5, 0.5)), &config());
        assert!(plan.hit.is_none());
    }

    #[test]
    fn no_ball_is_a_plain_jump() {
        let plan = plan_jump(Vec3::ZERO, 1.0, None, &config());
        assert!(plan.hit.is_none());
        assert_eq!(plan.jump.jump_velocity, config().max_jump_velocity);
    }

    #[test]
    fn high_ball_caps_jump_velocity() {
        let plan = plan_jump(Vec3::ZERO, 0.0, Some(vec3(0.0, 2.4, 0.5)), &config());
        assert!(plan.hit.is_some());
        assert_eq!(plan.jump.jump_velocity, config().max_jump_velocity);
    }

    #[test]
    fn low_ball_needs_no_jump() {
        assert_eq!(required_jump_velocity(-1.0, &config()), 0.0);
    }

    #[test]
    fn required_velocity_reaches_height() {
        let cfg = config();
        let height = 1.0;
        let v = required_jump_velocity(height, &cfg);
        // v^2 / 2g is the apex height of a constant-gravity throw
        assert!((v * v / (2.0 * cfg.gravity) - height).abs() < 1e-9);
    }

    #[test]
    fn hit_sends_ball_across_the_net() {
        let near = plan_jump(vec3(0.0, 0.0, 3.0), 0.0, Some(vec3(0.0, 1.0, 4.0)), &config());
        let far = plan_jump(vec3(0.0, 0.0, -3.0), 0.0, Some(vec3(0.0, 1.0, -2.0)), &config());
        assert!(near.hit.unwrap().initial_velocity.z < 0.0);
        assert!(far.hit.unwrap().initial_velocity.z > 0.0);
    }

    #[test]
    fn hit_rotation_points_at_ball() {
        let plan = plan_jump(Vec3::ZERO, 0.0, Some(vec3(1.5, 1.0, 0.5)), &config());
        let expected = vec3::facing_from_direction(1.5, 0.0);
        assert!((plan.jump.rotation - expected).abs() < 1e-9);
    }
}
