//! Client-side bot that drives the local player when no human is at the keys.
//! Wanders its half of the court and jumps at a ball on its side or at the
//! serve spot.

use volley_shared::vec3::{horizontal_length, sub, Vec3};

use super::input::InputState;

const COURT_HALF_WIDTH: f64 = 6.0;
const COURT_DEPTH: f64 = 8.0;
/// Closest the bot gets to the net
const NET_MARGIN: f64 = 0.5;

const CHASE_DEADZONE: f64 = 0.3;
const JUMP_REACH: f64 = 2.0;
const JUMP_MAX_BALL_HEIGHT: f64 = 4.0;
const JUMP_COOLDOWN: f64 = 1.5;

const WANDER_MIN: f64 = 0.8;
const WANDER_MAX: f64 = 2.0;
const WANDER_IDLE_CHANCE: f64 = 0.3;

#[derive(Debug)]
pub(crate) struct VolleyBot {
    wander: InputState,
    wander_left: f64,
    jump_cooldown: f64,
    seed: u32,
}

impl Default for VolleyBot {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

impl VolleyBot {
    pub(crate) fn with_seed(seed: u32) -> Self {
        Self {
            wander: InputState::default(),
            wander_left: 0.0,
            jump_cooldown: 0.0,
            seed,
        }
    }

    fn next_random(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223) & 0x7fff_ffff;
        self.seed as f64 / 0x7fff_ffffu32 as f64
    }

    pub(crate) fn update(&mut self, dt: f64, me: Vec3, ball: Option<Vec3>) -> InputState {
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        // The serve spot sits on the net line and belongs to both sides
        let target = ball.filter(|b| b.z * me.z >= 0.0);
        let input = match target {
            Some(ball) => self.chase(me, ball),
            None => self.wander(dt),
        };
        keep_on_court(input, me)
    }

    fn chase(&mut self, me: Vec3, ball: Vec3) -> InputState {
        let delta = sub(ball, me);
        if horizontal_length(delta) <= JUMP_REACH
            && ball.y <= JUMP_MAX_BALL_HEIGHT
            && self.jump_cooldown <= 0.0
        {
            self.jump_cooldown = JUMP_COOLDOWN;
            return InputState {
                jump: true,
                ..Default::default()
            };
        }

        InputState {
            left: delta.x < -CHASE_DEADZONE,
            right: delta.x > CHASE_DEADZONE,
            forward: delta.z < -CHASE_DEADZONE,
            back: delta.z > CHASE_DEADZONE,
            jump: false,
        }
    }

    fn wander(&mut self, dt: f64) -> InputState {
        self.wander_left -= dt;
        if self.wander_left <= 0.0 {
            self.wander_left = WANDER_MIN + self.next_random() * (WANDER_MAX - WANDER_MIN);
            self.wander = if self.next_random() < WANDER_IDLE_CHANCE {
                InputState::default()
            } else {
                let dir = (self.next_random() * 8.0) as u32 % 8;
                InputState {
                    forward: matches!(dir, 0 | 1 | 7),
                    right: matches!(dir, 1..=3),
                    back: matches!(dir, 3..=5),
                    left: matches!(dir, 5..=7),
                    jump: false,
                }
            };
        }
        self.wander
    }

    pub(crate) fn reset(&mut self) {
        self.wander = InputState::default();
        self.wander_left = 0.0;
        self.jump_cooldown = 0.0;
    }
}

/// Drops keys that would carry the player off its half of the court
fn keep_on_court(mut input: InputState, me: Vec3) -> InputState {
    if me.x >= COURT_HALF_WIDTH {
        input.right = false;
    }
    if me.x <= -COURT_HALF_WIDTH {
        input.left = false;
    }
    if me.z >= 0.0 {
        if me.z <= NET_MARGIN {
            input.forward = false;
        }
        if me.z >= COURT_DEPTH {
            input.back = false;
        }
    } else {
        if me.z >= -NET_MARGIN {
            input.back = false;
        }
        if me.z <= -COURT_DEPTH {
            input.forward = false;
        }
    }
    input
}
