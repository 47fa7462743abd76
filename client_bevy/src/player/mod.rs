//! Movement and jump state machine for local and remote players.

pub mod hooks;

use std::f64::consts::FRAC_1_SQRT_2;

use bevy::log::{debug, warn};
use volley_shared::config::GameConfig;
use volley_shared::jump::plan_jump;
use volley_shared::protocol::{ClientMsg, JumpPayload};
use volley_shared::vec3::{facing_from_direction, horizontal_length, sub, Vec3};

use crate::animation::{Action, ActionTable, ClipLibrary, ClipMixer, MeshHandle};
use crate::game::input::InputState;

use hooks::{build_action_table, ActionHook, Body};

/// Remote position deltas at or below this are treated as standing still
const MOVE_EPSILON: f64 = 1e-4;

const PLAYER_MESH: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Moving,
    /// A jump is in flight; input and remote animation changes are ignored
    NonInterruptible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Local,
    Remote,
}

pub struct Player {
    pub id: u32,
    pub control: Control,
    state: MotionState,
    body: Body,
    actions: ActionTable<ActionHook>,
    mixer: ClipMixer,
    pub mesh: Option<MeshHandle>,
    last_sent: Vec3,
    jump_held: bool,
}

impl Player {
    pub fn new(
        id: u32,
        control: Control,
        position: Vec3,
        library: &ClipLibrary,
        config: GameConfig,
    ) -> Self {
        let mut mixer = ClipMixer::new();
        let actions = build_action_table(library, &mut mixer);
        let mesh = match library.skinned_entity(PLAYER_MESH) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                warn!("Player {} spawned without a mesh: {}", id, e);
                None
            }
        };

        let mut player = Self {
            id,
            control,
            state: MotionState::Idle,
            body: Body::new(position, config),
            actions,
            mixer,
            mesh,
            last_sent: position,
            jump_held: false,
        };
        player.select(Action::Idle);
        player
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn facing(&self) -> f64 {
        self.body.facing
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn current_action(&self) -> Option<Action> {
        self.actions.current()
    }

    fn select(&mut self, action: Action) -> bool {
        self.actions.select(action, &mut self.mixer, &mut self.body)
    }

    /// Advances animation and returns to `Idle` once a jump has released
    /// the body.
    pub fn tick(&mut self, dt: f64) {
        self.actions.update(&mut self.mixer, &mut self.body, dt);
        if self.state == MotionState::NonInterruptible && self.body.interruptible {
            self.state = MotionState::Idle;
        }
    }

    /// Applies local input and returns the messages to send to the server.
    pub fn handle_input(&mut self, input: &InputState, ball: Option<Vec3>, dt: f64) -> Vec<ClientMsg> {
        let mut out = Vec::new();
        if self.control != Control::Local {
            return out;
        }

        let jump_pressed = input.jump && !self.jump_held;
        self.jump_held = input.jump;
        if self.state == MotionState::NonInterruptible {
            return out;
        }

        if jump_pressed {
            let plan = plan_jump(self.body.position, self.body.facing, ball, &self.body.config);
            out.push(ClientMsg::ClientJump(plan.jump));
            if let Some(hit) = plan.hit {
                debug!("Player {} hits the ball", self.id);
                out.push(ClientMsg::ClientHitBall(hit));
            }
            self.apply_jump(plan.jump);
            self.push_movement(&mut out);
            return out;
        }

        let (mut dx, mut dz) = input.direction();
        if dx != 0.0 && dz != 0.0 {
            dx *= FRAC_1_SQRT_2;
            dz *= FRAC_1_SQRT_2;
        }

        if dx != 0.0 || dz != 0.0 {
            let step = self.body.config.move_speed * dt;
            self.body.position.x += dx * step;
            self.body.position.z += dz * step;
            self.body.facing = facing_from_direction(dx, dz);
            if self.state == MotionState::Idle {
                self.state = MotionState::Moving;
                self.select(Action::SlowRun);
                out.push(animation_msg(Action::SlowRun));
            }
        } else if self.state == MotionState::Moving {
            self.state = MotionState::Idle;
            self.select(Action::Idle);
            out.push(animation_msg(Action::Idle));
        }

        self.push_movement(&mut out);
        out
    }

    fn push_movement(&mut self, out: &mut Vec<ClientMsg>) {
        if self.body.position != self.last_sent {
            self.last_sent = self.body.position;
            out.push(ClientMsg::ClientMovement(self.body.position));
        }
    }

    /// Starts a jump from a local plan or a relayed `player_jump`.
    /// Returns false when the jump could not start.
    pub fn apply_jump(&mut self, payload: JumpPayload) -> bool {
        if self.state == MotionState::NonInterruptible {
            debug!("Player {} is already jumping", self.id);
            return false;
        }

        if !payload.keeps_facing() {
            self.body.facing = payload.rotation;
        }
        self.body.jump.velocity = payload.jump_velocity;
        self.body.interruptible = false;

        if self.select(Action::Jump) {
            self.state = MotionState::NonInterruptible;
            true
        } else {
            self.body.interruptible = true;
            false
        }
    }

    /// Overwrites the position with a relayed snapshot. Starts the run
    /// animation when the snapshot shows the player moving.
    pub fn apply_position_snapshot(&mut self, position: Vec3) {
        let delta = sub(position, self.body.position);
        if self.state != MotionState::NonInterruptible && horizontal_length(delta) > MOVE_EPSILON {
            self.body.facing = facing_from_direction(delta.x, delta.z);
            if self.state == MotionState::Idle {
                self.state = MotionState::Moving;
                self.select(Action::SlowRun);
            }
        }
        self.body.position = position;
    }

    /// Applies a relayed `animation_update`.
    pub fn apply_animation(&mut self, name: &str) {
        let action = match name.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                warn!("Player {}: {}", self.id, e);
                return;
            }
        };
        if self.state == MotionState::NonInterruptible {
            debug!("Player {} ignores '{}' mid-jump", self.id, action);
            return;
        }

        match (action, self.state) {
            (Action::Idle, MotionState::Moving) => {
                self.state = MotionState::Idle;
                self.select(Action::Idle);
            }
            (Action::SlowRun, MotionState::Idle) => {
                self.state = MotionState::Moving;
                self.select(Action::SlowRun);
            }
            _ => {}
        }
    }
}

fn animation_msg(action: Action) -> ClientMsg {
    ClientMsg::ClientAnimation {
        animation: action.as_str().to_string(),
    }
}
