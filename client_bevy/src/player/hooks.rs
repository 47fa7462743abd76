use bevy::log::warn;
use volley_shared::config::GameConfig;
use volley_shared::jump::jump_offset;
use volley_shared::vec3::{add, Vec3};

use crate::animation::{
    Action, ActionTable, AnimationChain, AnimationLink, ClipLibrary, LinkHooks, Mixer,
};

/// Fraction of the jump clip that plays before the body leaves the ground
const TAKEOFF_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JumpState {
    /// Vertical speed per tick
    pub velocity: f64,
    pub elapsed: f64,
}

/// The part of a player that animation hooks act on
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec3,
    /// Yaw in radians
    pub facing: f64,
    /// Cosmetic yaw added on top of `facing` while a clip asks for it
    pub model_rotation_offset: f64,
    pub interruptible: bool,
    pub jump: JumpState,
    pub config: GameConfig,
}

impl Body {
    pub fn new(position: Vec3, config: GameConfig) -> Self {
        Self {
            position,
            facing: 0.0,
            model_rotation_offset: 0.0,
            interruptible: true,
            jump: JumpState::default(),
            config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpHook {
    pub takeoff_delay: f64,
    /// Radians
    pub rotation_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionHook {
    Passive,
    Jump(JumpHook),
}

impl LinkHooks<Body> for ActionHook {
    fn on_enter(&self, body: &mut Body) {
        if let ActionHook::Jump(hook) = self {
            body.position = add(body.position, jump_offset(body.facing, &body.config));
            body.model_rotation_offset = hook.rotation_offset;
            body.jump.elapsed = 0.0;
            body.interruptible = false;
        }
    }

    fn on_tick(&self, body: &mut Body, dt: f64) {
        let ActionHook::Jump(hook) = self else {
            return;
        };
        body.jump.elapsed += dt;
        if body.jump.elapsed < hook.takeoff_delay {
            return;
        }

        body.position.y += body.jump.velocity;
        body.jump.velocity -= body.config.gravity;
        if body.position.y < body.config.ground_height {
            body.position.y = body.config.ground_height;
            body.jump.velocity = 0.0;
        }
    }

    fn on_exit(&self, body: &mut Body) {
        if let ActionHook::Jump(_) = self {
            // Slow frame rates can leave the link before the body has come down
            body.position.y = body.config.ground_height;
            body.jump.velocity = 0.0;
            body.model_rotation_offset = 0.0;
            body.interruptible = true;
        }
    }
}

/// Builds the per-player action table. Every chain ends on the shared idle
/// link; actions whose clip is missing are left out with a warning.
pub fn build_action_table(library: &ClipLibrary, mixer: &mut dyn Mixer) -> ActionTable<ActionHook> {
    let mut table = ActionTable::new();

    let idle = match library.clip(Action::Idle.as_str()) {
        Ok((clip, options)) => AnimationLink::new(clip.clone(), options.loopable, ActionHook::Passive),
        Err(e) => {
            warn!("Player has no animations: {}", e);
            return table;
        }
    };

    for action in Action::ALL {
        let links = if action == Action::Idle {
            vec![idle.clone()]
        } else {
            let (clip, options) = match library.clip(action.as_str()) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Skipping action '{}': {}", action, e);
                    continue;
                }
            };
            let hooks = match action {
                Action::Jump => ActionHook::Jump(JumpHook {
                    takeoff_delay: clip.duration * TAKEOFF_FRACTION,
                    rotation_offset: options.rotation_offset.to_radians(),
                }),
                _ => ActionHook::Passive,
            };
            vec![
                AnimationLink::new(clip.clone(), options.loopable, hooks),
                idle.clone(),
            ]
        };

        // A jump settles into idle by itself
        let fade_to_idle = action != Action::Jump;
        match AnimationChain::new(mixer, fade_to_idle, links) {
            Ok(chain) => table.insert(action, chain),
            Err(e) => warn!("Skipping action '{}': {}", action, e),
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ClipMixer;

    fn jump_hook() -> ActionHook {
        ActionHook::Jump(JumpHook {
            takeoff_delay: 0.3,
            rotation_offset: 0.5,
        })
    }

    fn body() -> Body {
        Body::new(Vec3::ZERO, GameConfig::default())
    }

    #[test]
    fn jump_enter_pushes_forward_and_locks() {
        let mut body = body();
        jump_hook().on_enter(&mut body);
        assert!((body.position.z - 0.5).abs() < 1e-9);
        assert_eq!(body.model_rotation_offset, 0.5);
        assert!(!body.interruptible);
    }

    #[test]
    fn jump_waits_for_takeoff_delay() {
        let mut body = body();
        body.jump.velocity = 0.2;
        let hook = jump_hook();
        hook.on_enter(&mut body);
        hook.on_tick(&mut body, 0.1);
        hook.on_tick(&mut body, 0.1);
        assert_eq!(body.position.y, 0.0);
        hook.on_tick(&mut body, 0.15);
        assert!((body.position.y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn jump_lands_on_ground() {
        let mut body = body();
        body.jump.velocity = 0.2;
        let hook = jump_hook();
        hook.on_enter(&mut body);
        let mut peak: f64 = 0.0;
        for _ in 0..100 {
            hook.on_tick(&mut body, 0.5);
            peak = peak.max(body.position.y);
        }
        assert!(peak > 1.0);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.jump.velocity, 0.0);
    }

    #[test]
    fn jump_exit_restores_pose() {
        let mut body = body();
        let hook = jump_hook();
        hook.on_enter(&mut body);
        hook.on_exit(&mut body);
        assert_eq!(body.model_rotation_offset, 0.0);
        assert!(body.interruptible);
    }

    #[test]
    fn jump_exit_lands_a_body_still_in_the_air() {
        let mut body = body();
        body.jump.velocity = 0.2;
        let hook = jump_hook();
        hook.on_enter(&mut body);
        hook.on_tick(&mut body, 0.5);
        hook.on_tick(&mut body, 0.5);
        assert!(body.position.y > 0.0);

        hook.on_exit(&mut body);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.jump.velocity, 0.0);
    }

    #[test]
    fn passive_hooks_leave_body_alone() {
        let mut body = body();
        ActionHook::Passive.on_enter(&mut body);
        ActionHook::Passive.on_tick(&mut body, 1.0);
        assert_eq!(body.position, Vec3::ZERO);
        assert!(body.interruptible);
    }

    #[test]
    fn table_has_every_builtin_action() {
        let library = ClipLibrary::builtin().unwrap();
        let mut mixer = ClipMixer::new();
        let table = build_action_table(&library, &mut mixer);
        for action in Action::ALL {
            assert!(table.contains(action), "missing {}", action);
        }
        // idle is bound once and shared
        assert_eq!(mixer.bound_count(), 3);
    }

    #[test]
    fn missing_clip_skips_only_that_action() {
        let library = ClipLibrary::from_manifest_str(
            r#"{"animations": {"idle": {"duration": 2.0}, "slow_run": {"duration": 0.8}}}"#,
        )
        .unwrap();
        let mut mixer = ClipMixer::new();
        let table = build_action_table(&library, &mut mixer);
        assert!(table.contains(Action::SlowRun));
        assert!(!table.contains(Action::Jump));
    }

    #[test]
    fn jump_chain_settles_into_idle() {
        let library = ClipLibrary::builtin().unwrap();
        let mut mixer = ClipMixer::new();
        let mut table = build_action_table(&library, &mut mixer);
        let mut body = body();
        body.jump.velocity = 0.2;

        assert!(table.select(Action::Jump, &mut mixer, &mut body));
        assert!(!body.interruptible);
        for _ in 0..120 {
            table.update(&mut mixer, &mut body, 1.0 / 60.0);
        }
        assert!(body.interruptible);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(table.chain(Action::Jump).unwrap().cursor(), Some(1));
    }
}
