use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bevy::log::{debug, warn};
use thiserror::Error;

use super::chain::{AnimationChain, LinkHooks, StopWait};
use super::mixer::Mixer;

/// Named player actions; the wire name doubles as the clip name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Idle,
    SlowRun,
    Jump,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Idle, Action::SlowRun, Action::Jump];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::SlowRun => "slow_run",
            Action::Jump => "jump",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// One animation chain per action, at most one of them live.
///
/// Leaving `Idle` blends into the idle pose and holds the next action as
/// pending until the blend is over. Leaving any other action cuts over
/// immediately.
#[derive(Debug)]
pub struct ActionTable<H> {
    chains: HashMap<Action, AnimationChain<H>>,
    current: Option<Action>,
    pending: Option<Action>,
}

impl<H> Default for ActionTable<H> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
            current: None,
            pending: None,
        }
    }
}

impl<H> ActionTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: Action, chain: AnimationChain<H>) {
        self.chains.insert(action, chain);
    }

    pub fn contains(&self, action: Action) -> bool {
        self.chains.contains_key(&action)
    }

    pub fn chain(&self, action: Action) -> Option<&AnimationChain<H>> {
        self.chains.get(&action)
    }

    pub fn current(&self) -> Option<Action> {
        self.current
    }

    pub fn pending(&self) -> Option<Action> {
        self.pending
    }

    /// Switches to `action`. Returns false when no chain exists for it.
    pub fn select<C>(&mut self, action: Action, mixer: &mut dyn Mixer, ctx: &mut C) -> bool
    where
        H: LinkHooks<C>,
    {
        if !self.chains.contains_key(&action) {
            warn!("No animation chain for action '{}'", action);
            return false;
        }

        if self.pending.is_some() {
            self.pending = Some(action);
            return true;
        }

        let Some(current) = self.current else {
            self.start(action, mixer, ctx);
            return true;
        };

        if current == action {
            let restart = self.chains.get(&action).is_some_and(|c| !c.is_playing());
            if restart {
                self.start(action, mixer, ctx);
            }
            return true;
        }

        let wait = match self.chains.get_mut(&current) {
            Some(chain) if current == Action::Idle => chain.stop(mixer, ctx),
            Some(chain) => {
                chain.halt(mixer, ctx);
                StopWait::Immediate
            }
            None => StopWait::Immediate,
        };

        match wait {
            StopWait::Draining(secs) => {
                debug!("Holding '{}' for {:.2}s while '{}' drains", action, secs, current);
                self.pending = Some(action);
            }
            StopWait::Immediate => self.start(action, mixer, ctx),
        }
        true
    }

    pub fn update<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C, dt: f64)
    where
        H: LinkHooks<C>,
    {
        let Some(current) = self.current else {
            return;
        };
        let Some(chain) = self.chains.get_mut(&current) else {
            return;
        };
        chain.update(mixer, ctx, dt);

        if !chain.is_draining() {
            if let Some(next) = self.pending.take() {
                self.start(next, mixer, ctx);
            }
        }
    }

    fn start<C>(&mut self, action: Action, mixer: &mut dyn Mixer, ctx: &mut C)
    where
        H: LinkHooks<C>,
    {
        if let Some(chain) = self.chains.get_mut(&action) {
            chain.start(mixer, ctx);
            self.current = Some(action);
        }
    }
}
