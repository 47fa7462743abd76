use std::sync::Arc;

use thiserror::Error;

use super::clips::Clip;
use super::mixer::{LoopMode, Mixer, PlaybackId};

/// Blend time between consecutive links, and from a stopped chain to idle
pub const CROSS_FADE_SECONDS: f64 = 0.1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("an animation chain needs at least one link")]
    Empty,
}

/// Side effects attached to a link, run against the owning entity's state `C`.
pub trait LinkHooks<C> {
    fn on_enter(&self, _ctx: &mut C) {}
    fn on_tick(&self, _ctx: &mut C, _dt: f64) {}
    fn on_exit(&self, _ctx: &mut C) {}
}

impl<C> LinkHooks<C> for () {}

/// One clip in a chain. Immutable once built and shared between chains.
#[derive(Debug)]
pub struct AnimationLink<H> {
    pub clip: Clip,
    pub loopable: bool,
    pub hooks: H,
}

impl<H> AnimationLink<H> {
    pub fn new(clip: Clip, loopable: bool, hooks: H) -> Arc<Self> {
        Arc::new(Self {
            clip,
            loopable,
            hooks,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainStatus {
    /// Built, never started
    Ready,
    Playing,
    /// The last link ran its exit hook; only the mixer keeps moving
    Finished,
    /// Blending into idle after `stop()`; all handles stop when it elapses
    Draining { remaining: f64 },
    Stopped,
}

/// What the caller has to wait for after [`AnimationChain::stop`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopWait {
    Immediate,
    Draining(f64),
}

/// Plays its links in order, cross-fading from one to the next shortly
/// before the current clip ends. A loopable link holds the chain until it is
/// stopped; the last link is usually the shared idle loop.
#[derive(Debug)]
pub struct AnimationChain<H> {
    links: Vec<Arc<AnimationLink<H>>>,
    handles: Vec<PlaybackId>,
    cursor: Option<usize>,
    status: ChainStatus,
    cross_fade: f64,
    fade_to_idle: bool,
}

impl<H> AnimationChain<H> {
    pub fn new(
        mixer: &mut dyn Mixer,
        fade_to_idle: bool,
        links: Vec<Arc<AnimationLink<H>>>,
    ) -> Result<Self, ChainError> {
        if links.is_empty() {
            return Err(ChainError::Empty);
        }
        let handles = links.iter().map(|link| mixer.bind(&link.clip)).collect();
        Ok(Self {
            links,
            handles,
            cursor: None,
            status: ChainStatus::Ready,
            cross_fade: CROSS_FADE_SECONDS,
            fade_to_idle,
        })
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn status(&self) -> ChainStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == ChainStatus::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.status == ChainStatus::Finished
    }

    pub fn is_draining(&self) -> bool {
        matches!(self.status, ChainStatus::Draining { .. })
    }

    fn last_index(&self) -> usize {
        self.links.len() - 1
    }

    fn stop_all(&self, mixer: &mut dyn Mixer) {
        for &handle in &self.handles {
            mixer.stop(handle);
        }
    }

    pub fn start<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C)
    where
        H: LinkHooks<C>,
    {
        for (link, &handle) in self.links.iter().zip(&self.handles) {
            mixer.reset(handle);
            let mode = if link.loopable {
                LoopMode::Repeat
            } else {
                LoopMode::Once
            };
            mixer.set_loop(handle, mode);
        }

        self.cursor = Some(0);
        self.status = ChainStatus::Playing;
        self.links[0].hooks.on_enter(ctx);
        mixer.play(self.handles[0]);
    }

    pub fn update<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C, dt: f64)
    where
        H: LinkHooks<C>,
    {
        match self.status {
            ChainStatus::Ready | ChainStatus::Stopped => return,
            ChainStatus::Finished => {
                mixer.advance(dt);
                return;
            }
            ChainStatus::Draining { remaining } => {
                mixer.advance(dt);
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.stop_all(mixer);
                    self.status = ChainStatus::Stopped;
                } else {
                    self.status = ChainStatus::Draining { remaining };
                }
                return;
            }
            ChainStatus::Playing => {}
        }

        let Some(index) = self.cursor else {
            return;
        };
        mixer.advance(dt);

        let link = Arc::clone(&self.links[index]);
        let handle = self.handles[index];
        let is_last = index == self.last_index();

        if link.loopable {
            link.hooks.on_tick(ctx, dt);
        } else if !is_last && mixer.time(handle) >= mixer.clip_duration(handle) - self.cross_fade {
            link.hooks.on_tick(ctx, dt);
            self.cross_fade_to_next(mixer, ctx, index);
        } else if is_last {
            link.hooks.on_tick(ctx, dt);
            link.hooks.on_exit(ctx);
            self.status = ChainStatus::Finished;
        } else {
            link.hooks.on_tick(ctx, dt);
        }
    }

    fn cross_fade_to_next<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C, index: usize)
    where
        H: LinkHooks<C>,
    {
        self.links[index].hooks.on_exit(ctx);
        let next = index + 1;
        self.cursor = Some(next);
        self.links[next].hooks.on_enter(ctx);

        let (from, to) = (self.handles[index], self.handles[next]);
        mixer.reset(to);
        mixer.cross_fade(from, to, self.cross_fade);
        mixer.play(to);
    }

    /// Stops the chain. With fade-to-idle the current clip blends into the
    /// idle link and the caller must keep calling `update` until the returned
    /// wait has elapsed; the drain cannot be cancelled.
    pub fn stop<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C) -> StopWait
    where
        H: LinkHooks<C>,
    {
        match self.status {
            ChainStatus::Ready | ChainStatus::Stopped => return StopWait::Immediate,
            ChainStatus::Draining { remaining } => return StopWait::Draining(remaining),
            ChainStatus::Playing | ChainStatus::Finished => {}
        }

        let Some(index) = self.cursor else {
            return StopWait::Immediate;
        };
        if self.status == ChainStatus::Playing {
            self.links[index].hooks.on_exit(ctx);
        }

        if !self.fade_to_idle {
            self.stop_all(mixer);
            self.status = ChainStatus::Stopped;
            return StopWait::Immediate;
        }

        let idle = self.last_index();
        if index != idle {
            let (from, to) = (self.handles[index], self.handles[idle]);
            mixer.reset(to);
            mixer.cross_fade(from, to, self.cross_fade);
            mixer.play(to);
        }
        self.cursor = Some(idle);
        self.status = ChainStatus::Draining {
            remaining: self.cross_fade,
        };
        StopWait::Draining(self.cross_fade)
    }

    /// Stops every handle right away, ignoring fade-to-idle. Ends a drain
    /// that is still in flight.
    pub fn halt<C>(&mut self, mixer: &mut dyn Mixer, ctx: &mut C)
    where
        H: LinkHooks<C>,
    {
        if self.status == ChainStatus::Playing {
            if let Some(index) = self.cursor {
                self.links[index].hooks.on_exit(ctx);
            }
        }
        if self.status != ChainStatus::Ready {
            self.stop_all(mixer);
            self.status = ChainStatus::Stopped;
        }
    }
}
