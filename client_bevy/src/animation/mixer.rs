use std::collections::HashMap;

use super::clips::Clip;

/// Handle of one clip bound to a mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Repeat,
}

/// Per-skeleton playback driver.
///
/// Chains only talk to the mixer through this trait, so a renderer-backed
/// implementation can replace [`ClipMixer`] without touching chain logic.
pub trait Mixer {
    /// Returns the playback for `clip`, creating it on first use.
    fn bind(&mut self, clip: &Clip) -> PlaybackId;
    fn advance(&mut self, dt: f64);
    /// Rewinds to time 0 at full weight and drops any pending fade.
    fn reset(&mut self, id: PlaybackId);
    fn play(&mut self, id: PlaybackId);
    fn stop(&mut self, id: PlaybackId);
    fn set_loop(&mut self, id: PlaybackId, mode: LoopMode);
    /// Fades `from` out and `to` in over `duration` seconds.
    fn cross_fade(&mut self, from: PlaybackId, to: PlaybackId, duration: f64);
    fn time(&self, id: PlaybackId) -> f64;
    fn clip_duration(&self, id: PlaybackId) -> f64;
    fn weight(&self, id: PlaybackId) -> f64;
    fn is_running(&self, id: PlaybackId) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    start: f64,
    end: f64,
    elapsed: f64,
    duration: f64,
}

#[derive(Debug, Clone)]
struct Playback {
    duration: f64,
    time: f64,
    weight: f64,
    running: bool,
    loop_mode: LoopMode,
    fade: Option<Fade>,
}

impl Playback {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            time: 0.0,
            weight: 1.0,
            running: false,
            loop_mode: LoopMode::Repeat,
            fade: None,
        }
    }

    fn advance(&mut self, dt: f64) {
        if !self.running {
            return;
        }

        self.time += dt;
        match self.loop_mode {
            LoopMode::Repeat => {
                if self.time >= self.duration {
                    self.time = self.time.rem_euclid(self.duration);
                }
            }
            LoopMode::Once => self.time = self.time.min(self.duration),
        }

        if let Some(mut fade) = self.fade {
            fade.elapsed += dt;
            if fade.elapsed >= fade.duration {
                self.weight = fade.end;
                self.fade = None;
                if fade.end <= 0.0 {
                    self.halt();
                }
            } else {
                let t = fade.elapsed / fade.duration;
                self.weight = fade.start + (fade.end - fade.start) * t;
                self.fade = Some(fade);
            }
        }
    }

    fn halt(&mut self) {
        self.running = false;
        self.time = 0.0;
        self.fade = None;
    }
}

/// Software mixer that tracks time and blend weight for each bound clip.
///
/// Bindings are cached by clip name: two chains that share a clip share the
/// same playback, the way one skeleton can only play a clip once at a time.
#[derive(Debug, Default)]
pub struct ClipMixer {
    playbacks: Vec<Playback>,
    by_name: HashMap<String, PlaybackId>,
}

impl ClipMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct clips bound so far
    pub fn bound_count(&self) -> usize {
        self.playbacks.len()
    }

    fn get(&self, id: PlaybackId) -> Option<&Playback> {
        self.playbacks.get(id.0)
    }

    fn get_mut(&mut self, id: PlaybackId) -> Option<&mut Playback> {
        self.playbacks.get_mut(id.0)
    }
}

impl Mixer for ClipMixer {
    fn bind(&mut self, clip: &Clip) -> PlaybackId {
        if let Some(id) = self.by_name.get(&clip.name) {
            return *id;
        }
        let id = PlaybackId(self.playbacks.len());
        self.playbacks.push(Playback::new(clip.duration));
        self.by_name.insert(clip.name.clone(), id);
        id
    }

    fn advance(&mut self, dt: f64) {
        for playback in &mut self.playbacks {
            playback.advance(dt);
        }
    }

    fn reset(&mut self, id: PlaybackId) {
        if let Some(p) = self.get_mut(id) {
            p.time = 0.0;
            p.weight = 1.0;
            p.fade = None;
        }
    }

    fn play(&mut self, id: PlaybackId) {
        if let Some(p) = self.get_mut(id) {
            p.running = true;
        }
    }

    fn stop(&mut self, id: PlaybackId) {
        if let Some(p) = self.get_mut(id) {
            p.halt();
        }
    }

    fn set_loop(&mut self, id: PlaybackId, mode: LoopMode) {
        if let Some(p) = self.get_mut(id) {
            p.loop_mode = mode;
        }
    }

    fn cross_fade(&mut self, from: PlaybackId, to: PlaybackId, duration: f64) {
        if from == to {
            return;
        }
        if duration <= 0.0 {
            self.stop(from);
            if let Some(p) = self.get_mut(to) {
                p.weight = 1.0;
                p.fade = None;
            }
            return;
        }
        if let Some(p) = self.get_mut(from) {
            p.fade = Some(Fade {
                start: p.weight,
                end: 0.0,
                elapsed: 0.0,
                duration,
            });
        }
        if let Some(p) = self.get_mut(to) {
            p.weight = 0.0;
            p.fade = Some(Fade {
                start: 0.0,
                end: 1.0,
                elapsed: 0.0,
                duration,
            });
        }
    }

    fn time(&self, id: PlaybackId) -> f64 {
        self.get(id).map_or(0.0, |p| p.time)
    }

    fn clip_duration(&self, id: PlaybackId) -> f64 {
        self.get(id).map_or(0.0, |p| p.duration)
    }

    fn weight(&self, id: PlaybackId) -> f64 {
        self.get(id).map_or(0.0, |p| p.weight)
    }

    fn is_running(&self, id: PlaybackId) -> bool {
        self.get(id).is_some_and(|p| p.running)
    }
}
