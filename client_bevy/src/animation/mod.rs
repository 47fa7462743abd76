//! Clip registry, software mixer and the chain/action layer driving it.

pub mod actions;
pub mod chain;
pub mod clips;
pub mod mixer;

pub use actions::{Action, ActionTable};
pub use chain::{AnimationChain, AnimationLink, LinkHooks};
pub use clips::{ClipLibrary, MeshHandle};
pub use mixer::{ClipMixer, Mixer};
