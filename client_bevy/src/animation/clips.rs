//! Clip and mesh registry.
//!
//! Parsing GLTF files is left to the renderer; the registry only needs each
//! clip's name, duration and playback options, which come from a manifest.

use std::collections::HashMap;

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

const BUILTIN_MANIFEST: &str = include_str!("../../assets/animations.json");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("invalid clip '{name}': {reason}")]
    InvalidClip { name: String, reason: String },
    #[error("malformed asset manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// A named skeletal animation sample with a fixed duration (seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClipOptions {
    #[serde(default = "default_loopable")]
    pub loopable: bool,
    /// Cosmetic model yaw applied while the clip plays, in degrees
    #[serde(default, rename = "rotation")]
    pub rotation_offset: f64,
}

fn default_loopable() -> bool {
    true
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            loopable: true,
            rotation_offset: 0.0,
        }
    }
}

/// Opaque reference to a skinned mesh the renderer knows how to instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub String);

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    animations: HashMap<String, ClipEntry>,
    #[serde(default)]
    meshes: HashMap<String, MeshEntry>,
}

#[derive(Deserialize)]
struct ClipEntry {
    #[serde(default)]
    url: Option<String>,
    duration: f64,
    #[serde(default)]
    options: ClipOptions,
}

#[derive(Deserialize)]
struct MeshEntry {
    url: String,
}

#[derive(Resource, Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, (Clip, ClipOptions)>,
    meshes: HashMap<String, MeshHandle>,
}

impl ClipLibrary {
    pub fn from_manifest_str(json: &str) -> Result<Self, AssetError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let mut library = Self::default();

        for (name, entry) in manifest.animations {
            if !entry.duration.is_finite() || entry.duration <= 0.0 {
                return Err(AssetError::InvalidClip {
                    name,
                    reason: format!("duration must be > 0, got {}", entry.duration),
                });
            }
            if let Some(url) = &entry.url {
                bevy::log::debug!("Registered clip '{}' from {}", name, url);
            }
            library.insert_clip(
                Clip {
                    name: name.clone(),
                    duration: entry.duration,
                },
                entry.options,
            );
        }

        for (name, entry) in manifest.meshes {
            library.meshes.insert(name, MeshHandle(entry.url));
        }

        Ok(library)
    }

    /// The manifest shipped with the client
    pub fn builtin() -> Result<Self, AssetError> {
        Self::from_manifest_str(BUILTIN_MANIFEST)
    }

    pub fn insert_clip(&mut self, clip: Clip, options: ClipOptions) {
        self.clips.insert(clip.name.clone(), (clip, options));
    }

    pub fn clip(&self, name: &str) -> Result<(&Clip, &ClipOptions), AssetError> {
        self.clips
            .get(name)
            .map(|(clip, options)| (clip, options))
            .ok_or_else(|| AssetError::NotFound {
                kind: "clip",
                name: name.to_string(),
            })
    }

    pub fn skinned_entity(&self, name: &str) -> Result<MeshHandle, AssetError> {
        self.meshes
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                kind: "mesh",
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_manifest_has_player_actions() {
        let library = ClipLibrary::builtin().unwrap();
        for name in ["idle", "slow_run", "jump"] {
            assert!(library.clip(name).is_ok(), "missing {}", name);
        }
        assert!(library.skinned_entity("player").is_ok());
    }

    #[test]
    fn options_default_to_loopable_without_offset() {
        let library = ClipLibrary::from_manifest_str(
            r#"{"animations": {"wave": {"duration": 1.0}}}"#,
        )
        .unwrap();
        let (_, options) = library.clip("wave").unwrap();
        assert!(options.loopable);
        assert_eq!(options.rotation_offset, 0.0);
    }

    #[test]
    fn rotation_option_is_read() {
        let library = ClipLibrary::builtin().unwrap();
        let (clip, options) = library.clip("jump").unwrap();
        assert!(!options.loopable);
        assert_eq!(options.rotation_offset, 30.0);
        assert!(clip.duration > 0.0);
    }

    #[test]
    fn missing_clip_is_not_found() {
        let library = ClipLibrary::default();
        let err = library.clip("dance").unwrap_err();
        assert!(matches!(err, AssetError::NotFound { kind: "clip", .. }));
        assert_eq!(err.to_string(), "clip 'dance' not found");
    }

    #[test]
    fn missing_mesh_is_not_found() {
        let library = ClipLibrary::default();
        assert!(matches!(
            library.skinned_entity("ball"),
            Err(AssetError::NotFound { kind: "mesh", .. })
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let result = ClipLibrary::from_manifest_str(
            r#"{"animations": {"blink": {"duration": 0}}}"#,
        );
        assert!(matches!(result, Err(AssetError::InvalidClip { .. })));
    }

    #[test]
    fn malformed_manifest_is_rejected() {
        assert!(matches!(
            ClipLibrary::from_manifest_str("{"),
            Err(AssetError::Manifest(_))
        ));
    }
}
