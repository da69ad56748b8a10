// config.rs - Viewer settings with the widget's fixed defaults
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ASSET_PATH: &str = "ebonchill_magic_sword/scene.gltf";

/// What happens to the bloom composer's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomMode {
    /// Bloom is rendered into its intermediate target and then overwritten by
    /// the final composer; the visible frame carries no glow.
    #[default]
    Discarded,
    /// The bloom target is additively blended over the final composer output.
    Composited,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
    pub mode: BloomMode,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 2.0,
            radius: 1.0,
            threshold: 0.25,
            mode: BloomMode::Discarded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Starting distance along +Z
    pub distance: f32,
    /// Multiplier applied to the normalized pointer position
    pub pointer_scale: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 10.0,
            pointer_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0x404040,
            ambient_intensity: 1.0,
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [1.0, 1.0, 1.0],
        }
    }
}

/// Everything the widget hard-codes, in one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset_path: PathBuf,
    pub model_scale: f32,
    pub model_position: [f32; 3],
    /// Radians added to the model's Y rotation every frame
    pub rotation_speed: f32,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    pub bloom: BloomConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from(DEFAULT_ASSET_PATH),
            model_scale: 2.5,
            model_position: [-5.9, -5.2, 0.0],
            rotation_speed: 0.01,
            camera: CameraConfig::default(),
            lights: LightConfig::default(),
            bloom: BloomConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid viewer config")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("In config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_widget_constants() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.asset_path, PathBuf::from("ebonchill_magic_sword/scene.gltf"));
        assert_eq!(cfg.model_scale, 2.5);
        assert_eq!(cfg.model_position, [-5.9, -5.2, 0.0]);
        assert_eq!(cfg.rotation_speed, 0.01);
        assert_eq!(cfg.camera.fov_degrees, 75.0);
        assert_eq!(cfg.camera.near, 0.1);
        assert_eq!(cfg.camera.far, 1000.0);
        assert_eq!(cfg.camera.pointer_scale, 2.0);
        assert_eq!(cfg.bloom.strength, 2.0);
        assert_eq!(cfg.bloom.radius, 1.0);
        assert_eq!(cfg.bloom.threshold, 0.25);
        assert_eq!(cfg.bloom.mode, BloomMode::Discarded);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = ViewerConfig::from_json(r#"{ "asset_path": "other/model.glb", "bloom": { "mode": "composited" } }"#)
            .unwrap();
        assert_eq!(cfg.asset_path, PathBuf::from("other/model.glb"));
        assert_eq!(cfg.bloom.mode, BloomMode::Composited);
        assert_eq!(cfg.bloom.strength, 2.0);
        assert_eq!(cfg.model_scale, 2.5);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = ViewerConfig::from_json("{ not json").unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid viewer config"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ViewerConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(format!("{:#}", err).contains("not/here.json"));
    }
}
