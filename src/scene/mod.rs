//! Scene graph state shared by the frame loop and the asset loader.
//!
//! The widget owns one `SceneState`; the loader hands it a finished asset and
//! the frame loop advances it. Both run on the UI thread.

pub mod animation;
pub mod model;

use glam::Vec3;

use crate::config::{LightConfig, ViewerConfig};
use crate::math::hex_to_linear;
pub use animation::{AnimationChannel, AnimationClip, AnimationPlayer, ChannelValues, Interpolation};
pub use model::{DrawItem, Material, Mesh, Model, Node, Primitive, TextureData, Vertex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB, intensity folded in
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub position: Vec3,
}

impl DirectionalLight {
    /// Direction the light travels, from its position towards the origin
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

/// Result of a successful asset import
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub model: Model,
    pub clips: Vec<AnimationClip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached { animated: bool },
    /// A model is already present; the new one was dropped
    Rejected,
}

#[derive(Debug)]
pub struct SceneState {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    model: Option<Model>,
    player: Option<AnimationPlayer>,
}

impl SceneState {
    /// Scene holding only the two lights
    pub fn new(lights: &LightConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: hex_to_linear(lights.ambient_color, lights.ambient_intensity),
            },
            directional: DirectionalLight {
                color: hex_to_linear(lights.directional_color, lights.directional_intensity),
                position: Vec3::from_array(lights.directional_position),
            },
            model: None,
            player: None,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.player.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Place a loaded asset in the scene
    ///
    /// Applies the configured scale and offset and, when the asset has clips,
    /// starts a player on clip 0. Other clips are never played.
    pub fn attach_asset(&mut self, asset: LoadedAsset, config: &ViewerConfig) -> AttachOutcome {
        if self.model.is_some() {
            log::warn!("Scene already holds a model; ignoring a second one");
            return AttachOutcome::Rejected;
        }

        let LoadedAsset { mut model, clips } = asset;
        model.transform.scale = Vec3::splat(config.model_scale);
        model.transform.position = Vec3::from_array(config.model_position);

        let clip_count = clips.len();
        if let Some(first) = clips.into_iter().next() {
            log::info!(
                "Playing animation {:?} ({:.2}s), {} other clip(s) unused",
                first.name,
                first.duration,
                clip_count - 1
            );
            self.player = Some(AnimationPlayer::new(first, 0));
        }

        log::info!(
            "Model attached: {} nodes, {} triangles",
            model.nodes.len(),
            model.triangle_count()
        );
        self.model = Some(model);

        AttachOutcome::Attached {
            animated: self.player.is_some(),
        }
    }

    /// Per-frame CPU update: advance the animation, then spin the model
    ///
    /// Both steps are skipped while no model is attached. Rotation accumulates
    /// without wrapping.
    pub fn advance(&mut self, delta: f32, rotation_speed: f32) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        if let Some(player) = self.player.as_mut() {
            player.update(delta, model);
        }
        model.transform.rotation.y += rotation_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Object3d, Trs};

    fn asset(clips: usize) -> LoadedAsset {
        let model = Model {
            nodes: vec![Node {
                name: None,
                local: Trs::IDENTITY,
                mesh: None,
                children: vec![],
            }],
            roots: vec![0],
            meshes: vec![],
            materials: vec![],
            textures: vec![],
            transform: Object3d::IDENTITY,
        };
        let clips = (0..clips)
            .map(|i| {
                AnimationClip::new(
                    format!("clip{}", i),
                    vec![AnimationChannel {
                        node: 0,
                        times: vec![0.0, 1.0],
                        values: ChannelValues::Translation(vec![Vec3::ZERO, Vec3::X]),
                        interpolation: Interpolation::Linear,
                    }],
                )
            })
            .collect();
        LoadedAsset { model, clips }
    }

    #[test]
    fn test_new_scene_has_lights_only() {
        let scene = SceneState::new(&LightConfig::default());
        assert!(!scene.has_model());
        assert!(scene.player().is_none());
        assert!(scene.ambient.color[0] > 0.0);
        assert!((scene.directional.direction() - Vec3::splat(-1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_advance_without_model_is_a_no_op() {
        let mut scene = SceneState::new(&LightConfig::default());
        scene.advance(0.016, 0.01);
        assert!(!scene.has_model());
    }

    #[test]
    fn test_second_asset_is_rejected() {
        let config = ViewerConfig::default();
        let mut scene = SceneState::new(&config.lights);
        assert_eq!(
            scene.attach_asset(asset(0), &config),
            AttachOutcome::Attached { animated: false }
        );
        assert_eq!(scene.attach_asset(asset(2), &config), AttachOutcome::Rejected);
        assert!(scene.player().is_none());
    }

    #[test]
    fn test_player_starts_on_first_clip() {
        let config = ViewerConfig::default();
        let mut scene = SceneState::new(&config.lights);
        scene.attach_asset(asset(3), &config);
        let player = scene.player().unwrap();
        assert_eq!(player.clip_index(), 0);
        assert_eq!(player.clip().name, "clip0");
    }
}
