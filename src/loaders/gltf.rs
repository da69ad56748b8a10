use anyhow::{bail, Context, Result};
use glam::{Quat, Vec3};
use std::path::Path;

use crate::math::{Object3d, Trs};
use crate::scene::{
    AnimationChannel, AnimationClip, ChannelValues, Interpolation, LoadedAsset, Material, Mesh,
    Model, Node, Primitive, TextureData, Vertex,
};

/// Loads a glTF/GLB file into a model plus its animation clips
pub fn load_gltf(path: impl AsRef<Path>) -> Result<LoadedAsset> {
    let path = path.as_ref();
    log::info!("Loading glTF file: {:?}", path);

    let (document, buffers, images) =
        gltf::import(path).with_context(|| format!("Failed to load glTF file: {:?}", path))?;

    log::debug!(
        "glTF loaded: {} scenes, {} nodes, {} meshes, {} materials, {} images, {} animations",
        document.scenes().count(),
        document.nodes().count(),
        document.meshes().count(),
        document.materials().count(),
        images.len(),
        document.animations().count()
    );

    from_document(&document, &buffers, &images)
}

/// Converts an already-imported glTF document
pub fn from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<LoadedAsset> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF document has no scenes")?;

    let nodes = document.nodes().map(load_node).collect();
    let roots = scene.nodes().map(|n| n.index()).collect();

    let meshes = document
        .meshes()
        .map(|m| load_mesh(&m, buffers))
        .collect::<Result<Vec<_>>>()?;

    let materials = document.materials().map(load_material).collect();
    let textures = images.iter().enumerate().map(|(i, img)| convert_image(i, img)).collect();

    // One clip per glTF animation, even an empty one, so clip indices match the file
    let clips = document
        .animations()
        .map(|a| load_animation(&a, buffers))
        .collect();

    Ok(LoadedAsset {
        model: Model {
            nodes,
            roots,
            meshes,
            materials,
            textures,
            transform: Object3d::IDENTITY,
        },
        clips,
    })
}

fn load_node(node: gltf::Node) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    Node {
        name: node.name().map(str::to_owned),
        local: Trs {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        },
        mesh: node.mesh().map(|m| m.index()),
        children: node.children().map(|c| c.index()).collect(),
    }
}

fn load_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<Mesh> {
    let mut primitives = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                mesh.name()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .context("Mesh primitive has no positions")?
            .collect();
        if positions.is_empty() {
            continue;
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            bail!("Index {} out of range for {} vertices", bad, positions.len());
        }

        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => generate_normals(&positions, &indices),
        };

        let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
            Some(uvs) => uvs.into_f32().collect(),
            None => vec![[0.0, 0.0]; positions.len()],
        };

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        primitives.push(Primitive {
            vertices,
            indices,
            material: primitive.material().index(),
        });
    }

    Ok(Mesh {
        name: mesh.name().map(str::to_owned),
        primitives,
    })
}

/// Area-weighted smooth normals for primitives that ship without any
pub fn generate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            Vec3::from_array(positions[a]),
            Vec3::from_array(positions[b]),
            Vec3::from_array(positions[c]),
        );
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

fn load_material(material: gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        base_color: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|info| info.texture().source().index()),
        emissive: material.emissive_factor(),
    }
}

/// Expand any 8-bit image layout to RGBA8
fn convert_image(index: usize, image: &gltf::image::Data) -> TextureData {
    use gltf::image::Format;

    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            log::warn!("Texture {} has unsupported format {:?}; using white", index, other);
            return TextureData::white();
        }
    };

    TextureData {
        width: image.width,
        height: image.height,
        rgba,
    }
}

fn load_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> AnimationClip {
    use gltf::animation::util::ReadOutputs;

    let mut channels = Vec::new();

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };

        let values = match outputs {
            ReadOutputs::Translations(iter) => {
                ChannelValues::Translation(iter.map(Vec3::from_array).collect())
            }
            ReadOutputs::Rotations(iter) => {
                ChannelValues::Rotation(iter.into_f32().map(Quat::from_array).collect())
            }
            ReadOutputs::Scales(iter) => ChannelValues::Scale(iter.map(Vec3::from_array).collect()),
            ReadOutputs::MorphTargetWeights(_) => {
                log::debug!("Skipping morph target channel in {:?}", animation.name());
                continue;
            }
        };

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let expected = match interpolation {
            Interpolation::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        let actual = match &values {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
            ChannelValues::Rotation(v) => v.len(),
        };
        if times.is_empty() || actual != expected {
            log::warn!(
                "Skipping malformed channel in {:?}: {} keys, {} values",
                animation.name(),
                times.len(),
                actual
            );
            continue;
        }

        channels.push(AnimationChannel {
            node: channel.target().node().index(),
            times,
            values,
            interpolation,
        });
    }

    if channels.is_empty() {
        log::debug!(
            "Animation {:?} has no playable channels; it will pose nothing",
            animation.name()
        );
    }

    AnimationClip::new(animation.name().unwrap_or("animation"), channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_normals_for_flat_triangle() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = generate_normals(&positions, &[0, 1, 2]);
        for n in normals {
            assert!((Vec3::from_array(n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_generate_normals_unreferenced_vertex_points_up() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let normals = generate_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_gltf("/no/such/model.gltf").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load glTF file"));
    }
}
