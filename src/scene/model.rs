use glam::Mat4;

use crate::math::{Object3d, Trs};

/// Interleaved vertex layout shared by the importer and the GPU scene pass
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangle list with one material
#[derive(Debug, Clone)]
pub struct Primitive {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Index into `Model::materials`; `None` uses the default material
    pub material: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub base_color: [f32; 4],
    /// Index into `Model::textures`
    pub base_color_texture: Option<usize>,
    pub emissive: [f32; 3],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            emissive: [0.0, 0.0, 0.0],
        }
    }
}

/// RGBA8 image
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// 1x1 opaque white, bound wherever a material has no texture
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255, 255, 255, 255],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub local: Trs,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// One loaded asset: node hierarchy plus the data its meshes reference
///
/// `transform` is the wrapper object the whole hierarchy hangs from; it is
/// what gets scaled, positioned and spun.
#[derive(Debug, Clone)]
pub struct Model {
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<TextureData>,
    pub transform: Object3d,
}

/// A mesh placed in the world by one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: usize,
    pub mesh: usize,
    pub world: Mat4,
}

impl Model {
    /// World matrix of every node, indexed like `nodes`
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut out = vec![Mat4::IDENTITY; self.nodes.len()];
        let root = self.transform.matrix();
        for &index in &self.roots {
            self.accumulate(index, root, &mut out);
        }
        out
    }

    fn accumulate(&self, index: usize, parent: Mat4, out: &mut [Mat4]) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        let world = parent * node.local.matrix();
        out[index] = world;
        for &child in &node.children {
            self.accumulate(child, world, out);
        }
    }

    /// Every mesh reachable from the roots with its world matrix
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let world = self.world_matrices();
        let mut items = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if let Some(mesh) = node.mesh {
                items.push(DrawItem {
                    node: index,
                    mesh,
                    world: world[index],
                });
            }
            stack.extend(node.children.iter().rev().copied());
        }
        items
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.indices.len() / 3)
            .sum()
    }

    pub fn material(&self, index: Option<usize>) -> Material {
        index
            .and_then(|i| self.materials.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn two_level_model() -> Model {
        let child = Node {
            name: Some("blade".into()),
            local: Trs {
                translation: Vec3::new(0.0, 1.0, 0.0),
                ..Trs::IDENTITY
            },
            mesh: Some(0),
            children: vec![],
        };
        let root = Node {
            name: Some("hilt".into()),
            local: Trs {
                translation: Vec3::new(1.0, 0.0, 0.0),
                ..Trs::IDENTITY
            },
            mesh: None,
            children: vec![1],
        };
        Model {
            nodes: vec![root, child],
            roots: vec![0],
            meshes: vec![Mesh {
                name: None,
                primitives: vec![Primitive {
                    vertices: vec![],
                    indices: vec![0, 1, 2, 0, 2, 3],
                    material: None,
                }],
            }],
            materials: vec![],
            textures: vec![],
            transform: Object3d::IDENTITY,
        }
    }

    #[test]
    fn test_world_matrices_follow_hierarchy() {
        let model = two_level_model();
        let world = model.world_matrices();
        let p = world[1].transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_root_transform_applies_to_all_nodes() {
        let mut model = two_level_model();
        model.transform.scale = Vec3::splat(2.0);
        let world = model.world_matrices();
        let p = world[1].transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_draw_items_only_mesh_nodes() {
        let model = two_level_model();
        let items = model.draw_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].node, 1);
        assert_eq!(items[0].mesh, 0);
    }

    #[test]
    fn test_find_node_and_triangle_count() {
        let model = two_level_model();
        assert_eq!(model.find_node("blade"), Some(1));
        assert_eq!(model.find_node("pommel"), None);
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn test_missing_material_falls_back_to_default() {
        let model = two_level_model();
        assert_eq!(model.material(None), Material::default());
        assert_eq!(model.material(Some(7)), Material::default());
    }
}
