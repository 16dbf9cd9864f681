//! Imported scene graphs and their flattening into mesh lists.
//!
//! A [`SceneGraph`] is what an [`Importer`](crate::resources::import::Importer)
//! hands back: a tree of [`Node`]s stored in an arena and addressed by index,
//! a table of [`RawMesh`] records the nodes point into, and a table of
//! [`RawMaterial`] records the meshes point into. Nodes may share mesh
//! records; every reference yields its own mesh when the graph is flattened.

use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{material::TextureChannel, model::Vertex};

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    /// Child node indices, in draw order.
    pub children: Vec<usize>,
    /// Indices into [`SceneGraph::meshes`], in draw order.
    pub meshes: Vec<usize>,
    /// Local transform. Identity once vertices have been pretransformed.
    pub transform: Matrix4<f32>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            meshes: Vec::new(),
            transform: Matrix4::identity(),
        }
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }
}

/// Mesh record as produced by an importer.
///
/// `normals` is either empty or as long as `positions`; so is `tex_coords`
/// when present. Faces are already triangulated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<[u32; 3]>,
    pub material_index: usize,
}

impl RawMesh {
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// True when every face corner names an existing vertex.
    pub fn faces_in_range(&self) -> bool {
        let count = self.positions.len();
        self.faces.iter().flatten().all(|&vertex| (vertex as usize) < count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MaterialProperty {
    Name(String),
    Shininess(f32),
    Color(ColorKey, [f32; 3]),
}

/// Material record as produced by an importer.
///
/// Properties keep the order they were declared in. Texture paths are kept
/// per channel exactly as written in the source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMaterial {
    pub properties: Vec<MaterialProperty>,
    pub textures: HashMap<TextureChannel, Vec<String>>,
}

impl RawMaterial {
    pub const DEFAULT_NAME: &'static str = "DefaultMaterial";

    /// The material importers attach to meshes that declare none.
    pub fn fallback() -> Self {
        Self::default().with_name(Self::DEFAULT_NAME)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties.push(MaterialProperty::Name(name.into()));
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.properties.push(MaterialProperty::Shininess(shininess));
        self
    }

    pub fn with_color(mut self, key: ColorKey, color: [f32; 3]) -> Self {
        self.properties.push(MaterialProperty::Color(key, color));
        self
    }

    pub fn with_texture(mut self, channel: TextureChannel, path: impl Into<String>) -> Self {
        self.textures.entry(channel).or_default().push(path.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.iter().find_map(|property| match property {
            MaterialProperty::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn shininess(&self) -> Option<f32> {
        self.properties.iter().find_map(|property| match property {
            MaterialProperty::Shininess(shininess) => Some(*shininess),
            _ => None,
        })
    }

    pub fn color(&self, key: ColorKey) -> Option<[f32; 3]> {
        self.properties.iter().find_map(|property| match property {
            MaterialProperty::Color(k, color) if *k == key => Some(*color),
            _ => None,
        })
    }

    pub fn texture_paths(&self, channel: TextureChannel) -> &[String] {
        self.textures
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Importer output: node arena, mesh table and material table.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGraph {
    pub nodes: Vec<Node>,
    pub root: usize,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
    /// Set by importers that could only read part of the file.
    pub incomplete: bool,
}

impl SceneGraph {
    /// An empty graph with a single root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(root_name)],
            root: 0,
            meshes: Vec::new(),
            materials: Vec::new(),
            incomplete: false,
        }
    }

    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Adds `node` and appends it to `parent`'s children.
    pub fn add_child(&mut self, parent: usize, node: Node) -> usize {
        let index = self.add_node(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(index);
        }
        index
    }

    pub fn add_mesh(&mut self, mesh: RawMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Mesh references reachable from the root, depth-first pre-order: a
    /// node's own meshes come before those of its children.
    pub fn mesh_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        self.process_node(self.root, &mut order);
        order
    }

    fn process_node(&self, index: usize, order: &mut Vec<usize>) {
        let Some(node) = self.nodes.get(index) else {
            log::warn!("Scene graph references missing node {index}.");
            return;
        };
        order.extend_from_slice(&node.meshes);
        for &child in &node.children {
            self.process_node(child, order);
        }
    }
}

/// Copies a raw mesh into the shared vertex layout.
///
/// Meshes without texture coordinates get `(0, 0)` on every vertex; the same
/// goes for normals of meshes that carry none.
pub fn extract_vertices(mesh: &RawMesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or_default(),
            tex_coords: mesh
                .tex_coords
                .as_ref()
                .and_then(|tex_coords| tex_coords.get(i).copied())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn extract_indices(mesh: &RawMesh) -> Vec<u32> {
    mesh.faces.iter().flatten().copied().collect()
}
