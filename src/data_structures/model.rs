//! Render-ready geometry: vertices, meshes and the model that owns them.
//!
//! A [`Model`] owns its materials and meshes. Materials are created first and
//! keep their positions for the model's lifetime, so a [`Mesh`] refers to its
//! material by index into [`Model::materials`].

use crate::{
    data_structures::material::Material,
    render::{BufferId, Renderer},
};

/// Vertex layout shared by every mesh: position, normal, texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A triangle list with its GPU buffers.
///
/// Names are copied from the source file as they are, empty and duplicate
/// names included.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    /// Index into the owning model's materials.
    pub material: Option<usize>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
}

impl Mesh {
    /// Uploads `vertices` and `indices` and wraps them in a mesh.
    ///
    /// `indices` is a triangle list; every index must address a vertex.
    pub fn new<R: Renderer + ?Sized>(
        renderer: &mut R,
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: Option<usize>,
    ) -> Self {
        debug_assert!(indices.len() % 3 == 0);
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        let name = name.into();
        let vertex_buffer = renderer.create_vertex_buffer(&name, &vertices);
        let index_buffer = renderer.create_index_buffer(&name, &indices);
        Self {
            name,
            material,
            vertices,
            indices,
            vertex_buffer,
            index_buffer,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Applies `material` (if any) and issues the draw call.
    ///
    /// Without a material the target's current material state is left
    /// untouched.
    pub fn draw<R: Renderer + ?Sized>(
        &self,
        renderer: &R,
        target: &mut R::Target,
        material: Option<&Material>,
    ) {
        if let Some(material) = material {
            material.apply(renderer, target);
        }
        renderer.issue_draw(
            target,
            self.vertex_buffer,
            self.index_buffer,
            self.index_count(),
        );
    }
}

/// Materials and meshes of one loaded scene file.
///
/// A model is not modified after it has been built. The default value is
/// the empty model a failed import produces.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub(crate) materials: Vec<Material>,
    pub(crate) meshes: Vec<Mesh>,
}

impl Model {
    /// Assembles a model from parts built elsewhere, e.g. procedural meshes.
    ///
    /// Mesh material indices that do not address one of `materials` are
    /// cleared.
    pub fn from_parts(materials: Vec<Material>, mut meshes: Vec<Mesh>) -> Self {
        for mesh in meshes.iter_mut() {
            if let Some(index) = mesh.material.filter(|&index| index >= materials.len()) {
                log::warn!(
                    "Mesh {:?} references material {} but only {} exist; drawing it without material.",
                    mesh.name,
                    index,
                    materials.len()
                );
                mesh.material = None;
            }
        }
        Self { materials, meshes }
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.materials.is_empty()
    }

    /// First material named exactly `name`, in storage order.
    pub fn get_material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    /// First mesh named exactly `name`, in storage order.
    pub fn get_mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn mesh_material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material.and_then(|index| self.materials.get(index))
    }

    /// Draws every mesh in storage order.
    ///
    /// With `use_material` each mesh that has a material applies it before
    /// its draw call; without it no material state is touched at all.
    pub fn draw<R: Renderer + ?Sized>(&self, renderer: &R, target: &mut R::Target, use_material: bool) {
        for mesh in &self.meshes {
            let material = if use_material {
                self.mesh_material(mesh)
            } else {
                None
            };
            mesh.draw(renderer, target, material);
        }
    }
}
