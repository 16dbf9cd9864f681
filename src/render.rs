//! The renderer seam.
//!
//! Model loading and drawing talk to the GPU only through [`Renderer`]:
//! buffer and texture creation at build time, material state and draw calls
//! at draw time. [`Context`](crate::context::Context) implements it on top of
//! wgpu; tests implement it with plain recorders.
//!
//! Draw calls are issued against a renderer-defined *target*. The wgpu
//! renderer uses a [`DrawList`]: material state is accumulated the way a
//! classic shader program keeps its uniforms, and every draw snapshots the
//! current state. The list is turned into render pass commands afterwards
//! (see [`Context::prepare`](crate::context::Context::prepare)).

use crate::data_structures::{
    material::TextureChannel,
    model::Vertex,
    texture::{TextureId, TextureUpload},
};

/// Opaque GPU buffer handle. `BufferId(0)` never refers to a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

impl BufferId {
    pub const INVALID: BufferId = BufferId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A material parameter slot of the shader target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialField {
    Shininess,
    DiffuseColor,
    SpecularColor,
    AmbientColor,
    EmissiveColor,
    Texture(TextureChannel),
}

impl MaterialField {
    /// Name of the uniform this field is written to in the material shader.
    pub fn uniform_name(self) -> &'static str {
        match self {
            Self::Shininess => "material.shininess",
            Self::DiffuseColor => "material.diffuse_color",
            Self::SpecularColor => "material.specular_color",
            Self::AmbientColor => "material.ambient_color",
            Self::EmissiveColor => "material.emissive_color",
            Self::Texture(TextureChannel::Diffuse) => "material.diffuse_texture",
            Self::Texture(TextureChannel::Specular) => "material.specular_texture",
            Self::Texture(TextureChannel::Ambient) => "material.ambient_texture",
            Self::Texture(TextureChannel::Emissive) => "material.emissive_texture",
            Self::Texture(TextureChannel::AmbientOcclusion) => "material.ao_texture",
            Self::Texture(TextureChannel::Normal) => "material.normal_texture",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialValue {
    Float(f32),
    Color([f32; 3]),
    Texture(TextureId),
}

/// GPU resource creation and draw submission used by models.
pub trait Renderer {
    /// What draw calls are recorded into.
    type Target;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> BufferId;

    fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> BufferId;

    fn create_texture_2d(&mut self, upload: &TextureUpload) -> TextureId;

    fn bind_material_state(
        &self,
        target: &mut Self::Target,
        field: MaterialField,
        value: MaterialValue,
    );

    /// Draws `index_count` indices of a triangle list.
    fn issue_draw(
        &self,
        target: &mut Self::Target,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        index_count: u32,
    );
}

/// Current material parameters of a [`DrawList`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialState {
    pub shininess: f32,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub ambient: [f32; 3],
    pub emissive: [f32; 3],
    pub textures: [TextureId; TextureChannel::COUNT],
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            shininess: 0.0,
            diffuse: [1.0; 3],
            specular: [0.0; 3],
            ambient: [1.0; 3],
            emissive: [0.0; 3],
            textures: [TextureId::INVALID; TextureChannel::COUNT],
        }
    }
}

impl MaterialState {
    pub fn set(&mut self, field: MaterialField, value: MaterialValue) {
        match (field, value) {
            (MaterialField::Shininess, MaterialValue::Float(shininess)) => {
                self.shininess = shininess
            }
            (MaterialField::DiffuseColor, MaterialValue::Color(color)) => self.diffuse = color,
            (MaterialField::SpecularColor, MaterialValue::Color(color)) => self.specular = color,
            (MaterialField::AmbientColor, MaterialValue::Color(color)) => self.ambient = color,
            (MaterialField::EmissiveColor, MaterialValue::Color(color)) => self.emissive = color,
            (MaterialField::Texture(channel), MaterialValue::Texture(id)) => {
                self.textures[channel.index()] = id
            }
            (field, value) => log::warn!(
                "Ignoring {:?} for {}: value type does not match the field.",
                value,
                field.uniform_name()
            ),
        }
    }
}

/// One recorded draw call with the material state it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub material: MaterialState,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
}

/// Shader target that records draw calls.
///
/// Material state persists across draws until it is overwritten, so a draw
/// issued without binding a material reuses whatever was bound last.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub state: MaterialState,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_draw(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32) {
        self.commands.push(DrawCommand {
            material: self.state,
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops recorded draws and resets the material state for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.state = MaterialState::default();
    }
}
