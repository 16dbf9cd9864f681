//! Resolved material parameters.
//!
//! A [`Material`] is the render-ready form of one imported material record:
//! scalar and colour parameters plus one [`Texture`] slot per
//! [`TextureChannel`]. Materials are owned by a
//! [`Model`](super::model::Model) and referenced from meshes by index.

use std::fmt;

use cgmath::Vector3;

use crate::{
    data_structures::texture::Texture,
    render::{MaterialField, MaterialValue, Renderer},
};

/// The kinds of texture a material can carry, one slot each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureChannel {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
    AmbientOcclusion,
    Normal,
}

impl TextureChannel {
    pub const COUNT: usize = 6;
    pub const ALL: [TextureChannel; Self::COUNT] = [
        Self::Diffuse,
        Self::Specular,
        Self::Ambient,
        Self::Emissive,
        Self::AmbientOcclusion,
        Self::Normal,
    ];

    /// Slot index, also used as the texture unit the channel binds to.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Diffuse => "Diffuse",
            Self::Specular => "Specular",
            Self::Ambient => "Ambient",
            Self::Emissive => "Emissive",
            Self::AmbientOcclusion => "AO",
            Self::Normal => "Normal",
        }
    }
}

/// Shading parameters of a surface.
///
/// Defaults: shininess `0`, white diffuse and ambient, black specular and
/// emissive, every texture slot invalid.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub shininess: f32,
    pub diffuse_color: Vector3<f32>,
    pub specular_color: Vector3<f32>,
    pub ambient_color: Vector3<f32>,
    pub emissive_color: Vector3<f32>,
    pub textures: [Texture; TextureChannel::COUNT],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shininess: 0.0,
            diffuse_color: Vector3::new(1.0, 1.0, 1.0),
            specular_color: Vector3::new(0.0, 0.0, 0.0),
            ambient_color: Vector3::new(1.0, 1.0, 1.0),
            emissive_color: Vector3::new(0.0, 0.0, 0.0),
            textures: Default::default(),
        }
    }
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn texture(&self, channel: TextureChannel) -> &Texture {
        &self.textures[channel.index()]
    }

    pub fn set_texture(&mut self, channel: TextureChannel, texture: Texture) {
        self.textures[channel.index()] = texture;
    }

    /// Writes every parameter and texture slot into `target`.
    ///
    /// Invalid slots are bound too, so a previous material's texture never
    /// leaks into this one.
    pub fn apply<R: Renderer + ?Sized>(&self, renderer: &R, target: &mut R::Target) {
        renderer.bind_material_state(
            target,
            MaterialField::Shininess,
            MaterialValue::Float(self.shininess),
        );
        let colors = [
            (MaterialField::DiffuseColor, self.diffuse_color),
            (MaterialField::SpecularColor, self.specular_color),
            (MaterialField::AmbientColor, self.ambient_color),
            (MaterialField::EmissiveColor, self.emissive_color),
        ];
        for (field, color) in colors {
            renderer.bind_material_state(target, field, MaterialValue::Color(color.into()));
        }
        for channel in TextureChannel::ALL {
            renderer.bind_material_state(
                target,
                MaterialField::Texture(channel),
                MaterialValue::Texture(self.texture(channel).id),
            );
        }
    }
}

struct Vec3Display(Vector3<f32>);

impl fmt::Display for Vec3Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {}, {}, {} }}", self.0.x, self.0.y, self.0.z)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Shininess: {}", self.shininess)?;
        writeln!(f, "Diffuse color: {}", Vec3Display(self.diffuse_color))?;
        writeln!(f, "Specular color: {}", Vec3Display(self.specular_color))?;
        writeln!(f, "Ambient color: {}", Vec3Display(self.ambient_color))?;
        writeln!(f, "Emissive color: {}", Vec3Display(self.emissive_color))?;
        for channel in TextureChannel::ALL {
            writeln!(f, "{} texture: {}", channel.label(), self.texture(channel))?;
        }
        Ok(())
    }
}
