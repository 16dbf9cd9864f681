//! GPU side of material state: the uniform block, its bind group layout and
//! the draw commands a [`DrawList`](crate::render::DrawList) turns into.
//!
//! Binding 0 holds [`MaterialUniform`]. Each texture channel then takes two
//! bindings, texture at `1 + 2 * unit` and sampler at `2 + 2 * unit`, where
//! the unit is [`TextureChannel::index`].

use crate::{data_structures::material::TextureChannel, render::MaterialState};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub diffuse_color: [f32; 3],
    pub shininess: f32,
    pub specular_color: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    pub ambient_color: [f32; 3],
    _padding2: u32,
    pub emissive_color: [f32; 3],
    _padding3: u32,
}

impl From<&MaterialState> for MaterialUniform {
    fn from(state: &MaterialState) -> Self {
        Self {
            diffuse_color: state.diffuse,
            shininess: state.shininess,
            specular_color: state.specular,
            _padding: 0,
            ambient_color: state.ambient,
            _padding2: 0,
            emissive_color: state.emissive,
            _padding3: 0,
        }
    }
}

pub fn texture_binding(channel: TextureChannel) -> u32 {
    1 + 2 * channel.index() as u32
}

pub fn sampler_binding(channel: TextureChannel) -> u32 {
    texture_binding(channel) + 1
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }];
    for channel in TextureChannel::ALL {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding(channel),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: sampler_binding(channel),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("material_bind_group_layout"),
    })
}

/// One draw of a prepared list: everything a render pass needs.
#[derive(Debug)]
pub struct PreparedDraw {
    pub bind_group: wgpu::BindGroup,
    pub uniform_buffer: wgpu::Buffer,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// GPU commands for a recorded [`DrawList`](crate::render::DrawList),
/// produced by [`Context::prepare`](crate::context::Context::prepare).
#[derive(Debug, Default)]
pub struct PreparedDraws {
    pub(crate) draws: Vec<PreparedDraw>,
}

impl PreparedDraws {
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn draws(&self) -> &[PreparedDraw] {
        &self.draws
    }

    /// Records every draw into `pass`, binding material state at `group`.
    ///
    /// The pipeline set on `pass` must use a layout whose group `group` was
    /// created from [`mk_bind_group_layout`] and whose vertex input is
    /// [`Vertex::desc`](crate::data_structures::model::Vertex::desc).
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>, group: u32) {
        for draw in &self.draws {
            pass.set_bind_group(group, &draw.bind_group, &[]);
            pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
            pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }
}
