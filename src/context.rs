//! wgpu implementation of the [`Renderer`] seam.
//!
//! Buffers and textures created through a [`Context`] live as long as the
//! context; ids handed out are 1-based indices into its resource tables.
//! Models only store ids, so dropping a model releases nothing on the GPU.

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::TextureChannel,
        model::Vertex,
        texture::{GpuTexture, TextureId, TextureUpload},
    },
    pipelines::material::{
        self, MaterialUniform, PreparedDraw, PreparedDraws, sampler_binding, texture_binding,
    },
    render::{BufferId, DrawList, MaterialField, MaterialValue, Renderer},
};

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    material_layout: wgpu::BindGroupLayout,
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<GpuTexture>,
    /// Bound for empty colour texture slots.
    white: GpuTexture,
    /// Bound for an empty normal map slot.
    flat_normal: GpuTexture,
}

impl Context {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let material_layout = material::mk_bind_group_layout(&device);
        let white = GpuTexture::solid(&device, &queue, [255; 4], "default white texture");
        let flat_normal = GpuTexture::create_default_normal_map(&device, &queue);
        Self {
            device,
            queue,
            material_layout,
            buffers: Vec::new(),
            textures: Vec::new(),
            white,
            flat_normal,
        }
    }

    /// A context on the default adapter without any surface.
    pub async fn headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .context("no suitable GPU adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-model device"),
                ..Default::default()
            })
            .await
            .context("failed to create device")?;
        Ok(Self::new(device, queue))
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.buffers.get(i))
    }

    pub fn texture(&self, id: TextureId) -> Option<&GpuTexture> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.textures.get(i))
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32)
    }

    fn slot_texture(&self, channel: TextureChannel, id: TextureId) -> &GpuTexture {
        match self.texture(id) {
            Some(texture) => texture,
            None if channel == TextureChannel::Normal => &self.flat_normal,
            None => &self.white,
        }
    }

    /// Creates the uniform buffers and bind groups for every draw in
    /// `draw_list`.
    ///
    /// Draws referring to unknown buffers or without indices are skipped.
    pub fn prepare(&self, draw_list: &DrawList) -> PreparedDraws {
        let mut draws = Vec::with_capacity(draw_list.len());
        for (i, command) in draw_list.commands().iter().enumerate() {
            let (Some(vertex_buffer), Some(index_buffer)) = (
                self.buffer(command.vertex_buffer),
                self.buffer(command.index_buffer),
            ) else {
                log::warn!("Skipping draw {i}: unknown buffer.");
                continue;
            };
            if command.index_count == 0 {
                continue;
            }

            let uniform = MaterialUniform::from(&command.material);
            let uniform_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Material Uniform Buffer"),
                    contents: bytemuck::cast_slice(&[uniform]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

            let slots: Vec<&GpuTexture> = TextureChannel::ALL
                .iter()
                .map(|&channel| self.slot_texture(channel, command.material.textures[channel.index()]))
                .collect();
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }];
            for (channel, texture) in TextureChannel::ALL.iter().zip(&slots) {
                entries.push(wgpu::BindGroupEntry {
                    binding: texture_binding(*channel),
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: sampler_binding(*channel),
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                });
            }
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.material_layout,
                entries: &entries,
                label: Some("material_bind_group"),
            });

            draws.push(PreparedDraw {
                bind_group,
                uniform_buffer,
                vertex_buffer: vertex_buffer.clone(),
                index_buffer: index_buffer.clone(),
                index_count: command.index_count,
            });
        }
        PreparedDraws { draws }
    }
}

impl Renderer for Context {
    type Target = DrawList;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.push_buffer(buffer)
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.push_buffer(buffer)
    }

    fn create_texture_2d(&mut self, upload: &TextureUpload) -> TextureId {
        let texture = GpuTexture::from_upload(&self.device, &self.queue, upload);
        self.textures.push(texture);
        TextureId(self.textures.len() as u32)
    }

    fn bind_material_state(&self, target: &mut DrawList, field: MaterialField, value: MaterialValue) {
        target.state.set(field, value);
    }

    fn issue_draw(
        &self,
        target: &mut DrawList,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        index_count: u32,
    ) {
        target.push_draw(vertex_buffer, index_buffer, index_count);
    }
}
