//! Textures: the handle stored in materials, the CPU-side upload description
//! and the wgpu resource behind a handle.
//!
//! A [`Texture`] is what a [`Material`](super::material::Material) keeps per
//! channel: an opaque id plus the file it came from. Id `0` is the invalid
//! texture, used for empty slots and failed loads. Several materials may hold
//! the same id when the texture cache served them the same file; those copies
//! are aliases of one GPU resource, not independent owners.
//!
//! [`TextureUpload`] describes a decoded image ready for the GPU (format,
//! swizzle, sampler settings and the full mip chain). [`GpuTexture`] is the
//! wgpu side of it.

use std::{fmt, path::PathBuf};

/// Opaque GPU texture handle. `TextureId(0)` never refers to a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const INVALID: TextureId = TextureId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A texture slot value: GPU handle plus the resolved source path.
///
/// The default value is the invalid texture with an empty path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub path: PathBuf,
}

impl Texture {
    pub fn new(id: TextureId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }
}

impl fmt::Display for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture {{ {}", self.id.0)?;
        if self.is_valid() {
            write!(f, ": {}", self.path.display())?;
        }
        write!(f, " }}")
    }
}

/// Pixel layout of a decoded image, inferred from its channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8),
            2 => Some(Self::Rg8),
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Source of one output component when a texel is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Red,
    Green,
    Blue,
    Alpha,
    Zero,
    One,
}

/// Maps stored channels to sampled RGBA output.
///
/// Channels a texel does not store read as `0` for red/green/blue and as
/// fully opaque for alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swizzle(pub [Component; 4]);

impl Swizzle {
    pub const IDENTITY: Swizzle = Swizzle([
        Component::Red,
        Component::Green,
        Component::Blue,
        Component::Alpha,
    ]);
    /// Single channel broadcast to RGB with opaque alpha.
    pub const GRAYSCALE: Swizzle = Swizzle([
        Component::Red,
        Component::Red,
        Component::Red,
        Component::One,
    ]);
    /// First channel broadcast to RGB, second channel used as alpha.
    pub const GRAYSCALE_ALPHA: Swizzle = Swizzle([
        Component::Red,
        Component::Red,
        Component::Red,
        Component::Green,
    ]);

    pub fn for_format(format: PixelFormat) -> Self {
        match format {
            PixelFormat::R8 => Self::GRAYSCALE,
            PixelFormat::Rg8 => Self::GRAYSCALE_ALPHA,
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => Self::IDENTITY,
        }
    }

    /// Sampled RGBA value of one stored texel.
    pub fn apply(&self, texel: &[u8]) -> [u8; 4] {
        let read = |component: Component| match component {
            Component::Red => texel.first().copied().unwrap_or(0),
            Component::Green => texel.get(1).copied().unwrap_or(0),
            Component::Blue => texel.get(2).copied().unwrap_or(0),
            Component::Alpha => texel.get(3).copied().unwrap_or(u8::MAX),
            Component::Zero => 0,
            Component::One => u8::MAX,
        };
        self.0.map(read)
    }

    /// Expands tightly packed texels with `channels` components each into RGBA8.
    pub fn expand(&self, pixels: &[u8], channels: usize) -> Vec<u8> {
        if channels == 4 && *self == Self::IDENTITY {
            return pixels.to_vec();
        }
        pixels
            .chunks_exact(channels.max(1))
            .flat_map(|texel| self.apply(texel))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Sampling state of an uploaded texture.
///
/// The default is what every loaded model texture uses: repeat on both
/// axes, linear-mipmap-linear minification and linear magnification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSettings {
    pub wrap_u: Wrap,
    pub wrap_v: Wrap,
    pub min_filter: Filter,
    pub mipmap_filter: Filter,
    pub mag_filter: Filter,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            wrap_u: Wrap::Repeat,
            wrap_v: Wrap::Repeat,
            min_filter: Filter::Linear,
            mipmap_filter: Filter::Linear,
            mag_filter: Filter::Linear,
        }
    }
}

/// One level of a mip chain, tightly packed in the upload's pixel format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Everything a renderer needs to create a sampled 2D texture.
///
/// `levels[0]` is the full resolution image; each following level halves
/// the previous one down to 1x1.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureUpload {
    pub label: String,
    pub format: PixelFormat,
    pub swizzle: Swizzle,
    pub sampler: SamplerSettings,
    pub levels: Vec<MipLevel>,
}

impl TextureUpload {
    pub fn width(&self) -> u32 {
        self.levels.first().map_or(0, |level| level.width)
    }

    pub fn height(&self) -> u32 {
        self.levels.first().map_or(0, |level| level.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// A GPU texture with its view and sampler.
///
/// wgpu offers neither component swizzles nor 3-channel formats, so every
/// upload is stored as `Rgba8Unorm` with the swizzle already applied to the
/// texels. Sampling therefore yields the same values a swizzled
/// single/dual-channel texture would.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn from_upload(device: &wgpu::Device, queue: &wgpu::Queue, upload: &TextureUpload) -> Self {
        let size = wgpu::Extent3d {
            width: upload.width().max(1),
            height: upload.height().max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&upload.label),
            size,
            mip_level_count: upload.mip_level_count().max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let channels = upload.format.channels();
        for (mip_level, level) in upload.levels.iter().enumerate() {
            let rgba = upload.swizzle.expand(&level.pixels, channels);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, &upload.sampler);
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 texture of a single colour, bound in place of empty slots.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let upload = TextureUpload {
            label: label.to_string(),
            format: PixelFormat::Rgba8,
            swizzle: Swizzle::IDENTITY,
            sampler: SamplerSettings::default(),
            levels: vec![MipLevel {
                width: 1,
                height: 1,
                pixels: rgba.to_vec(),
            }],
        };
        Self::from_upload(device, queue, &upload)
    }

    /// Neutral normal map (no deformation).
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        // The blue/purple-ish colour that represents the default for normal maps
        Self::solid(device, queue, [127, 127, 255, 255], "default normal map")
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

fn mipmap_filter_mode(filter: Filter) -> wgpu::MipmapFilterMode {
    match filter {
        Filter::Nearest => wgpu::MipmapFilterMode::Nearest,
        Filter::Linear => wgpu::MipmapFilterMode::Linear,
    }
}

pub fn create_sampler(device: &wgpu::Device, settings: &SamplerSettings) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode(settings.wrap_u),
        address_mode_v: address_mode(settings.wrap_v),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter_mode(settings.mag_filter),
        min_filter: filter_mode(settings.min_filter),
        mipmap_filter: mipmap_filter_mode(settings.mipmap_filter),
        ..Default::default()
    })
}
