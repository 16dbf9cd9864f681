//! Texture loading: decode, infer the pixel format, build the mip chain and
//! upload through a [`Renderer`]. [`TextureCache`] makes sure every file is
//! decoded and uploaded at most once per model build.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba, imageops::FilterType};
use thiserror::Error;

use crate::{
    data_structures::texture::{
        MipLevel, PixelFormat, SamplerSettings, Swizzle, Texture, TextureId, TextureUpload,
    },
    render::Renderer,
};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} has {channels} channels, expected 1 to 4", .path.display())]
    UnsupportedChannels { path: PathBuf, channels: u8 },
    #[error("{} decoded to a pixel buffer that does not match its size", .path.display())]
    Malformed { path: PathBuf },
}

/// Tightly packed 8-bit pixels, rows top to bottom unless flipped on decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

pub trait ImageDecoder {
    /// Decodes the file at `path`, keeping its channel count.
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, TextureError>;
}

/// Decodes with the `image` crate. 16-bit and float images are reduced to
/// 8 bits per channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, TextureError> {
        let mut img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if flip_vertically {
            img = img.flipv();
        }
        let (width, height) = (img.width(), img.height());
        let channels = img.color().channel_count();
        let pixels = match channels {
            1 => img.into_luma8().into_raw(),
            2 => img.into_luma_alpha8().into_raw(),
            3 => img.into_rgb8().into_raw(),
            4 => img.into_rgba8().into_raw(),
            _ => {
                return Err(TextureError::UnsupportedChannels {
                    path: path.to_path_buf(),
                    channels,
                });
            }
        };
        Ok(DecodedImage {
            width,
            height,
            channels,
            pixels,
        })
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

fn downsample<P>(
    path: &Path,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<Vec<MipLevel>, TextureError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let base: ImageBuffer<P, Vec<u8>> =
        ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| TextureError::Malformed {
            path: path.to_path_buf(),
        })?;
    let count = mip_level_count(width, height);
    let mut levels = Vec::with_capacity(count as usize);
    for level in 1..count {
        let level_width = (width >> level).max(1);
        let level_height = (height >> level).max(1);
        let scaled = image::imageops::resize(&base, level_width, level_height, FilterType::Triangle);
        levels.push(MipLevel {
            width: level_width,
            height: level_height,
            pixels: scaled.into_raw(),
        });
    }
    levels.insert(
        0,
        MipLevel {
            width,
            height,
            pixels: base.into_raw(),
        },
    );
    Ok(levels)
}

/// Full mip chain of `image`, level 0 first.
pub fn mip_chain(path: &Path, image: DecodedImage) -> Result<Vec<MipLevel>, TextureError> {
    let DecodedImage {
        width,
        height,
        channels,
        pixels,
    } = image;
    if width == 0 || height == 0 {
        return Err(TextureError::Malformed {
            path: path.to_path_buf(),
        });
    }
    match channels {
        1 => downsample::<Luma<u8>>(path, width, height, pixels),
        2 => downsample::<LumaA<u8>>(path, width, height, pixels),
        3 => downsample::<Rgb<u8>>(path, width, height, pixels),
        4 => downsample::<Rgba<u8>>(path, width, height, pixels),
        _ => Err(TextureError::UnsupportedChannels {
            path: path.to_path_buf(),
            channels,
        }),
    }
}

/// Decodes `path` and creates a mipmapped, repeating, linearly filtered 2D
/// texture from it.
///
/// The pixel format follows the channel count. One and two channel images
/// are swizzled so they sample as grayscale (with alpha from the second
/// channel).
pub fn load_texture<R: Renderer + ?Sized>(
    path: &Path,
    flip_vertically: bool,
    decoder: &dyn ImageDecoder,
    renderer: &mut R,
) -> Result<Texture, TextureError> {
    let image = decoder.decode(path, flip_vertically)?;
    let format =
        PixelFormat::from_channels(image.channels).ok_or_else(|| TextureError::UnsupportedChannels {
            path: path.to_path_buf(),
            channels: image.channels,
        })?;
    let levels = mip_chain(path, image)?;
    let upload = TextureUpload {
        label: path.display().to_string(),
        format,
        swizzle: Swizzle::for_format(format),
        sampler: SamplerSettings::default(),
        levels,
    };
    let id = renderer.create_texture_2d(&upload);
    log::debug!(
        "Uploaded {} ({}x{}, {:?}, {} levels) as texture {}",
        path.display(),
        upload.width(),
        upload.height(),
        format,
        upload.mip_level_count(),
        id.0
    );
    Ok(Texture::new(id, path))
}

/// Removes `.` components and folds `..` into the preceding component
/// without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folds = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if folds {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Textures already resolved during one model build, keyed by normalized
/// path.
///
/// Failed loads are remembered as the invalid texture, so a broken file is
/// decoded once and logged once no matter how many materials use it.
#[derive(Debug)]
pub struct TextureCache {
    textures: HashMap<PathBuf, Texture>,
    flip_vertically: bool,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TextureCache {
    pub fn new(flip_vertically: bool) -> Self {
        Self {
            textures: HashMap::new(),
            flip_vertically,
        }
    }

    /// The texture for `path`, loading it on first request.
    ///
    /// Never fails: a file that cannot be loaded yields the invalid texture.
    pub fn resolve<R: Renderer + ?Sized>(
        &mut self,
        path: &Path,
        decoder: &dyn ImageDecoder,
        renderer: &mut R,
    ) -> Texture {
        let key = normalize_path(path);
        if let Some(texture) = self.textures.get(&key) {
            return texture.clone();
        }
        let texture = match load_texture(&key, self.flip_vertically, decoder, renderer) {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("Failed to load texture: {err}");
                Texture::new(TextureId::INVALID, key.clone())
            }
        };
        self.textures.insert(key, texture.clone());
        texture
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.textures.contains_key(&normalize_path(path))
    }

    /// Number of cached paths that loaded successfully.
    pub fn loaded(&self) -> usize {
        self.textures.values().filter(|texture| texture.is_valid()).count()
    }
}
