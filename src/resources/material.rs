//! Building [`Material`]s from imported material records.

use std::path::{Path, PathBuf};

use cgmath::Vector3;

use crate::data_structures::{
    material::{Material, TextureChannel},
    scene_graph::{ColorKey, RawMaterial},
    texture::Texture,
};

/// Existence checks used when resolving texture paths.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Last component of `declared`, splitting on both `/` and `\` since model
/// files often carry paths written on another platform.
fn file_name(declared: &str) -> &str {
    declared.rsplit(['/', '\\']).next().unwrap_or(declared)
}

/// Where a texture declared as `declared` by a model in `directory` lives.
///
/// Tries `directory/declared` first, then `directory/<file name>`. When
/// neither exists the first candidate is returned and loading it will fail.
pub fn resolve_texture_path(filesystem: &dyn Filesystem, directory: &Path, declared: &str) -> PathBuf {
    let as_given = directory.join(declared);
    if filesystem.exists(&as_given) {
        return as_given;
    }
    let flattened = directory.join(file_name(declared));
    if flattened != as_given && filesystem.exists(&flattened) {
        log::debug!(
            "Texture {declared:?} not found as given, using {}",
            flattened.display()
        );
        return flattened;
    }
    as_given
}

/// Resolves one material record.
///
/// Missing colours keep the [`Material`] defaults. The ambient colour starts
/// out as the diffuse colour and is only replaced by an explicit ambient
/// entry. Each declared texture channel uses its first path; `load` turns
/// the resolved path into a texture.
pub fn resolve_material(
    raw: &RawMaterial,
    directory: &Path,
    filesystem: &dyn Filesystem,
    mut load: impl FnMut(&Path) -> Texture,
) -> Material {
    let mut material = Material::new(raw.name().unwrap_or_default());
    if let Some(shininess) = raw.shininess() {
        material.shininess = shininess;
    }
    if let Some(diffuse) = raw.color(ColorKey::Diffuse) {
        material.diffuse_color = Vector3::from(diffuse);
    }
    material.ambient_color = material.diffuse_color;
    if let Some(specular) = raw.color(ColorKey::Specular) {
        material.specular_color = Vector3::from(specular);
    }
    if let Some(ambient) = raw.color(ColorKey::Ambient) {
        material.ambient_color = Vector3::from(ambient);
    }
    if let Some(emissive) = raw.color(ColorKey::Emissive) {
        material.emissive_color = Vector3::from(emissive);
    }

    for channel in TextureChannel::ALL {
        let paths = raw.texture_paths(channel);
        let Some(declared) = paths.first() else {
            continue;
        };
        if paths.len() > 1 {
            log::debug!(
                "Material {:?} declares {} {} textures, only the first is used.",
                material.name,
                paths.len(),
                channel.label()
            );
        }
        let path = resolve_texture_path(filesystem, directory, declared);
        material.set_texture(channel, load(&path));
    }
    material
}
