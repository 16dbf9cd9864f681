//! The importer seam: scene files in, [`SceneGraph`]s out.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{
    data_structures::scene_graph::SceneGraph,
    resources::{gltf_scene::GltfImporter, obj_scene::ObjImporter},
};

/// Largest angle between two faces whose normals are still averaged when
/// smooth normals are forced.
pub const FORCE_SMOOTH_MAX_ANGLE: f32 = 175.0;

/// Processing steps an importer applies before handing out a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportFlags {
    /// Bake node transforms into vertices so meshes need no per-node transform.
    pub pretransform_vertices: bool,
    pub triangulate: bool,
    pub join_identical_vertices: bool,
    /// Flat per-face normals for meshes without normals.
    pub generate_normals: bool,
    /// Smooth per-vertex normals for meshes without normals.
    pub generate_smooth_normals: bool,
    /// Drop normals stored in the file.
    pub remove_normals: bool,
    /// In degrees, used by smooth normal generation.
    pub max_smoothing_angle: f32,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            pretransform_vertices: true,
            triangulate: true,
            join_identical_vertices: true,
            generate_normals: true,
            generate_smooth_normals: false,
            remove_normals: false,
            max_smoothing_angle: FORCE_SMOOTH_MAX_ANGLE,
        }
    }
}

impl ImportFlags {
    /// Replaces whatever normals the file has with smooth ones.
    ///
    /// Flat normal generation is switched off and file normals are removed
    /// first, so generated normals never mix with stored ones.
    pub fn force_smooth(mut self) -> Self {
        self.generate_normals = false;
        self.remove_normals = true;
        self.generate_smooth_normals = true;
        self.max_smoothing_angle = FORCE_SMOOTH_MAX_ANGLE;
        self
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse OBJ {}: {source}", .path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to parse glTF {}: {source}", .path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{} contains no scene", .path.display())]
    NoScene { path: PathBuf },
    #[error("{} could only be imported partially", .path.display())]
    Incomplete { path: PathBuf },
    #[error("{} contains a face with {arity} vertices but triangulation is disabled", .path.display())]
    NotTriangulated { path: PathBuf, arity: u32 },
    #[error("{} is not a supported model format", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Parses a scene file.
pub trait Importer {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<SceneGraph, ImportError>;
}

/// Picks an importer by file extension: `obj`, `gltf` and `glb`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileImporter;

impl Importer for FileImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<SceneGraph, ImportError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("obj") => ObjImporter.import(path, flags),
            Some("gltf" | "glb") => GltfImporter.import(path, flags),
            _ => Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
