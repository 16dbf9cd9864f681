use std::path::Path;

use crate::{
    data_structures::{
        model::{Mesh, Model},
        scene_graph::{extract_indices, extract_vertices},
    },
    render::Renderer,
    resources::{
        import::{FileImporter, ImportError, ImportFlags, Importer},
        material::{Filesystem, StdFilesystem, resolve_material},
        texture::{ImageCrateDecoder, ImageDecoder, TextureCache},
    },
};

/**
 * This module contains all logic for turning scene files into render-ready models:
 * importers, post-processing, material resolution and texture loading.
 */
pub mod gltf_scene;
pub mod import;
pub mod material;
pub mod obj_scene;
pub mod postprocess;
pub mod texture;

/// Caller-facing knobs of a model build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildOptions {
    /// Discard file normals and generate smooth ones instead.
    pub force_smooth: bool,
    /// Base import flags. Vertices are always pretransformed.
    pub flags: ImportFlags,
    /// Flip images vertically on decode.
    pub flip_textures: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force_smooth: false,
            flags: ImportFlags::default(),
            flip_textures: true,
        }
    }
}

impl BuildOptions {
    /// The flags handed to the importer.
    pub fn import_flags(&self) -> ImportFlags {
        let flags = ImportFlags {
            pretransform_vertices: true,
            ..self.flags.clone()
        };
        if self.force_smooth {
            flags.force_smooth()
        } else {
            flags
        }
    }
}

/// Builds [`Model`]s from scene files.
///
/// The importer, image decoder and filesystem default to the real ones and
/// can be swapped out, which is how the tests run without files or a GPU.
pub struct ModelBuilder<'a> {
    importer: &'a dyn Importer,
    decoder: &'a dyn ImageDecoder,
    filesystem: &'a dyn Filesystem,
    options: BuildOptions,
}

impl Default for ModelBuilder<'_> {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

impl<'a> ModelBuilder<'a> {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            importer: &FileImporter,
            decoder: &ImageCrateDecoder,
            filesystem: &StdFilesystem,
            options,
        }
    }

    pub fn with_importer(mut self, importer: &'a dyn Importer) -> Self {
        self.importer = importer;
        self
    }

    pub fn with_decoder(mut self, decoder: &'a dyn ImageDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_filesystem(mut self, filesystem: &'a dyn Filesystem) -> Self {
        self.filesystem = filesystem;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Imports `path` and resolves it into a model.
    ///
    /// Materials are resolved first, in the order the file declares them,
    /// sharing one texture cache. Meshes follow in depth-first node order.
    /// Texture failures only leave slots invalid; import failures and
    /// partially imported scenes are errors.
    pub fn try_build<R: Renderer + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        renderer: &mut R,
    ) -> Result<Model, ImportError> {
        let path = path.as_ref();
        let scene = self.importer.import(path, &self.options.import_flags())?;
        if scene.incomplete {
            return Err(ImportError::Incomplete {
                path: path.to_path_buf(),
            });
        }

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let mut cache = TextureCache::new(self.options.flip_textures);
        let mut materials = Vec::with_capacity(scene.materials.len());
        for raw in &scene.materials {
            let material = resolve_material(raw, directory, self.filesystem, |texture_path| {
                cache.resolve(texture_path, self.decoder, &mut *renderer)
            });
            materials.push(material);
        }

        let order = scene.mesh_order();
        let mut meshes = Vec::with_capacity(order.len());
        for index in order {
            let Some(raw) = scene.meshes.get(index) else {
                log::warn!("Node references missing mesh {index} in {}.", path.display());
                continue;
            };
            if !raw.faces_in_range() {
                log::warn!(
                    "Mesh {:?} of {} indexes past its {} vertices; skipping it.",
                    raw.name,
                    path.display(),
                    raw.vertex_count()
                );
                continue;
            }
            let material = if raw.material_index < materials.len() {
                Some(raw.material_index)
            } else {
                log::warn!(
                    "Mesh {:?} references material {} of {}; drawing it without material.",
                    raw.name,
                    raw.material_index,
                    materials.len()
                );
                None
            };
            meshes.push(Mesh::new(
                renderer,
                raw.name.clone(),
                extract_vertices(raw),
                extract_indices(raw),
                material,
            ));
        }

        log::info!(
            "Loaded {}: {} meshes, {} materials, {} of {} textures",
            path.display(),
            meshes.len(),
            materials.len(),
            cache.loaded(),
            cache.len()
        );
        Ok(Model::from_parts(materials, meshes))
    }

    /// Like [`try_build`](Self::try_build), but logs the error and returns
    /// the empty model instead.
    pub fn build<R: Renderer + ?Sized>(&self, path: impl AsRef<Path>, renderer: &mut R) -> Model {
        let path = path.as_ref();
        match self.try_build(path, renderer) {
            Ok(model) => model,
            Err(err) => {
                log::error!("Failed to load model {}: {err}", path.display());
                Model::default()
            }
        }
    }
}

/// Loads `path` with default settings; see [`ModelBuilder::build`].
pub fn load_model<R: Renderer + ?Sized>(
    path: impl AsRef<Path>,
    force_smooth: bool,
    renderer: &mut R,
) -> Model {
    ModelBuilder::new(BuildOptions {
        force_smooth,
        ..Default::default()
    })
    .build(path, renderer)
}
