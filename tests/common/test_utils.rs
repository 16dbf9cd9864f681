#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use flow_model::{
    data_structures::{
        model::Vertex,
        scene_graph::SceneGraph,
        texture::{TextureId, TextureUpload},
    },
    render::{BufferId, DrawList, MaterialField, MaterialValue, Renderer},
    resources::{
        import::{ImportError, ImportFlags, Importer},
        material::Filesystem,
        texture::{DecodedImage, ImageDecoder, TextureError},
    },
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Renderer that keeps everything it is asked to create in memory.
#[derive(Default)]
pub struct RecordingRenderer {
    pub vertex_buffers: Vec<(String, Vec<Vertex>)>,
    pub index_buffers: Vec<(String, Vec<u32>)>,
    pub uploads: Vec<TextureUpload>,
    pub bindings: RefCell<Vec<(MaterialField, MaterialValue)>>,
    next_buffer: u32,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self, id: TextureId) -> Option<&TextureUpload> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.uploads.get(i))
    }

    fn next_buffer_id(&mut self) -> BufferId {
        self.next_buffer += 1;
        BufferId(self.next_buffer)
    }
}

impl Renderer for RecordingRenderer {
    type Target = DrawList;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[Vertex]) -> BufferId {
        self.vertex_buffers.push((label.to_string(), vertices.to_vec()));
        self.next_buffer_id()
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u32]) -> BufferId {
        self.index_buffers.push((label.to_string(), indices.to_vec()));
        self.next_buffer_id()
    }

    fn create_texture_2d(&mut self, upload: &TextureUpload) -> TextureId {
        self.uploads.push(upload.clone());
        TextureId(self.uploads.len() as u32)
    }

    fn bind_material_state(&self, target: &mut DrawList, field: MaterialField, value: MaterialValue) {
        self.bindings.borrow_mut().push((field, value));
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

/// Decoder serving images from memory and logging every request.
#[derive(Default)]
pub struct FakeDecoder {
    pub images: HashMap<PathBuf, DecodedImage>,
    pub calls: RefCell<Vec<(PathBuf, bool)>>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, image: DecodedImage) -> Self {
        self.images.insert(path.into(), image);
        self
    }

    pub fn decode_count(&self, path: impl AsRef<Path>) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(called, _)| called == path.as_ref())
            .count()
    }
}

impl ImageDecoder for FakeDecoder {
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage, TextureError> {
        self.calls
            .borrow_mut()
            .push((path.to_path_buf(), flip_vertically));
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| TextureError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::from(
                    std::io::ErrorKind::NotFound,
                )),
            })
    }
}

pub fn solid_image(width: u32, height: u32, channels: u8) -> DecodedImage {
    DecodedImage {
        width,
        height,
        channels,
        pixels: vec![200; (width * height) as usize * channels as usize],
    }
}

#[derive(Default)]
pub struct FakeFilesystem(pub HashSet<PathBuf>);

impl FakeFilesystem {
    pub fn with(paths: &[&str]) -> Self {
        Self(paths.iter().map(PathBuf::from).collect())
    }
}

impl Filesystem for FakeFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.0.contains(path)
    }
}

/// Importer handing out a prepared scene and remembering the flags it got.
pub struct ScriptedImporter {
    pub scene: SceneGraph,
    pub flags: RefCell<Option<ImportFlags>>,
}

impl ScriptedImporter {
    pub fn new(scene: SceneGraph) -> Self {
        Self {
            scene,
            flags: RefCell::new(None),
        }
    }
}

impl Importer for ScriptedImporter {
    fn import(&self, _path: &Path, flags: &ImportFlags) -> Result<SceneGraph, ImportError> {
        *self.flags.borrow_mut() = Some(flags.clone());
        Ok(self.scene.clone())
    }
}

pub struct FailingImporter;

impl Importer for FailingImporter {
    fn import(&self, path: &Path, _flags: &ImportFlags) -> Result<SceneGraph, ImportError> {
        Err(ImportError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}
