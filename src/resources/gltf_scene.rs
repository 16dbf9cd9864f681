//! glTF 2.0 import on top of the `gltf` crate.
//!
//! Every primitive becomes one [`RawMesh`]. Materials are mapped from the
//! metallic-roughness model onto the Phong-style parameters of
//! [`RawMaterial`]: base colour to diffuse, `(1 - roughness) * 1000` to
//! shininess, occlusion texture to ambient occlusion. Only images referenced
//! by file URI are kept; embedded images are skipped.

use std::{collections::HashMap, path::Path};

use cgmath::{Matrix4, SquareMatrix};
use log::{debug, warn};

use crate::{
    data_structures::{
        material::TextureChannel,
        scene_graph::{ColorKey, Node, RawMaterial, RawMesh, SceneGraph},
    },
    resources::{
        import::{ImportError, ImportFlags, Importer},
        postprocess,
    },
};

#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<SceneGraph, ImportError> {
        let gltf_error = |source: gltf::Error| ImportError::Gltf {
            path: path.to_path_buf(),
            source,
        };
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_error)?;

        let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next())
        else {
            return Err(ImportError::NoScene {
                path: path.to_path_buf(),
            });
        };

        let mut materials: Vec<RawMaterial> = document.materials().map(to_raw_material).collect();
        let root_name = gltf_scene.name().map(str::to_string).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut builder = SceneBuilder {
            scene: SceneGraph::new(root_name),
            buffers: &buffers,
            fallback_material: materials.len(),
            needs_fallback: false,
            pretransform: flags.pretransform_vertices,
            shared_meshes: HashMap::new(),
            incomplete: false,
        };
        let root = builder.scene.root;
        for node in gltf_scene.nodes() {
            builder.add_node(root, &node, Matrix4::identity());
        }

        if builder.needs_fallback {
            materials.push(RawMaterial::fallback());
        }
        let mut scene = builder.scene;
        scene.materials = materials;
        scene.incomplete = builder.incomplete || scene.meshes.is_empty();

        postprocess::apply(&mut scene, flags);
        Ok(scene)
    }
}

struct SceneBuilder<'a> {
    scene: SceneGraph,
    buffers: &'a [gltf::buffer::Data],
    fallback_material: usize,
    needs_fallback: bool,
    pretransform: bool,
    /// glTF mesh index to the raw meshes its primitives became, when meshes
    /// are shared between nodes instead of baked per node.
    shared_meshes: HashMap<usize, Vec<usize>>,
    incomplete: bool,
}

impl SceneBuilder<'_> {
    fn add_node(&mut self, parent: usize, node: &gltf::Node, parent_transform: Matrix4<f32>) {
        let local = Matrix4::from(node.transform().matrix());
        let world = parent_transform * local;
        let name = node.name().unwrap_or_default();

        let meshes = match node.mesh() {
            Some(mesh) if self.pretransform => self.convert_mesh(&mesh, Some(&world)),
            Some(mesh) => match self.shared_meshes.get(&mesh.index()) {
                Some(meshes) => meshes.clone(),
                None => {
                    let meshes = self.convert_mesh(&mesh, None);
                    self.shared_meshes.insert(mesh.index(), meshes.clone());
                    meshes
                }
            },
            None => Vec::new(),
        };

        let mut raw_node = Node::new(name).with_meshes(meshes);
        if !self.pretransform {
            raw_node.transform = local;
        }
        let index = self.scene.add_child(parent, raw_node);
        for child in node.children() {
            self.add_node(index, &child, world);
        }
    }

    fn convert_mesh(&mut self, mesh: &gltf::Mesh, transform: Option<&Matrix4<f32>>) -> Vec<usize> {
        let name = mesh.name().unwrap_or_default();
        let primitive_count = mesh.primitives().count();
        let mut indices = Vec::with_capacity(primitive_count);
        for (i, primitive) in mesh.primitives().enumerate() {
            let primitive_name = if primitive_count > 1 {
                format!("{name}-{i}")
            } else {
                name.to_string()
            };
            let Some(mut raw) = self.convert_primitive(primitive_name, &primitive) else {
                continue;
            };
            if let Some(transform) = transform {
                raw = postprocess::transform_mesh(&raw, transform);
            }
            indices.push(self.scene.add_mesh(raw));
        }
        indices
    }

    fn convert_primitive(&mut self, name: String, primitive: &gltf::Primitive) -> Option<RawMesh> {
        let buffers = self.buffers;
        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            warn!("Primitive of mesh {name:?} has no positions, skipping it.");
            self.incomplete = true;
            return None;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|normals| normals.collect())
            .unwrap_or_default();
        let tex_coords: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|tex_coords| tex_coords.into_f32().collect());
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let faces: Vec<[u32; 3]> = match primitive.mode() {
            gltf::mesh::Mode::Triangles => indices
                .chunks_exact(3)
                .map(|f| [f[0], f[1], f[2]])
                .collect(),
            gltf::mesh::Mode::TriangleStrip => indices
                .windows(3)
                .enumerate()
                .map(|(i, f)| {
                    if i % 2 == 0 {
                        [f[0], f[1], f[2]]
                    } else {
                        [f[1], f[0], f[2]]
                    }
                })
                .collect(),
            gltf::mesh::Mode::TriangleFan => indices
                .get(1..)
                .unwrap_or_default()
                .windows(2)
                .map(|f| [indices[0], f[0], f[1]])
                .collect(),
            mode => {
                debug!("Dropping {mode:?} primitive of mesh {name:?}.");
                return None;
            }
        };

        if let Some(&vertex) = faces
            .iter()
            .flatten()
            .find(|&&vertex| vertex as usize >= positions.len())
        {
            warn!(
                "Primitive of mesh {name:?} indexes vertex {vertex} of {}, skipping it.",
                positions.len()
            );
            self.incomplete = true;
            return None;
        }

        let material_index = match primitive.material().index() {
            Some(index) if index < self.fallback_material => index,
            _ => {
                self.needs_fallback = true;
                self.fallback_material
            }
        };

        Some(RawMesh {
            name,
            positions,
            normals,
            tex_coords,
            faces,
            material_index,
        })
    }
}

fn texture_uri(texture: gltf::Texture) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
            match urlencoding::decode(uri) {
                Ok(decoded) => Some(decoded.into_owned()),
                Err(err) => {
                    warn!("Image URI {uri:?} is not valid UTF-8 once decoded ({err}); using it as is.");
                    Some(uri.to_string())
                }
            }
        }
        _ => {
            warn!(
                "Texture {} embeds its image, which is not supported; leaving the slot empty.",
                texture.index()
            );
            None
        }
    }
}

fn to_raw_material(material: gltf::Material) -> RawMaterial {
    let pbr = material.pbr_metallic_roughness();
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material-{}", material.index().unwrap_or_default()));
    let [r, g, b, _] = pbr.base_color_factor();

    let mut raw = RawMaterial::default()
        .with_name(name)
        .with_shininess((1.0 - pbr.roughness_factor()) * 1000.0)
        .with_color(ColorKey::Diffuse, [r, g, b])
        .with_color(ColorKey::Emissive, material.emissive_factor());

    let textures = [
        (TextureChannel::Diffuse, pbr.base_color_texture().map(|info| info.texture())),
        (TextureChannel::Emissive, material.emissive_texture().map(|info| info.texture())),
        (
            TextureChannel::AmbientOcclusion,
            material.occlusion_texture().map(|info| info.texture()),
        ),
        (TextureChannel::Normal, material.normal_texture().map(|info| info.texture())),
    ];
    for (channel, texture) in textures {
        if let Some(uri) = texture.and_then(texture_uri) {
            raw = raw.with_texture(channel, uri);
        }
    }
    raw
}
