//! Wavefront OBJ/MTL import on top of `tobj`.

use std::path::Path;

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

/// OBJ files have no node hierarchy: the root node gets one child per
/// object/group, each holding that group's mesh.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn import(&self, path: &Path, flags: &ImportFlags) -> Result<SceneGraph, ImportError> {
        let options = tobj::LoadOptions {
            triangulate: flags.triangulate,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, obj_materials) =
            tobj::load_obj(path, &options).map_err(|source| ImportError::Obj {
                path: path.to_path_buf(),
                source,
            })?;

        let mut materials: Vec<RawMaterial> = match obj_materials {
            Ok(materials) => materials.iter().map(to_raw_material).collect(),
            Err(err) => {
                warn!(
                    "Material library of {} could not be loaded ({err}); using the default material.",
                    path.display()
                );
                Vec::new()
            }
        };
        let fallback_material = materials.len();
        let mut needs_fallback = false;

        let root_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut scene = SceneGraph::new(root_name);
        for model in &models {
            let mut mesh = to_raw_mesh(path, model)?;
            mesh.material_index = match model.mesh.material_id {
                Some(id) if id < fallback_material => id,
                _ => {
                    needs_fallback = true;
                    fallback_material
                }
            };
            debug!(
                "OBJ group {:?}: {} vertices, {} faces",
                mesh.name,
                mesh.positions.len(),
                mesh.faces.len()
            );
            let mesh_index = scene.add_mesh(mesh);
            let root = scene.root;
            scene.add_child(root, Node::new(model.name.clone()).with_meshes([mesh_index]));
        }
        if needs_fallback {
            materials.push(RawMaterial::fallback());
        }
        scene.materials = materials;
        scene.incomplete = scene.meshes.is_empty();

        postprocess::apply(&mut scene, flags);
        Ok(scene)
    }
}

fn to_raw_mesh(path: &Path, model: &tobj::Model) -> Result<RawMesh, ImportError> {
    let mesh = &model.mesh;
    if let Some(&arity) = mesh.face_arities.iter().find(|&&arity| arity != 3) {
        return Err(ImportError::NotTriangulated {
            path: path.to_path_buf(),
            arity,
        });
    }

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals: Vec<[f32; 3]> = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();
    let tex_coords: Option<Vec<[f32; 2]>> = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect()
    });
    let faces: Vec<[u32; 3]> = mesh
        .indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    Ok(RawMesh {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        faces,
        material_index: 0,
    })
}

fn parse_color(value: &str) -> Option<[f32; 3]> {
    let mut components = value.split_whitespace().map(str::parse::<f32>);
    let r = components.next()?.ok()?;
    let g = components.next()?.ok()?;
    let b = components.next()?.ok()?;
    Some([r, g, b])
}

fn to_raw_material(material: &tobj::Material) -> RawMaterial {
    let mut raw = RawMaterial::default().with_name(material.name.clone());
    if let Some(shininess) = material.shininess {
        raw = raw.with_shininess(shininess);
    }
    let colors = [
        (ColorKey::Diffuse, material.diffuse),
        (ColorKey::Specular, material.specular),
        (ColorKey::Ambient, material.ambient),
        (
            ColorKey::Emissive,
            material.unknown_param.get("Ke").and_then(|ke| parse_color(ke)),
        ),
    ];
    for (key, color) in colors {
        if let Some(color) = color {
            raw = raw.with_color(key, color);
        }
    }

    let textures = [
        (TextureChannel::Diffuse, material.diffuse_texture.as_deref()),
        (TextureChannel::Specular, material.specular_texture.as_deref()),
        (TextureChannel::Ambient, material.ambient_texture.as_deref()),
        (
            TextureChannel::Emissive,
            material.unknown_param.get("map_Ke").map(String::as_str),
        ),
        (
            TextureChannel::AmbientOcclusion,
            material.unknown_param.get("map_ao").map(String::as_str),
        ),
        (TextureChannel::Normal, material.normal_texture.as_deref()),
    ];
    for (channel, texture) in textures {
        if let Some(texture) = texture.map(str::trim).filter(|texture| !texture.is_empty()) {
            raw = raw.with_texture(channel, texture);
        }
    }
    raw
}
