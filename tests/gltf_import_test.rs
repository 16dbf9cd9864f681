use std::{fs, path::Path};

use cgmath::Matrix4;
use flow_model::{
    data_structures::{material::TextureChannel, scene_graph::ColorKey},
    resources::{
        ModelBuilder,
        gltf_scene::GltfImporter,
        import::{ImportError, ImportFlags, Importer},
    },
};

use crate::common::test_utils::{RecordingRenderer, init_logger};

mod common;

/// One triangle, drawn by a translated parent node and by its translated
/// child.
const SCENE_JSON: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "name": "yard", "nodes": [0] }],
  "nodes": [
    { "name": "parent", "mesh": 0, "translation": [1.0, 0.0, 0.0], "children": [1] },
    { "name": "child", "mesh": 0, "translation": [0.0, 2.0, 0.0] }
  ],
  "meshes": [
    { "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }
  ],
  "materials": [
    {
      "name": "bark",
      "pbrMetallicRoughness": {
        "baseColorFactor": [0.5, 0.25, 1.0, 1.0],
        "roughnessFactor": 0.5,
        "baseColorTexture": { "index": 0 }
      },
      "emissiveFactor": [0.0, 0.0, 0.5]
    }
  ],
  "textures": [{ "source": 0 }],
  "images": [{ "uri": "bark.png" }],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
  ],
  "buffers": [{ "uri": "tri.bin", "byteLength": 44 }]
}"#;

fn write_scene(dir: &Path, json: &str) {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u16; 4] = [0, 1, 2, 0];
    let mut bin = bytemuck::cast_slice::<f32, u8>(&positions).to_vec();
    bin.extend_from_slice(bytemuck::cast_slice::<u16, u8>(&indices));
    fs::write(dir.join("tri.bin"), bin).unwrap();
    fs::write(dir.join("yard.gltf"), json).unwrap();
    image::GrayImage::from_pixel(2, 2, image::Luma([128]))
        .save(dir.join("bark.png"))
        .unwrap();
}

#[test]
fn node_transforms_are_baked_in_pre_order() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), SCENE_JSON);
    let mut renderer = RecordingRenderer::new();

    let model = ModelBuilder::default()
        .try_build(dir.path().join("yard.gltf"), &mut renderer)
        .unwrap();

    assert_eq!(model.meshes().len(), 2);
    let parent = &model.meshes()[0];
    let child = &model.meshes()[1];
    assert_eq!(parent.name, "tri");
    assert_eq!(child.name, "tri");
    assert_eq!(parent.vertices()[0].position, [1.0, 0.0, 0.0]);
    assert_eq!(parent.vertices()[1].position, [2.0, 0.0, 0.0]);
    assert_eq!(child.vertices()[0].position, [1.0, 2.0, 0.0]);
    assert_eq!(child.vertices()[2].position, [1.0, 3.0, 0.0]);
    assert!(child.vertices().iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[test]
fn pbr_material_is_mapped_and_texture_loaded() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), SCENE_JSON);
    let mut renderer = RecordingRenderer::new();

    let model = ModelBuilder::default()
        .try_build(dir.path().join("yard.gltf"), &mut renderer)
        .unwrap();

    assert_eq!(model.materials().len(), 1);
    let bark = model.get_material("bark").unwrap();
    assert_eq!(bark.shininess, 500.0);
    assert_eq!(bark.diffuse_color, cgmath::Vector3::new(0.5, 0.25, 1.0));
    assert_eq!(bark.ambient_color, bark.diffuse_color);
    assert_eq!(bark.emissive_color, cgmath::Vector3::new(0.0, 0.0, 0.5));
    let texture = bark.texture(TextureChannel::Diffuse);
    assert!(texture.is_valid());
    assert_eq!(texture.path, dir.path().join("bark.png"));
    assert_eq!(renderer.uploads.len(), 1);
    assert_eq!(renderer.uploads[0].levels[0].pixels, vec![128; 4]);
}

#[test]
fn shared_meshes_keep_local_transforms_without_pretransform() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), SCENE_JSON);
    let flags = ImportFlags {
        pretransform_vertices: false,
        ..Default::default()
    };

    let scene = GltfImporter
        .import(&dir.path().join("yard.gltf"), &flags)
        .unwrap();

    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.mesh_order(), vec![0, 0]);
    let root = &scene.nodes[scene.root];
    assert_eq!(root.name, "yard");
    let parent = &scene.nodes[root.children[0]];
    assert_eq!(parent.name, "parent");
    assert_eq!(
        parent.transform,
        Matrix4::from_translation(cgmath::Vector3::new(1.0, 0.0, 0.0))
    );
    assert_eq!(
        scene.materials[0].color(ColorKey::Diffuse),
        Some([0.5, 0.25, 1.0])
    );
}

#[test]
fn primitive_without_material_gets_the_default_one() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), &SCENE_JSON.replace(r#", "material": 0"#, ""));

    let scene = GltfImporter
        .import(&dir.path().join("yard.gltf"), &ImportFlags::default())
        .unwrap();

    assert_eq!(scene.materials.len(), 2);
    assert_eq!(scene.materials[1].name(), Some("DefaultMaterial"));
    assert!(scene.meshes.iter().all(|mesh| mesh.material_index == 1));
}

#[test]
fn document_without_scenes_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.gltf");
    fs::write(&path, r#"{ "asset": { "version": "2.0" } }"#).unwrap();

    let result = GltfImporter.import(&path, &ImportFlags::default());

    assert!(matches!(result, Err(ImportError::NoScene { .. })));
}

/// One triangle whose third index points past its three vertices.
const OUT_OF_RANGE_JSON: &str = r#"{
  "asset": { "version": "2.0" },
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "meshes": [
    { "name": "torn", "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 }, "indices": 2 }] }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
    { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 72, "byteLength": 6 }
  ],
  "buffers": [{ "uri": "torn.bin", "byteLength": 80 }]
}"#;

fn write_out_of_range(dir: &Path, json: &str) {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let normals: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    let indices: [u16; 4] = [0, 1, 7, 0];
    let mut bin = bytemuck::cast_slice::<f32, u8>(&positions).to_vec();
    bin.extend_from_slice(bytemuck::cast_slice::<f32, u8>(&normals));
    bin.extend_from_slice(bytemuck::cast_slice::<u16, u8>(&indices));
    fs::write(dir.join("torn.bin"), bin).unwrap();
    fs::write(dir.join("torn.gltf"), json).unwrap();
}

#[test]
fn index_past_the_vertex_count_drops_the_primitive() {
    init_logger();
    let without_normals = OUT_OF_RANGE_JSON.replace(r#", "NORMAL": 1"#, "");
    for json in [OUT_OF_RANGE_JSON, without_normals.as_str()] {
        let dir = tempfile::tempdir().unwrap();
        write_out_of_range(dir.path(), json);
        let path = dir.path().join("torn.gltf");

        let scene = GltfImporter.import(&path, &ImportFlags::default()).unwrap();
        assert!(scene.incomplete);
        assert!(scene.meshes.is_empty());

        let mut renderer = RecordingRenderer::new();
        let result = ModelBuilder::default().try_build(&path, &mut renderer);
        assert!(matches!(result, Err(ImportError::Incomplete { .. })));

        let model = ModelBuilder::default().build(&path, &mut renderer);
        assert!(model.is_empty());
        assert!(renderer.index_buffers.is_empty());
    }
}

#[test]
fn built_meshes_only_index_their_own_vertices() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), SCENE_JSON);
    let mut renderer = RecordingRenderer::new();

    let model = ModelBuilder::default()
        .try_build(dir.path().join("yard.gltf"), &mut renderer)
        .unwrap();

    assert!(!model.meshes().is_empty());
    for mesh in model.meshes() {
        assert_eq!(mesh.indices().len() % 3, 0);
        assert!(
            mesh.indices()
                .iter()
                .all(|&index| (index as usize) < mesh.vertices().len())
        );
    }
}

#[test]
fn percent_encoded_image_uri_is_decoded() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    write_scene(
        dir.path(),
        &SCENE_JSON.replace(r#""uri": "bark.png""#, r#""uri": "old%20bark.png""#),
    );
    fs::rename(dir.path().join("bark.png"), dir.path().join("old bark.png")).unwrap();
    let mut renderer = RecordingRenderer::new();

    let model = ModelBuilder::default()
        .try_build(dir.path().join("yard.gltf"), &mut renderer)
        .unwrap();

    let texture = model
        .get_material("bark")
        .unwrap()
        .texture(TextureChannel::Diffuse);
    assert!(texture.is_valid());
    assert_eq!(texture.path, dir.path().join("old bark.png"));
    assert_eq!(renderer.uploads.len(), 1);
}
