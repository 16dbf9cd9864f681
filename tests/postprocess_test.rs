use cgmath::{Matrix4, Vector3};
use flow_model::{
    data_structures::scene_graph::{RawMesh, SceneGraph},
    resources::{
        import::{FORCE_SMOOTH_MAX_ANGLE, ImportFlags},
        postprocess::{
            apply, generate_flat_normals, generate_smooth_normals, join_identical_vertices,
            transform_mesh,
        },
    },
};

fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

/// Two triangles folded 90 degrees along the shared edge x = 0..1, y = 0.
fn folded() -> RawMesh {
    RawMesh {
        name: "fold".to_string(),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        ],
        normals: Vec::new(),
        tex_coords: None,
        faces: vec![[0, 1, 2], [3, 4, 5]],
        material_index: 0,
    }
}

#[test]
fn flat_normals_follow_each_face() {
    let mut mesh = folded();
    generate_flat_normals(&mut mesh);

    assert_eq!(mesh.positions.len(), 6);
    assert_close(mesh.normals[0], [0.0, 0.0, 1.0]);
    assert_close(mesh.normals[3], [0.0, 1.0, 0.0]);
}

#[test]
fn smooth_normals_average_across_split_vertices() {
    let mut mesh = folded();
    generate_smooth_normals(&mut mesh, FORCE_SMOOTH_MAX_ANGLE);

    let diagonal = std::f32::consts::FRAC_1_SQRT_2;
    assert_close(mesh.normals[0], [0.0, diagonal, diagonal]);
    assert_close(mesh.normals[3], [0.0, diagonal, diagonal]);
    assert_close(mesh.normals[2], [0.0, 0.0, 1.0]);
    assert_close(mesh.normals[4], [0.0, 1.0, 0.0]);
}

#[test]
fn smoothing_angle_limits_averaging() {
    let mut mesh = folded();
    generate_smooth_normals(&mut mesh, 45.0);

    assert_close(mesh.normals[0], [0.0, 0.0, 1.0]);
    assert_close(mesh.normals[3], [0.0, 1.0, 0.0]);
}

#[test]
fn existing_normals_are_kept_unless_removed() {
    let mut mesh = folded();
    mesh.normals = vec![[1.0, 0.0, 0.0]; 6];
    let mut scene = SceneGraph::new("root");
    scene.add_mesh(mesh);

    apply(&mut scene, &ImportFlags::default());
    assert!(scene.meshes[0].normals.iter().all(|&n| n == [1.0, 0.0, 0.0]));

    apply(&mut scene, &ImportFlags::default().force_smooth());
    assert!(scene.meshes[0].normals.iter().all(|&n| n != [1.0, 0.0, 0.0]));
}

#[test]
fn identical_vertices_are_joined() {
    let mut mesh = folded();
    mesh.normals = vec![[0.0, 0.0, 1.0]; 6];
    join_identical_vertices(&mut mesh);

    assert_eq!(mesh.positions.len(), 4);
    assert_eq!(mesh.normals.len(), 4);
    assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 3, 1]]);
}

#[test]
fn vertices_differing_in_normal_stay_apart() {
    let mut mesh = folded();
    generate_flat_normals(&mut mesh);
    join_identical_vertices(&mut mesh);

    assert_eq!(mesh.positions.len(), 6);
}

#[test]
fn transform_moves_positions_and_rotates_normals() {
    let mut mesh = folded();
    generate_flat_normals(&mut mesh);
    let transform = Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0))
        * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0)
        * Matrix4::from_angle_x(cgmath::Deg(90.0));

    let moved = transform_mesh(&mesh, &transform);

    assert_close(moved.positions[1], [2.0, 0.0, 5.0]);
    assert_close(moved.positions[2], [0.0, 0.0, 6.0]);
    assert_close(moved.normals[0], [0.0, -1.0, 0.0]);
    assert_eq!(moved.faces, mesh.faces);
}

/// One triangle drawn from both sides through the same three vertices.
fn double_sided(faces: Vec<[u32; 3]>) -> RawMesh {
    RawMesh {
        name: "sheet".to_string(),
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: Vec::new(),
        tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
        faces,
        material_index: 0,
    }
}

#[test]
fn opposite_faces_sharing_vertices_keep_their_own_normals() {
    for faces in [vec![[0, 1, 2], [0, 2, 1]], vec![[0, 2, 1], [0, 1, 2]]] {
        let mut mesh = double_sided(faces);
        generate_smooth_normals(&mut mesh, FORCE_SMOOTH_MAX_ANGLE);

        assert_eq!(mesh.positions.len(), 6);
        assert_eq!(mesh.normals.len(), 6);
        assert_eq!(mesh.tex_coords.as_ref().map(Vec::len), Some(6));
        for face in &mesh.faces {
            let front = mesh.positions[face[1] as usize] == [1.0, 0.0, 0.0];
            let expected = if front { [0.0, 0.0, 1.0] } else { [0.0, 0.0, -1.0] };
            for &vertex in face {
                assert_close(mesh.normals[vertex as usize], expected);
            }
        }
    }
}
