//! Mesh post-processing applied by the importers after parsing.

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, SquareMatrix, Transform, Vector3, Zero};

use crate::{
    data_structures::scene_graph::{RawMesh, SceneGraph},
    resources::import::ImportFlags,
};

/// Runs the steps `flags` asks for on every mesh of `scene`.
///
/// Order: remove normals, smooth normals, flat normals, join identical
/// vertices. Pretransformation happens inside the importers since it needs
/// the node hierarchy.
pub fn apply(scene: &mut SceneGraph, flags: &ImportFlags) {
    for mesh in scene.meshes.iter_mut() {
        if flags.remove_normals {
            mesh.normals.clear();
        }
        if flags.generate_smooth_normals {
            generate_smooth_normals(mesh, flags.max_smoothing_angle);
        }
        if flags.generate_normals {
            generate_flat_normals(mesh);
        }
        if flags.join_identical_vertices {
            join_identical_vertices(mesh);
        }
    }
}

fn position(mesh: &RawMesh, index: u32) -> Vector3<f32> {
    mesh.positions
        .get(index as usize)
        .copied()
        .map_or_else(Vector3::zero, Vector3::from)
}

/// Unit normal of a counter-clockwise triangle, zero for degenerate ones.
fn face_normal(mesh: &RawMesh, face: &[u32; 3]) -> Vector3<f32> {
    let [a, b, c] = face.map(|index| position(mesh, index));
    let normal = (b - a).cross(c - a);
    if normal.magnitude2() > 0.0 {
        normal.normalize()
    } else {
        Vector3::zero()
    }
}

fn bits2(value: [f32; 2]) -> [u32; 2] {
    value.map(f32::to_bits)
}

fn bits3(value: [f32; 3]) -> [u32; 3] {
    value.map(f32::to_bits)
}

/// Gives every face corner the average of the face normals around its
/// position.
///
/// Vertices that share a position but not an index are smoothed together.
/// A face only contributes when its normal is within `max_angle` degrees of
/// the normal of the face the corner belongs to. A vertex whose corners end
/// up with different normals is split, one copy per distinct normal. Meshes
/// that already have normals are left alone.
pub fn generate_smooth_normals(mesh: &mut RawMesh, max_angle: f32) {
    if mesh.has_normals() || mesh.positions.is_empty() {
        return;
    }
    let face_normals: Vec<Vector3<f32>> = mesh
        .faces
        .iter()
        .map(|face| face_normal(mesh, face))
        .collect();

    let mut faces_at: HashMap<[u32; 3], Vec<usize>> = HashMap::new();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        for &vertex in face {
            if let Some(&position) = mesh.positions.get(vertex as usize) {
                faces_at.entry(bits3(position)).or_default().push(face_index);
            }
        }
    }

    let min_cos = max_angle.to_radians().cos();
    let vertex_count = mesh.positions.len();
    let mut normals: Vec<Option<[f32; 3]>> = vec![None; vertex_count];
    let mut splits: HashMap<(u32, [u32; 3]), u32> = HashMap::new();
    let mut faces = mesh.faces.clone();

    for (face_index, face) in faces.iter_mut().enumerate() {
        let own = face_normals[face_index];
        for vertex in face.iter_mut() {
            let Some(&position) = mesh.positions.get(*vertex as usize) else {
                continue;
            };
            let mut sum = Vector3::zero();
            for &other in faces_at.get(&bits3(position)).into_iter().flatten() {
                let normal = face_normals[other];
                if normal.dot(own) >= min_cos {
                    sum += normal;
                }
            }
            let normal = if sum.magnitude2() > 0.0 {
                sum.normalize()
            } else {
                own
            };
            let normal: [f32; 3] = normal.into();

            match normals[*vertex as usize] {
                None => normals[*vertex as usize] = Some(normal),
                Some(existing) if bits3(existing) == bits3(normal) => {}
                Some(_) => {
                    let source = *vertex;
                    *vertex = *splits.entry((source, bits3(normal))).or_insert_with(|| {
                        mesh.positions.push(position);
                        if let Some(tex_coords) = mesh.tex_coords.as_mut() {
                            let tex_coord =
                                tex_coords.get(source as usize).copied().unwrap_or_default();
                            tex_coords.push(tex_coord);
                        }
                        normals.push(Some(normal));
                        mesh.positions.len() as u32 - 1
                    });
                }
            }
        }
    }

    if mesh.positions.len() > vertex_count {
        log::trace!(
            "Split {} vertices of mesh {:?} while smoothing",
            mesh.positions.len() - vertex_count,
            mesh.name
        );
    }
    mesh.faces = faces;
    mesh.normals = normals
        .into_iter()
        .map(|normal| normal.unwrap_or_default())
        .collect();
}

/// Gives every face its own three vertices carrying the face normal.
///
/// Meshes that already have normals are left alone.
pub fn generate_flat_normals(mesh: &mut RawMesh) {
    if mesh.has_normals() {
        return;
    }
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(mesh.faces.len() * 3);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(mesh.faces.len() * 3);
    let mut tex_coords: Option<Vec<[f32; 2]>> = mesh
        .tex_coords
        .as_ref()
        .map(|_| Vec::with_capacity(mesh.faces.len() * 3));
    let mut faces = Vec::with_capacity(mesh.faces.len());

    for face in &mesh.faces {
        let normal: [f32; 3] = face_normal(mesh, face).into();
        let base = positions.len() as u32;
        for &vertex in face {
            positions.push(position(mesh, vertex).into());
            normals.push(normal);
            if let (Some(out), Some(source)) = (tex_coords.as_mut(), mesh.tex_coords.as_ref()) {
                out.push(source.get(vertex as usize).copied().unwrap_or_default());
            }
        }
        faces.push([base, base + 1, base + 2]);
    }

    mesh.positions = positions;
    mesh.normals = normals;
    mesh.tex_coords = tex_coords;
    mesh.faces = faces;
}

/// Merges vertices whose position, normal and texture coordinate are
/// bit-identical, then remaps the faces.
pub fn join_identical_vertices(mesh: &mut RawMesh) {
    let mut seen: HashMap<([u32; 3], [u32; 3], [u32; 2]), u32> = HashMap::new();
    let mut remap = Vec::with_capacity(mesh.positions.len());
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut tex_coords = mesh.tex_coords.as_ref().map(|_| Vec::new());

    for (vertex, &position) in mesh.positions.iter().enumerate() {
        let normal = mesh.normals.get(vertex).copied();
        let tex_coord = mesh
            .tex_coords
            .as_ref()
            .and_then(|tex_coords| tex_coords.get(vertex).copied());
        let key = (
            bits3(position),
            bits3(normal.unwrap_or_default()),
            bits2(tex_coord.unwrap_or_default()),
        );
        let index = *seen.entry(key).or_insert_with(|| {
            positions.push(position);
            if let Some(normal) = normal {
                normals.push(normal);
            }
            if let Some(out) = tex_coords.as_mut() {
                out.push(tex_coord.unwrap_or_default());
            }
            positions.len() as u32 - 1
        });
        remap.push(index);
    }

    if positions.len() == mesh.positions.len() {
        return;
    }
    log::trace!(
        "Joined {} of {} vertices in mesh {:?}",
        mesh.positions.len() - positions.len(),
        mesh.positions.len(),
        mesh.name
    );
    for face in mesh.faces.iter_mut() {
        *face = face.map(|vertex| remap.get(vertex as usize).copied().unwrap_or(vertex));
    }
    mesh.positions = positions;
    mesh.normals = normals;
    mesh.tex_coords = tex_coords;
}

/// Copy of `mesh` with `transform` baked into positions and normals.
pub fn transform_mesh(mesh: &RawMesh, transform: &Matrix4<f32>) -> RawMesh {
    let linear = Matrix3::from_cols(
        transform.x.truncate(),
        transform.y.truncate(),
        transform.z.truncate(),
    );
    let normal_matrix = linear.invert().map_or(linear, |inverse| inverse.transpose());

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .iter()
        .map(|&position| {
            let point = transform.transform_point(Point3::from(position));
            [point.x, point.y, point.z]
        })
        .collect();
    let normals: Vec<[f32; 3]> = mesh
        .normals
        .iter()
        .map(|&normal| {
            let normal = normal_matrix * Vector3::from(normal);
            if normal.magnitude2() > 0.0 {
                normal.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect();

    RawMesh {
        positions,
        normals,
        ..mesh.clone()
    }
}
