//! Procedural meshes.

use std::f32::consts::{PI, TAU};

use crate::{
    data_structures::model::{Mesh, Vertex},
    render::Renderer,
};

pub const DEFAULT_LATITUDES: u32 = 16;
pub const DEFAULT_LONGITUDES: u32 = 32;

/// UV sphere of radius 1 with `latitudes` rings and `longitudes` segments.
///
/// The texture seam is duplicated so `u` runs from 0 to 1 around the sphere.
pub fn sphere<R: Renderer + ?Sized>(renderer: &mut R, latitudes: u32, longitudes: u32) -> Mesh {
    let latitudes = latitudes.max(1);
    let longitudes = longitudes.max(3);

    let mut vertices = Vec::with_capacity(((latitudes + 1) * (longitudes + 1)) as usize);
    for i in 0..=latitudes {
        for j in 0..=longitudes {
            let theta = j as f32 / longitudes as f32 * TAU;
            let phi = (i as f32 / latitudes as f32 - 0.5) * PI;
            let x = theta.cos() * phi.cos();
            let y = phi.sin();
            let z = -theta.sin() * phi.cos();
            let u = j as f32 / longitudes as f32;
            let v = i as f32 / latitudes as f32;
            vertices.push(Vertex::new([x, y, z], [x, y, z], [u, v]));
        }
    }

    let row = longitudes + 1;
    let mut indices = Vec::with_capacity((latitudes * longitudes * 6) as usize);
    for i in 0..latitudes {
        for j in 0..longitudes {
            indices.extend_from_slice(&[
                i * row + j,
                i * row + j + 1,
                (i + 1) * row + j + 1,
                (i + 1) * row + j + 1,
                (i + 1) * row + j,
                i * row + j,
            ]);
        }
    }

    Mesh::new(renderer, "sphere", vertices, indices, None)
}

/// Unit cube centered on the origin with one quad per face.
///
/// With `separate_faces` the texture coordinates lay the faces out as a cube
/// net (one texture for the whole cube); otherwise every face maps the full
/// texture.
pub fn cube<R: Renderer + ?Sized>(renderer: &mut R, separate_faces: bool) -> Mesh {
    const THIRD: f32 = 1.0 / 3.0;
    const TWO_THIRDS: f32 = 2.0 / 3.0;
    let quad = |u0: f32, v0: f32, u1: f32, v1: f32| [[u0, v0], [u1, v0], [u1, v1], [u0, v1]];
    // back, front, left, right, bottom, top
    let tex_coords: [[[f32; 2]; 4]; 6] = if separate_faces {
        [
            quad(0.75, THIRD, 1.0, TWO_THIRDS),
            quad(0.25, THIRD, 0.5, TWO_THIRDS),
            quad(0.0, THIRD, 0.25, TWO_THIRDS),
            quad(0.5, THIRD, 0.75, TWO_THIRDS),
            quad(0.25, 0.0, 0.5, THIRD),
            quad(0.25, TWO_THIRDS, 0.5, 1.0),
        ]
    } else {
        [quad(0.0, 0.0, 1.0, 1.0); 6]
    };

    let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
        (
            [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]],
            [0.0, 0.0, -1.0],
        ),
        (
            [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
            [0.0, 0.0, 1.0],
        ),
        (
            [[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]],
            [-1.0, 0.0, 0.0],
        ),
        (
            [[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]],
            [1.0, 0.0, 0.0],
        ),
        (
            [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]],
            [0.0, -1.0, 0.0],
        ),
        (
            [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]],
            [0.0, 1.0, 0.0],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, ((corners, normal), uvs)) in faces.iter().zip(tex_coords.iter()).enumerate() {
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            vertices.push(Vertex::new(*corner, *normal, *uv));
        }
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Mesh::new(renderer, "cube", vertices, indices, None)
}
