//! Engine data structures: scene graphs, models, materials and textures.
//!
//! This module contains the core data types of a loaded model:
//!
//! - `scene_graph` holds the importer output and flattens it into a mesh list
//! - `model` contains vertices, meshes and the model aggregate
//! - `material` contains resolved material parameters and texture channels
//! - `texture` contains texture handles, upload descriptions and the GPU wrapper
//! - `primitives` builds procedural spheres and cubes

pub mod material;
pub mod model;
pub mod primitives;
pub mod scene_graph;
pub mod texture;
