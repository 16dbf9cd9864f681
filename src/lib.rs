//! flow-model
//!
//! Turns imported 3D scene files into render-ready models for wgpu: the
//! node hierarchy is flattened into a list of meshes, material records are
//! resolved into shading parameters, and every referenced texture is
//! decoded and uploaded once per build through a texture cache.
//!
//! High-level modules
//! - `context`: wgpu device/queue owner and the GPU implementation of `Renderer`
//! - `data_structures`: scene graphs, meshes, materials, textures and primitives
//! - `pipelines`: material uniform layout and prepared draw commands
//! - `render`: the `Renderer` seam and the draw list it records into
//! - `resources`: importers, post-processing, material resolution, texture loading
//!
//! ```no_run
//! use flow_model::{context::Context, render::DrawList, resources::load_model};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut ctx = Context::headless().await?;
//! let model = load_model("assets/backpack.obj", false, &mut ctx);
//! let mut draws = DrawList::new();
//! model.draw(&ctx, &mut draws, true);
//! let prepared = ctx.prepare(&draws);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::{
    material::{Material, TextureChannel},
    model::{Mesh, Model, Vertex},
    texture::{Texture, TextureId},
};
pub use render::{DrawList, Renderer};
pub use resources::{BuildOptions, ModelBuilder, load_model};
