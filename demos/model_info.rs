//! Loads a model on a headless GPU context and prints what came out of it.
//!
//! ```text
//! cargo run --example model_info -- path/to/model.obj [--smooth]
//! ```

use flow_model::{
    context::Context,
    render::DrawList,
    resources::{BuildOptions, ModelBuilder},
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        anyhow::bail!("usage: model_info <model file> [--smooth]");
    };
    let force_smooth = args.any(|arg| arg == "--smooth");

    let mut ctx = futures::executor::block_on(Context::headless())?;
    let builder = ModelBuilder::new(BuildOptions {
        force_smooth,
        ..Default::default()
    });
    let model = builder.try_build(&path, &mut ctx)?;

    for material in model.materials() {
        println!("{material}");
    }
    for mesh in model.meshes() {
        let material = model
            .mesh_material(mesh)
            .map_or("<none>", |material| material.name.as_str());
        println!(
            "Mesh {:?}: {} vertices, {} triangles, material {}",
            mesh.name,
            mesh.vertices().len(),
            mesh.indices().len() / 3,
            material
        );
    }

    let mut draws = DrawList::new();
    model.draw(&ctx, &mut draws, true);
    let prepared = ctx.prepare(&draws);
    println!(
        "{} draw calls prepared, {} GPU buffers, {} GPU textures",
        prepared.len(),
        ctx.buffer_count(),
        ctx.texture_count()
    );
    Ok(())
}
