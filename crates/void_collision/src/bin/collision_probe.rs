//! Load a collider mesh and cast a probe ray at it
//!
//! Run with: cargo run -p void_collision --bin collision_probe -- <mesh.gltf|glb> [config.toml]

use std::process::ExitCode;

use void_collision::prelude::*;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(mesh_path) = args.get(1) else {
        let program = args.first().map_or("collision_probe", String::as_str);
        eprintln!("usage: {} <mesh.gltf|glb> [config.toml]", program);
        return ExitCode::from(2);
    };

    match run(mesh_path, args.get(2).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mesh_path: &str, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            log::info!("Loading collision config from {}", path);
            CollisionConfig::load(path)?
        }
        None => CollisionConfig::accelerated(),
    };

    let mut world = CollisionWorld::new(config);
    let mesh = world.load_collider_mesh(&GltfMeshSource::new(), mesh_path)?;
    let collider = world.create_collider(mesh, &Mat4::IDENTITY, CollisionMask::ALL, 0)?;

    let stats = world.rebuild_bvh();
    log::info!(
        "Collider BVH: {} nodes, {} leaves, depth {}",
        stats.nodes_used,
        stats.leaves,
        stats.max_depth
    );

    // Start outside the bounding sphere, looking down -Z
    let radius = world.collider_mesh(mesh).map_or(1.0, |m| m.radius());
    let origin = Vec3::new(0.0, 0.0, radius * 2.0 + 1.0);

    match world.raycast(origin, Vec3::NEG_Z, f32::MAX, CollisionMask::ANY) {
        Some(hit) => log::info!(
            "Hit {:?} at distance {:.4}, point ({:.4}, {:.4}, {:.4})",
            hit.collider,
            hit.distance,
            hit.point.x,
            hit.point.y,
            hit.point.z
        ),
        None => log::info!("Ray from {:?} along -Z missed {:?}", origin, collider),
    }

    Ok(())
}
