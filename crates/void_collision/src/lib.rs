//! Void Collision - Triangle-Mesh Colliders and Raycasts
//!
//! Scene collision queries against placed triangle meshes.
//!
//! # Features
//!
//! - Collider meshes loaded from glTF (any index width, signed or unsigned)
//! - Colliders placed with a uniform-scale transform, filtered by a 16-bit mask
//! - Nearest-hit raycasts with a bounding-sphere broad phase and back-face
//!   culled triangle tests
//! - Optional BVH over collider bounds for large scenes
//! - Generational handles for meshes and colliders
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 CollisionWorld                   │
//! │  ┌───────────┐  ┌──────────────────┐  ┌───────┐  │
//! │  │ MeshStore │  │ ColliderRegistry │  │  BVH  │  │
//! │  └───────────┘  └──────────────────┘  └───────┘  │
//! │  ┌────────────────────────────────────────────┐  │
//! │  │   raycast: mask → sphere → triangles       │  │
//! │  └────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//!          ▲                                 │
//!          │ MeshSource (glTF)               ▼
//!     ┌──────────┐                    ┌────────────┐
//!     │  assets  │                    │ DebugDraw  │
//!     └──────────┘                    └────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_collision::prelude::*;
//!
//! let mut world = CollisionWorld::new(CollisionConfig::default());
//!
//! let mesh = world.load_collider_mesh(&GltfMeshSource::new(), "assets/level.glb")?;
//! let wall = world.create_collider(mesh, &Mat4::IDENTITY, CollisionMask::layer(0), 17)?;
//!
//! if let Some(hit) = world.raycast(Vec3::new(0.0, 1.0, 10.0), Vec3::NEG_Z, 100.0, CollisionMask::ANY) {
//!     assert_eq!(hit.collider, wall);
//! }
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod mask;
pub mod mesh;
pub mod query;
pub mod registry;
pub mod world;

pub mod prelude {
    pub use crate::config::CollisionConfig;
    pub use crate::error::{CollisionError, Result};
    pub use crate::loader::{GltfMeshSource, IndexData, MeshData, MeshPrimitive, MeshSource};
    pub use crate::mask::CollisionMask;
    pub use crate::mesh::{ColliderMesh, MeshStore, Triangle};
    pub use crate::query::{RaycastHit, RaycastQuery};
    pub use crate::registry::{Collider, ColliderHandle, ColliderRegistry, MeshHandle};
    pub use crate::world::{CollisionWorld, SharedCollisionWorld};

    pub use void_math::{Mat4, Vec3};
}

pub use prelude::*;
