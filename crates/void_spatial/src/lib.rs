//! # void_spatial - Spatial Acceleration
//!
//! Bounding volume hierarchy over axis-aligned boxes:
//! - Binned SAH build into a flat node arena plus an index permutation
//! - Ray traversal with nearest-first descent and distance pruning
//! - Inspection (stats, SAH cost per node) and serializable snapshots
//! - Debug visualization driven by integer toggles
//!
//! # Example
//!
//! ```ignore
//! use void_math::{Ray, Vec3, AABB};
//! use void_spatial::Bvh;
//!
//! let boxes = vec![
//!     AABB::new(Vec3::ZERO, Vec3::ONE),
//!     AABB::new(Vec3::splat(5.0), Vec3::splat(6.0)),
//! ];
//! let bvh = Bvh::build(&boxes);
//!
//! let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
//! let hit = bvh.closest_hit(&ray, 100.0, |prim| void_math::ray_aabb(&ray, &boxes[prim as usize], 100.0));
//! ```

mod bvh;
mod config;
pub mod debug;
mod error;

pub use bvh::*;
pub use config::*;
pub use debug::{draw_bvh, BvhDebugSettings, BvhDrawMode, DebugDraw, RenderMode};
pub use error::*;

pub mod prelude {
    pub use crate::bvh::{Bvh, BvhNode, BvhState, BvhStats};
    pub use crate::config::BvhConfig;
    pub use crate::debug::{draw_bvh, BvhDebugSettings, BvhDrawMode, DebugDraw, RenderMode};
    pub use crate::error::SpatialError;
}
