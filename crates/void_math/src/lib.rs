//! # void_math - Collision Math
//!
//! Small, allocation-free math primitives for spatial indexing and ray
//! queries: vectors, column-major matrices, bounding volumes, rays and the
//! intersection predicates built on them.

pub mod bounds;
pub mod intersect;
pub mod matrix;
pub mod ray;
pub mod vector;

pub use bounds::*;
pub use intersect::*;
pub use matrix::*;
pub use ray::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    /// Tolerance used when comparing lengths for equality
    pub const EPSILON: f32 = 1e-5;
}

pub mod prelude {
    pub use crate::bounds::{Sphere, AABB};
    pub use crate::intersect::{ray_aabb, ray_triangle, sphere_may_hit, SphereTest};
    pub use crate::matrix::Mat4;
    pub use crate::ray::Ray;
    pub use crate::vector::{Vec3, Vec4};
}
