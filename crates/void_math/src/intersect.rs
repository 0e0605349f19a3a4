//! Intersection predicates for ray queries
//!
//! - AABB entry distance (slab method), used to descend a BVH
//! - Bounding sphere broad phase
//! - Triangle fine phase with back-face culling and edge functions

use crate::bounds::{Sphere, AABB};
use crate::ray::Ray;
use crate::vector::Vec3;

/// Ray-AABB entry distance using the slab method
///
/// Returns the parameter where the ray enters the box, clamped to 0 when the
/// origin is already inside, or `None` if the box is missed, lies behind the
/// origin or is entered beyond `max_t`.
pub fn ray_aabb(ray: &Ray, aabb: &AABB, max_t: f32) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }
    let inv_dir = ray.inverse_direction();

    let (x0, x1) = slab(ray.origin.x, aabb.min.x, aabb.max.x, inv_dir.x);
    let (y0, y1) = slab(ray.origin.y, aabb.min.y, aabb.max.y, inv_dir.y);
    let (z0, z1) = slab(ray.origin.z, aabb.min.z, aabb.max.z, inv_dir.z);

    let tmin = x0.max(y0).max(z0).max(0.0);
    let tmax = x1.min(y1).min(z1);

    if tmin > tmax || tmin > max_t {
        None
    } else {
        Some(tmin)
    }
}

/// Entry and exit parameters for one slab. A ray parallel to the slab is
/// inside it for all `t` when the origin lies within `[min, max]`, faces
/// included, and never otherwise.
#[inline]
fn slab(origin: f32, min: f32, max: f32, inv_dir: f32) -> (f32, f32) {
    if inv_dir.is_infinite() {
        return if origin >= min && origin <= max {
            (f32::NEG_INFINITY, f32::INFINITY)
        } else {
            (f32::INFINITY, f32::NEG_INFINITY)
        };
    }
    let t1 = (min - origin) * inv_dir;
    let t2 = (max - origin) * inv_dir;
    (t1.min(t2), t1.max(t2))
}

/// Outcome of the bounding sphere broad phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SphereTest {
    /// Ray starts inside the sphere
    Inside,
    /// Ray may reach the sphere before `best`
    Candidate,
    /// Sphere cannot contain a hit closer than `best`
    Rejected,
}

impl SphereTest {
    /// Check if the fine phase should run
    #[inline]
    pub fn passes(self) -> bool {
        self != SphereTest::Rejected
    }
}

/// Bounding sphere broad phase against a unit-direction ray
///
/// `best` is the current nearest hit distance (or the query's maximum
/// distance before any hit). A ray that starts inside the sphere always
/// passes.
pub fn sphere_may_hit(ray: &Ray, sphere: &Sphere, best: f32) -> SphereTest {
    let to_center = sphere.center - ray.origin;
    let r2 = sphere.radius * sphere.radius;
    let c2 = to_center.dot(to_center);

    if c2 < r2 {
        return SphereTest::Inside;
    }

    let d = to_center.dot(ray.direction);
    if d < 0.0 {
        return SphereTest::Rejected;
    }

    if d * d - (c2 - r2) < 0.0 {
        return SphereTest::Rejected;
    }

    // Equivalent to sqrt(c2) - radius > best
    if c2 > best * best + 2.0 * sphere.radius * best + r2 {
        return SphereTest::Rejected;
    }

    SphereTest::Candidate
}

/// Unnormalized face normal, `(b - a) x (c - a)`
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Ray-triangle intersection with back-face culling
///
/// `normal` must be [`triangle_normal`] of the same vertices; only its
/// direction matters. Triangles facing away from the ray or edge-on to it are
/// skipped. The hit point is accepted when it lies on the inner side of all
/// three edges. Returns the ray parameter of the hit.
pub fn ray_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> Option<f32> {
    let n_dot_dir = normal.dot(ray.direction);
    if n_dot_dir >= 0.0 {
        return None;
    }

    let t = -(normal.dot(ray.origin) - normal.dot(a)) / n_dot_dir;
    if t < 0.0 {
        return None;
    }

    let p = ray.at(t);
    let inside = |from: Vec3, to: Vec3| normal.dot((to - from).cross(p - from)) >= 0.0;
    if inside(a, b) && inside(b, c) && inside(c, a) {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const A: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    const B: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    const C: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    #[test]
    fn test_unit_triangle_hit() {
        let n = triangle_normal(A, B, C);
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let t = ray_triangle(&ray, A, B, C, n).unwrap();
        assert_relative_eq!(t, 1.0);
        assert_eq!(ray.at(t), Vec3::new(0.25, 0.25, 0.0));
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let n = triangle_normal(A, B, C);
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(ray_triangle(&ray, A, B, C, n).is_none());
    }

    #[test]
    fn test_back_face_is_culled() {
        let n = triangle_normal(A, B, C);
        let below = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);
        assert!(ray_triangle(&below, A, B, C, n).is_none());

        // Reversed winding faces down and is hit from below
        let flipped = triangle_normal(A, C, B);
        let t = ray_triangle(&below, A, C, B, flipped).unwrap();
        assert_relative_eq!(t, 1.0);
    }

    #[test]
    fn test_point_outside_edges_misses() {
        let n = triangle_normal(A, B, C);
        for origin in [
            Vec3::new(0.75, 0.75, 1.0),
            Vec3::new(-0.1, 0.5, 1.0),
            Vec3::new(0.5, -0.1, 1.0),
        ] {
            let ray = Ray::new(origin, Vec3::NEG_Z);
            assert!(ray_triangle(&ray, A, B, C, n).is_none(), "{:?}", origin);
        }
    }

    #[test]
    fn test_triangle_behind_origin_misses() {
        let n = triangle_normal(A, B, C);
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::NEG_Z);
        assert!(ray_triangle(&ray, A, B, C, n).is_none());
    }

    #[test]
    fn test_sphere_rejects_rays_passing_outside() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0);
        for offset in [1.01, 2.0, 50.0] {
            let ray = Ray::new(Vec3::new(offset, 0.0, 0.0), Vec3::NEG_Z);
            assert_eq!(sphere_may_hit(&ray, &sphere, f32::MAX), SphereTest::Rejected);
        }
        let ray = Ray::new(Vec3::new(0.5, 0.0, 0.0), Vec3::NEG_Z);
        assert_eq!(sphere_may_hit(&ray, &sphere, f32::MAX), SphereTest::Candidate);
    }

    #[test]
    fn test_sphere_behind_or_too_far() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let away = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(sphere_may_hit(&away, &sphere, f32::MAX), SphereTest::Rejected);

        let toward = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(sphere_may_hit(&toward, &sphere, 5.0), SphereTest::Rejected);
        assert_eq!(sphere_may_hit(&toward, &sphere, 9.5), SphereTest::Candidate);
    }

    #[test]
    fn test_origin_inside_sphere_always_passes() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X);
        assert_eq!(sphere_may_hit(&ray, &sphere, 0.0), SphereTest::Inside);
        assert!(SphereTest::Inside.passes());
    }

    #[test]
    fn test_ray_aabb_entry() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 6.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_relative_eq!(ray_aabb(&ray, &aabb, f32::MAX).unwrap(), 4.0);
        assert!(ray_aabb(&ray, &aabb, 3.0).is_none());

        let inside = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(ray_aabb(&inside, &aabb, f32::MAX), Some(0.0));

        let behind = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray_aabb(&behind, &aabb, f32::MAX).is_none());

        let miss = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::Z);
        assert!(ray_aabb(&miss, &aabb, f32::MAX).is_none());
        assert!(ray_aabb(&ray, &AABB::EMPTY, f32::MAX).is_none());
    }

    #[test]
    fn test_ray_aabb_parallel_to_face() {
        let aabb = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Origin on the x = 1 and y = -1 faces, moving along them
        let on_face = Ray::new(Vec3::new(1.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_relative_eq!(ray_aabb(&on_face, &aabb, f32::MAX).unwrap(), 4.0);
        let on_edge = Ray::new(Vec3::new(1.0, -1.0, 5.0), Vec3::NEG_Z);
        assert_relative_eq!(ray_aabb(&on_edge, &aabb, f32::MAX).unwrap(), 4.0);

        let outside = Ray::new(Vec3::new(1.0001, 0.0, 5.0), Vec3::NEG_Z);
        assert!(ray_aabb(&outside, &aabb, f32::MAX).is_none());
    }
}
