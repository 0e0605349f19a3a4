//! Bounding volumes

use crate::matrix::Mat4;
use crate::vector::Vec3;

/// Axis-Aligned Bounding Box
///
/// Starts out inverted ([`AABB::EMPTY`]) so that growing it by points or
/// boxes needs no special first case.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// Inverted box that contains nothing
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box around a set of points
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |aabb, &p| aabb.grow(p))
    }

    /// Box grown to include a point
    #[inline]
    pub fn grow(self, point: Vec3) -> Self {
        Self::new(self.min.min(point), self.max.max(point))
    }

    /// Box grown to include another box. An empty operand is the identity.
    #[inline]
    pub fn union(&self, other: &AABB) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Check if the box is inverted on any axis
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extents along each axis
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// SAH cost metric: twice the sum of the three face areas. Empty boxes
    /// have zero area.
    #[inline]
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.size();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if another box lies fully inside this one. Every box contains
    /// an empty box.
    #[inline]
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
    }

    /// Box around the eight transformed corners
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let mut out = Self::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out = out.grow(matrix.transform_point(corner));
        }
        out
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding sphere
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Tight axis-aligned box around the sphere
    #[inline]
    pub fn bounding_box(&self) -> AABB {
        AABB::from_center_half_extents(self.center, Vec3::splat(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box_is_growth_identity() {
        let b = AABB::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 3.0, 4.0));
        assert!(AABB::EMPTY.is_empty());
        assert_eq!(AABB::EMPTY.union(&b), b);
        assert_eq!(b.union(&AABB::EMPTY), b);
        assert_eq!(AABB::EMPTY.grow(Vec3::ONE), AABB::new(Vec3::ONE, Vec3::ONE));
    }

    #[test]
    fn test_area_is_twice_face_sum() {
        let b = AABB::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.area(), 2.0 * (2.0 + 6.0 + 3.0));
        assert_eq!(AABB::EMPTY.area(), 0.0);

        // A single point is a valid box with no area
        let p = AABB::EMPTY.grow(Vec3::splat(5.0));
        assert!(!p.is_empty());
        assert_eq!(p.area(), 0.0);
    }

    #[test]
    fn test_containment() {
        let outer = AABB::from_points(&[Vec3::splat(-2.0), Vec3::splat(2.0)]);
        let inner = AABB::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(outer.contains_aabb(&inner));
        assert!(!inner.contains_aabb(&outer));
        assert!(inner.contains_aabb(&AABB::EMPTY));
    }

    #[test]
    fn test_sphere_bounding_box() {
        let s = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5);
        let b = s.bounding_box();
        assert_eq!(b.min, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(b.max, Vec3::new(1.5, 2.5, 3.5));
    }

    #[test]
    fn test_transformed_box() {
        let b = AABB::new(Vec3::ZERO, Vec3::ONE);
        let moved = b.transformed(&Mat4::from_scale_translation(2.0, Vec3::new(0.0, 0.0, -1.0)));
        assert_eq!(moved, AABB::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(2.0, 2.0, 1.0)));

        // A quarter turn about Z swaps the x and y extents
        let wide = AABB::new(Vec3::new(-2.0, -1.0, 0.0), Vec3::new(2.0, 1.0, 0.0));
        let turned = wide.transformed(&Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
        assert!((turned.max.x - 1.0).abs() < 1e-5);
        assert!((turned.max.y - 2.0).abs() < 1e-5);

        assert!(AABB::EMPTY.transformed(&Mat4::IDENTITY).is_empty());
    }
}
