//! Rays for intersection queries

use crate::matrix::Mat4;
use crate::vector::Vec3;

/// Half-line from `origin` along `direction`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length in world space. A ray carried into a scaled local space
    /// keeps the scaled length so that parameters stay world distances.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at parameter `t`
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Carry the ray into another space without renormalizing. For an affine
    /// `matrix`, `self.at(t)` maps to `result.at(t)` for every `t`.
    #[inline]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point(self.origin),
            direction: matrix.transform_vector(self.direction),
        }
    }

    /// Component-wise reciprocal of the direction, for slab tests
    #[inline]
    pub fn inverse_direction(&self) -> Vec3 {
        self.direction.recip()
    }

    /// Check that the direction is usable (finite and non-zero)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.origin.is_finite() && self.direction.is_finite() && self.direction.length_squared() > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_direction_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(ray.direction.length(), 1.0);
        assert_eq!(ray.at(5.0), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_transformed_ray_preserves_parameter() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 10.0), Vec3::NEG_Z);
        let to_local = Mat4::from_scale_translation(2.0, Vec3::new(3.0, 0.0, -1.0))
            .try_inverse()
            .unwrap();
        let local = ray.transformed(&to_local);

        for t in [0.0, 1.5, 4.0] {
            let expected = to_local.transform_point(ray.at(t));
            let actual = local.at(t);
            assert_relative_eq!(actual.x, expected.x, epsilon = 1e-5);
            assert_relative_eq!(actual.y, expected.y, epsilon = 1e-5);
            assert_relative_eq!(actual.z, expected.z, epsilon = 1e-5);
        }
        assert_relative_eq!(local.direction.length(), 0.5);
    }

    #[test]
    fn test_zero_direction_is_invalid() {
        assert!(!Ray::new(Vec3::ZERO, Vec3::ZERO).is_valid());
        assert!(Ray::new(Vec3::ZERO, Vec3::Z).is_valid());
    }
}
