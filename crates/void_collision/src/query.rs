//! Raycast queries

use void_math::{Ray, Vec3};

use crate::mask::CollisionMask;
use crate::registry::ColliderHandle;

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Distance from ray origin
    pub distance: f32,
    /// Hit point in world space
    pub point: Vec3,
    /// User data from the collider
    pub user_data: u64,
}

/// A ray plus the filters applied to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    pub origin: Vec3,
    /// Normalized before casting
    pub direction: Vec3,
    /// Hits farther than this are ignored; a hit exactly here counts
    pub max_distance: f32,
    /// Collider mask filter, [`CollisionMask::ANY`] matches everything
    pub mask: CollisionMask,
}

impl RaycastQuery {
    /// Unbounded query that matches every collider
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            max_distance: f32::MAX,
            mask: CollisionMask::ANY,
        }
    }

    /// Set maximum distance
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Set collision mask filter
    pub fn with_mask(mut self, mask: impl Into<CollisionMask>) -> Self {
        self.mask = mask.into();
        self
    }

    /// World-space ray with a unit direction, or `None` if the direction is
    /// zero or anything is not finite
    pub fn ray(&self) -> Option<Ray> {
        let ray = Ray::new(self.origin, self.direction);
        (ray.is_valid() && !self.max_distance.is_nan()).then_some(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let query = RaycastQuery::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0))
            .with_max_distance(10.0)
            .with_mask(0x2u16);
        assert_eq!(query.mask, CollisionMask(2));
        assert_eq!(query.max_distance, 10.0);
        assert_eq!(query.ray().unwrap().direction, Vec3::NEG_Z);
    }

    #[test]
    fn test_degenerate_rays() {
        assert!(RaycastQuery::new(Vec3::ZERO, Vec3::ZERO).ray().is_none());
        assert!(RaycastQuery::new(Vec3::splat(f32::NAN), Vec3::Z).ray().is_none());
        assert!(RaycastQuery::new(Vec3::ZERO, Vec3::Z)
            .with_max_distance(f32::NAN)
            .ray()
            .is_none());
    }
}
