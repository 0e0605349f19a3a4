//! Collider meshes
//!
//! A collider mesh is an immutable triangle soup in local space plus the
//! radius of a bounding sphere around the local origin. Face normals are the
//! unnormalized cross product of two edges; only their direction is used.

use void_core::IdPool;
use void_math::{ray_triangle, triangle_normal, Ray, Vec3, AABB};

use crate::error::{CollisionError, Result};
use crate::loader::MeshData;
use crate::registry::MeshHandle;

/// One collision triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    /// `(b - a) x (c - a)`, not normalized
    pub normal: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
            normal: triangle_normal(a, b, c),
        }
    }

    /// Ray parameter of a front-face hit
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let [a, b, c] = self.vertices;
        ray_triangle(ray, a, b, c, self.normal)
    }
}

/// Triangle soup with a bounding-sphere radius
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderMesh {
    triangles: Vec<Triangle>,
    radius: f32,
    /// Box around every vertex
    bounds: AABB,
}

impl ColliderMesh {
    /// Build from loaded data
    ///
    /// The radius is the largest absolute component of any primitive's
    /// reported min/max extents.
    pub fn from_data(data: &MeshData) -> Result<Self> {
        let mut triangles = Vec::new();
        let mut radius = 0.0f32;

        for primitive in &data.primitives {
            for corner in primitive.min.iter().chain(&primitive.max) {
                radius = radius.max(corner.abs());
            }
            triangles.extend(
                primitive
                    .triangles()?
                    .into_iter()
                    .map(|[a, b, c]| Triangle::new(a, b, c)),
            );
        }

        if triangles.is_empty() {
            return Err(CollisionError::MalformedMesh("mesh contains no triangles".to_string()));
        }
        if !radius.is_finite() {
            return Err(CollisionError::MalformedMesh(format!("bounding radius {} is not finite", radius)));
        }

        let bounds = vertex_bounds(&triangles);
        Ok(Self {
            triangles,
            radius,
            bounds,
        })
    }

    /// Build from explicit triangles, with the radius taken from the
    /// vertices' largest absolute component
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let radius = triangles
            .iter()
            .flat_map(|t| t.vertices)
            .map(|v| v.abs().max_element())
            .fold(0.0, f32::max);
        let bounds = vertex_bounds(&triangles);
        Self {
            triangles,
            radius,
            bounds,
        }
    }

    /// Override the bounding radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Bounding sphere radius in local units
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Local-space box around the vertices
    pub fn local_bounds(&self) -> AABB {
        self.bounds
    }

    /// Nearest triangle hit
    ///
    /// With `inclusive`, a hit at exactly `best` counts (used for the first
    /// hit of a query, against its maximum distance). Otherwise a hit must
    /// be strictly closer, so the first triangle found at a distance keeps it.
    pub fn closest_hit(&self, ray: &Ray, best: f32, inclusive: bool) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        let mut limit = best;
        for triangle in &self.triangles {
            let Some(t) = triangle.intersect(ray) else {
                continue;
            };
            let closer = match nearest {
                Some(_) => t < limit,
                None if inclusive => t <= limit,
                None => t < limit,
            };
            if closer {
                nearest = Some(t);
                limit = t;
            }
        }
        nearest
    }
}

fn vertex_bounds(triangles: &[Triangle]) -> AABB {
    triangles
        .iter()
        .flat_map(|t| t.vertices)
        .fold(AABB::EMPTY, |aabb, v| aabb.grow(v))
}

/// Owns loaded collider meshes, addressed by generational handles
#[derive(Debug)]
pub struct MeshStore {
    pool: IdPool<ColliderMesh>,
    meshes: Vec<Option<ColliderMesh>>,
}

impl MeshStore {
    pub fn new(reuse_delay: usize) -> Self {
        Self {
            pool: IdPool::with_reuse_delay(reuse_delay),
            meshes: Vec::new(),
        }
    }

    /// Enable or disable generation wraparound warnings
    pub fn set_wrap_warnings(&mut self, enabled: bool) {
        self.pool.set_wrap_warnings(enabled);
    }

    /// Take ownership of a mesh
    pub fn insert(&mut self, mesh: ColliderMesh) -> Result<MeshHandle> {
        let (handle, reused) = self.pool.allocate()?;
        let index = handle.index() as usize;
        if reused {
            self.meshes[index] = Some(mesh);
        } else {
            self.meshes.push(Some(mesh));
        }
        Ok(handle)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&ColliderMesh> {
        if !self.pool.is_valid(handle) {
            return None;
        }
        self.meshes.get(handle.index() as usize)?.as_ref()
    }

    /// Drop a mesh and free its handle
    pub fn remove(&mut self, handle: MeshHandle) -> Result<ColliderMesh> {
        if !self.pool.is_valid(handle) {
            return Err(CollisionError::InvalidMesh(handle));
        }
        let mesh = self.meshes[handle.index() as usize]
            .take()
            .ok_or(CollisionError::InvalidMesh(handle))?;
        self.pool.deallocate(handle)?;
        Ok(mesh)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.pool.is_valid(handle)
    }

    /// Number of loaded meshes
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{IndexData, MeshPrimitive};

    fn quad() -> MeshData {
        MeshData {
            primitives: vec![MeshPrimitive {
                positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
                indices: IndexData::U8(vec![0, 1, 2, 0, 2, 3]),
                min: [-1.0, -1.0, 0.0],
                max: [1.0, 1.0, 0.0],
            }],
        }
    }

    #[test]
    fn test_from_data() {
        let mesh = ColliderMesh::from_data(&quad()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.radius(), 1.0);
        assert_eq!(mesh.local_bounds(), AABB::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)));
        // Counter-clockwise winding seen from +Z faces +Z
        assert!(mesh.triangles()[0].normal.z > 0.0);
    }

    #[test]
    fn test_radius_uses_reported_extents() {
        let mut data = quad();
        data.primitives[0].min = [-3.0, 0.0, 0.0];
        let mesh = ColliderMesh::from_data(&data).unwrap();
        assert_eq!(mesh.radius(), 3.0);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = ColliderMesh::from_data(&MeshData::default()).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedMesh(_)));
    }

    #[test]
    fn test_closest_hit_inclusive_limit() {
        let mesh = ColliderMesh::from_data(&quad()).unwrap();
        let ray = Ray::new(Vec3::new(0.2, 0.3, 2.0), Vec3::NEG_Z);
        assert_eq!(mesh.closest_hit(&ray, f32::MAX, true), Some(2.0));
        assert_eq!(mesh.closest_hit(&ray, 2.0, true), Some(2.0));
        assert_eq!(mesh.closest_hit(&ray, 2.0, false), None);
        assert_eq!(mesh.closest_hit(&ray, 1.0, true), None);
    }

    #[test]
    fn test_store_handles() {
        let mut store = MeshStore::new(0);
        let mesh = ColliderMesh::from_data(&quad()).unwrap();
        let a = store.insert(mesh.clone()).unwrap();
        assert_eq!(store.get(a), Some(&mesh));

        store.remove(a).unwrap();
        assert!(store.get(a).is_none());
        assert!(matches!(store.remove(a), Err(CollisionError::InvalidMesh(_))));

        // Zero reuse delay recycles the slot at once with a new generation
        let b = store.insert(mesh).unwrap();
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert_eq!(store.len(), 1);
    }
}
