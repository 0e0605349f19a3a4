//! Collider registry
//!
//! Colliders are stored as parallel arrays indexed by handle slot. Placement
//! keeps the world position with the uniform scale in `w` and the inverse
//! world transform used to carry rays into mesh space.

use void_core::{Handle, IdPool, ValidationConfig};
use void_math::{Mat4, Sphere, Vec3, Vec4, AABB};

use crate::error::{CollisionError, Result};
use crate::mask::CollisionMask;
use crate::mesh::ColliderMesh;

/// Handle to a placed collider
pub type ColliderHandle = Handle<Collider>;
/// Handle to a loaded collider mesh
pub type MeshHandle = Handle<ColliderMesh>;

/// Snapshot of one collider's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub mesh: MeshHandle,
    pub position: Vec3,
    pub scale: f32,
    pub mask: CollisionMask,
    pub user_data: u64,
    pub active: bool,
}

/// World placement derived from a transform
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement {
    pub position_and_scale: Vec4,
    pub inverse: Mat4,
    /// World box holding both the bounding sphere and the placed vertices
    pub bounds: AABB,
}

impl Placement {
    /// Validate and decompose a world transform for `mesh`
    pub fn new(transform: &Mat4, mesh: &ColliderMesh, validation: &ValidationConfig) -> Result<Self> {
        let axes = transform.axis_lengths();
        if !validation.accepts_scale(axes.x, axes.y, axes.z) {
            return Err(CollisionError::NonUniformScale {
                x: axes.x,
                y: axes.y,
                z: axes.z,
            });
        }
        let inverse = transform.try_inverse().ok_or(CollisionError::InvalidTransform)?;
        let position = transform.translation();
        let sphere = Sphere::new(position, mesh.radius() * axes.x);
        Ok(Self {
            position_and_scale: position.extend(axes.x),
            inverse,
            bounds: sphere.bounding_box().union(&mesh.local_bounds().transformed(transform)),
        })
    }
}

/// Structure-of-arrays collider storage
#[derive(Debug)]
pub struct ColliderRegistry {
    pool: IdPool<Collider>,
    /// Allocated and not destroyed
    live: Vec<bool>,
    active: Vec<bool>,
    masks: Vec<CollisionMask>,
    user_data: Vec<u64>,
    /// xyz: world position, w: uniform scale
    positions_and_scales: Vec<Vec4>,
    inverse_transforms: Vec<Mat4>,
    bounds: Vec<AABB>,
    meshes: Vec<MeshHandle>,
}

impl ColliderRegistry {
    pub fn new(reuse_delay: usize) -> Self {
        Self {
            pool: IdPool::with_reuse_delay(reuse_delay),
            live: Vec::new(),
            active: Vec::new(),
            masks: Vec::new(),
            user_data: Vec::new(),
            positions_and_scales: Vec::new(),
            inverse_transforms: Vec::new(),
            bounds: Vec::new(),
            meshes: Vec::new(),
        }
    }

    /// Enable or disable generation wraparound warnings
    pub fn set_wrap_warnings(&mut self, enabled: bool) {
        self.pool.set_wrap_warnings(enabled);
    }

    /// Register an active collider. The mesh handle is not checked here.
    pub(crate) fn create(
        &mut self,
        mesh: MeshHandle,
        placement: Placement,
        mask: CollisionMask,
        user_data: u64,
    ) -> Result<ColliderHandle> {
        let (handle, reused) = self.pool.allocate()?;
        let index = handle.index() as usize;

        if reused {
            self.live[index] = true;
            self.active[index] = true;
            self.masks[index] = mask;
            self.user_data[index] = user_data;
            self.positions_and_scales[index] = placement.position_and_scale;
            self.inverse_transforms[index] = placement.inverse;
            self.bounds[index] = placement.bounds;
            self.meshes[index] = mesh;
        } else {
            self.live.push(true);
            self.active.push(true);
            self.masks.push(mask);
            self.user_data.push(user_data);
            self.positions_and_scales.push(placement.position_and_scale);
            self.inverse_transforms.push(placement.inverse);
            self.bounds.push(placement.bounds);
            self.meshes.push(mesh);
        }

        Ok(handle)
    }

    /// Overwrite the placement of a live collider
    pub(crate) fn set_placement(&mut self, handle: ColliderHandle, placement: Placement) -> Result<()> {
        let index = self.slot(handle)?;
        self.positions_and_scales[index] = placement.position_and_scale;
        self.inverse_transforms[index] = placement.inverse;
        self.bounds[index] = placement.bounds;
        Ok(())
    }

    /// Deactivate and free a collider
    pub fn destroy(&mut self, handle: ColliderHandle) -> Result<()> {
        let index = self.slot(handle)?;
        self.pool.deallocate(handle)?;
        self.live[index] = false;
        self.active[index] = false;
        Ok(())
    }

    pub fn set_active(&mut self, handle: ColliderHandle, active: bool) -> Result<()> {
        let index = self.slot(handle)?;
        self.active[index] = active;
        Ok(())
    }

    pub fn set_mask(&mut self, handle: ColliderHandle, mask: CollisionMask) -> Result<()> {
        let index = self.slot(handle)?;
        self.masks[index] = mask;
        Ok(())
    }

    /// Snapshot of a live collider
    pub fn get(&self, handle: ColliderHandle) -> Result<Collider> {
        let index = self.slot(handle)?;
        let placement = self.positions_and_scales[index];
        Ok(Collider {
            mesh: self.meshes[index],
            position: placement.truncate(),
            scale: placement.w,
            mask: self.masks[index],
            user_data: self.user_data[index],
            active: self.active[index],
        })
    }

    pub fn is_valid(&self, handle: ColliderHandle) -> bool {
        self.slot(handle).is_ok()
    }

    /// Number of live colliders
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Check if a live collider, active or not, uses `mesh`
    pub fn uses_mesh(&self, mesh: MeshHandle) -> bool {
        self.live.iter().zip(&self.meshes).any(|(&live, &m)| live && m == mesh)
    }

    // ==================== Query access ====================

    /// Number of slots ever created, live or not
    pub(crate) fn slot_count(&self) -> usize {
        self.active.len()
    }

    /// Check that a slot is active and its mask passes the query
    #[inline]
    pub(crate) fn is_candidate(&self, index: usize, query: CollisionMask) -> bool {
        self.active[index] && self.masks[index].matches_query(query)
    }

    /// World-space bounding sphere of a slot
    #[inline]
    pub(crate) fn bounding_sphere(&self, index: usize, mesh: &ColliderMesh) -> Sphere {
        let placement = self.positions_and_scales[index];
        Sphere::new(placement.truncate(), mesh.radius() * placement.w)
    }

    /// World box containing everything the slot can be hit on
    #[inline]
    pub(crate) fn bounds_at(&self, index: usize) -> AABB {
        self.bounds[index]
    }

    #[inline]
    pub(crate) fn inverse_transform(&self, index: usize) -> &Mat4 {
        &self.inverse_transforms[index]
    }

    #[inline]
    pub(crate) fn mesh_at(&self, index: usize) -> MeshHandle {
        self.meshes[index]
    }

    #[inline]
    pub(crate) fn user_data_at(&self, index: usize) -> u64 {
        self.user_data[index]
    }

    /// Current handle of a slot, carrying the pool's generation
    #[inline]
    pub(crate) fn handle_at(&self, index: usize) -> Option<ColliderHandle> {
        self.pool.handle_at(index as u32)
    }

    fn slot(&self, handle: ColliderHandle) -> Result<usize> {
        let live = self.live.get(handle.index() as usize).copied().unwrap_or(false);
        if live && self.pool.is_valid(handle) {
            Ok(handle.index() as usize)
        } else {
            Err(CollisionError::InvalidCollider(handle))
        }
    }
}
