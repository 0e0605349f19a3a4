//! Collision world - owns meshes, colliders and the collider BVH

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use void_core::ToggleSource;
use void_math::{sphere_may_hit, Mat4, Ray, Vec3, AABB};
use void_spatial::{draw_bvh, Bvh, BvhDebugSettings, BvhStats, DebugDraw};

use crate::config::CollisionConfig;
use crate::error::{CollisionError, Result};
use crate::loader::{MeshData, MeshSource};
use crate::mask::CollisionMask;
use crate::mesh::{ColliderMesh, MeshStore};
use crate::query::{RaycastHit, RaycastQuery};
use crate::registry::{Collider, ColliderHandle, ColliderRegistry, MeshHandle, Placement};

/// Collision world shared between a writer and concurrent raycasts
pub type SharedCollisionWorld = Arc<RwLock<CollisionWorld>>;

/// All collision state for one scene
pub struct CollisionWorld {
    /// Configuration
    config: CollisionConfig,

    /// Loaded collider meshes
    meshes: MeshStore,

    /// Placed colliders
    colliders: ColliderRegistry,

    /// Tree over `bvh_boxes`
    bvh: Bvh,

    /// Collider slot of each BVH primitive
    bvh_slots: Vec<u32>,

    /// World boxes the BVH was built from
    bvh_boxes: Vec<AABB>,

    /// No collider changed since the last rebuild
    bvh_fresh: bool,
}

impl CollisionWorld {
    /// Create an empty world. Invalid settings are logged and replaced with
    /// usable ones, see [`CollisionConfig::sanitized`].
    pub fn new(config: CollisionConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("{}; using sanitized collision config", e);
                config.sanitized()
            }
        };
        let mut meshes = MeshStore::new(config.reuse_delay);
        let mut colliders = ColliderRegistry::new(config.reuse_delay);
        meshes.set_wrap_warnings(config.validation.generation_warnings);
        colliders.set_wrap_warnings(config.validation.generation_warnings);

        Self {
            config,
            meshes,
            colliders,
            bvh: Bvh::new(),
            bvh_slots: Vec::new(),
            bvh_boxes: Vec::new(),
            bvh_fresh: false,
        }
    }

    /// Wrap the world for shared access
    pub fn into_shared(self) -> SharedCollisionWorld {
        Arc::new(RwLock::new(self))
    }

    /// Get the configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    // ==================== Meshes ====================

    /// Load a collider mesh through `source`
    pub fn load_collider_mesh(&mut self, source: &impl MeshSource, path: &str) -> Result<MeshHandle> {
        let loaded = source.load(path).and_then(|data| ColliderMesh::from_data(&data));
        let mesh = match loaded {
            Ok(mesh) => mesh,
            Err(e) => {
                log::error!("Failed to load collider mesh {}: {}", path, e);
                return Err(e);
            }
        };

        log::info!(
            "Loaded collider mesh {}: {} triangles, radius {}",
            path,
            mesh.triangle_count(),
            mesh.radius()
        );
        self.meshes.insert(mesh)
    }

    /// Build a collider mesh from data already in memory
    pub fn add_collider_mesh(&mut self, data: &MeshData) -> Result<MeshHandle> {
        let mesh = ColliderMesh::from_data(data)?;
        self.meshes.insert(mesh)
    }

    /// Take ownership of a prepared mesh
    pub fn insert_collider_mesh(&mut self, mesh: ColliderMesh) -> Result<MeshHandle> {
        self.meshes.insert(mesh)
    }

    /// Free a mesh. Fails while any collider still uses it.
    pub fn unload_collider_mesh(&mut self, handle: MeshHandle) -> Result<()> {
        if !self.meshes.contains(handle) {
            return Err(CollisionError::InvalidMesh(handle));
        }
        if self.colliders.uses_mesh(handle) {
            return Err(CollisionError::MeshInUse(handle));
        }
        self.meshes.remove(handle)?;
        Ok(())
    }

    /// Get a loaded mesh
    pub fn collider_mesh(&self, handle: MeshHandle) -> Option<&ColliderMesh> {
        self.meshes.get(handle)
    }

    /// Number of loaded meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // ==================== Colliders ====================

    /// Place an instance of `mesh` in the world
    ///
    /// `transform` must scale uniformly when the uniform scale check is
    /// enabled, and must be invertible.
    pub fn create_collider(
        &mut self,
        mesh: MeshHandle,
        transform: &Mat4,
        mask: impl Into<CollisionMask>,
        user_data: u64,
    ) -> Result<ColliderHandle> {
        let placement = self.placement(mesh, transform)?;
        let handle = self.colliders.create(mesh, placement, mask.into(), user_data)?;
        self.bvh_fresh = false;
        Ok(handle)
    }

    /// Move a collider
    pub fn set_collider_transform(&mut self, handle: ColliderHandle, transform: &Mat4) -> Result<()> {
        let mesh = self.colliders.get(handle)?.mesh;
        let placement = self.placement(mesh, transform)?;
        self.colliders.set_placement(handle, placement)?;
        self.bvh_fresh = false;
        Ok(())
    }

    /// Remove a collider and free its handle
    pub fn destroy_collider(&mut self, handle: ColliderHandle) -> Result<()> {
        self.colliders.destroy(handle)?;
        self.bvh_fresh = false;
        Ok(())
    }

    /// Include or exclude a collider from queries without freeing it
    pub fn set_collider_active(&mut self, handle: ColliderHandle, active: bool) -> Result<()> {
        self.colliders.set_active(handle, active)?;
        self.bvh_fresh = false;
        Ok(())
    }

    /// Change a collider's mask
    pub fn set_collider_mask(&mut self, handle: ColliderHandle, mask: impl Into<CollisionMask>) -> Result<()> {
        self.colliders.set_mask(handle, mask.into())?;
        self.bvh_fresh = false;
        Ok(())
    }

    /// Snapshot of a collider
    pub fn collider(&self, handle: ColliderHandle) -> Result<Collider> {
        self.colliders.get(handle)
    }

    /// Check if a collider handle is live
    pub fn is_collider_valid(&self, handle: ColliderHandle) -> bool {
        self.colliders.is_valid(handle)
    }

    /// Number of live colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn placement(&self, mesh: MeshHandle, transform: &Mat4) -> Result<Placement> {
        let mesh_data = self.meshes.get(mesh).ok_or(CollisionError::InvalidMesh(mesh))?;
        Placement::new(transform, mesh_data, &self.config.validation)
    }

    // ==================== BVH ====================

    /// Rebuild the collider BVH from every active collider
    pub fn rebuild_bvh(&mut self) -> BvhStats {
        let start = Instant::now();

        self.bvh_slots.clear();
        self.bvh_boxes.clear();
        for index in 0..self.colliders.slot_count() {
            if self.colliders.is_candidate(index, CollisionMask::ANY) {
                self.bvh_slots.push(index as u32);
                self.bvh_boxes.push(self.colliders.bounds_at(index));
            }
        }

        self.bvh = Bvh::build_with(&self.bvh_boxes, &self.config.bvh);
        self.bvh_fresh = true;

        let stats = self.bvh.stats();
        log::debug!(
            "Collider BVH rebuilt over {} colliders in {:.3} ms",
            stats.primitives,
            start.elapsed().as_secs_f64() * 1000.0
        );
        stats
    }

    /// Check if the BVH reflects the current colliders
    pub fn is_bvh_fresh(&self) -> bool {
        self.bvh_fresh
    }

    /// The collider BVH as last built
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Draw the collider BVH according to the debug toggles
    pub fn draw_debug(&self, toggles: &impl ToggleSource, draw: &mut impl DebugDraw) -> usize {
        let settings = BvhDebugSettings::from_toggles(toggles);
        draw_bvh(&self.bvh, &self.bvh_boxes, &settings, draw)
    }

    // ==================== Queries ====================

    /// Nearest hit along a ray
    ///
    /// `direction` is normalized. A `mask` of zero matches every collider.
    /// Returns `None` when nothing is hit within `max_distance` or the ray is
    /// degenerate.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: impl Into<CollisionMask>,
    ) -> Option<RaycastHit> {
        let query = RaycastQuery::new(origin, direction)
            .with_max_distance(max_distance)
            .with_mask(mask);
        self.cast(&query)
    }

    /// Run a raycast query
    pub fn cast(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        let ray = query.ray()?;

        let nearest = if self.config.use_bvh && self.bvh_fresh {
            self.cast_bvh(&ray, query)
        } else {
            if self.config.use_bvh {
                log::debug!("Collider BVH is stale, raycasting with a linear scan");
            }
            self.cast_linear(&ray, query)
        };

        let (index, distance) = nearest?;
        Some(RaycastHit {
            collider: self.colliders.handle_at(index)?,
            distance,
            point: ray.at(distance),
            user_data: self.colliders.user_data_at(index),
        })
    }

    /// Raycast testing every collider in slot order
    fn cast_linear(&self, ray: &Ray, query: &RaycastQuery) -> Option<(usize, f32)> {
        let mut nearest = None;
        let mut best = query.max_distance;
        for index in 0..self.colliders.slot_count() {
            if !self.colliders.is_candidate(index, query.mask) {
                continue;
            }
            if let Some(t) = self.hit_collider(index, ray, best, nearest.is_none()) {
                best = t;
                nearest = Some((index, t));
            }
        }
        nearest
    }

    /// Raycast descending the collider BVH, nearer subtrees first
    fn cast_bvh(&self, ray: &Ray, query: &RaycastQuery) -> Option<(usize, f32)> {
        let mut nearest = None;
        self.bvh.ray_query(ray, query.max_distance, |prim, best| {
            let Some(&slot) = self.bvh_slots.get(prim as usize) else {
                return best;
            };
            let index = slot as usize;
            if !self.colliders.is_candidate(index, query.mask) {
                return best;
            }
            match self.hit_collider(index, ray, best, nearest.is_none()) {
                Some(t) => {
                    nearest = Some((index, t));
                    t
                }
                None => best,
            }
        });
        nearest
    }

    /// Broad phase against the world bounding sphere, then every triangle in
    /// mesh space. `first` lets a hit at exactly `best` count.
    fn hit_collider(&self, index: usize, ray: &Ray, best: f32, first: bool) -> Option<f32> {
        let mesh = self.meshes.get(self.colliders.mesh_at(index))?;

        let sphere = self.colliders.bounding_sphere(index, mesh);
        if !sphere_may_hit(ray, &sphere, best).passes() {
            return None;
        }

        // The inverse transform shrinks the direction by the collider scale,
        // so local parameters are world distances
        let local = ray.transformed(self.colliders.inverse_transform(index));
        mesh.closest_hit(&local, best, first)
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl std::fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("meshes", &self.meshes.len())
            .field("colliders", &self.colliders.len())
            .field("bvh_nodes", &self.bvh.nodes_used())
            .field("bvh_fresh", &self.bvh_fresh)
            .finish()
    }
}
