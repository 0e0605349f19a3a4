//! Bounding Volume Hierarchy over axis-aligned boxes
//!
//! Nodes live in one flat arena sized `2N - 1`. A node with `count == 0` is
//! internal and its children sit at `index` and `index + 1`; a leaf covers
//! `indices[index..index + count]`. Building reorders the index permutation
//! in place and never copies the input boxes.
//!
//! Splits are chosen with a binned surface area heuristic. A node stays a
//! leaf when it is small enough, when no split is cheaper than keeping it
//! whole, or when the chosen plane fails to separate its primitives.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use void_math::{ray_aabb, Ray, Vec3, AABB};

use crate::config::BvhConfig;
use crate::error::{Result, SpatialError};

/// One arena slot
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BvhNode {
    /// Union of every primitive box below this node
    pub bounds: AABB,
    /// Left child for internal nodes, first permutation slot for leaves
    pub index: u32,
    /// Primitive count for leaves, zero for internal nodes
    pub count: u32,
}

impl BvhNode {
    const UNUSED: Self = Self {
        bounds: AABB::EMPTY,
        index: 0,
        count: 0,
    };

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }

    /// Child arena indices of an internal node
    #[inline]
    pub fn children(&self) -> Option<(usize, usize)> {
        if self.is_leaf() {
            None
        } else {
            let left = self.index as usize;
            Some((left, left + 1))
        }
    }
}

/// Shape summary of a built tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BvhStats {
    pub primitives: usize,
    pub nodes_used: usize,
    pub leaves: usize,
    /// Depth of the deepest node, root is 0
    pub max_depth: u32,
    pub largest_leaf: u32,
}

/// Serializable snapshot of a built tree
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BvhState {
    /// Used portion of the arena
    pub nodes: Vec<BvhNode>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Copy)]
struct Bin {
    bounds: AABB,
    count: u32,
}

impl Bin {
    const EMPTY: Self = Self {
        bounds: AABB::EMPTY,
        count: 0,
    };
}

struct Split {
    axis: usize,
    position: f32,
    cost: f32,
}

/// Flat-arena BVH
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
    nodes_used: usize,
}

impl Bvh {
    /// Create an empty BVH
    pub fn new() -> Self {
        Self::default()
    }

    /// Build with the default configuration
    pub fn build(boxes: &[AABB]) -> Self {
        Self::build_with(boxes, &BvhConfig::default())
    }

    /// Build over `boxes`, addressed by their position in the slice
    pub fn build_with(boxes: &[AABB], config: &BvhConfig) -> Self {
        let started = Instant::now();
        let config = config.sanitized();

        let n = boxes.len();
        if n == 0 {
            log::debug!("BVH build skipped: no primitives");
            return Self::new();
        }

        let centroids: Vec<Vec3> = boxes.iter().map(AABB::center).collect();
        let mut bvh = Self {
            nodes: vec![BvhNode::UNUSED; 2 * n - 1],
            indices: (0..n as u32).collect(),
            nodes_used: 1,
        };
        bvh.nodes[0].count = n as u32;
        bvh.update_bounds(0, boxes);

        // Left is pushed last so nodes are allocated in depth-first order
        let mut bins = vec![Bin::EMPTY; config.bin_count as usize];
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            if let Some(left) = bvh.subdivide(node, boxes, &centroids, &config, &mut bins) {
                stack.push(left + 1);
                stack.push(left);
            }
        }

        let stats = bvh.stats();
        log::info!(
            "BVH built: {} primitives, {} nodes ({} leaves, depth {}) in {:.3} ms",
            n,
            stats.nodes_used,
            stats.leaves,
            stats.max_depth,
            started.elapsed().as_secs_f64() * 1000.0
        );
        bvh
    }

    fn update_bounds(&mut self, node: usize, boxes: &[AABB]) {
        let BvhNode { index, count, .. } = self.nodes[node];
        let first = index as usize;
        let bounds = self.indices[first..first + count as usize]
            .iter()
            .fold(AABB::EMPTY, |acc, &prim| acc.union(&boxes[prim as usize]));
        self.nodes[node].bounds = bounds;
    }

    /// Split a leaf in two. Returns the left child's arena index, or `None`
    /// when the node stays a leaf.
    fn subdivide(
        &mut self,
        node_idx: usize,
        boxes: &[AABB],
        centroids: &[Vec3],
        config: &BvhConfig,
        bins: &mut [Bin],
    ) -> Option<usize> {
        let node = self.nodes[node_idx];
        if node.count <= config.max_leaf_size {
            return None;
        }

        let split = self.find_best_split(&node, boxes, centroids, bins)?;
        let no_split_cost = node.count as f32 * node.bounds.area();
        if split.cost >= no_split_cost {
            return None;
        }

        let first = node.index as usize;
        let mut i = first;
        let mut end = first + node.count as usize;
        while i < end {
            if centroids[self.indices[i] as usize][split.axis] < split.position {
                i += 1;
            } else {
                end -= 1;
                self.indices.swap(i, end);
            }
        }

        let left_count = (i - first) as u32;
        if left_count == 0 || left_count == node.count {
            return None;
        }

        let left = self.nodes_used;
        self.nodes_used += 2;
        self.nodes[left] = BvhNode {
            bounds: AABB::EMPTY,
            index: node.index,
            count: left_count,
        };
        self.nodes[left + 1] = BvhNode {
            bounds: AABB::EMPTY,
            index: node.index + left_count,
            count: node.count - left_count,
        };
        self.nodes[node_idx].index = left as u32;
        self.nodes[node_idx].count = 0;

        self.update_bounds(left, boxes);
        self.update_bounds(left + 1, boxes);
        Some(left)
    }

    /// Cheapest binned plane over all three axes. Ties keep the first plane
    /// in (axis, bin) order.
    fn find_best_split(
        &self,
        node: &BvhNode,
        boxes: &[AABB],
        centroids: &[Vec3],
        bins: &mut [Bin],
    ) -> Option<Split> {
        let first = node.index as usize;
        let members = &self.indices[first..first + node.count as usize];
        let bin_count = bins.len();
        let planes = bin_count - 1;

        let mut left_area = vec![0.0f32; planes];
        let mut right_area = vec![0.0f32; planes];
        let mut left_count = vec![0u32; planes];
        let mut right_count = vec![0u32; planes];
        let mut best: Option<Split> = None;

        for axis in 0..3 {
            let (lo, hi) = members.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &prim| {
                let c = centroids[prim as usize][axis];
                (lo.min(c), hi.max(c))
            });
            if lo == hi {
                continue;
            }

            bins.fill(Bin::EMPTY);
            let scale = bin_count as f32 / (hi - lo);
            for &prim in members {
                let slot = (((centroids[prim as usize][axis] - lo) * scale) as usize).min(bin_count - 1);
                bins[slot].count += 1;
                bins[slot].bounds = bins[slot].bounds.union(&boxes[prim as usize]);
            }

            let mut left_box = AABB::EMPTY;
            let mut right_box = AABB::EMPTY;
            let mut left_sum = 0;
            let mut right_sum = 0;
            for i in 0..planes {
                left_sum += bins[i].count;
                left_box = left_box.union(&bins[i].bounds);
                left_count[i] = left_sum;
                left_area[i] = left_box.area();

                let from_right = planes - i;
                right_sum += bins[from_right].count;
                right_box = right_box.union(&bins[from_right].bounds);
                right_count[from_right - 1] = right_sum;
                right_area[from_right - 1] = right_box.area();
            }

            let step = (hi - lo) / bin_count as f32;
            for i in 0..planes {
                let cost = left_count[i] as f32 * left_area[i] + right_count[i] as f32 * right_area[i];
                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(Split {
                        axis,
                        position: lo + step * (i + 1) as f32,
                        cost,
                    });
                }
            }
        }

        best
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Walk every leaf the ray can reach before `max_t`, nearer children first
    ///
    /// `visit` receives each candidate primitive and the current distance
    /// limit, and returns the new limit. Subtrees entered beyond the limit are
    /// skipped; a subtree entered exactly at the limit is still visited.
    pub fn ray_query<F>(&self, ray: &Ray, max_t: f32, mut visit: F)
    where
        F: FnMut(u32, f32) -> f32,
    {
        if self.nodes_used == 0 {
            return;
        }

        let mut limit = max_t;
        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if ray_aabb(ray, &node.bounds, limit).is_none() {
                continue;
            }

            let Some((left, right)) = node.children() else {
                for &prim in self.leaf_primitives(idx) {
                    limit = visit(prim, limit);
                }
                continue;
            };

            let t_left = ray_aabb(ray, &self.nodes[left].bounds, limit);
            let t_right = ray_aabb(ray, &self.nodes[right].bounds, limit);
            match (t_left, t_right) {
                (Some(a), Some(b)) if a <= b => {
                    stack.push(right);
                    stack.push(left);
                }
                (Some(_), Some(_)) => {
                    stack.push(left);
                    stack.push(right);
                }
                (Some(_), None) => stack.push(left),
                (None, Some(_)) => stack.push(right),
                (None, None) => {}
            }
        }
    }

    /// Nearest primitive hit along the ray
    ///
    /// `hit_test` returns the hit distance for one primitive. A hit at
    /// exactly `max_t` is accepted; later hits must be strictly closer.
    pub fn closest_hit<F>(&self, ray: &Ray, max_t: f32, mut hit_test: F) -> Option<(u32, f32)>
    where
        F: FnMut(u32) -> Option<f32>,
    {
        let mut best: Option<(u32, f32)> = None;
        self.ray_query(ray, max_t, |prim, limit| {
            if let Some(t) = hit_test(prim) {
                let closer = match best {
                    Some((_, best_t)) => t < best_t,
                    None => t >= 0.0 && t <= limit,
                };
                if closer {
                    best = Some((prim, t));
                    return t;
                }
            }
            limit
        });
        best
    }

    /// Pre-order walk. `visit` gets the arena index, node and depth, and
    /// returns whether to descend into the node's children.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &BvhNode, u32) -> bool,
    {
        if self.nodes_used == 0 {
            return;
        }
        let mut stack = vec![(0usize, 0u32)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if !visit(idx, node, depth) {
                continue;
            }
            if let Some((left, right)) = node.children() {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Used portion of the node arena
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes[..self.nodes_used]
    }

    /// Node by arena index, if used
    pub fn node(&self, index: usize) -> Option<&BvhNode> {
        self.nodes().get(index)
    }

    /// Number of arena slots in use, at most `2N - 1`
    pub fn nodes_used(&self) -> usize {
        self.nodes_used
    }

    /// Arena size reserved at build time
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Index permutation; leaf ranges point into it
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_used == 0
    }

    /// Bounds of everything in the tree
    pub fn root_bounds(&self) -> Option<AABB> {
        self.node(0).map(|n| n.bounds)
    }

    /// Original primitive indices held by a leaf. Empty for internal or
    /// unused nodes.
    pub fn leaf_primitives(&self, node: usize) -> &[u32] {
        match self.node(node) {
            Some(n) if n.is_leaf() => {
                let first = n.index as usize;
                &self.indices[first..first + n.count as usize]
            }
            _ => &[],
        }
    }

    /// Number of primitives below a node
    pub fn subtree_size(&self, node: usize) -> usize {
        let mut total = 0;
        let mut stack = vec![node];
        while let Some(idx) = stack.pop() {
            match self.node(idx) {
                Some(n) if n.is_leaf() => total += n.count as usize,
                Some(n) => stack.extend([n.index as usize, n.index as usize + 1]),
                None => {}
            }
        }
        total
    }

    /// SAH cost of a node as built: `count * area` for a leaf, the
    /// count-weighted child areas for an internal node
    pub fn sah_cost(&self, node: usize) -> Option<f32> {
        let n = self.node(node)?;
        match n.children() {
            None => Some(n.count as f32 * n.bounds.area()),
            Some((left, right)) => {
                let cost = |child: usize| self.subtree_size(child) as f32 * self.nodes[child].bounds.area();
                Some(cost(left) + cost(right))
            }
        }
    }

    /// Summary of the tree's shape
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            primitives: self.indices.len(),
            nodes_used: self.nodes_used,
            ..Default::default()
        };
        self.walk(|_, node, depth| {
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_leaf() {
                stats.leaves += 1;
                stats.largest_leaf = stats.largest_leaf.max(node.count);
            }
            true
        });
        stats
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Snapshot the used arena and permutation
    pub fn to_state(&self) -> BvhState {
        BvhState {
            nodes: self.nodes().to_vec(),
            indices: self.indices.clone(),
        }
    }

    /// Restore a snapshot, rejecting anything that is not a well-formed tree
    pub fn from_state(state: &BvhState) -> Result<Self> {
        let n = state.indices.len();
        if state.nodes.is_empty() {
            if n != 0 {
                return Err(SpatialError::MalformedState(format!(
                    "{} indices but no nodes",
                    n
                )));
            }
            return Ok(Self::new());
        }
        if n == 0 || state.nodes.len() > 2 * n - 1 {
            return Err(SpatialError::MalformedState(format!(
                "{} nodes cannot index {} primitives",
                state.nodes.len(),
                n
            )));
        }

        let mut seen = vec![false; n];
        for &prim in &state.indices {
            match seen.get_mut(prim as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(SpatialError::MalformedState(format!(
                        "index permutation repeats or exceeds {}",
                        prim
                    )))
                }
            }
        }

        for (i, node) in state.nodes.iter().enumerate() {
            let ok = match node.children() {
                Some((left, right)) => left > i && right < state.nodes.len(),
                None => node.index as usize + node.count as usize <= n,
            };
            if !ok {
                return Err(SpatialError::MalformedState(format!(
                    "node {} points outside the tree",
                    i
                )));
            }
        }

        let mut nodes = state.nodes.clone();
        let nodes_used = nodes.len();
        nodes.resize(2 * n - 1, BvhNode::UNUSED);
        Ok(Self {
            nodes,
            indices: state.indices.clone(),
            nodes_used,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(x: f32) -> AABB {
        AABB::from_center_half_extents(Vec3::new(x, 0.0, 0.0), Vec3::splat(0.5))
    }

    #[test]
    fn test_empty_build() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        assert_eq!(bvh.nodes_used(), 0);
        assert!(bvh.root_bounds().is_none());
        assert_eq!(bvh.stats(), BvhStats::default());
    }

    #[test]
    fn test_small_sets_stay_single_leaf() {
        let bvh = Bvh::build(&[unit_box_at(0.0), unit_box_at(10.0)]);
        assert_eq!(bvh.nodes_used(), 1);
        assert_eq!(bvh.arena_len(), 3);
        assert_eq!(bvh.leaf_primitives(0).len(), 2);
    }

    #[test]
    fn test_separated_clusters_split() {
        let boxes: Vec<_> = [0.0, 1.0, 50.0, 51.0].iter().map(|&x| unit_box_at(x)).collect();
        let bvh = Bvh::build(&boxes);
        assert_eq!(bvh.nodes_used(), 3);

        let root = bvh.node(0).unwrap();
        let (left, right) = root.children().unwrap();
        assert_eq!((left, right), (1, 2));

        let mut near = bvh.leaf_primitives(left).to_vec();
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
        let mut far = bvh.leaf_primitives(right).to_vec();
        far.sort_unstable();
        assert_eq!(far, vec![2, 3]);

        // Each side is a 2x1x1 box holding two primitives
        assert_relative_eq!(bvh.sah_cost(0).unwrap(), 40.0);
        assert!(bvh.sah_cost(0).unwrap() < 4.0 * root.bounds.area());
    }

    #[test]
    fn test_coincident_centroids_collapse_to_leaf() {
        let boxes = vec![unit_box_at(3.0); 16];
        let bvh = Bvh::build(&boxes);
        assert_eq!(bvh.nodes_used(), 1);
        assert_eq!(bvh.leaf_primitives(0).len(), 16);
    }

    #[test]
    fn test_max_leaf_size_is_respected() {
        let boxes: Vec<_> = (0..4).map(|i| unit_box_at(i as f32 * 10.0)).collect();
        let config = BvhConfig::default().with_max_leaf_size(4);
        let bvh = Bvh::build_with(&boxes, &config);
        assert_eq!(bvh.nodes_used(), 1);
    }

    #[test]
    fn test_closest_hit_prefers_nearest() {
        let boxes: Vec<_> = (0..8).map(|i| unit_box_at(i as f32 * 3.0)).collect();
        let bvh = Bvh::build(&boxes);
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);

        let hit = bvh.closest_hit(&ray, 100.0, |prim| {
            ray_aabb(&ray, &boxes[prim as usize], f32::MAX)
        });
        let (prim, t) = hit.unwrap();
        assert_eq!(prim, 0);
        assert_relative_eq!(t, 9.5);

        // Limit stops short of everything
        assert!(bvh.closest_hit(&ray, 5.0, |prim| ray_aabb(&ray, &boxes[prim as usize], f32::MAX)).is_none());
    }

    #[test]
    fn test_state_round_trip() {
        let boxes: Vec<_> = (0..10).map(|i| unit_box_at(i as f32 * 2.0)).collect();
        let bvh = Bvh::build(&boxes);

        let json = serde_json::to_string(&bvh.to_state()).unwrap();
        let state: BvhState = serde_json::from_str(&json).unwrap();
        let restored = Bvh::from_state(&state).unwrap();

        assert_eq!(restored.nodes(), bvh.nodes());
        assert_eq!(restored.indices(), bvh.indices());
        assert_eq!(restored.stats(), bvh.stats());
    }

    #[test]
    fn test_malformed_state_rejected() {
        let bvh = Bvh::build(&(0..6).map(|i| unit_box_at(i as f32 * 4.0)).collect::<Vec<_>>());

        let mut bad_child = bvh.to_state();
        bad_child.nodes[0].index = 0;
        bad_child.nodes[0].count = 0;
        assert!(Bvh::from_state(&bad_child).is_err());

        let mut bad_perm = bvh.to_state();
        bad_perm.indices[0] = bad_perm.indices[1];
        assert!(Bvh::from_state(&bad_perm).is_err());

        let orphan = BvhState {
            nodes: Vec::new(),
            indices: vec![0],
        };
        assert!(Bvh::from_state(&orphan).is_err());
    }
}
