//! BVH build configuration

use serde::{Deserialize, Serialize};

/// Parameters of the binned SAH build
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Centroid bins per axis when searching for a split plane
    pub bin_count: u32,
    /// Nodes with this many primitives or fewer are never split
    pub max_leaf_size: u32,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            bin_count: 8,
            max_leaf_size: 2,
        }
    }
}

impl BvhConfig {
    /// Set the number of bins per axis
    pub fn with_bin_count(mut self, bins: u32) -> Self {
        self.bin_count = bins;
        self
    }

    /// Set the leaf size threshold
    pub fn with_max_leaf_size(mut self, size: u32) -> Self {
        self.max_leaf_size = size;
        self
    }

    /// Clamp to values the builder can work with: at least two bins, at
    /// least one primitive per leaf
    pub fn sanitized(self) -> Self {
        Self {
            bin_count: self.bin_count.max(2),
            max_leaf_size: self.max_leaf_size.max(1),
        }
    }
}
