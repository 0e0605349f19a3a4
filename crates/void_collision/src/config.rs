//! Collision world configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use void_core::{ValidationConfig, DEFAULT_REUSE_DELAY};
use void_spatial::BvhConfig;

use crate::error::{CollisionError, Result};

/// Collision world configuration
///
/// Every field is optional in a config file:
///
/// ```toml
/// use_bvh = true
///
/// [validation]
/// uniform_scale = true
///
/// [bvh]
/// bin_count = 12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Freed handle slots that must be pending before one is reused
    pub reuse_delay: usize,

    /// Raycasts descend the collider BVH while it is up to date
    pub use_bvh: bool,

    /// Development checks
    pub validation: ValidationConfig,

    /// Collider BVH build parameters
    pub bvh: BvhConfig,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            reuse_delay: DEFAULT_REUSE_DELAY,
            use_bvh: false,
            validation: ValidationConfig::default(),
            bvh: BvhConfig::default(),
        }
    }
}

impl CollisionConfig {
    /// Create a configuration that raycasts through the collider BVH
    pub fn accelerated() -> Self {
        Self {
            use_bvh: true,
            ..Default::default()
        }
    }

    /// Create a configuration with every validation check enabled
    pub fn strict() -> Self {
        Self {
            validation: ValidationConfig::strict(),
            ..Default::default()
        }
    }

    /// Set the handle reuse delay
    pub fn with_reuse_delay(mut self, delay: usize) -> Self {
        self.reuse_delay = delay;
        self
    }

    /// Enable or disable BVH raycasts
    pub fn with_bvh(mut self, enabled: bool) -> Self {
        self.use_bvh = enabled;
        self
    }

    /// Replace the validation settings
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Replace the BVH build parameters
    pub fn with_bvh_config(mut self, bvh: BvhConfig) -> Self {
        self.bvh = bvh;
        self
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| CollisionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollisionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CollisionError::Config(e.to_string()))
    }

    /// Replace values no world can run with: an unusable scale tolerance
    /// falls back to the default and the BVH parameters are clamped
    pub fn sanitized(mut self) -> Self {
        let epsilon = self.validation.uniform_scale_epsilon;
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            self.validation.uniform_scale_epsilon = ValidationConfig::default().uniform_scale_epsilon;
        }
        self.bvh = self.bvh.sanitized();
        self
    }

    /// Reject values no world can run with
    pub fn validate(&self) -> Result<()> {
        let epsilon = self.validation.uniform_scale_epsilon;
        if !(epsilon.is_finite() && epsilon >= 0.0) {
            return Err(CollisionError::Config(format!(
                "uniform_scale_epsilon must be a non-negative number, got {}",
                epsilon
            )));
        }
        if self.bvh.bin_count < 2 {
            return Err(CollisionError::Config(format!(
                "bvh.bin_count must be at least 2, got {}",
                self.bvh.bin_count
            )));
        }
        if self.bvh.max_leaf_size == 0 {
            return Err(CollisionError::Config("bvh.max_leaf_size must be at least 1".to_string()));
        }
        Ok(())
    }
}
