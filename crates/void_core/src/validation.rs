//! Runtime-switchable validation checks
//!
//! Checks are always compiled in. Defaults follow the build profile: on in
//! debug builds, off in release builds.

use serde::{Deserialize, Serialize};

/// Which development checks run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject transforms whose basis vectors differ in length
    pub uniform_scale: bool,

    /// Absolute tolerance for the uniform scale comparison
    pub uniform_scale_epsilon: f32,

    /// Warn when a pool slot's generation is about to wrap
    pub generation_warnings: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let on = cfg!(debug_assertions);
        Self {
            uniform_scale: on,
            uniform_scale_epsilon: 1e-5,
            generation_warnings: on,
        }
    }
}

impl ValidationConfig {
    /// Every check enabled
    pub fn strict() -> Self {
        Self {
            uniform_scale: true,
            generation_warnings: true,
            ..Default::default()
        }
    }

    /// Every check disabled
    pub fn off() -> Self {
        Self {
            uniform_scale: false,
            generation_warnings: false,
            ..Default::default()
        }
    }

    /// True when the three axis lengths pass the uniform scale check, or the
    /// check is disabled
    pub fn accepts_scale(&self, x: f32, y: f32, z: f32) -> bool {
        if !self.uniform_scale {
            return true;
        }
        (x - y).abs() < self.uniform_scale_epsilon && (x - z).abs() < self.uniform_scale_epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_scale_check() {
        let strict = ValidationConfig::strict();
        assert!(strict.accepts_scale(2.0, 2.0, 2.0));
        assert!(!strict.accepts_scale(1.0, 2.0, 1.0));
        assert!(!strict.accepts_scale(1.0, 1.0, 1.5));

        let off = ValidationConfig::off();
        assert!(off.accepts_scale(1.0, 2.0, 3.0));
    }
}
