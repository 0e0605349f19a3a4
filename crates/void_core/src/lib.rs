//! # void_core - Void Collision Core
//!
//! Foundational primitives shared by the spatial and collision crates:
//! - **Handles**: 22-bit index + 10-bit generation, checked on every use
//! - **Validation**: development checks that can be switched at runtime
//! - **Toggles**: read-only access to externally owned console variables

pub mod cvar;
pub mod error;
pub mod handle;
pub mod validation;

pub use cvar::*;
pub use error::*;
pub use handle::*;
pub use validation::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cvar::{NoToggles, ToggleSource, ToggleTable};
    pub use crate::error::{HandleError, Result};
    pub use crate::handle::{Handle, IdPool};
    pub use crate::validation::ValidationConfig;
}
