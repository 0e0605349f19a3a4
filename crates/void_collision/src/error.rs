//! Error types for the collision system

use thiserror::Error;
use void_core::HandleError;

use crate::registry::{ColliderHandle, MeshHandle};

/// Collision system errors
#[derive(Debug, Error)]
pub enum CollisionError {
    /// Pool rejected a handle or ran out of indices
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// Collider handle is stale or was never allocated
    #[error("Collider not found: {0:?}")]
    InvalidCollider(ColliderHandle),

    /// Mesh handle is stale or was never allocated
    #[error("Collider mesh not found: {0:?}")]
    InvalidMesh(MeshHandle),

    /// Transform basis vectors differ in length
    #[error("Non-uniform scale ({x}, {y}, {z}) is not supported for colliders")]
    NonUniformScale { x: f32, y: f32, z: f32 },

    /// Transform cannot be inverted
    #[error("Collider transform is singular or not finite")]
    InvalidTransform,

    /// Asset could not be read or parsed
    #[error("Failed to load collider mesh {path}: {reason}")]
    MeshLoad { path: String, reason: String },

    /// Index buffer uses a component type that cannot hold indices
    #[error("Unsupported index component type: {0}")]
    UnsupportedIndexFormat(String),

    /// Index is negative or past the end of the vertex list
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: i64, vertex_count: usize },

    /// Mesh data is structurally unusable
    #[error("Malformed collider mesh: {0}")]
    MalformedMesh(String),

    /// Mesh is still referenced by a collider
    #[error("Collider mesh {0:?} is still in use")]
    MeshInUse(MeshHandle),

    /// Invalid configuration
    #[error("Invalid collision configuration: {0}")]
    Config(String),
}

/// Result type for collision operations
pub type Result<T> = std::result::Result<T, CollisionError>;
