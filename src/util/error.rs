//! Error types for the Kenos lighting library.

use thiserror::Error;

/// Main error type for scene and lighting operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Global triangle index past the end of the scene
    #[error("Triangle index {index} out of range (count: {count})")]
    TriangleOutOfRange { index: usize, count: usize },

    /// Scene object index past the end of the scene
    #[error("Object index {index} out of range (count: {count})")]
    ObjectOutOfRange { index: usize, count: usize },

    /// Scene object references a mesh that was never declared
    #[error("Mesh not found: {0}")]
    MeshNotFound(String),

    /// Scene object references a material that was never declared
    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    /// Mesh data is inconsistent (e.g. face index past the vertex list)
    #[error("Invalid mesh '{mesh}': {reason}")]
    InvalidMesh { mesh: String, reason: String },

    /// Lighting configuration failed validation
    #[error("Invalid lighting config: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid mesh error.
    pub fn invalid_mesh(mesh: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMesh {
            mesh: mesh.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Kenos operations.
pub type Result<T> = std::result::Result<T, Error>;
