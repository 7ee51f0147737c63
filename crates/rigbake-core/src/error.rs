//! Error types for rigbake

use thiserror::Error;

/// The main error type for rigbake operations
#[derive(Debug, Error)]
pub enum RigError {
    #[error("Import error: {0}")]
    Import(String),

    #[error("Malformed animation: {0}")]
    MalformedAnimation(String),

    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),

    #[error("Pose size mismatch: expected {expected} bones, got {got}")]
    PoseSizeMismatch { expected: usize, got: usize },

    #[error("Mesh has no vertices: {0}")]
    EmptyMesh(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate bone name: {0}")]
    DuplicateBone(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rigbake operations
pub type Result<T> = std::result::Result<T, RigError>;

impl From<toml::de::Error> for RigError {
    fn from(err: toml::de::Error) -> Self {
        RigError::Config(err.to_string())
    }
}
