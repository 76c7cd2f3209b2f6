use thiserror::Error;

/// Main error type for archflow operations
#[derive(Error, Debug)]
pub enum ArchflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern compilation error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Augmentation error: {0}")]
    Augmentation(String),

    /// An internal invariant of the pipeline was broken. Never expected at runtime.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ArchflowError>;
