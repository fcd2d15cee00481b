//! Error types for the pixbatch processing pipeline.
//!
//! Errors are organized by stage so each carries the context that matters
//! when a batch run goes wrong (file paths, limits, dimensions).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixbatch operations.
#[derive(Error, Debug)]
pub enum PixbatchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
///
/// Most variants are per-item failures that a batch pass isolates and
/// counts; `CreateDir`, `InvalidDimensions` and `Decision` are fatal for
/// the pass that hits them.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// JPEG encoding or output write failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Decode timed out
    #[error("Decode timed out for {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Requested output dimensions are out of range
    #[error("Invalid dimensions {width}x{height}: must be positive and at most {max}")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    /// Two resize batches asked for the same width, whose outputs would
    /// land in the same width-named directory
    #[error("Duplicate batch width {width}: both batches would write into the same directory")]
    DuplicateBatchWidth { width: u32 },

    /// Output directory could not be created
    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The decision source (prompt, dialog, script) failed
    #[error("Decision source failed: {0}")]
    Decision(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for pixbatch results.
pub type Result<T> = std::result::Result<T, PixbatchError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
