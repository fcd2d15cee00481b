//! Image processing pipeline components.
//!
//! The stages of a batch run:
//! - **discovery**: find eligible images under a source directory
//! - **decode**: load images with limits and a timeout
//! - **transform**: flatten, centered square crop, exact resize
//! - **encode**: JPEG output
//! - **batch**: one directory-to-directory pass with error isolation
//! - **orchestrator**: crop pass, resize passes, temp-dir cleanup

pub mod batch;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod orchestrator;
pub mod transform;

// Re-exports for convenient access
pub use batch::{
    BatchObserver, BatchProcessor, BatchResult, CropPrompt, NullObserver, PassTransforms,
};
pub use decode::ImageDecoder;
pub use discovery::{FileDiscovery, ImageRecord};
pub use orchestrator::{CropMode, DecisionSource, PipelineOrchestrator, PipelineOutcome};
pub use transform::{TransformSpec, DEFAULT_CROP_RATIO};
