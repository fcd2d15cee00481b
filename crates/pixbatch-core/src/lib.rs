//! Pixbatch core - batch image transformation library.
//!
//! Pixbatch turns a folder of mixed raster images into flat directories of
//! uniformly sized JPEGs: optional centered square cropping (whole batch or
//! confirmed per image), transparency flattened onto white, and one or two
//! exact-size resize passes.
//!
//! # Architecture
//!
//! ```text
//! Discover -> Decode -> Transform (flatten / crop / resize) -> JPEG write
//! ```
//!
//! [`PipelineOrchestrator`] sequences the passes; every interactive choice
//! is injected through [`DecisionSource`], and per-item failures flow into
//! an [`ErrorSink`] without aborting the batch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixbatch_core::{Config, NullObserver, PipelineOrchestrator};
//!
//! let config = Config::load()?;
//! let orchestrator = PipelineOrchestrator::new(&config);
//! let outcome = orchestrator
//!     .run(root, false, &mut decisions, &mut NullObserver, &mut errors)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod report;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, PixbatchError, Result};
pub use pipeline::{
    BatchObserver, BatchProcessor, BatchResult, CropMode, CropPrompt, DecisionSource,
    FileDiscovery, ImageRecord, NullObserver, PassTransforms, PipelineOrchestrator,
    PipelineOutcome, TransformSpec, DEFAULT_CROP_RATIO,
};
pub use report::{ErrorSink, FileErrorSink, MemoryErrorSink};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
