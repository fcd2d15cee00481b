//! Batch pass execution: one discovery-transform-write sweep from a source
//! directory into a flat destination directory.
//!
//! A pass never aborts on a single bad image. Each item is decoded,
//! transformed, renamed collision-free, and written as JPEG; failures are
//! recorded in the [`ErrorSink`] and counted, and progress is reported
//! after every item.

use std::path::Path;

use image::DynamicImage;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::naming;
use crate::report::ErrorSink;

use super::decode::ImageDecoder;
use super::discovery::{FileDiscovery, ImageRecord};
use super::encode;
use super::transform::{self, TransformSpec};

/// Summary counts for one completed batch pass.
///
/// `succeeded + failed + skipped` always equals the number of discovered
/// items; `skipped` counts files that vanished between discovery and
/// processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl BatchResult {
    /// Total number of items the pass looked at.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.skipped
    }
}

/// Synchronous decision port for the confirm-crop-per-image mode.
///
/// Backed by a terminal prompt in the CLI and by canned answer lists in
/// tests; the pass blocks on it, so a slow answer simply pauses progress.
pub trait CropPrompt {
    /// Decide whether the image at `path` should be square-cropped.
    fn confirm_crop(&mut self, path: &Path) -> PipelineResult<bool>;
}

/// How a pass chooses the transforms for each item.
pub enum PassTransforms<'a> {
    /// The same ordered transform list for every item
    Fixed(&'a [TransformSpec]),
    /// Ask per image: yes applies flatten + square crop, no flatten only
    ConfirmCrop(&'a mut dyn CropPrompt),
}

/// Progress callbacks surfaced to the caller of a batch pass.
///
/// All methods have empty defaults so observers implement only what they
/// need (the CLI drives an indicatif bar, tests count invocations).
pub trait BatchObserver {
    /// A pass discovered its inputs and is about to start.
    fn batch_started(&mut self, label: &str, total: u64) {
        let _ = (label, total);
    }

    /// One item finished (success or failure). `done` is monotonic.
    fn progress(&mut self, done: u64, total: u64) {
        let _ = (done, total);
    }

    /// The pass completed with the given counts.
    fn batch_finished(&mut self, label: &str, result: &BatchResult) {
        let _ = (label, result);
    }
}

/// Observer that ignores all events.
pub struct NullObserver;

impl BatchObserver for NullObserver {}

/// Runs batch passes: discovery, per-item transform chain, collision-free
/// JPEG output.
pub struct BatchProcessor {
    decoder: ImageDecoder,
    discovery: FileDiscovery,
    jpeg_quality: u8,
    crop_ratio: f64,
}

impl BatchProcessor {
    /// Create a new batch processor from configuration.
    ///
    /// Discovery prunes the configured output directories, so a recursive
    /// pass never ingests what an earlier pass (or an earlier run) wrote.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()).with_excluded_dirs([
                config.output.processed_dir.clone(),
                config.output.temp_crop_dir.clone(),
            ]),
            jpeg_quality: config.output.jpeg_quality,
            crop_ratio: config.processing.crop_ratio,
        }
    }

    /// Run one pass from `source` into `dest`.
    ///
    /// `dest` is created if absent (failure to create it is fatal for the
    /// pass). Items are processed in discovery order, one at a time; a
    /// per-item failure is logged, recorded in `errors`, and counted, but
    /// never aborts the pass. A failing [`CropPrompt`] is the one
    /// exception: losing the decision source ends the pass.
    pub async fn run_batch(
        &self,
        label: &str,
        source: &Path,
        dest: &Path,
        recursive: bool,
        mut transforms: PassTransforms<'_>,
        observer: &mut dyn BatchObserver,
        errors: &mut dyn ErrorSink,
    ) -> PipelineResult<BatchResult> {
        std::fs::create_dir_all(dest).map_err(|e| PipelineError::CreateDir {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let records = self.discovery.discover(source, recursive);
        let total = records.len() as u64;
        observer.batch_started(label, total);

        let mut result = BatchResult::default();
        let mut done: u64 = 0;

        for record in &records {
            match self.process_item(record, dest, &mut transforms).await {
                Ok(()) => result.succeeded += 1,
                Err(e @ PipelineError::Decision(_)) => return Err(e),
                Err(PipelineError::FileNotFound(path)) => {
                    tracing::warn!("Skipped {:?}: file disappeared after discovery", path);
                    result.skipped += 1;
                }
                Err(e) => {
                    tracing::error!("Failed: {:?} - {}", record.path, e);
                    errors.record(&record.path, &e.to_string());
                    result.failed += 1;
                }
            }
            done += 1;
            observer.progress(done, total);
        }

        observer.batch_finished(label, &result);
        Ok(result)
    }

    /// Decode, transform, name, and write one item.
    async fn process_item(
        &self,
        record: &ImageRecord,
        dest: &Path,
        transforms: &mut PassTransforms<'_>,
    ) -> PipelineResult<()> {
        let img = self.decoder.decode(&record.path).await?;
        let img = self.transform_item(img, &record.path, transforms)?;

        let stem = record
            .relative_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let desired = format!("{}.jpg", naming::sanitize(stem));
        let name = naming::allocate_unique(&desired, dest);

        encode::write_jpeg(&img, &dest.join(name), self.jpeg_quality)
    }

    fn transform_item(
        &self,
        img: DynamicImage,
        path: &Path,
        transforms: &mut PassTransforms<'_>,
    ) -> PipelineResult<DynamicImage> {
        match transforms {
            PassTransforms::Fixed(specs) => Ok(transform::apply_all(img, specs)),
            PassTransforms::ConfirmCrop(prompt) => {
                let crop_specs = [
                    TransformSpec::Flatten,
                    TransformSpec::CropSquare {
                        ratio: self.crop_ratio,
                    },
                ];
                let flatten_only = [TransformSpec::Flatten];
                let specs: &[TransformSpec] = if prompt.confirm_crop(path)? {
                    &crop_specs
                } else {
                    &flatten_only
                };
                Ok(transform::apply_all(img, specs))
            }
        }
    }
}
