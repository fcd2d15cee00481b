//! Top-level pipeline sequencing.
//!
//! One run walks a fixed stage sequence:
//!
//! ```text
//! Discover -> [crop pass into temp dir] -> resize pass x1 or x2 -> cleanup
//! ```
//!
//! Every choice along the way (crop mode, batch count, target dimensions,
//! per-image crop confirmation) comes from an injected [`DecisionSource`],
//! so the orchestrator runs the same against terminal prompts, CLI flags,
//! or canned test scripts.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::report::ErrorSink;

use super::batch::{BatchObserver, BatchProcessor, BatchResult, CropPrompt, PassTransforms};
use super::discovery::FileDiscovery;
use super::transform::TransformSpec;

/// Whether and how the crop pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    /// No crop pass; resize directly from the source folder
    Skip,
    /// Crop every image
    All,
    /// Ask per image via [`CropPrompt`]
    PerImage,
}

/// External decisions that drive a pipeline run.
///
/// Methods are called in stage order: `crop_mode` once, then (for
/// [`CropMode::PerImage`]) `confirm_crop` once per image, then
/// `second_batch` once, then `dimensions` once per resize batch. A
/// returned error is fatal for the run, but the temporary crop directory
/// is still cleaned up.
pub trait DecisionSource: CropPrompt {
    /// Whether to crop before resizing.
    fn crop_mode(&mut self) -> PipelineResult<CropMode>;

    /// Whether to run a second resize batch.
    fn second_batch(&mut self) -> PipelineResult<bool>;

    /// Target width and height for the given batch (0-based index).
    fn dimensions(&mut self, batch_index: usize) -> PipelineResult<(u32, u32)>;
}

/// Terminal outcome of a pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No eligible images under the root; nothing was created
    NothingToDo,
    /// All passes ran; `outputs` lists the populated output directories
    Completed {
        outputs: Vec<PathBuf>,
        passes: Vec<BatchResult>,
    },
}

/// Sequences the crop and resize passes over one source folder.
pub struct PipelineOrchestrator {
    processor: BatchProcessor,
    discovery: FileDiscovery,
    config: Config,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            processor: BatchProcessor::new(config),
            discovery: FileDiscovery::new(config.processing.clone()).with_excluded_dirs([
                config.output.processed_dir.clone(),
                config.output.temp_crop_dir.clone(),
            ]),
            config: config.clone(),
        }
    }

    /// Run the full pipeline against `root`.
    ///
    /// Outputs land in `<root>/<processed_dir>/<width>x/`. If a crop pass
    /// runs, it writes into `<root>/<temp_crop_dir>`, the resize passes
    /// read from there, and the temp directory is removed afterwards on
    /// both success and failure paths.
    pub async fn run(
        &self,
        root: &Path,
        recursive: bool,
        decisions: &mut dyn DecisionSource,
        observer: &mut dyn BatchObserver,
        errors: &mut dyn ErrorSink,
    ) -> PipelineResult<PipelineOutcome> {
        if self.discovery.discover(root, recursive).is_empty() {
            tracing::info!("No eligible images under {:?}", root);
            return Ok(PipelineOutcome::NothingToDo);
        }

        let crop_mode = decisions.crop_mode()?;
        let temp_dir = root.join(&self.config.output.temp_crop_dir);
        let crop_ran = crop_mode != CropMode::Skip;
        let mut passes = Vec::new();

        if crop_ran {
            let crop_specs = [
                TransformSpec::Flatten,
                TransformSpec::CropSquare {
                    ratio: self.config.processing.crop_ratio,
                },
            ];
            let transforms = match crop_mode {
                CropMode::All => PassTransforms::Fixed(&crop_specs),
                CropMode::PerImage => PassTransforms::ConfirmCrop(&mut *decisions),
                CropMode::Skip => unreachable!(),
            };

            let crop_result = self
                .processor
                .run_batch("crop", root, &temp_dir, recursive, transforms, observer, errors)
                .await;
            match crop_result {
                Ok(result) => passes.push(result),
                Err(e) => {
                    remove_temp_dir(&temp_dir);
                    return Err(e);
                }
            }
        }

        // The crop pass flattens everything into the temp dir, so resize
        // passes after a crop read it non-recursively with no flatten step.
        let (source, source_recursive) = if crop_ran {
            (temp_dir.clone(), false)
        } else {
            (root.to_path_buf(), recursive)
        };

        let resized = self
            .run_resize_passes(
                root,
                &source,
                source_recursive,
                crop_ran,
                decisions,
                observer,
                errors,
                &mut passes,
            )
            .await;

        if crop_ran {
            remove_temp_dir(&temp_dir);
        }

        Ok(PipelineOutcome::Completed {
            outputs: resized?,
            passes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_resize_passes(
        &self,
        root: &Path,
        source: &Path,
        source_recursive: bool,
        crop_ran: bool,
        decisions: &mut dyn DecisionSource,
        observer: &mut dyn BatchObserver,
        errors: &mut dyn ErrorSink,
        passes: &mut Vec<BatchResult>,
    ) -> PipelineResult<Vec<PathBuf>> {
        let batches = if decisions.second_batch()? { 2 } else { 1 };
        let processed_root = root.join(&self.config.output.processed_dir);
        let mut outputs = Vec::new();
        let mut widths_used: Vec<u32> = Vec::new();

        for batch_index in 0..batches {
            let (width, height) = decisions.dimensions(batch_index)?;
            self.validate_dimensions(width, height)?;
            // Output dirs are named by width alone, so a repeated width
            // would mix two target sizes in one directory
            if widths_used.contains(&width) {
                return Err(PipelineError::DuplicateBatchWidth { width });
            }
            widths_used.push(width);

            let dest = processed_root.join(format!("{width}x"));
            let resize = TransformSpec::Resize { width, height };
            // Flatten only when the source may still carry transparency,
            // i.e. no crop pass already flattened it
            let specs: Vec<TransformSpec> = if crop_ran {
                vec![resize]
            } else {
                vec![TransformSpec::Flatten, resize]
            };

            let label = format!("resize {width}x{height}");
            let result = self
                .processor
                .run_batch(
                    &label,
                    source,
                    &dest,
                    source_recursive,
                    PassTransforms::Fixed(&specs),
                    observer,
                    errors,
                )
                .await?;
            passes.push(result);
            outputs.push(dest);
        }

        Ok(outputs)
    }

    fn validate_dimensions(&self, width: u32, height: u32) -> PipelineResult<()> {
        let max = self.config.limits.max_image_dimension;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(PipelineError::InvalidDimensions { width, height, max });
        }
        Ok(())
    }
}

fn remove_temp_dir(temp_dir: &Path) {
    if !temp_dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(temp_dir) {
        tracing::warn!("Failed to remove temp directory {:?}: {}", temp_dir, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch::NullObserver;
    use crate::report::MemoryErrorSink;
    use image::DynamicImage;

    struct Scripted {
        crop: CropMode,
        second: bool,
        dims: Vec<(u32, u32)>,
        crop_answers: Vec<bool>,
        asked: usize,
    }

    impl Scripted {
        fn new(crop: CropMode, dims: &[(u32, u32)]) -> Self {
            Self {
                crop,
                second: dims.len() > 1,
                dims: dims.to_vec(),
                crop_answers: vec![],
                asked: 0,
            }
        }
    }

    impl CropPrompt for Scripted {
        fn confirm_crop(&mut self, _path: &Path) -> PipelineResult<bool> {
            let answer = self.crop_answers[self.asked % self.crop_answers.len()];
            self.asked += 1;
            Ok(answer)
        }
    }

    impl DecisionSource for Scripted {
        fn crop_mode(&mut self) -> PipelineResult<CropMode> {
            Ok(self.crop)
        }
        fn second_batch(&mut self) -> PipelineResult<bool> {
            Ok(self.second)
        }
        fn dimensions(&mut self, batch_index: usize) -> PipelineResult<(u32, u32)> {
            Ok(self.dims[batch_index])
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        DynamicImage::new_rgb8(width, height)
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    fn count_jpgs(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".jpg"))
            .count()
    }

    #[tokio::test]
    async fn test_crop_then_two_batches() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("a.png"), 200, 150);
        write_png(&root.path().join("b.png"), 90, 120);

        let config = Config::default();
        let orchestrator = PipelineOrchestrator::new(&config);
        let mut decisions = Scripted::new(CropMode::All, &[(50, 50), (75, 75)]);
        let mut errors = MemoryErrorSink::default();

        let outcome = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap();

        let PipelineOutcome::Completed { outputs, passes } = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(passes.len(), 3); // crop + two resizes
        assert_eq!(outputs.len(), 2);
        assert_eq!(count_jpgs(&root.path().join("Processed").join("50x")), 2);
        assert_eq!(count_jpgs(&root.path().join("Processed").join("75x")), 2);
        assert!(!root.path().join("Cropped_Temp_Images").exists());

        let out = image::open(root.path().join("Processed/75x/a.jpg")).unwrap();
        assert_eq!((out.width(), out.height()), (75, 75));
    }

    #[tokio::test]
    async fn test_recursive_second_batch_sees_only_source_images() {
        let root = tempfile::tempdir().unwrap();
        let sub = root.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        write_png(&sub.join("a.png"), 100, 100);
        // Leftover output from an earlier run must not become input either
        let stale = root.path().join("Processed").join("99x");
        std::fs::create_dir_all(&stale).unwrap();
        DynamicImage::new_rgb8(10, 10)
            .save_with_format(stale.join("old.jpg"), image::ImageFormat::Jpeg)
            .unwrap();

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::Skip, &[(50, 50), (75, 75)]);
        let mut errors = MemoryErrorSink::default();

        let outcome = orchestrator
            .run(
                root.path(),
                true,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap();

        let PipelineOutcome::Completed { passes, .. } = outcome else {
            panic!("expected completed outcome");
        };
        // Each pass processes exactly the one source image, never the
        // JPEGs an earlier pass wrote under Processed/
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].total(), 1);
        assert_eq!(passes[1].total(), 1);
        assert_eq!(count_jpgs(&root.path().join("Processed").join("50x")), 1);
        assert_eq!(count_jpgs(&root.path().join("Processed").join("75x")), 1);
    }

    #[tokio::test]
    async fn test_empty_root_is_nothing_to_do() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("readme.txt"), b"no images here").unwrap();

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::All, &[(50, 50)]);
        let mut errors = MemoryErrorSink::default();

        let outcome = orchestrator
            .run(
                root.path(),
                true,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::NothingToDo));
        assert!(!root.path().join("Processed").exists());
        assert!(!root.path().join("Cropped_Temp_Images").exists());
    }

    #[tokio::test]
    async fn test_resize_only_single_batch() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("wide.png"), 300, 100);

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::Skip, &[(120, 60)]);
        let mut errors = MemoryErrorSink::default();

        let outcome = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap();

        let PipelineOutcome::Completed { outputs, passes } = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(passes.len(), 1);
        assert_eq!(outputs, vec![root.path().join("Processed").join("120x")]);

        let out = image::open(outputs[0].join("wide.jpg")).unwrap();
        assert_eq!((out.width(), out.height()), (120, 60));
    }

    #[tokio::test]
    async fn test_per_image_crop_decisions() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("a.png"), 100, 100);
        write_png(&root.path().join("b.png"), 100, 100);

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::PerImage, &[(40, 40)]);
        decisions.crop_answers = vec![true, false];
        let mut errors = MemoryErrorSink::default();

        let outcome = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
        assert_eq!(decisions.asked, 2);
        // Declined crop is an item outcome, not an abort: both images resized
        assert_eq!(count_jpgs(&root.path().join("Processed").join("40x")), 2);
    }

    #[tokio::test]
    async fn test_bad_dimensions_still_clean_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("a.png"), 64, 64);

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        // Second batch asks for an invalid size after the crop pass ran
        let mut decisions = Scripted::new(CropMode::All, &[(50, 50), (0, 80)]);
        let mut errors = MemoryErrorSink::default();

        let err = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidDimensions { .. }));
        assert!(!root.path().join("Cropped_Temp_Images").exists());
    }

    #[tokio::test]
    async fn test_duplicate_batch_width_rejected() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("a.png"), 64, 64);

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::All, &[(100, 50), (100, 80)]);
        let mut errors = MemoryErrorSink::default();

        let err = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DuplicateBatchWidth { width: 100 }
        ));
        assert!(!root.path().join("Cropped_Temp_Images").exists());
    }

    #[tokio::test]
    async fn test_oversized_dimensions_rejected() {
        let root = tempfile::tempdir().unwrap();
        write_png(&root.path().join("a.png"), 10, 10);

        let orchestrator = PipelineOrchestrator::new(&Config::default());
        let mut decisions = Scripted::new(CropMode::Skip, &[(20000, 20)]);
        let mut errors = MemoryErrorSink::default();

        let err = orchestrator
            .run(
                root.path(),
                false,
                &mut decisions,
                &mut NullObserver,
                &mut errors,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::InvalidDimensions { max: 10000, .. }
        ));
    }
}
