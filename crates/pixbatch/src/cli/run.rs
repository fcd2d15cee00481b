//! The `pixbatch run` command - the batch pipeline with interactive or
//! flag-driven decisions.
//!
//! Every choice the pipeline needs (folder, crop mode, batch count, target
//! sizes, per-image crop confirmation) can come from a flag or from a
//! themed prompt; the orchestrator itself never knows which.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use clap::Args;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use pixbatch_core::{
    BatchObserver, BatchResult, Config, CropMode, CropPrompt, DecisionSource, FileErrorSink,
    PipelineError, PipelineOrchestrator, PipelineOutcome, PipelineResult,
};

use super::theme;

/// One resize target, parsed from `WxH`.
#[derive(Debug, Clone, Copy)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH (e.g. 1200x800), got '{s}'"))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("dimensions must be positive, got '{s}'"));
        }
        Ok(Size { width, height })
    }
}

/// Crop choice for non-interactive runs.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CropChoice {
    /// No crop pass
    Skip,
    /// Crop every image
    All,
    /// Ask per image
    PerImage,
}

impl From<CropChoice> for CropMode {
    fn from(choice: CropChoice) -> Self {
        match choice {
            CropChoice::Skip => CropMode::Skip,
            CropChoice::All => CropMode::All,
            CropChoice::PerImage => CropMode::PerImage,
        }
    }
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Folder containing images to process (prompted for when omitted)
    pub input: Option<PathBuf>,

    /// Include images in nested subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Crop choice; prompted for when omitted
    #[arg(long, value_enum)]
    pub crop: Option<CropChoice>,

    /// Resize target as WxH; repeat for a second batch (max two).
    /// When given, the size prompts are skipped
    #[arg(long = "size", value_name = "WxH")]
    pub sizes: Vec<Size>,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    if args.sizes.len() > 2 {
        anyhow::bail!("At most two --size targets are supported.");
    }

    let prompts_needed = args.input.is_none() || args.crop.is_none() || args.sizes.is_empty();
    if prompts_needed {
        theme::print_banner();
    }

    let theme = theme::pixbatch_theme();
    let root = match &args.input {
        Some(path) => path.clone(),
        None => prompt_for_folder(&theme)?,
    };
    if !root.is_dir() {
        anyhow::bail!(
            "Not a directory: {}\n\n  Hint: Check the folder path and try again.",
            root.display()
        );
    }

    let mut decisions = CliDecisions {
        theme,
        crop_flag: args.crop.map(CropMode::from),
        sizes: args.sizes.clone(),
        max_dimension: config.limits.max_image_dimension,
    };
    let mut observer = ProgressObserver::default();
    let mut errors = FileErrorSink::new(config.error_log_path());
    let orchestrator = PipelineOrchestrator::new(&config);

    let start = Instant::now();
    let outcome = orchestrator
        .run(
            &root,
            args.recursive,
            &mut decisions,
            &mut observer,
            &mut errors,
        )
        .await?;

    match outcome {
        PipelineOutcome::NothingToDo => {
            eprintln!("No valid images found in {}. Nothing to do.", root.display());
        }
        PipelineOutcome::Completed { outputs, passes } => {
            print_summary(&passes, start.elapsed());
            eprintln!("  Processed images saved in:");
            for output in &outputs {
                eprintln!("    {}", output.display());
            }
            eprintln!();

            let failed: u64 = passes.iter().map(|p| p.failed).sum();
            if failed > 0 {
                eprintln!(
                    "  {failed} item(s) failed; see {} for details.",
                    config.error_log_path().display()
                );
            }
        }
    }

    Ok(())
}

/// Ask for the source folder. An empty answer aborts the run.
fn prompt_for_folder(theme: &ColorfulTheme) -> anyhow::Result<PathBuf> {
    let answer: String = Input::with_theme(theme)
        .with_prompt("Folder containing images")
        .allow_empty(true)
        .interact_text()?;

    let trimmed = answer.trim();
    if trimmed.is_empty() {
        anyhow::bail!("No folder selected. Exiting.");
    }
    let expanded = shellexpand::tilde(trimmed);
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Decision source backed by flags where given and themed prompts otherwise.
struct CliDecisions {
    theme: ColorfulTheme,
    crop_flag: Option<CropMode>,
    sizes: Vec<Size>,
    max_dimension: u32,
}

impl CliDecisions {
    fn prompt_dimension(&self, what: &str) -> PipelineResult<u32> {
        let max = self.max_dimension;
        Input::<u32>::with_theme(&self.theme)
            .with_prompt(format!("{what} in pixels"))
            .validate_with(move |value: &u32| {
                if *value >= 1 && *value <= max {
                    Ok(())
                } else {
                    Err(format!("must be between 1 and {max}"))
                }
            })
            .interact_text()
            .map_err(decision_failed)
    }
}

impl CropPrompt for CliDecisions {
    fn confirm_crop(&mut self, path: &Path) -> PipelineResult<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(format!("Crop {} to a centered square?", path.display()))
            .default(true)
            .interact()
            .map_err(decision_failed)
    }
}

impl DecisionSource for CliDecisions {
    fn crop_mode(&mut self) -> PipelineResult<CropMode> {
        if let Some(mode) = self.crop_flag {
            return Ok(mode);
        }
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Crop images before resizing?")
            .items(&["No crop", "Crop every image", "Confirm per image"])
            .default(0)
            .interact()
            .map_err(decision_failed)?;
        Ok(match selection {
            0 => CropMode::Skip,
            1 => CropMode::All,
            _ => CropMode::PerImage,
        })
    }

    fn second_batch(&mut self) -> PipelineResult<bool> {
        if !self.sizes.is_empty() {
            return Ok(self.sizes.len() > 1);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Produce a second batch at another size?")
            .default(false)
            .interact()
            .map_err(decision_failed)
    }

    fn dimensions(&mut self, batch_index: usize) -> PipelineResult<(u32, u32)> {
        if let Some(size) = self.sizes.get(batch_index) {
            return Ok((size.width, size.height));
        }
        if batch_index > 0 {
            eprintln!();
            eprintln!("  Second batch:");
        }
        let width = self.prompt_dimension("Width")?;
        let height = self.prompt_dimension("Height")?;
        Ok((width, height))
    }
}

fn decision_failed(e: dialoguer::Error) -> PipelineError {
    PipelineError::Decision(e.to_string())
}

/// Drives one indicatif bar per batch pass.
#[derive(Default)]
struct ProgressObserver {
    bar: Option<ProgressBar>,
    pass_started: Option<Instant>,
}

impl BatchObserver for ProgressObserver {
    fn batch_started(&mut self, label: &str, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                )
                .unwrap()
                .progress_chars("##-"),
        );
        pb.set_message(label.to_string());
        self.bar = Some(pb);
        self.pass_started = Some(Instant::now());
    }

    fn progress(&mut self, done: u64, _total: u64) {
        let Some(pb) = &self.bar else { return };
        pb.inc(1);
        if let Some(started) = self.pass_started {
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                pb.set_message(format!("{:.1} img/sec", done as f64 / elapsed));
            }
        }
    }

    fn batch_finished(&mut self, label: &str, result: &BatchResult) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
        tracing::info!(
            "{} pass done: {} succeeded, {} failed, {} skipped",
            label,
            result.succeeded,
            result.failed,
            result.skipped
        );
    }
}

/// Print a formatted summary table after the pipeline completes.
fn print_summary(passes: &[BatchResult], elapsed: std::time::Duration) {
    let succeeded: u64 = passes.iter().map(|p| p.succeeded).sum();
    let failed: u64 = passes.iter().map(|p| p.failed).sum();
    let skipped: u64 = passes.iter().map(|p| p.skipped).sum();
    let total = succeeded + failed + skipped;
    let rate = if elapsed.as_secs_f64() > 0.0 {
        succeeded as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    if skipped > 0 {
        eprintln!("    Skipped:      {:>8}", skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
