//! The `pixbatch config` command: inspect and bootstrap the config file.

use clap::{Args, Subcommand};
use pixbatch_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it comes from
    Show,

    /// Print the config file path
    Path,

    /// Write a commented default config file to edit
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show(),
        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
            Ok(())
        }
        ConfigCommand::Init { force } => init(force),
    }
}

/// Print the effective TOML plus the resolved paths a run will touch.
/// Provenance and paths go to stderr so stdout stays pipeable TOML.
fn show() -> anyhow::Result<()> {
    let path = Config::default_path();
    let config = Config::load()?;

    if path.exists() {
        eprintln!("# loaded from {}", path.display());
    } else {
        eprintln!("# no file at {} - showing defaults", path.display());
    }
    eprintln!("# error log appends to {}", config.error_log_path().display());
    eprintln!(
        "# outputs: <folder>/{}/<width>x, temp dir <folder>/{}",
        config.output.processed_dir, config.output.temp_crop_dir
    );

    println!("{}", config.to_toml()?);
    Ok(())
}

fn init(force: bool) -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, render_default_config()?)?;

    // Round-trip through the loader so a broken template is caught here,
    // not on the next run
    Config::load_from(&path)?;

    tracing::info!("Config file created at: {}", path.display());
    println!("Configuration initialized at: {}", path.display());
    Ok(())
}

/// Default config serialized with a short orientation header.
fn render_default_config() -> anyhow::Result<String> {
    let mut content = String::from(
        "# pixbatch configuration\n\
         #\n\
         # [processing] controls which extensions are discovered and the\n\
         # centered-square crop ratio; [limits] caps input size and decode\n\
         # time; [output] sets the Processed/ and temp directory names,\n\
         # JPEG quality, and where per-item failures are logged.\n\n",
    );
    content.push_str(&Config::default().to_toml()?);
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_default_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, render_default_config().unwrap()).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output.jpeg_quality, 90);
        assert_eq!(config.processing.crop_ratio, 0.88);
    }

    #[test]
    fn test_rendered_default_keeps_header() {
        let content = render_default_config().unwrap();
        assert!(content.starts_with("# pixbatch configuration"));
        assert!(content.contains("[processing]"));
        assert!(content.contains("[output]"));
    }
}
