//! Command-line interface
//!
//! ```text
//! auxpass print.gcode -o print_aux.gcode -c auxpass.toml
//! auxpass --write-default-config auxpass.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use auxpass_settings::{Config, LayerErrorPolicy, PassPattern};

use crate::postprocess::PostProcessor;

/// Replay every printed layer of a slicer program for an auxiliary tool
#[derive(Parser, Debug)]
#[command(name = "auxpass")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Slicer G-code program to process
    #[arg(required_unless_present = "write_default_config")]
    pub input: Option<PathBuf>,

    /// Output path (default: <input stem>_aux.<ext> beside the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Raster each layer's bounding box instead of retracing its path
    #[arg(long)]
    pub grid: bool,

    /// Keep layers with unparsable moves as printed instead of aborting
    #[arg(long)]
    pub skip_bad_layers: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_default_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if self.grid {
            config.processing.pattern = PassPattern::Grid;
        }
        if self.skip_bad_layers {
            config.processing.on_layer_error = LayerErrorPolicy::Skip;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `print.gcode` -> `print_aux.gcode`, in the same directory
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_aux.{}", stem, ext.to_string_lossy()),
        None => format!("{}_aux", stem),
    };
    input.with_file_name(name)
}

/// Execute the parsed command line
pub fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.write_default_config {
        Config::default()
            .save_to_file(path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote default configuration");
        return Ok(());
    }

    let config = cli.resolve_config()?;
    let input = cli
        .input
        .as_deref()
        .context("No input program given")?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    tracing::debug!(
        pattern = %config.processing.pattern,
        on_layer_error = %config.processing.on_layer_error,
        "Configuration resolved"
    );

    let report = PostProcessor::new(config).process_file(input, &output)?;
    if report.skipped_layers > 0 {
        tracing::warn!(
            skipped = report.skipped_layers,
            "Some layers were left without an auxiliary pass"
        );
    }
    Ok(())
}
