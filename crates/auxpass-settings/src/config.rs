//! Configuration for auxpass
//!
//! Configuration is organized into logical sections:
//! - Auxiliary device settings (on/off commands, dwell)
//! - Motion settings (replay feed, nozzle-to-tool offset, clearance)
//! - Processing settings (pass pattern, error policy, annotation)
//!
//! Files are JSON or TOML, chosen by extension. Missing keys take their
//! default values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, SettingsResult};

/// Auxiliary device control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxDeviceSettings {
    /// Command that switches the device on
    pub on_command: String,
    /// Command that switches the device off
    pub off_command: String,
    /// Pause after each switch, in seconds
    pub dwell_seconds: f64,
}

impl Default for AuxDeviceSettings {
    fn default() -> Self {
        Self {
            on_command: "SET_PIN PIN=caselight1 VALUE=1".to_string(),
            off_command: "SET_PIN PIN=caselight1 VALUE=0".to_string(),
            dwell_seconds: 2.0,
        }
    }
}

impl AuxDeviceSettings {
    /// Dwell as whole milliseconds, the unit of `G4 P`
    pub fn dwell_ms(&self) -> u64 {
        (self.dwell_seconds * 1000.0).round() as u64
    }
}

/// Motion of the replayed pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Feed rate of replayed moves (mm/min)
    pub feed_rate: f64,
    /// X distance from nozzle to auxiliary tool (mm)
    pub offset_x: f64,
    /// Y distance from nozzle to auxiliary tool (mm)
    pub offset_y: f64,
    /// Lift above the layer's entry height during the pass (mm)
    pub z_clearance: f64,
    /// Feed rate of the vertical moves into and out of the pass (mm/min)
    pub transition_feed_rate: f64,
    /// Height the first layer starts from (mm)
    pub initial_z: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            feed_rate: 200.0,
            offset_x: 10.0,
            offset_y: 10.0,
            z_clearance: 0.007,
            transition_feed_rate: 2000.0,
            initial_z: 0.0,
        }
    }
}

/// Path followed by the auxiliary tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PassPattern {
    /// Retrace every printed move
    #[default]
    Path,
    /// Raster the layer's bounding rectangle
    Grid,
}

impl std::fmt::Display for PassPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// What to do when a layer cannot be tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayerErrorPolicy {
    /// Stop the run
    #[default]
    Abort,
    /// Keep the layer as printed, without an auxiliary pass
    Skip,
}

impl std::fmt::Display for LayerErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Processing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Path followed by the auxiliary tool
    pub pattern: PassPattern,
    /// Row spacing of the grid pattern (mm)
    pub grid_stepover: f64,
    /// Margin around the layer in the grid pattern (mm)
    pub grid_overhang: f64,
    /// Handling of layers with unparsable moves
    pub on_layer_error: LayerErrorPolicy,
    /// Insert a comment naming the post-processor into the header
    pub annotate: bool,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            pattern: PassPattern::Path,
            grid_stepover: 1.0,
            grid_overhang: 0.0,
            on_layer_error: LayerErrorPolicy::Abort,
            annotate: true,
        }
    }
}

/// Complete post-processor configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Auxiliary device control
    pub aux: AuxDeviceSettings,
    /// Motion of the replayed pass
    pub motion: MotionSettings,
    /// Processing options
    pub processing: ProcessingSettings,
}

fn require_finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, "must be a finite number"))
    }
}

fn require_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(key, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn require_non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(key, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be >= 0, got {}", value)))
    }
}

enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(format!(
                "{} (config file must be .json or .toml)",
                other.unwrap_or("no extension")
            ))),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aux.on_command.trim().is_empty() {
            return Err(ConfigError::invalid("aux.on_command", "must not be empty"));
        }
        if self.aux.off_command.trim().is_empty() {
            return Err(ConfigError::invalid("aux.off_command", "must not be empty"));
        }
        require_non_negative("aux.dwell_seconds", self.aux.dwell_seconds)?;

        require_positive("motion.feed_rate", self.motion.feed_rate)?;
        require_positive(
            "motion.transition_feed_rate",
            self.motion.transition_feed_rate,
        )?;
        require_finite("motion.offset_x", self.motion.offset_x)?;
        require_finite("motion.offset_y", self.motion.offset_y)?;
        require_non_negative("motion.z_clearance", self.motion.z_clearance)?;
        require_finite("motion.initial_z", self.motion.initial_z)?;

        if self.processing.pattern == PassPattern::Grid {
            require_positive("processing.grid_stepover", self.processing.grid_stepover)?;
        }
        require_non_negative("processing.grid_overhang", self.processing.grid_overhang)?;

        Ok(())
    }
}
