//! auxpass Settings Crate
//!
//! Holds every tuning value of the post-processor in one explicit
//! configuration structure, with JSON/TOML persistence and validation.

pub mod config;
pub mod error;

pub use config::{
    AuxDeviceSettings, Config, LayerErrorPolicy, MotionSettings, PassPattern, ProcessingSettings,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
