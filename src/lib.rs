//! # auxpass
//!
//! Post-processor for slicer G-code that replays every printed layer a
//! second time for an auxiliary tool mounted beside the nozzle, such as a
//! curing light or a marker.
//!
//! ## Architecture
//!
//! auxpass is organized as a workspace with multiple crates:
//!
//! 1. **auxpass-core** - Position and geometry types, error hierarchy
//! 2. **auxpass-gcode** - Layer segmentation, position tracking, path replay
//! 3. **auxpass-settings** - Configuration structure and persistence
//! 4. **auxpass** - Post-processing pipeline, logging and the CLI binary
//!
//! ## Pipeline
//!
//! - Split the program into prologue, layers and epilogue from the slicer's
//!   `;LAYER_COUNT:`, `;LAYER:` and `;TIME_ELAPSED:` comments
//! - Track each layer's print moves and its entry/exit height
//! - After each layer, lift, switch the device on, retrace the layer with the
//!   configured offset (or raster its bounding box), switch off and return

pub mod cli;
pub mod postprocess;

pub use auxpass_core::{
    BoundingBox, Error, LayerExtent, Offset2D, Point3D, ReplayError, Result, SegmentError,
    TrackError,
};
pub use auxpass_gcode::{
    grid_pass, replay, segment, track, track_from, GridPassParameters, Ingest, LayerPartition,
    LayerSlice, LayerTrack, PositionTracker, Projection,
};
pub use auxpass_settings::{Config, LayerErrorPolicy, PassPattern};
pub use postprocess::{PostProcessor, ProcessedProgram, ProcessingReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output to stderr with target, level and line numbers
/// - RUST_LOG environment variable support
/// - `default_level` used when RUST_LOG is unset
pub fn init_logging(default_level: tracing::Level) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
