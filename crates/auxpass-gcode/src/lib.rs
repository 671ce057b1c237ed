//! # auxpass G-Code
//!
//! The processing core of auxpass:
//! - Move command tokenizing (`G0`/`G1` only)
//! - Layer segmentation from slicer annotations
//! - Position tracking with partial-command carry-forward
//! - Path replay (3D, planar, planar with offset) and raster grid passes
//! - Program file reading and writing

pub mod command;
pub mod file_io;
pub mod replay;
pub mod segmenter;
pub mod tracker;

pub use command::{normalize, MoveCommand, MoveOpcode};
pub use file_io::{write_program, FileReadStats, ProgramReader};
pub use replay::{grid_pass, replay, GridPassParameters, Projection, MAX_GRID_ROWS};
pub use segmenter::{segment, Annotation, LayerPartition, LayerSlice};
pub use tracker::{track, track_from, Ingest, LayerTrack, PositionTracker};
