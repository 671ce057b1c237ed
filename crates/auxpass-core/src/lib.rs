//! # auxpass Core
//!
//! Core types and error definitions shared by the auxpass crates.
//! Provides the tool position cursor, planar offsets, bounding boxes and
//! the error hierarchy used by segmentation, tracking and replay.

pub mod data;
pub mod error;

pub use data::{BoundingBox, LayerExtent, Offset2D, Point3D};

pub use error::{Error, MissingMarker, ReplayError, Result, SegmentError, TrackError};
