//! Error handling for auxpass
//!
//! Provides error types for every stage of post-processing:
//! - Segmentation errors (slicer layer annotations)
//! - Tracking errors (position reconstruction within a layer)
//! - Replay errors (command generation)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Line numbers are 1-based positions in the input program.

use thiserror::Error;

use crate::data::Point3D;

/// Segmentation error type
///
/// Raised while splitting a program into layers. Any of these aborts the
/// whole run, there is no safe partial output without a correct partition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// A required layer annotation is absent
    #[error("Missing layer marker: {marker}")]
    MissingLayerMarker {
        /// Which marker could not be found
        marker: MissingMarker,
    },

    /// A layer index or count is not a non-negative integer
    #[error("Malformed layer index at line {line_number}: '{text}'")]
    MalformedIndex {
        /// The line holding the annotation.
        line_number: usize,
        /// The offending index text.
        text: String,
    },

    /// An annotation that must be unique appeared twice
    #[error("Duplicate {marker} at line {line_number} (first seen at line {first_line})")]
    DuplicateMarker {
        /// Description of the repeated annotation.
        marker: String,
        /// Line of the first occurrence.
        first_line: usize,
        /// Line of the repeated occurrence.
        line_number: usize,
    },

    /// A layer starts before the previous layer has ended
    #[error("Layer {layer} starts at line {line_number}, before the previous layer ends")]
    OutOfOrder {
        /// The layer index.
        layer: usize,
        /// The line holding the start annotation.
        line_number: usize,
    },

    /// A layer end annotation appeared before any layer was opened
    #[error("Layer end marker at line {line_number} with no open layer")]
    OrphanLayerEnd {
        /// The line holding the end annotation.
        line_number: usize,
    },
}

impl SegmentError {
    /// Shorthand for a missing marker error
    pub fn missing(marker: MissingMarker) -> Self {
        Self::MissingLayerMarker { marker }
    }
}

/// The annotation a `MissingLayerMarker` error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingMarker {
    /// No layer count declaration in the program
    LayerCount,
    /// A declared layer never starts
    LayerStart {
        /// The layer index.
        layer: usize,
    },
    /// A declared layer never ends
    LayerEnd {
        /// The layer index.
        layer: usize,
    },
    /// A layer starts that lies outside the declared count
    Undeclared {
        /// The layer index.
        layer: usize,
        /// The declared layer count.
        layer_count: usize,
        /// The line holding the start annotation.
        line_number: usize,
    },
}

impl std::fmt::Display for MissingMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerCount => write!(f, "no layer count declaration"),
            Self::LayerStart { layer } => write!(f, "layer {} has no start marker", layer),
            Self::LayerEnd { layer } => write!(f, "layer {} has no end marker", layer),
            Self::Undeclared {
                layer,
                layer_count,
                line_number,
            } => write!(
                f,
                "layer {} at line {} is outside the declared count of {}",
                layer, line_number, layer_count
            ),
        }
    }
}

/// Position tracking error type
///
/// Raised while reconstructing the tool path of a single layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// An axis word carries a value that is not a finite number
    #[error("Cannot parse {axis} value '{token}' at line {line_number}: {line}")]
    NumericParseFailure {
        /// The line number of the offending command.
        line_number: usize,
        /// The axis letter, upper-cased.
        axis: char,
        /// The offending token as written.
        token: String,
        /// The full command line, trimmed.
        line: String,
    },

    /// Extent requested for a layer without any recorded move
    #[error("Layer has no recorded moves")]
    EmptyHistory,
}

/// Replay error type
///
/// Raised while generating motion commands from a history or a bounding box.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    /// A generation parameter is out of range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A position that cannot be written as a G-code word
    #[error("Invalid position {position} at history index {index}")]
    InvalidPosition {
        /// Index of the position in its source sequence.
        index: usize,
        /// The offending position.
        position: Point3D,
    },
}

impl ReplayError {
    /// Shorthand for an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for auxpass
///
/// A unified error type that can represent any error from all stages.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Segmentation error
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Tracking error outside any layer context
    #[error(transparent)]
    Track(#[from] TrackError),

    /// Tracking error raised while processing a specific layer
    #[error("Layer {layer}: {source}")]
    Layer {
        /// The zero-based layer index.
        layer: usize,
        /// The underlying tracking error.
        #[source]
        source: TrackError,
    },

    /// Replay error
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl Error {
    /// Attach a layer index to a tracking error
    pub fn in_layer(layer: usize, source: TrackError) -> Self {
        Error::Layer { layer, source }
    }

    /// Check if this is a segmentation error
    pub fn is_segment_error(&self) -> bool {
        matches!(self, Error::Segment(_))
    }

    /// Check if this error is scoped to one layer
    pub fn is_layer_error(&self) -> bool {
        matches!(self, Error::Layer { .. })
    }

    /// Check if this error reports a layer without recorded moves
    pub fn is_empty_history(&self) -> bool {
        matches!(
            self,
            Error::Track(TrackError::EmptyHistory)
                | Error::Layer {
                    source: TrackError::EmptyHistory,
                    ..
                }
        )
    }

    /// The layer index the error refers to, if any
    pub fn layer(&self) -> Option<usize> {
        match self {
            Error::Layer { layer, .. } => Some(*layer),
            _ => None,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
