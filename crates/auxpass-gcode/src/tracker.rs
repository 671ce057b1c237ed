//! Position tracker
//!
//! Reconstructs the tool path of one layer from its raw command lines.
//! Slicers emit partial commands (`G1 X10 E2` leaves Y and Z where they
//! were), so the tracker keeps a cursor and carries missing axes forward.
//!
//! Only moves that extrude or change height are recorded. Pure travel moves
//! are ignored, including their effect on the cursor, but their axis words
//! must still be numeric.

use auxpass_core::{BoundingBox, LayerExtent, Point3D, TrackError};

use crate::command::{parse_axis_word, MoveCommand};

/// Outcome of feeding one line to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The line was a print-relevant move and a snapshot was appended
    Recorded,
    /// Not a move, or a move with neither extrusion nor height
    Ignored,
}

/// Tracks tool position across one layer
///
/// The tracker is seeded with the height the previous layer ended at. A new
/// layer replaces the history but keeps the cursor.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    cursor: Point3D,
    history: Vec<Point3D>,
    line_origin: usize,
    lines_seen: usize,
}

impl PositionTracker {
    /// Create a tracker whose cursor starts at the XY origin, at `starting_z`
    pub fn new(starting_z: f64) -> Self {
        Self {
            cursor: Point3D::at_height(starting_z),
            history: Vec::new(),
            line_origin: 0,
            lines_seen: 0,
        }
    }

    /// Create a tracker resuming from a known cursor, e.g. where the
    /// previous layer left the tool
    pub fn with_cursor(cursor: Point3D) -> Self {
        Self {
            cursor,
            ..Self::new(cursor.z)
        }
    }

    /// Current cursor position
    pub fn cursor(&self) -> Point3D {
        self.cursor
    }

    /// Snapshots recorded for the current layer, in program order
    pub fn history(&self) -> &[Point3D] {
        &self.history
    }

    /// Consume the tracker, keeping only its history
    pub fn into_history(self) -> Vec<Point3D> {
        self.history
    }

    /// Number of input lines preceding the current layer.
    ///
    /// Only used to report absolute line numbers in errors.
    pub fn set_line_origin(&mut self, origin: usize) {
        self.line_origin = origin;
        self.lines_seen = 0;
    }

    /// Feed one program line
    pub fn ingest(&mut self, line: &str) -> Result<Ingest, TrackError> {
        self.lines_seen += 1;

        let Some(command) = MoveCommand::parse(line) else {
            return Ok(Ingest::Ignored);
        };

        // Axis words are checked on every move, recorded or not, and applied
        // to a copy so a bad word leaves the cursor unchanged
        let mut next = self.cursor;
        for word in command.axis_words() {
            let (axis, value) =
                parse_axis_word(word).ok_or_else(|| TrackError::NumericParseFailure {
                    line_number: self.line_origin + self.lines_seen,
                    axis: word
                        .chars()
                        .next()
                        .map(|c| c.to_ascii_uppercase())
                        .unwrap_or('?'),
                    token: word.to_string(),
                    line: line.trim().to_string(),
                })?;
            next.set_axis(axis, value);
        }

        if !command.is_print_relevant() {
            return Ok(Ingest::Ignored);
        }

        self.cursor = next;
        self.history.push(next);
        Ok(Ingest::Recorded)
    }

    /// Clear the history and ingest every line of a layer in order.
    ///
    /// Returns the number of recorded moves. The first numeric failure aborts
    /// the layer and is returned.
    pub fn reset_for_layer<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<usize, TrackError> {
        self.history.clear();
        self.lines_seen = 0;
        for line in lines {
            self.ingest(line.as_ref())?;
        }
        tracing::trace!(
            recorded = self.history.len(),
            lines = lines.len(),
            "Layer tracked"
        );
        Ok(self.history.len())
    }

    /// Element-wise min/max over the recorded history
    pub fn bounding_box(&self) -> Result<BoundingBox, TrackError> {
        BoundingBox::from_points(&self.history).ok_or(TrackError::EmptyHistory)
    }

    /// Lowest and highest recorded Z of the layer
    pub fn layer_extent(&self) -> Result<LayerExtent, TrackError> {
        self.bounding_box()
            .map(|bbox| LayerExtent::from_bounding_box(&bbox))
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Result of tracking one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTrack {
    /// Recorded snapshots in program order
    pub history: Vec<Point3D>,
    /// Cursor after the last line of the layer
    pub final_cursor: Point3D,
}

impl LayerTrack {
    /// Bounding box of the recorded moves
    pub fn bounding_box(&self) -> Result<BoundingBox, TrackError> {
        BoundingBox::from_points(&self.history).ok_or(TrackError::EmptyHistory)
    }

    /// Entry and exit height of the layer
    pub fn extent(&self) -> Result<LayerExtent, TrackError> {
        self.bounding_box()
            .map(|bbox| LayerExtent::from_bounding_box(&bbox))
    }

    /// True when no move was recorded
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Track one layer's lines starting from `starting_z`.
///
/// `first_line` is the number of program lines preceding the layer and only
/// affects line numbers reported in errors.
pub fn track<S: AsRef<str>>(
    lines: &[S],
    starting_z: f64,
    first_line: usize,
) -> Result<LayerTrack, TrackError> {
    track_from(lines, Point3D::at_height(starting_z), first_line)
}

/// Track one layer's lines with the cursor starting at `start`.
///
/// Moves that only extrude (retract/prime) are recorded at the carried XY,
/// so resuming from the previous layer's final cursor keeps them in place.
pub fn track_from<S: AsRef<str>>(
    lines: &[S],
    start: Point3D,
    first_line: usize,
) -> Result<LayerTrack, TrackError> {
    let mut tracker = PositionTracker::with_cursor(start);
    tracker.set_line_origin(first_line);
    tracker.reset_for_layer(lines)?;
    let final_cursor = tracker.cursor();
    Ok(LayerTrack {
        history: tracker.into_history(),
        final_cursor,
    })
}
