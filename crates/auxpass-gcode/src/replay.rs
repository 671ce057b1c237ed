//! Path replay
//!
//! Regenerates `G1` commands from a recorded history, in program order, and
//! builds raster grid passes over a bounding box.

use auxpass_core::{BoundingBox, Offset2D, Point3D, ReplayError};

/// Tolerance used when deciding whether the last grid row hit the boundary
const ROW_EPSILON: f64 = 1e-9;

/// Upper bound on grid rows for a single layer
pub const MAX_GRID_ROWS: usize = 100_000;

/// How recorded positions are written back out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// X, Y and Z
    Full3D,
    /// X and Y only; Z must already be set by the caller
    Planar,
    /// X and Y shifted by an offset; Z must already be set by the caller
    PlanarOffset(Offset2D),
}

fn check_feed_rate(feed_rate: f64) -> Result<(), ReplayError> {
    if !feed_rate.is_finite() || feed_rate <= 0.0 {
        return Err(ReplayError::invalid_parameter(
            "feed_rate",
            format!("must be a positive finite number, got {}", feed_rate),
        ));
    }
    Ok(())
}

fn planar_move(x: f64, y: f64, feed_rate: f64) -> String {
    format!("G1 X{:.3} Y{:.3} F{:.1}", x, y, feed_rate)
}

/// Write one `G1` per history entry at `feed_rate`
pub fn replay(
    history: &[Point3D],
    feed_rate: f64,
    projection: Projection,
) -> Result<Vec<String>, ReplayError> {
    check_feed_rate(feed_rate)?;

    history
        .iter()
        .enumerate()
        .map(|(index, pos)| {
            let pos = match projection {
                Projection::PlanarOffset(offset) => pos.translated(offset),
                _ => *pos,
            };
            if !pos.is_finite() {
                return Err(ReplayError::InvalidPosition {
                    index,
                    position: pos,
                });
            }
            Ok(match projection {
                Projection::Full3D => format!(
                    "G1 X{:.3} Y{:.3} Z{:.3} F{:.1}",
                    pos.x, pos.y, pos.z, feed_rate
                ),
                Projection::Planar | Projection::PlanarOffset(_) => {
                    planar_move(pos.x, pos.y, feed_rate)
                }
            })
        })
        .collect()
}

/// Raster pass parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPassParameters {
    /// Distance between rows, must be > 0
    pub stepover: f64,
    /// Margin added around the box on every side
    pub overhang: f64,
    /// Planar shift applied to the box before rastering
    pub offset: Offset2D,
    /// Feed rate of every generated move
    pub feed_rate: f64,
}

impl Default for GridPassParameters {
    fn default() -> Self {
        Self {
            stepover: 1.0,
            overhang: 0.0,
            offset: Offset2D::none(),
            feed_rate: 200.0,
        }
    }
}

impl GridPassParameters {
    /// Check all parameters are usable
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !self.stepover.is_finite() || self.stepover <= 0.0 {
            return Err(ReplayError::invalid_parameter(
                "stepover",
                format!("must be > 0, got {}", self.stepover),
            ));
        }
        if !self.overhang.is_finite() || self.overhang < 0.0 {
            return Err(ReplayError::invalid_parameter(
                "overhang",
                format!("must be >= 0, got {}", self.overhang),
            ));
        }
        if !self.offset.is_finite() {
            return Err(ReplayError::invalid_parameter(
                "offset",
                "must be finite".to_string(),
            ));
        }
        check_feed_rate(self.feed_rate)
    }
}

/// Row heights from `start` to `end` inclusive at `step` spacing.
///
/// The last row always lands on `end`, even when the span is not a multiple
/// of the step.
fn row_positions(start: f64, end: f64, step: f64) -> Vec<f64> {
    let span = end - start;
    let full_steps = ((span / step) + ROW_EPSILON).floor() as usize;
    let mut rows: Vec<f64> = (0..=full_steps).map(|i| start + i as f64 * step).collect();
    match rows.last_mut() {
        Some(last) if (end - *last).abs() <= ROW_EPSILON * step.max(1.0) => *last = end,
        _ => rows.push(end),
    }
    rows
}

/// Back-and-forth raster covering `bbox`.
///
/// The box is shifted by the offset and grown by the overhang; each row
/// emits two moves spanning the full X range. Even rows run from min X to
/// max X and odd rows return from max X to min X, so consecutive rows join
/// without a return traverse.
///
/// A step-over that would need [`MAX_GRID_ROWS`] rows or more to cover
/// the box fails with `InvalidParameter`.
pub fn grid_pass(
    bbox: &BoundingBox,
    params: &GridPassParameters,
) -> Result<Vec<String>, ReplayError> {
    params.validate()?;
    for (index, corner) in [bbox.min, bbox.max].into_iter().enumerate() {
        if !corner.is_finite() {
            return Err(ReplayError::InvalidPosition {
                index,
                position: corner,
            });
        }
    }

    let area = bbox.translated(params.offset).expanded_xy(params.overhang);
    let row_count = area.depth() / params.stepover;
    if !row_count.is_finite() || row_count >= MAX_GRID_ROWS as f64 {
        return Err(ReplayError::invalid_parameter(
            "stepover",
            format!(
                "{} mm needs {} rows or more to cover {:.3} mm",
                params.stepover, MAX_GRID_ROWS, area.depth()
            ),
        ));
    }
    tracing::trace!(
        width = area.width(),
        depth = area.depth(),
        rows = row_count.floor() as usize + 1,
        "Grid pass"
    );
    let rows = row_positions(area.min.y, area.max.y, params.stepover);

    let mut lines = Vec::with_capacity(rows.len() * 2);
    for (i, y) in rows.into_iter().enumerate() {
        let (from, to) = if i % 2 == 0 {
            (area.min.x, area.max.x)
        } else {
            (area.max.x, area.min.x)
        };
        lines.push(planar_move(from, y, params.feed_rate));
        lines.push(planar_move(to, y, params.feed_rate));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Point3D> {
        vec![
            Point3D::new(0.0, 0.0, 0.2),
            Point3D::new(10.0, 0.0, 0.2),
            Point3D::new(10.0, 5.5, 0.2),
        ]
    }

    #[test]
    fn test_replay_full_3d() {
        let lines = replay(&history(), 200.0, Projection::Full3D).unwrap();
        assert_eq!(
            lines,
            vec![
                "G1 X0.000 Y0.000 Z0.200 F200.0",
                "G1 X10.000 Y0.000 Z0.200 F200.0",
                "G1 X10.000 Y5.500 Z0.200 F200.0",
            ]
        );
    }

    #[test]
    fn test_replay_planar_omits_z() {
        let lines = replay(&history(), 1500.0, Projection::Planar).unwrap();
        assert_eq!(lines[2], "G1 X10.000 Y5.500 F1500.0");
        assert!(lines.iter().all(|l| !l.contains('Z')));
    }

    #[test]
    fn test_replay_planar_offset() {
        let lines = replay(
            &history(),
            200.0,
            Projection::PlanarOffset(Offset2D::new(10.0, -2.5)),
        )
        .unwrap();
        assert_eq!(lines[0], "G1 X10.000 Y-2.500 F200.0");
        assert_eq!(lines[2], "G1 X20.000 Y3.000 F200.0");
    }

    #[test]
    fn test_replay_empty_history() {
        assert!(replay(&[], 200.0, Projection::Full3D).unwrap().is_empty());
    }

    #[test]
    fn test_replay_rejects_non_finite() {
        let mut h = history();
        h[1].y = f64::NAN;
        let err = replay(&h, 200.0, Projection::Planar).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidPosition { index: 1, .. }));

        let err = replay(
            &history(),
            200.0,
            Projection::PlanarOffset(Offset2D::new(f64::INFINITY, 0.0)),
        )
        .unwrap_err();
        assert!(matches!(err, ReplayError::InvalidPosition { index: 0, .. }));
    }

    #[test]
    fn test_replay_rejects_bad_feed() {
        for feed in [0.0, -5.0, f64::NAN] {
            let err = replay(&history(), feed, Projection::Full3D).unwrap_err();
            assert!(matches!(err, ReplayError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_row_positions_exact_multiple() {
        assert_eq!(row_positions(0.0, 10.0, 5.0), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_row_positions_includes_boundary() {
        assert_eq!(row_positions(0.0, 10.0, 4.0), vec![0.0, 4.0, 8.0, 10.0]);
        assert_eq!(row_positions(2.0, 2.0, 1.0), vec![2.0]);
    }

    #[test]
    fn test_row_positions_float_steps() {
        let rows = row_positions(0.0, 1.0, 0.1);
        assert_eq!(rows.len(), 11);
        assert_eq!(*rows.last().unwrap(), 1.0);
    }

    #[test]
    fn test_grid_pass_square() {
        let bbox = BoundingBox::new(Point3D::new(0.0, 0.0, 0.2), Point3D::new(10.0, 10.0, 0.2));
        let params = GridPassParameters {
            stepover: 5.0,
            ..Default::default()
        };
        let lines = grid_pass(&bbox, &params).unwrap();
        assert_eq!(
            lines,
            vec![
                "G1 X0.000 Y0.000 F200.0",
                "G1 X10.000 Y0.000 F200.0",
                "G1 X10.000 Y5.000 F200.0",
                "G1 X0.000 Y5.000 F200.0",
                "G1 X0.000 Y10.000 F200.0",
                "G1 X10.000 Y10.000 F200.0",
            ]
        );
    }

    #[test]
    fn test_grid_pass_offset_and_overhang() {
        let bbox = BoundingBox::new(Point3D::new(0.0, 0.0, 0.2), Point3D::new(4.0, 2.0, 0.2));
        let params = GridPassParameters {
            stepover: 2.0,
            overhang: 1.0,
            offset: Offset2D::new(10.0, 10.0),
            feed_rate: 300.0,
        };
        let lines = grid_pass(&bbox, &params).unwrap();
        // rows at 9, 11, 13
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "G1 X9.000 Y9.000 F300.0");
        assert_eq!(lines[1], "G1 X15.000 Y9.000 F300.0");
        assert_eq!(lines[5], "G1 X15.000 Y13.000 F300.0");
    }

    #[test]
    fn test_grid_pass_rejects_bad_stepover() {
        let bbox = BoundingBox::new(Point3D::zero(), Point3D::new(1.0, 1.0, 0.0));
        for stepover in [0.0, -1.0] {
            let params = GridPassParameters {
                stepover,
                ..Default::default()
            };
            let err = grid_pass(&bbox, &params).unwrap_err();
            assert!(matches!(err, ReplayError::InvalidParameter { ref name, .. } if name == "stepover"));
        }
    }

    #[test]
    fn test_grid_pass_rejects_tiny_stepover() {
        let bbox = BoundingBox::new(Point3D::zero(), Point3D::new(10.0, 10.0, 0.2));
        for stepover in [1e-300, 1e-9, 5e-5] {
            let params = GridPassParameters {
                stepover,
                ..Default::default()
            };
            let err = grid_pass(&bbox, &params).unwrap_err();
            assert!(matches!(err, ReplayError::InvalidParameter { ref name, .. } if name == "stepover"));
        }

        let params = GridPassParameters {
            stepover: 0.001,
            ..Default::default()
        };
        assert_eq!(grid_pass(&bbox, &params).unwrap().len(), 2 * 10_001);
    }

    #[test]
    fn test_grid_pass_rows_alternate_direction() {
        let bbox = BoundingBox::new(Point3D::zero(), Point3D::new(10.0, 3.0, 0.2));
        let lines = grid_pass(&bbox, &GridPassParameters::default()).unwrap();
        assert_eq!(lines.len(), 8);
        for (row, pair) in lines.chunks(2).enumerate() {
            let (first, second) = if row % 2 == 0 { ("X0.000", "X10.000") } else { ("X10.000", "X0.000") };
            assert!(pair[0].contains(first), "row {}: {}", row, pair[0]);
            assert!(pair[1].contains(second), "row {}: {}", row, pair[1]);
        }
    }

    #[test]
    fn test_grid_pass_rejects_non_finite_box() {
        let bbox = BoundingBox::new(Point3D::zero(), Point3D::new(f64::INFINITY, 1.0, 0.0));
        let err = grid_pass(&bbox, &GridPassParameters::default()).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidPosition { index: 1, .. }));
    }
}
