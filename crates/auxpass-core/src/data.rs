//! Geometric data types
//!
//! Provides the tool position cursor and the derived geometry used when a
//! layer is replayed:
//! - `Point3D` - a tool position in machine coordinates
//! - `Offset2D` - a planar translation applied to replayed moves
//! - `BoundingBox` - element-wise extent of a set of positions
//! - `LayerExtent` - the vertical entry/exit heights of one layer

use std::fmt;

/// A tool position in 3D machine space (millimetres).
///
/// Used both as the tracker's cursor and as the snapshots stored in a
/// layer's history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Point3D {
    /// Create a new point from its three coordinates
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Point at the machine origin
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Point at the origin of the XY plane, raised to `z`
    pub const fn at_height(z: f64) -> Self {
        Self::new(0.0, 0.0, z)
    }

    /// Element-wise minimum of two points
    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Element-wise maximum of two points
    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// True when no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Shift the point in the XY plane, leaving Z untouched
    pub fn translated(&self, offset: Offset2D) -> Self {
        Self::new(self.x + offset.dx, self.y + offset.dy, self.z)
    }

    /// Set one axis by its letter (`x`, `y` or `z`, case-insensitive).
    ///
    /// Returns `false` if the letter is not an axis.
    pub fn set_axis(&mut self, axis: char, value: f64) -> bool {
        match axis.to_ascii_lowercase() {
            'x' => self.x = value,
            'y' => self.y = value,
            'z' => self.z = value,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Planar offset between the nozzle and the auxiliary tool
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset2D {
    /// Shift along X
    pub dx: f64,
    /// Shift along Y
    pub dy: f64,
}

impl Offset2D {
    /// Create a new offset
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// The identity offset
    pub const fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// True when both components are finite
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

/// Axis-aligned bounding box over a set of positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Element-wise minimum corner
    pub min: Point3D,
    /// Element-wise maximum corner
    pub max: Point3D,
}

impl BoundingBox {
    /// Create a box from explicit corners
    pub const fn new(min: Point3D, max: Point3D) -> Self {
        Self { min, max }
    }

    /// Fold a set of points into their bounding box.
    ///
    /// Returns `None` for an empty set, there is no meaningful extent.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3D>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |bbox, p| {
            Self::new(bbox.min.min(p), bbox.max.max(p))
        }))
    }

    /// Translate the box in the XY plane
    pub fn translated(&self, offset: Offset2D) -> Self {
        Self::new(self.min.translated(offset), self.max.translated(offset))
    }

    /// Grow the box by `margin` on every side of the XY plane
    pub fn expanded_xy(&self, margin: f64) -> Self {
        Self::new(
            Point3D::new(self.min.x - margin, self.min.y - margin, self.min.z),
            Point3D::new(self.max.x + margin, self.max.y + margin, self.max.z),
        )
    }

    /// Extent along X
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along Y
    pub fn depth(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// True when both corners are finite
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// Vertical span of a layer's recorded moves.
///
/// `entry_z` is the lowest recorded height and `exit_z` the highest; slicers
/// move to the next layer's height before the layer end marker, so `exit_z`
/// is where the following layer starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerExtent {
    /// Lowest Z seen in the layer
    pub entry_z: f64,
    /// Highest Z seen in the layer
    pub exit_z: f64,
}

impl LayerExtent {
    /// Derive the extent from a bounding box
    pub fn from_bounding_box(bbox: &BoundingBox) -> Self {
        Self {
            entry_z: bbox.min.z,
            exit_z: bbox.max.z,
        }
    }

    /// Height difference between exit and entry
    pub fn thickness(&self) -> f64 {
        self.exit_z - self.entry_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_of_empty_set_is_none() {
        let points: Vec<Point3D> = Vec::new();
        assert!(BoundingBox::from_points(&points).is_none());
    }

    #[test]
    fn test_bounding_box_single_point() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        let bbox = BoundingBox::from_points([&p]).unwrap();
        assert_eq!(bbox.min, p);
        assert_eq!(bbox.max, p);
        assert_eq!(bbox.width(), 0.0);
    }

    #[test]
    fn test_bounding_box_element_wise() {
        let points = [
            Point3D::new(5.0, -1.0, 0.2),
            Point3D::new(-3.0, 4.0, 0.4),
            Point3D::new(2.0, 2.0, 0.3),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, Point3D::new(-3.0, -1.0, 0.2));
        assert_eq!(bbox.max, Point3D::new(5.0, 4.0, 0.4));
    }

    #[test]
    fn test_translate_and_expand() {
        let bbox = BoundingBox::new(Point3D::new(0.0, 0.0, 0.2), Point3D::new(10.0, 5.0, 0.2));
        let moved = bbox.translated(Offset2D::new(10.0, -2.0)).expanded_xy(1.0);
        assert_eq!(moved.min, Point3D::new(9.0, -3.0, 0.2));
        assert_eq!(moved.max, Point3D::new(21.0, 4.0, 0.2));
    }

    #[test]
    fn test_set_axis() {
        let mut p = Point3D::zero();
        assert!(p.set_axis('X', 4.0));
        assert!(p.set_axis('z', 0.3));
        assert!(!p.set_axis('e', 1.0));
        assert_eq!(p, Point3D::new(4.0, 0.0, 0.3));
    }

    #[test]
    fn test_layer_extent_from_box() {
        let bbox = BoundingBox::new(Point3D::new(0.0, 0.0, 0.2), Point3D::new(1.0, 1.0, 0.4));
        let extent = LayerExtent::from_bounding_box(&bbox);
        assert_eq!(extent.entry_z, 0.2);
        assert_eq!(extent.exit_z, 0.4);
        assert!((extent.thickness() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(Point3D::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point3D::new(f64::NAN, 2.0, 3.0).is_finite());
        assert!(!Point3D::new(1.0, f64::INFINITY, 3.0).is_finite());
        assert!(!Offset2D::new(f64::NEG_INFINITY, 0.0).is_finite());
    }
}
