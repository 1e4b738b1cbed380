use std::fmt;
use std::fmt::{Display, Formatter};
use bincode::{Decode, Encode};
use nalgebra::{Vector2, Vector3};
use serde::{Serialize, Deserialize};

pub type Vec3 = Vector3<f64>;
pub type Vec2 = Vector2<f64>;

/// Pixel bounding box of a reflection on the detector, half open on every axis.
///
/// Stored in the conventional `(x0, x1, y0, y1, z0, z1)` order, where x and y are
/// the fast and slow detector axes and z is the frame axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct BoundingBox {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
    pub z0: i32,
    pub z1: i32,
}

impl BoundingBox {
    /// Creates a new `BoundingBox`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::data::geometry::BoundingBox;
    /// let bbox = BoundingBox::new(0, 8, 1022, 1036, 1070, 1083);
    /// assert_eq!(bbox.extent(), (13, 14, 8));
    /// assert_eq!(bbox.volume(), 13 * 14 * 8);
    /// ```
    pub fn new(x0: i32, x1: i32, y0: i32, y1: i32, z0: i32, z1: i32) -> Self {
        BoundingBox { x0, x1, y0, y1, z0, z1 }
    }

    /// Side lengths as `(z, y, x)`, the layout a shoebox for this box uses.
    /// Inverted sides count as zero.
    pub fn extent(&self) -> (usize, usize, usize) {
        let side = |lo: i32, hi: i32| (hi as i64 - lo as i64).max(0) as usize;
        (side(self.z0, self.z1), side(self.y0, self.y1), side(self.x0, self.x1))
    }

    pub fn is_empty(&self) -> bool {
        let (z, y, x) = self.extent();
        z == 0 || y == 0 || x == 0
    }

    pub fn volume(&self) -> usize {
        let (z, y, x) = self.extent();
        z * y * x
    }

    pub fn as_tuple(&self) -> (i32, i32, i32, i32, i32, i32) {
        (self.x0, self.x1, self.y0, self.y1, self.z0, self.z1)
    }
}

impl From<(i32, i32, i32, i32, i32, i32)> for BoundingBox {
    fn from((x0, x1, y0, y1, z0, z1): (i32, i32, i32, i32, i32, i32)) -> Self {
        BoundingBox::new(x0, x1, y0, y1, z0, z1)
    }
}

impl From<BoundingBox> for (i32, i32, i32, i32, i32, i32) {
    fn from(bbox: BoundingBox) -> Self {
        bbox.as_tuple()
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {}, {}, {})", self.x0, self.x1, self.y0, self.y1, self.z0, self.z1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_is_z_y_x() {
        let bbox = BoundingBox::new(10, 14, 20, 23, 5, 7);
        assert_eq!(bbox.extent(), (2, 3, 4));
        assert_eq!(bbox.volume(), 24);
        assert!(!bbox.is_empty());
    }

    #[test]
    fn test_inverted_box_is_empty() {
        let bbox = BoundingBox::new(10, 4, 0, 3, 0, 1);
        assert_eq!(bbox.extent(), (1, 3, 0));
        assert_eq!(bbox.volume(), 0);
        assert!(bbox.is_empty());
        assert!(BoundingBox::default().is_empty());
    }

    #[test]
    fn test_tuple_order() {
        let bbox: BoundingBox = (1, 2, 3, 4, 5, 6).into();
        assert_eq!(bbox.x0, 1);
        assert_eq!(bbox.y1, 4);
        assert_eq!(bbox.z1, 6);
        assert_eq!(bbox.to_string(), "(1, 2, 3, 4, 5, 6)");
    }
}
