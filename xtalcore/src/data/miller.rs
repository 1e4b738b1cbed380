use std::fmt;
use std::fmt::{Display, Formatter};
use bincode::{Decode, Encode};
use serde::{Serialize, Deserialize};

/// Miller index (h, k, l) of a reflection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct MillerIndex {
    pub h: i32,
    pub k: i32,
    pub l: i32,
}

impl MillerIndex {
    /// Creates a new `MillerIndex`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::data::miller::MillerIndex;
    /// let hkl = MillerIndex::new(1, -2, 3);
    /// assert_eq!((hkl.h, hkl.k, hkl.l), (1, -2, 3));
    /// assert!(!hkl.is_zero());
    /// ```
    pub fn new(h: i32, k: i32, l: i32) -> Self {
        MillerIndex { h, k, l }
    }

    /// True for the (0, 0, 0) index, which marks an unassigned reflection.
    pub fn is_zero(&self) -> bool {
        self.h == 0 && self.k == 0 && self.l == 0
    }

    pub fn as_tuple(&self) -> (i32, i32, i32) {
        (self.h, self.k, self.l)
    }
}

impl From<(i32, i32, i32)> for MillerIndex {
    fn from((h, k, l): (i32, i32, i32)) -> Self {
        MillerIndex::new(h, k, l)
    }
}

impl From<MillerIndex> for (i32, i32, i32) {
    fn from(index: MillerIndex) -> Self {
        index.as_tuple()
    }
}

impl Display for MillerIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.h, self.k, self.l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zero() {
        assert!(MillerIndex::default().is_zero());
        assert!(MillerIndex::new(0, 0, 0).is_zero());
        assert!(!MillerIndex::new(0, 0, 1).is_zero());
        assert!(!MillerIndex::new(-1, 0, 0).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(MillerIndex::new(1, -2, 3).to_string(), "(1, -2, 3)");
    }

    #[test]
    fn test_tuple_conversion() {
        let hkl: MillerIndex = (4, 5, -6).into();
        let back: (i32, i32, i32) = hkl.into();
        assert_eq!(back, (4, 5, -6));
    }
}
