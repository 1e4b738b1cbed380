use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use bincode::{Decode, Encode};
use serde::{Serialize, Deserialize};

use crate::data::geometry::BoundingBox;
use crate::error::{Result, XtalError};

const MAX_PREALLOCATED: usize = 4096;

fn element_count(shape: [usize; 3]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

fn check_len(shape: [usize; 3], got: usize) -> Result<()> {
    match element_count(shape) {
        Some(expected) if expected == got => Ok(()),
        expected => Err(XtalError::InvalidShape { shape, expected, got }),
    }
}

/// Dense 3D block of per-pixel values around a reflection, stored row major in
/// `(z, y, x)` order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shoebox<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

/// Raw detector counts.
pub type IntShoebox = Shoebox<i32>;

/// Pixel weights and transformed profiles.
pub type FloatShoebox = Shoebox<f64>;

impl<T> Shoebox<T> {
    /// Creates a new `Shoebox` from a shape and row major data.
    ///
    /// # Errors
    ///
    /// Returns `XtalError::InvalidShape` if `data` does not hold exactly
    /// `shape[0] * shape[1] * shape[2]` values.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::data::shoebox::Shoebox;
    /// let sbox = Shoebox::new([1, 2, 2], vec![1, 2, 3, 4]).unwrap();
    /// assert_eq!(sbox.get(0, 1, 0), Some(&3));
    /// assert!(Shoebox::new([2, 2, 2], vec![1, 2, 3]).is_err());
    /// ```
    pub fn new(shape: [usize; 3], data: Vec<T>) -> Result<Self> {
        check_len(shape, data.len())?;
        Ok(Shoebox { shape, data })
    }

    pub fn empty() -> Self {
        Shoebox { shape: [0, 0, 0], data: Vec::new() }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, z: usize, y: usize, x: usize) -> Option<&T> {
        let [nz, ny, nx] = self.shape;
        if z >= nz || y >= ny || x >= nx {
            return None;
        }
        self.data.get((z * ny + y) * nx + x)
    }

    pub fn into_raw(self) -> ([usize; 3], Vec<T>) {
        (self.shape, self.data)
    }

    /// Checks that the shape still matches the data, for values built by
    /// serde rather than `new`.
    pub fn validate(&self) -> Result<()> {
        check_len(self.shape, self.data.len())
    }
}

impl<T: Clone + Default> Shoebox<T> {
    pub fn zeros(shape: [usize; 3]) -> Result<Self> {
        let len = element_count(shape)
            .ok_or(XtalError::InvalidShape { shape, expected: None, got: 0 })?;
        Ok(Shoebox { shape, data: vec![T::default(); len] })
    }

    /// Zero filled shoebox covering `bbox`.
    pub fn for_bounding_box(bbox: &BoundingBox) -> Result<Self> {
        let (z, y, x) = bbox.extent();
        Self::zeros([z, y, x])
    }
}

impl<T> Default for Shoebox<T> {
    fn default() -> Self {
        Shoebox::empty()
    }
}

impl<T> Display for Shoebox<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "shoebox[{}, {}, {}]", self.shape[0], self.shape[1], self.shape[2])
    }
}

// Manual bincode implementation so decoding goes through the shape check
impl<T: Encode> Encode for Shoebox<T> {
    fn encode<E: bincode::enc::Encoder>(&self, encoder: &mut E) -> std::result::Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&self.shape, encoder)?;
        bincode::Encode::encode(&self.data, encoder)?;
        Ok(())
    }
}

impl<Context, T: Decode<Context>> Decode<Context> for Shoebox<T> {
    fn decode<D: bincode::de::Decoder<Context = Context>>(decoder: &mut D) -> std::result::Result<Self, bincode::error::DecodeError> {
        let shape: [usize; 3] = bincode::Decode::decode(decoder)?;
        let len: u64 = bincode::Decode::decode(decoder)?;
        let len = usize::try_from(len).map_err(|_| bincode::error::DecodeError::OtherString(format!("shoebox length {len} does not fit in memory")))?;
        check_len(shape, len).map_err(|e| bincode::error::DecodeError::OtherString(e.to_string()))?;
        // grow as values arrive, the encoded length alone is not trusted
        let mut data = Vec::with_capacity(len.min(MAX_PREALLOCATED));
        for _ in 0..len {
            data.push(T::decode(decoder)?);
        }
        Ok(Shoebox { shape, data })
    }
}

impl<'de, Context, T: Decode<Context>> bincode::BorrowDecode<'de, Context> for Shoebox<T> {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = Context>>(decoder: &mut D) -> std::result::Result<Self, bincode::error::DecodeError> {
        <Self as Decode<Context>>::decode(decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Shoebox::new([2, 3, 4], vec![0i32; 23]).unwrap_err();
        match err {
            XtalError::InvalidShape { shape, expected, got } => {
                assert_eq!(shape, [2, 3, 4]);
                assert_eq!(expected, Some(24));
                assert_eq!(got, 23);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_row_major() {
        let data: Vec<i32> = (0..24).collect();
        let sbox = Shoebox::new([2, 3, 4], data).unwrap();
        assert_eq!(sbox.get(0, 0, 0), Some(&0));
        assert_eq!(sbox.get(0, 1, 0), Some(&4));
        assert_eq!(sbox.get(1, 0, 0), Some(&12));
        assert_eq!(sbox.get(1, 2, 3), Some(&23));
        assert_eq!(sbox.get(2, 0, 0), None);
        assert_eq!(sbox.get(0, 0, 4), None);
    }

    #[test]
    fn test_for_bounding_box() {
        let bbox = BoundingBox::new(0, 4, 0, 3, 0, 2);
        let sbox: FloatShoebox = Shoebox::for_bounding_box(&bbox).unwrap();
        assert_eq!(sbox.shape(), [2, 3, 4]);
        assert_eq!(sbox.len(), 24);
        assert!(sbox.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_default() {
        let sbox: IntShoebox = Shoebox::default();
        assert!(sbox.is_empty());
        assert_eq!(sbox.shape(), [0, 0, 0]);
        assert!(sbox.validate().is_ok());
        assert_eq!(sbox.to_string(), "shoebox[0, 0, 0]");
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let shape = [usize::MAX / 2, 4, 4];
        match Shoebox::new(shape, Vec::<i32>::new()) {
            Err(XtalError::InvalidShape { expected, got, .. }) => {
                assert_eq!(expected, None);
                assert_eq!(got, 0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(IntShoebox::zeros(shape), Err(XtalError::InvalidShape { expected: None, .. })));
        let bbox = BoundingBox::new(i32::MIN, i32::MAX, i32::MIN, i32::MAX, i32::MIN, i32::MAX);
        assert!(FloatShoebox::for_bounding_box(&bbox).is_err());

        let json = format!(r#"{{"shape":[{},4,4],"data":[]}}"#, usize::MAX / 2);
        let sbox: IntShoebox = serde_json::from_str(&json).unwrap();
        assert!(sbox.validate().is_err());
    }

    #[test]
    fn test_decode_rejects_overflowing_shape() {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(([usize::MAX / 2, 4usize, 4usize], Vec::<i32>::new()), config).unwrap();
        let decoded: std::result::Result<(IntShoebox, usize), _> = bincode::decode_from_slice(&bytes, config);
        assert!(decoded.is_err());
    }

    #[test]
    fn test_decode_huge_claimed_length_fails_cleanly() {
        let config = bincode::config::standard();
        let n = usize::MAX / 8;
        let bytes = bincode::encode_to_vec(([n, 2usize, 4usize], u64::MAX / 4), config).unwrap();
        let decoded: std::result::Result<(IntShoebox, usize), _> = bincode::decode_from_slice(&bytes, config);
        assert!(decoded.is_err());
        let bytes = bincode::encode_to_vec(([n, 1usize, 1usize], n as u64, 7i32), config).unwrap();
        let decoded: std::result::Result<(IntShoebox, usize), _> = bincode::decode_from_slice(&bytes, config);
        assert!(decoded.is_err());
    }

    #[test]
    fn test_decode_rejects_inconsistent_shape() {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(([1usize, 2usize, 2usize], vec![1i32, 2, 3]), config).unwrap();
        let decoded: std::result::Result<(IntShoebox, usize), _> = bincode::decode_from_slice(&bytes, config);
        assert!(decoded.is_err());
    }
}
