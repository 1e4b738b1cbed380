use std::ops::Index;
use bincode::{Decode, Encode};
use serde::{Serialize, Deserialize};

use crate::data::reflection::Reflection;
use crate::error::{Result, XtalError};

/// Version written in front of every encoded list.
pub const REFLECTION_LIST_FORMAT_VERSION: u32 = 1;

/// Ordered, growable collection of reflections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ReflectionList {
    reflections: Vec<Reflection>,
}

impl ReflectionList {
    pub fn new() -> Self {
        ReflectionList { reflections: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ReflectionList { reflections: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.reflections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Reflection> {
        self.reflections.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Reflection> {
        self.reflections.get_mut(index)
    }

    pub fn set(&mut self, index: usize, reflection: Reflection) -> Result<()> {
        let len = self.len();
        let slot = self.reflections.get_mut(index).ok_or(XtalError::IndexOutOfRange { index, len })?;
        *slot = reflection;
        Ok(())
    }

    pub fn push(&mut self, reflection: Reflection) {
        self.reflections.push(reflection);
    }

    /// Inserts before `index`; an index past the end appends.
    pub fn insert(&mut self, index: usize, reflection: Reflection) {
        let index = index.min(self.len());
        self.reflections.insert(index, reflection);
    }

    pub fn remove(&mut self, index: usize) -> Result<Reflection> {
        if index >= self.len() {
            return Err(XtalError::IndexOutOfRange { index, len: self.len() });
        }
        Ok(self.reflections.remove(index))
    }

    pub fn pop(&mut self) -> Option<Reflection> {
        self.reflections.pop()
    }

    pub fn clear(&mut self) {
        self.reflections.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reflection> {
        self.reflections.iter()
    }

    pub fn as_slice(&self) -> &[Reflection] {
        &self.reflections
    }

    pub fn validate(&self) -> Result<()> {
        self.reflections.iter().try_for_each(Reflection::validate)
    }

    /// Encodes the whole list into one versioned buffer.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use xtalcore::data::reflection_list::ReflectionList;
    /// # use xtalcore::data::reflection::Reflection;
    /// # use xtalcore::data::miller::MillerIndex;
    /// let list: ReflectionList = vec![Reflection::new(MillerIndex::new(1, 0, 0))].into_iter().collect();
    /// let bytes = list.to_bytes().unwrap();
    /// assert_eq!(ReflectionList::from_bytes(&bytes).unwrap(), list);
    /// ```
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec((REFLECTION_LIST_FORMAT_VERSION, self), config)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard();
        let (version, read): (u32, usize) = bincode::decode_from_slice(bytes, config)?;
        if version != REFLECTION_LIST_FORMAT_VERSION {
            return Err(XtalError::UnsupportedVersion { found: version, expected: REFLECTION_LIST_FORMAT_VERSION });
        }
        let mut offset = read;
        let (count, read): (u64, usize) = bincode::decode_from_slice(&bytes[offset..], config)?;
        offset += read;
        // every record takes at least one byte
        let count = usize::try_from(count)
            .ok()
            .filter(|&n| n <= bytes.len() - offset)
            .ok_or_else(|| corrupt(format!("record count {count} exceeds the {} remaining bytes", bytes.len() - offset)))?;

        let mut reflections = Vec::new();
        for _ in 0..count {
            let (reflection, read): (Reflection, usize) = bincode::decode_from_slice(&bytes[offset..], config)?;
            offset += read;
            reflections.push(reflection);
        }
        if offset != bytes.len() {
            return Err(corrupt(format!("{} trailing bytes after {count} records", bytes.len() - offset)));
        }
        Ok(ReflectionList { reflections })
    }
}

fn corrupt(msg: String) -> XtalError {
    XtalError::Decode(bincode::error::DecodeError::OtherString(msg))
}

impl Index<usize> for ReflectionList {
    type Output = Reflection;

    fn index(&self, index: usize) -> &Self::Output {
        &self.reflections[index]
    }
}

impl From<Vec<Reflection>> for ReflectionList {
    fn from(reflections: Vec<Reflection>) -> Self {
        ReflectionList { reflections }
    }
}

impl FromIterator<Reflection> for ReflectionList {
    fn from_iter<I: IntoIterator<Item = Reflection>>(iter: I) -> Self {
        ReflectionList { reflections: iter.into_iter().collect() }
    }
}

impl Extend<Reflection> for ReflectionList {
    fn extend<I: IntoIterator<Item = Reflection>>(&mut self, iter: I) {
        self.reflections.extend(iter);
    }
}

impl IntoIterator for ReflectionList {
    type Item = Reflection;
    type IntoIter = std::vec::IntoIter<Reflection>;

    fn into_iter(self) -> Self::IntoIter {
        self.reflections.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReflectionList {
    type Item = &'a Reflection;
    type IntoIter = std::slice::Iter<'a, Reflection>;

    fn into_iter(self) -> Self::IntoIter {
        self.reflections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::{BoundingBox, Vec3};
    use crate::data::miller::MillerIndex;
    use crate::data::shoebox::Shoebox;

    fn indexed(h: i32) -> Reflection {
        Reflection::new(MillerIndex::new(h, 0, 0))
    }

    #[test]
    fn test_sequence_operations() {
        let mut list = ReflectionList::new();
        assert!(list.is_empty());
        list.push(indexed(1));
        list.push(indexed(3));
        list.insert(1, indexed(2));
        list.insert(100, indexed(4));
        let hs: Vec<i32> = list.iter().map(|r| r.miller_index().h).collect();
        assert_eq!(hs, vec![1, 2, 3, 4]);

        let removed = list.remove(0).unwrap();
        assert_eq!(removed.miller_index().h, 1);
        assert_eq!(list.pop().map(|r| r.miller_index().h), Some(4));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].miller_index().h, 2);

        list.clear();
        assert!(list.is_empty());
        assert!(list.pop().is_none());
    }

    #[test]
    fn test_out_of_range() {
        let mut list: ReflectionList = vec![indexed(1)].into();
        assert!(matches!(list.remove(1), Err(XtalError::IndexOutOfRange { index: 1, len: 1 })));
        assert!(matches!(list.set(3, indexed(2)), Err(XtalError::IndexOutOfRange { index: 3, len: 1 })));
        list.set(0, indexed(9)).unwrap();
        assert_eq!(list[0].miller_index().h, 9);
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut list: ReflectionList = (1..=3).map(indexed).collect();
        if let Some(r) = list.get_mut(2) {
            r.set_panel_number(7);
        }
        assert_eq!(list.get(2).map(|r| r.panel_number()), Some(7));
        assert!(list.get(3).is_none());
    }

    #[test]
    fn test_bytes_keep_records() {
        let mut r = indexed(5);
        r.set_bounding_box(BoundingBox::new(0, 2, 0, 2, 0, 1));
        r.set_centroid_position(Vec3::new(1.0, 1.0, 0.5));
        r.set_shoebox(Shoebox::new([1, 2, 2], vec![3, 1, 4, 1]).unwrap());
        let list: ReflectionList = vec![r, indexed(-1), Reflection::default()].into();

        let bytes = list.to_bytes().unwrap();
        let decoded = ReflectionList::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_empty_list_bytes() {
        let bytes = ReflectionList::new().to_bytes().unwrap();
        assert!(ReflectionList::from_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_from_bytes_rejects_unknown_version() {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec((99u32, ReflectionList::new()), config).unwrap();
        match ReflectionList::from_bytes(&bytes) {
            Err(XtalError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, REFLECTION_LIST_FORMAT_VERSION);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_bytes_rejects_truncated_buffer() {
        let list: ReflectionList = (0..4).map(indexed).collect();
        let bytes = list.to_bytes().unwrap();
        assert!(matches!(
            ReflectionList::from_bytes(&bytes[..bytes.len() - 3]),
            Err(XtalError::Decode(_))
        ));
        assert!(matches!(ReflectionList::from_bytes(&[]), Err(XtalError::Decode(_))));
    }

    #[test]
    fn test_from_bytes_rejects_oversized_count() {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec((REFLECTION_LIST_FORMAT_VERSION, u64::MAX / 4), config).unwrap();
        assert!(matches!(ReflectionList::from_bytes(&bytes), Err(XtalError::Decode(_))));
    }

    #[test]
    fn test_from_bytes_rejects_oversized_shoebox_length() {
        let config = bincode::config::standard();
        // a default record ends with three empty shoeboxes, each shape [0, 0, 0] plus length 0
        let mut record = bincode::encode_to_vec(Reflection::default(), config).unwrap();
        record.truncate(record.len() - 4);
        record.extend(bincode::encode_to_vec(([1usize, 1usize, 1usize], u64::MAX / 4), config).unwrap());

        let mut bytes = bincode::encode_to_vec((REFLECTION_LIST_FORMAT_VERSION, 1u64), config).unwrap();
        bytes.extend(record);
        assert!(matches!(ReflectionList::from_bytes(&bytes), Err(XtalError::Decode(_))));
    }

    #[test]
    fn test_from_bytes_rejects_trailing_bytes() {
        let list: ReflectionList = (0..2).map(indexed).collect();
        let mut bytes = list.to_bytes().unwrap();
        bytes.extend([1u8, 2, 3, 4]);
        assert!(matches!(ReflectionList::from_bytes(&bytes), Err(XtalError::Decode(_))));
    }
}
