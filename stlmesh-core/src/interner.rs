/// Exact-value vertex deduplication
use std::collections::hash_map::Entry;

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Canonical identity of a point: the raw bits of its three coordinates.
///
/// Two points are the same vertex only if every coordinate has the same bit
/// pattern, so `0.0` and `-0.0` stay distinct while identical NaNs collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey([u32; 3]);

impl PointKey {
    pub fn of(point: &Point3<f32>) -> Self {
        Self([point.x.to_bits(), point.y.to_bits(), point.z.to_bits()])
    }
}

/// Assigns dense, first-seen indices to distinct points.
///
/// Indices run `0..len()` with no gaps and never change once assigned; at
/// most `u32::MAX + 1` distinct points fit. The interner only stores keys;
/// the caller keeps the point values in the same order, which makes that
/// buffer the index space.
#[derive(Debug, Default)]
pub struct VertexInterner {
    indices: FxHashMap<PointKey, u32>,
}

impl VertexInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Return the index for `point`, and whether it was assigned just now.
    ///
    /// `None` once every `u32` index is taken and `point` is new.
    pub fn intern(&mut self, point: &Point3<f32>) -> Option<(u32, bool)> {
        let len = self.indices.len();
        match self.indices.entry(PointKey::of(point)) {
            Entry::Occupied(entry) => Some((*entry.get(), false)),
            Entry::Vacant(entry) => {
                let index = next_index(len)?;
                entry.insert(index);
                Some((index, true))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.indices.capacity()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve(additional);
    }

    /// Forget every point but keep the allocation.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Forget every point and hand the allocation back.
    pub fn release(&mut self) {
        self.indices = FxHashMap::default();
    }
}

fn next_index(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense_in_first_seen_order() {
        let mut interner = VertexInterner::new();
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 5.0, 6.0);

        assert_eq!(interner.intern(&a), Some((0, true)));
        assert_eq!(interner.intern(&b), Some((1, true)));
        assert_eq!(interner.intern(&a), Some((0, false)));
        assert_eq!(interner.intern(&b), Some((1, false)));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_signed_zero_is_a_distinct_point() {
        let mut interner = VertexInterner::new();
        interner.intern(&Point3::new(0.0, 0.0, 0.0));
        let (index, inserted) = interner.intern(&Point3::new(-0.0, 0.0, 0.0)).unwrap();
        assert_eq!(index, 1);
        assert!(inserted);
    }

    #[test]
    fn test_identical_nan_bits_collapse() {
        let mut interner = VertexInterner::new();
        let p = Point3::new(f32::NAN, 1.0, 1.0);
        interner.intern(&p);
        assert_eq!(interner.intern(&p), Some((0, false)));
    }

    #[test]
    fn test_index_space_ends_at_u32_max() {
        assert_eq!(next_index(0), Some(0));
        assert_eq!(next_index(u32::MAX as usize), Some(u32::MAX));
        assert_eq!(next_index(u32::MAX as usize + 1), None);
    }

    #[test]
    fn test_release_drops_allocation() {
        let mut interner = VertexInterner::with_capacity(1024);
        interner.intern(&Point3::new(1.0, 1.0, 1.0));
        interner.clear();
        assert!(interner.is_empty());
        assert!(interner.capacity() >= 1024);

        interner.release();
        assert!(interner.is_empty());
        assert_eq!(interner.capacity(), 0);
    }
}
