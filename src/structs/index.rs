//! # **Index Module** - *Typed integer views for layout nodes*
//!
//! An [`Index`] is a thin, immutable view over a contiguous integer buffer:
//! list offsets, starts/stops, projection indexes, union tags, and byte
//! masks. All positional arithmetic in the crate is signed 64-bit
//! ([`Index64`]); [`Index8`] exists for union tags and byte masks, where a
//! full word per element would triple memory traffic for no benefit.
//!
//! The value `-1` is a sentinel meaning "missing", and is only legal where
//! the owning node documents option semantics (`IndexedArray` with
//! `is_option`, the out-index of option projections).

use std::fmt::{Debug, Display, Formatter};

use num_traits::PrimInt;
use vec64::Vec64;

use crate::structs::buffer::Buffer;

/// Integer types usable as index storage.
pub trait IndexInt: PrimInt + Debug + Display + Default + 'static {
    fn to_i64(self) -> i64;
    fn from_i64(v: i64) -> Self;
}

impl IndexInt for i8 {
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v as i8
    }
}

impl IndexInt for i64 {
    #[inline]
    fn to_i64(self) -> i64 {
        self
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v
    }
}

/// Immutable typed integer view.
///
/// Windowing is zero-copy: `ListOffsetArray::starts()` and `stops()` are both
/// windows over the same offsets buffer, shifted by one element.
#[derive(Clone, PartialEq, Default)]
pub struct Index<T: IndexInt> {
    data: Buffer<T>,
}

/// Index over `i8` (union tags, byte masks).
pub type Index8 = Index<i8>;
/// Index over `i64` (offsets, starts/stops, projections, carries).
pub type Index64 = Index<i64>;

impl<T: IndexInt> Index<T> {
    #[inline]
    pub fn new(data: Buffer<T>) -> Self {
        Index { data }
    }

    #[inline]
    pub fn empty() -> Self {
        Index {
            data: Buffer::empty(),
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        Index {
            data: Buffer::from_slice(values),
        }
    }

    pub fn from_vec64(values: Vec64<T>) -> Self {
        Index {
            data: Buffer::from_vec64(values),
        }
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.data.len() as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `i`, widened to `i64`. Caller guarantees `0 <= i < len()`.
    #[inline]
    pub fn get(&self, i: i64) -> i64 {
        debug_assert!(0 <= i && i < self.len());
        self.data[i as usize].to_i64()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Zero-copy sub-view.
    #[inline]
    pub fn window(&self, offset: i64, len: i64) -> Self {
        Index {
            data: self.data.window(offset as usize, len as usize),
        }
    }

    pub fn iter_i64(&self) -> impl Iterator<Item = i64> + '_ {
        self.data.iter().map(|v| IndexInt::to_i64(*v))
    }

    pub fn to_vec_i64(&self) -> Vec<i64> {
        self.iter_i64().collect()
    }
}

impl Index64 {
    /// The identity gather: `[0, 1, ..., len-1]`.
    pub fn arange(len: i64) -> Self {
        let mut v = Vec64::with_capacity(len.max(0) as usize);
        for i in 0..len.max(0) {
            v.push(i);
        }
        Index::from_vec64(v)
    }

    pub fn zeros(len: i64) -> Self {
        let mut v = Vec64::with_capacity(len.max(0) as usize);
        v.resize(len.max(0) as usize, 0);
        Index::from_vec64(v)
    }

    pub fn full(value: i64, len: i64) -> Self {
        let mut v = Vec64::with_capacity(len.max(0) as usize);
        v.resize(len.max(0) as usize, value);
        Index::from_vec64(v)
    }
}

impl<T: IndexInt> Debug for Index<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Index{}", std::mem::size_of::<T>() * 8)?;
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T: IndexInt> Display for Index<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_and_get() {
        let idx = Index64::arange(5);
        assert_eq!(idx.len(), 5);
        assert_eq!(idx.get(0), 0);
        assert_eq!(idx.get(4), 4);
    }

    #[test]
    fn test_window_offsets_to_starts_stops() {
        // offsets [0, 3, 3, 5] -> starts [0, 3, 3], stops [3, 3, 5]
        let offsets = Index64::from_slice(&[0, 3, 3, 5]);
        let starts = offsets.window(0, 3);
        let stops = offsets.window(1, 3);
        assert_eq!(starts.to_vec_i64(), vec![0, 3, 3]);
        assert_eq!(stops.to_vec_i64(), vec![3, 3, 5]);
    }

    #[test]
    fn test_index8_widens() {
        let tags = Index8::from_slice(&[0, 1, 1, 0]);
        assert_eq!(tags.get(1), 1);
        assert_eq!(tags.to_vec_i64(), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_zeros_full_negative_len() {
        assert_eq!(Index64::zeros(-3).len(), 0);
        assert_eq!(Index64::full(7, 2).to_vec_i64(), vec![7, 7]);
    }

    #[test]
    fn test_display() {
        let idx = Index64::from_slice(&[2, -1, 0]);
        assert_eq!(format!("{}", idx), "[2, -1, 0]");
    }
}
