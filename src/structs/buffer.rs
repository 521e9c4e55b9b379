//! # **Buffer** - *Immutable shared data storage*
//!
//! `Buffer<T>` backs every typed data region in *Ragged*: primitive values in
//! [`crate::NumpyArray`], integer positions in [`crate::Index`], and the
//! packed bytes of [`crate::Bitmask`].
//!
//! ## Design
//! A buffer is a window `(offset, len)` into a reference-counted
//! [`Vec64<T>`] (64-byte aligned backing vector). Layout trees share children
//! freely, so slicing must be zero-copy and mutation must never be in-place:
//! `getitem_range` on any node reduces to [`Buffer::window`], and every
//! structural transform that actually moves data allocates a fresh backing
//! vector. Once wrapped in a `Buffer`, the backing storage is never written
//! again.

use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use vec64::Vec64;

/// Immutable, reference-counted window over a 64-byte aligned vector.
///
/// Cloning is cheap (one `Arc` bump); equality compares the viewed elements,
/// not the backing storage, so two windows over different allocations with
/// the same values are equal.
#[derive(Clone)]
pub struct Buffer<T> {
    data: Arc<Vec64<T>>,
    offset: usize,
    len: usize,
}

impl<T> Buffer<T> {
    /// Wraps an owned vector without copying.
    #[inline]
    pub fn from_vec64(v: Vec64<T>) -> Self {
        let len = v.len();
        Buffer {
            data: Arc::new(v),
            offset: 0,
            len,
        }
    }

    /// Empty buffer over a zero-length allocation.
    #[inline]
    pub fn empty() -> Self {
        Buffer::from_vec64(Vec64::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The viewed elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data[self.offset..self.offset + self.len]
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.as_slice().get(i)
    }

    /// Narrows the window. Zero-copy; shares the backing vector.
    ///
    /// Callers regularize bounds before windowing; an out-of-range request is
    /// a programmer error and panics.
    #[inline]
    pub fn window(&self, offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= self.len,
            "Buffer::window: window [{}, {}) exceeds length {}",
            offset,
            offset + len,
            self.len
        );
        Buffer {
            data: Arc::clone(&self.data),
            offset: self.offset + offset,
            len,
        }
    }
}

impl<T: Copy> Buffer<T> {
    /// Copies a slice into a fresh aligned allocation.
    pub fn from_slice(slice: &[T]) -> Self {
        let mut v = Vec64::with_capacity(slice.len());
        v.extend_from_slice(slice);
        Buffer::from_vec64(v)
    }

    /// Materialises the window into an owned vector.
    pub fn to_vec64(&self) -> Vec64<T> {
        let mut v = Vec64::with_capacity(self.len);
        v.extend_from_slice(self.as_slice());
        v
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec64<T>> for Buffer<T> {
    fn from(v: Vec64<T>) -> Self {
        Buffer::from_vec64(v)
    }
}

impl<T: Copy> From<&[T]> for Buffer<T> {
    fn from(slice: &[T]) -> Self {
        Buffer::from_slice(slice)
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Debug> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Buffer::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_and_deref() {
        let b = Buffer::from_slice(&[1i64, 2, 3, 4]);
        assert_eq!(b.len(), 4);
        assert_eq!(&b[..], &[1, 2, 3, 4]);
        assert_eq!(b.get(2), Some(&3));
        assert_eq!(b.get(4), None);
    }

    #[test]
    fn test_window_shares_storage() {
        let b = Buffer::from_slice(&[10i64, 20, 30, 40, 50]);
        let w = b.window(1, 3);
        assert_eq!(&w[..], &[20, 30, 40]);
        // Window of a window composes offsets.
        let ww = w.window(1, 1);
        assert_eq!(&ww[..], &[30]);
    }

    #[test]
    #[should_panic]
    fn test_window_out_of_range_panics() {
        let b = Buffer::from_slice(&[1i64, 2]);
        let _ = b.window(1, 2);
    }

    #[test]
    fn test_equality_is_by_contents() {
        let a = Buffer::from_slice(&[1i64, 2, 3]);
        let b = Buffer::from_slice(&[0i64, 1, 2, 3, 4]).window(1, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty() {
        let b: Buffer<i64> = Buffer::empty();
        assert!(b.is_empty());
        assert_eq!(b.as_slice(), &[] as &[i64]);
    }
}
