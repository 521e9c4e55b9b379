//! # **Bitmask Module** - *Packed one-bit-per-element validity storage*
//!
//! Backing storage for [`crate::BitMaskedArray`]: eight mask flags per byte,
//! least-significant bit first. Nodes that need the mask in any other shape
//! (byte-per-element, most-significant-bit-first) expand it through the byte
//! accessors rather than mutating in place.

use std::fmt::{Debug, Formatter};

use vec64::Vec64;

use crate::structs::buffer::Buffer;

/// Immutable packed bit vector, LSB-first within each byte.
#[derive(Clone, PartialEq, Default)]
pub struct Bitmask {
    bits: Buffer<u8>,
    len: usize,
}

impl Bitmask {
    /// Wraps packed bytes. `len` is the logical bit count; trailing bits in
    /// the final byte are ignored.
    pub fn from_bytes(bits: Buffer<u8>, len: usize) -> Self {
        assert!(
            len <= bits.len() * 8,
            "Bitmask: {} bits do not fit in {} bytes",
            len,
            bits.len()
        );
        Bitmask { bits, len }
    }

    /// All bits set to `value`.
    pub fn new_set_all(len: usize, value: bool) -> Self {
        let nbytes = len.div_ceil(8);
        let mut v = Vec64::with_capacity(nbytes);
        v.resize(nbytes, if value { 0xFF } else { 0x00 });
        Bitmask {
            bits: Buffer::from_vec64(v),
            len,
        }
    }

    /// Packs a slice of booleans, LSB-first.
    pub fn from_bools(values: &[bool]) -> Self {
        let nbytes = values.len().div_ceil(8);
        let mut v = Vec64::with_capacity(nbytes);
        v.resize(nbytes, 0u8);
        for (i, &b) in values.iter().enumerate() {
            if b {
                v[i / 8] |= 1 << (i % 8);
            }
        }
        Bitmask {
            bits: Buffer::from_vec64(v),
            len: values.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at position `i`, LSB-first. Caller guarantees `i < len()`.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        (self.bits[i / 8] >> (i % 8)) & 1 != 0
    }

    /// The packed bytes, including any unused trailing bits.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.bits.as_slice()
    }

    pub fn count_ones(&self) -> usize {
        (0..self.len).filter(|&i| self.get(i)).count()
    }

    /// Expands to one byte per element, reading bits in the given order
    /// within each byte.
    pub fn to_bools(&self, lsb_order: bool) -> Vec<bool> {
        (0..self.len)
            .map(|i| {
                let shift = if lsb_order { i % 8 } else { 7 - i % 8 };
                (self.bits[i / 8] >> shift) & 1 != 0
            })
            .collect()
    }
}

impl Debug for Bitmask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries((0..self.len).map(|i| self.get(i) as u8))
            .finish()
    }
}
