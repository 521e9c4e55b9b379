//! # **Missing-Value Kernels** - *Loops over option-type indexes and masks*
//!
//! Option-type nodes all reduce to one representation for computation: a
//! projection index with `-1` for missing. These kernels convert masks to
//! that form, split an option index into a dense carry plus an out-index,
//! and compose stacked option layers into one.

use vec64::Vec64;

use crate::enums::error::KernelError;
use crate::structs::index::{Index8, Index64};

/// Number of missing (negative) entries.
pub fn numnull(index: &Index64) -> i64 {
    (0..index.len()).filter(|&i| index.get(i) < 0).count() as i64
}

/// Splits an option index into `(nextcarry, outindex)`.
///
/// `nextcarry` gathers the valid content positions, in element order;
/// `outindex[i]` is `-1` for missing elements and otherwise the position of
/// element `i`'s value within the gathered content. Recursing on the carried
/// content and rewrapping with `outindex` preserves option semantics while
/// the recursion only ever sees dense data.
pub fn nextcarry_outindex(index: &Index64) -> (Vec64<i64>, Vec64<i64>) {
    let mut nextcarry = Vec64::new();
    let mut outindex = Vec64::with_capacity(index.len() as usize);
    for i in 0..index.len() {
        let v = index.get(i);
        if v < 0 {
            outindex.push(-1);
        } else {
            outindex.push(nextcarry.len() as i64);
            nextcarry.push(v);
        }
    }
    (nextcarry, outindex)
}

/// Gathers an option index by a carry; `-1` entries pass through.
pub fn index_carry(index: &Index64, carry: &[i64]) -> Result<Vec64<i64>, KernelError> {
    let mut out = Vec64::with_capacity(carry.len());
    for (i, &c) in carry.iter().enumerate() {
        if c < 0 || c >= index.len() {
            return Err(KernelError::index("carry index out of range", i as i64, c));
        }
        out.push(index.get(c));
    }
    Ok(out)
}

/// Composes two stacked projection layers into one index.
///
/// `outer` projects into an inner node of length `inner.len()`; missing
/// entries in either layer are missing in the result.
pub fn simplify_index(
    outer: &Index64,
    inner: &Index64,
) -> Result<Vec64<i64>, KernelError> {
    let mut out = Vec64::with_capacity(outer.len() as usize);
    for i in 0..outer.len() {
        let o = outer.get(i);
        if o < 0 {
            out.push(-1);
        } else if o >= inner.len() {
            return Err(KernelError::index("index out of range for inner index", i, o));
        } else {
            out.push(inner.get(o));
        }
    }
    Ok(out)
}

/// Converts a byte mask to an option index: valid elements project to
/// themselves, masked elements to `-1`.
pub fn bytemask_to_index(mask: &Index8, valid_when: bool) -> Vec64<i64> {
    let mut out = Vec64::with_capacity(mask.len() as usize);
    for i in 0..mask.len() {
        if (mask.get(i) != 0) == valid_when {
            out.push(i);
        } else {
            out.push(-1);
        }
    }
    out
}

/// An option index as a byte mask: `1` where valid.
pub fn index_to_bytemask(index: &Index64) -> Vec64<i8> {
    let mut out = Vec64::with_capacity(index.len() as usize);
    for i in 0..index.len() {
        out.push((index.get(i) >= 0) as i8);
    }
    out
}

/// Tags and index for replacing missing values with a fill value: tag `0`
/// selects the dense valid content, tag `1` selects the (length-1) fill.
pub fn fillna_tags_index(index: &Index64) -> (Vec64<i8>, Vec64<i64>) {
    let mut tags = Vec64::with_capacity(index.len() as usize);
    let mut outindex = Vec64::with_capacity(index.len() as usize);
    let mut valid = 0i64;
    for i in 0..index.len() {
        if index.get(i) < 0 {
            tags.push(1);
            outindex.push(0);
        } else {
            tags.push(0);
            outindex.push(valid);
            valid += 1;
        }
    }
    (tags, outindex)
}
