//! # **Getitem Kernels** - *Flat-buffer loops behind slice resolution*
//!
//! Every slice resolution step bottoms out here: tight loops over integer
//! buffers that turn (starts, stops, slice item) into a carry index for the
//! next level down, plus whatever offsets are needed to rebuild list
//! structure above it. Kernels know nothing about layout nodes; they report
//! failures as [`KernelError`] and the calling node attaches its class name
//! via [`crate::utils::handle_error`].
//!
//! Conventions:
//! - a *carry* is a buffer of element positions into the next level's content;
//! - negative user indices wrap exactly once, then bounds-check;
//! - `advanced` is the per-row position into broadcast fancy-indexes once one
//!   has been consumed (NumPy's rule that multiple fancy-indexes iterate in
//!   lock-step).

use vec64::Vec64;

use crate::enums::error::KernelError;
use crate::structs::index::Index64;

#[inline]
fn wrap(index: i64, length: i64) -> i64 {
    if index < 0 { index + length } else { index }
}

/// Wraps and bounds-checks every entry of a fancy-index against `length`.
pub fn regularize_index(flat: &Index64, length: i64) -> Result<Vec64<i64>, KernelError> {
    let mut out = Vec64::with_capacity(flat.len() as usize);
    for i in 0..flat.len() {
        let raw = flat.get(i);
        let reg = wrap(raw, length);
        if reg < 0 || reg >= length {
            return Err(KernelError::index("index out of range", i, raw));
        }
        out.push(reg);
    }
    Ok(out)
}

/// Resolves `start:stop:step` against a dimension of `length` elements,
/// following Python semantics (wrap once, clamp, never error).
///
/// Returns `(first, count)`: the selected positions are
/// `first, first + step, ..., first + (count-1) * step`.
pub fn resolve_range(
    length: i64,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> (i64, i64) {
    debug_assert!(step != 0);
    if step > 0 {
        let first = match start {
            None => 0,
            Some(v) => wrap(v, length).clamp(0, length),
        };
        let last = match stop {
            None => length,
            Some(v) => wrap(v, length).clamp(0, length),
        };
        let count = if last > first {
            (last - first + step - 1) / step
        } else {
            0
        };
        (first, count)
    } else {
        let first = match start {
            None => length - 1,
            Some(v) => wrap(v, length).clamp(-1, length - 1),
        };
        let last = match stop {
            None => -1,
            Some(v) => wrap(v, length).clamp(-1, length - 1),
        };
        let count = if last < first {
            (last - first + step + 1) / step
        } else {
            0
        };
        (first, count)
    }
}

/// Gathers an index by a carry produced internally (already in range).
pub fn carry_index(from: &Index64, carry: &[i64]) -> Vec64<i64> {
    let mut out = Vec64::with_capacity(carry.len());
    for &c in carry {
        debug_assert!(0 <= c && c < from.len());
        out.push(from.get(c));
    }
    out
}

/// Integer head against a list dimension: one selected element per row.
pub fn list_next_at(
    starts: &Index64,
    stops: &Index64,
    at: i64,
) -> Result<Vec64<i64>, KernelError> {
    let mut nextcarry = Vec64::with_capacity(starts.len() as usize);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        let reg = wrap(at, rowlen);
        if reg < 0 || reg >= rowlen {
            return Err(KernelError::index("index out of range", i, at));
        }
        nextcarry.push(starts.get(i) + reg);
    }
    Ok(nextcarry)
}

/// Range head against a list dimension: per-row clamped sub-ranges.
///
/// Returns `(offsets, nextcarry)`: `offsets` delimits the selection per row
/// and `nextcarry` flattens it.
pub fn list_next_range(
    starts: &Index64,
    stops: &Index64,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> (Vec64<i64>, Vec64<i64>) {
    let mut offsets = Vec64::with_capacity(starts.len() as usize + 1);
    let mut nextcarry = Vec64::new();
    offsets.push(0);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        let (first, count) = resolve_range(rowlen, start, stop, step);
        for k in 0..count {
            nextcarry.push(starts.get(i) + first + k * step);
        }
        offsets.push(nextcarry.len() as i64);
    }
    (offsets, nextcarry)
}

/// Replicates a per-row advanced position across that row's range selection.
pub fn spread_advanced(fromadvanced: &Index64, offsets: &[i64]) -> Vec64<i64> {
    let rows = offsets.len() - 1;
    let mut out = Vec64::with_capacity(offsets[rows].max(0) as usize);
    for i in 0..rows {
        for _ in offsets[i]..offsets[i + 1] {
            out.push(fromadvanced.get(i as i64));
        }
    }
    out
}

/// Fancy-index head against a list dimension, no advanced context yet: the
/// full index applies to every row, and positions within the index become
/// the new advanced context.
pub fn list_next_array(
    starts: &Index64,
    stops: &Index64,
    flat: &Index64,
) -> Result<(Vec64<i64>, Vec64<i64>), KernelError> {
    let flatlen = flat.len();
    let mut nextcarry = Vec64::with_capacity((starts.len() * flatlen) as usize);
    let mut nextadvanced = Vec64::with_capacity((starts.len() * flatlen) as usize);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        for j in 0..flatlen {
            let raw = flat.get(j);
            let reg = wrap(raw, rowlen);
            if reg < 0 || reg >= rowlen {
                return Err(KernelError::index("index out of range", i, raw));
            }
            nextcarry.push(starts.get(i) + reg);
            nextadvanced.push(j);
        }
    }
    Ok((nextcarry, nextadvanced))
}

/// Fancy-index head against a list dimension inside an advanced context:
/// each row takes the single index entry its advanced position selects.
pub fn list_next_array_advanced(
    starts: &Index64,
    stops: &Index64,
    flat: &Index64,
    advanced: &Index64,
) -> Result<Vec64<i64>, KernelError> {
    let mut nextcarry = Vec64::with_capacity(starts.len() as usize);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        let raw = flat.get(advanced.get(i));
        let reg = wrap(raw, rowlen);
        if reg < 0 || reg >= rowlen {
            return Err(KernelError::index("index out of range", i, raw));
        }
        nextcarry.push(starts.get(i) + reg);
    }
    Ok(nextcarry)
}

/// Integer head against a regular dimension.
pub fn regular_next_at(
    at: i64,
    size: i64,
    length: i64,
) -> Result<Vec64<i64>, KernelError> {
    let reg = wrap(at, size);
    if reg < 0 || reg >= size {
        return Err(KernelError::index("index out of range", 0, at));
    }
    let mut nextcarry = Vec64::with_capacity(length as usize);
    for i in 0..length {
        nextcarry.push(i * size + reg);
    }
    Ok(nextcarry)
}

/// Range head against a regular dimension; every row selects the same
/// positions, so the result stays regular with size `nextsize`.
pub fn regular_next_range(
    size: i64,
    length: i64,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> (i64, Vec64<i64>) {
    let (first, count) = resolve_range(size, start, stop, step);
    let mut nextcarry = Vec64::with_capacity((length * count) as usize);
    for i in 0..length {
        for k in 0..count {
            nextcarry.push(i * size + first + k * step);
        }
    }
    (count, nextcarry)
}

/// Fancy-index head against a regular dimension, no advanced context.
pub fn regular_next_array(
    flat: &Index64,
    size: i64,
    length: i64,
) -> Result<(Vec64<i64>, Vec64<i64>), KernelError> {
    let regularized = regularize_index(flat, size)?;
    let flatlen = regularized.len() as i64;
    let mut nextcarry = Vec64::with_capacity((length * flatlen) as usize);
    let mut nextadvanced = Vec64::with_capacity((length * flatlen) as usize);
    for i in 0..length {
        for (j, &reg) in regularized.iter().enumerate() {
            nextcarry.push(i * size + reg);
            nextadvanced.push(j as i64);
        }
    }
    Ok((nextcarry, nextadvanced))
}

/// Fancy-index head against a regular dimension inside an advanced context.
pub fn regular_next_array_advanced(
    flat: &Index64,
    advanced: &Index64,
    size: i64,
    length: i64,
) -> Result<Vec64<i64>, KernelError> {
    let mut nextcarry = Vec64::with_capacity(length as usize);
    for i in 0..length {
        let raw = flat.get(advanced.get(i));
        let reg = wrap(raw, size);
        if reg < 0 || reg >= size {
            return Err(KernelError::index("index out of range", i, raw));
        }
        nextcarry.push(i * size + reg);
    }
    Ok(nextcarry)
}

/// Fits a single-row jagged slice onto a regular dimension, replicating it
/// across `length` rows.
pub fn jagged_expand(
    singleoffsets: &Index64,
    size: i64,
    length: i64,
) -> Result<(Vec64<i64>, Vec64<i64>), KernelError> {
    if singleoffsets.len() - 1 != size {
        return Err(KernelError::value(
            "cannot fit jagged slice into regular dimension of different length",
            None,
        ));
    }
    let mut multistarts = Vec64::with_capacity((length * size) as usize);
    let mut multistops = Vec64::with_capacity((length * size) as usize);
    for _ in 0..length {
        for j in 0..size {
            multistarts.push(singleoffsets.get(j));
            multistops.push(singleoffsets.get(j + 1));
        }
    }
    Ok((multistarts, multistops))
}

/// Applies per-row fancy-indexes (the leaf of a jagged slice) to a list
/// dimension: row `i` of the slice indexes into row `i` of the array.
pub fn jagged_apply(
    slicestarts: &Index64,
    slicestops: &Index64,
    sliceindex: &Index64,
    fromstarts: &Index64,
    fromstops: &Index64,
) -> Result<(Vec64<i64>, Vec64<i64>), KernelError> {
    let rows = slicestarts.len();
    let mut tooffsets = Vec64::with_capacity(rows as usize + 1);
    let mut tocarry = Vec64::new();
    tooffsets.push(0);
    for i in 0..rows {
        let rowlen = fromstops.get(i) - fromstarts.get(i);
        if rowlen < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        for j in slicestarts.get(i)..slicestops.get(i) {
            let raw = sliceindex.get(j);
            let reg = wrap(raw, rowlen);
            if reg < 0 || reg >= rowlen {
                return Err(KernelError::index(
                    "jagged slice index out of range for its row",
                    i,
                    raw,
                ));
            }
            tocarry.push(fromstarts.get(i) + reg);
        }
        tooffsets.push(tocarry.len() as i64);
    }
    Ok((tooffsets, tocarry))
}

/// Counts non-missing entries of a missing-valued jagged slice leaf.
pub fn jagged_numvalid(
    slicestarts: &Index64,
    slicestops: &Index64,
    missing: &Index64,
) -> Result<i64, KernelError> {
    let mut numvalid = 0;
    for i in 0..slicestarts.len() {
        if slicestops.get(i) < slicestarts.get(i) {
            return Err(KernelError::value("jagged slice's stops[i] < starts[i]", Some(i)));
        }
        for j in slicestarts.get(i)..slicestops.get(i) {
            if missing.get(j) >= 0 {
                numvalid += 1;
            }
        }
    }
    Ok(numvalid)
}

/// Shrinks a missing-valued jagged slice to its valid entries.
///
/// Returns `(tocarry, smalloffsets, largeoffsets)`: `tocarry` selects the
/// valid entries of the flattened slice, `smalloffsets` delimits them per
/// row, and `largeoffsets` delimits the original (missing-inclusive) counts.
pub fn jagged_shrink(
    slicestarts: &Index64,
    slicestops: &Index64,
    missing: &Index64,
) -> (Vec64<i64>, Vec64<i64>, Vec64<i64>) {
    let rows = slicestarts.len();
    let mut tocarry = Vec64::new();
    let mut smalloffsets = Vec64::with_capacity(rows as usize + 1);
    let mut largeoffsets = Vec64::with_capacity(rows as usize + 1);
    smalloffsets.push(0);
    largeoffsets.push(0);
    let mut large = 0;
    for i in 0..rows {
        for j in slicestarts.get(i)..slicestops.get(i) {
            if missing.get(j) >= 0 {
                tocarry.push(j);
            }
            large += 1;
        }
        smalloffsets.push(tocarry.len() as i64);
        largeoffsets.push(large);
    }
    (tocarry, smalloffsets, largeoffsets)
}

/// Descends one level of a nested jagged slice: each slice row must have
/// exactly as many inner slices as the array row has elements.
pub fn jagged_descend(
    slicestarts: &Index64,
    slicestops: &Index64,
    fromstarts: &Index64,
    fromstops: &Index64,
) -> Result<Vec64<i64>, KernelError> {
    let rows = slicestarts.len();
    let mut tooffsets = Vec64::with_capacity(rows as usize + 1);
    tooffsets.push(0);
    let mut total = 0;
    for i in 0..rows {
        let slicelen = slicestops.get(i) - slicestarts.get(i);
        let rowlen = fromstops.get(i) - fromstarts.get(i);
        if slicelen != rowlen {
            return Err(KernelError::value(
                "cannot fit jagged slice into nested list of different length",
                Some(i),
            ));
        }
        total += rowlen;
        tooffsets.push(total);
    }
    Ok(tooffsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index64;

    #[test]
    fn test_resolve_range_forward() {
        assert_eq!(resolve_range(5, None, None, 1), (0, 5));
        assert_eq!(resolve_range(5, Some(1), Some(4), 1), (1, 3));
        assert_eq!(resolve_range(5, Some(-3), None, 1), (2, 3));
        assert_eq!(resolve_range(5, Some(0), Some(5), 2), (0, 3));
        // Out-of-range endpoints clamp rather than error.
        assert_eq!(resolve_range(5, Some(-100), Some(100), 1), (0, 5));
        assert_eq!(resolve_range(5, Some(3), Some(2), 1), (3, 0));
    }

    #[test]
    fn test_resolve_range_backward() {
        assert_eq!(resolve_range(5, None, None, -1), (4, 5));
        assert_eq!(resolve_range(5, None, None, -2), (4, 3));
        assert_eq!(resolve_range(5, Some(3), Some(0), -1), (3, 3));
        assert_eq!(resolve_range(5, Some(-1), Some(-100), -1), (4, 5));
    }

    #[test]
    fn test_list_next_at_wraps_and_checks() {
        let starts = index64![0, 3, 3];
        let stops = index64![3, 3, 5];
        // at = -1 selects each row's last element; row 1 is empty and fails.
        let err = list_next_at(&starts, &stops, -1).unwrap_err();
        assert_eq!(err.id, Some(1));
        let starts = index64![0, 3];
        let stops = index64![3, 5];
        let carry = list_next_at(&starts, &stops, -1).unwrap();
        assert_eq!(&carry[..], &[2, 4]);
    }

    #[test]
    fn test_list_next_range_clamps_per_row() {
        let starts = index64![0, 3, 3];
        let stops = index64![3, 3, 5];
        let (offsets, carry) = list_next_range(&starts, &stops, Some(1), None, 1);
        assert_eq!(&offsets[..], &[0, 2, 2, 3]);
        assert_eq!(&carry[..], &[1, 2, 4]);
    }

    #[test]
    fn test_list_next_array_produces_advanced() {
        let starts = index64![0, 3];
        let stops = index64![3, 6];
        let flat = index64![2, 0];
        let (carry, advanced) = list_next_array(&starts, &stops, &flat).unwrap();
        assert_eq!(&carry[..], &[2, 0, 5, 3]);
        assert_eq!(&advanced[..], &[0, 1, 0, 1]);
    }

    #[test]
    fn test_list_next_array_advanced_locksteps() {
        let starts = index64![0, 3];
        let stops = index64![3, 6];
        let flat = index64![2, 0];
        let advanced = index64![0, 1];
        let carry = list_next_array_advanced(&starts, &stops, &flat, &advanced).unwrap();
        assert_eq!(&carry[..], &[2, 3]);
    }

    #[test]
    fn test_regular_next_kernels() {
        let carry = regular_next_at(-1, 3, 2).unwrap();
        assert_eq!(&carry[..], &[2, 5]);
        let (nextsize, carry) = regular_next_range(4, 2, Some(1), None, 2);
        assert_eq!(nextsize, 2);
        assert_eq!(&carry[..], &[1, 3, 5, 7]);
        let (carry, advanced) = regular_next_array(&index64![0, 2], 3, 2).unwrap();
        assert_eq!(&carry[..], &[0, 2, 3, 5]);
        assert_eq!(&advanced[..], &[0, 1, 0, 1]);
    }

    #[test]
    fn test_spread_advanced() {
        let offsets = [0i64, 2, 2, 5];
        let spread = spread_advanced(&index64![7, 8, 9], &offsets);
        assert_eq!(&spread[..], &[7, 7, 9, 9, 9]);
    }

    #[test]
    fn test_jagged_apply_bounds() {
        let slicestarts = index64![0, 2];
        let slicestops = index64![2, 3];
        let sliceindex = index64![1, 0, -1];
        let fromstarts = index64![0, 3];
        let fromstops = index64![3, 5];
        let (offsets, carry) =
            jagged_apply(&slicestarts, &slicestops, &sliceindex, &fromstarts, &fromstops)
                .unwrap();
        assert_eq!(&offsets[..], &[0, 2, 3]);
        assert_eq!(&carry[..], &[1, 0, 4]);
        // Index 2 is out of range for row 1 (length 2).
        let bad = index64![1, 0, 2];
        assert!(
            jagged_apply(&slicestarts, &slicestops, &bad, &fromstarts, &fromstops).is_err()
        );
    }

    #[test]
    fn test_jagged_shrink_and_numvalid() {
        let slicestarts = index64![0, 2];
        let slicestops = index64![2, 4];
        let missing = index64![0, -1, 1, 2];
        assert_eq!(jagged_numvalid(&slicestarts, &slicestops, &missing).unwrap(), 3);
        let (tocarry, small, large) = jagged_shrink(&slicestarts, &slicestops, &missing);
        assert_eq!(&tocarry[..], &[0, 2, 3]);
        assert_eq!(&small[..], &[0, 1, 3]);
        assert_eq!(&large[..], &[0, 2, 4]);
    }

    #[test]
    fn test_jagged_descend_requires_equal_lengths() {
        let slicestarts = index64![0, 2];
        let slicestops = index64![2, 4];
        let fromstarts = index64![0, 2];
        let fromstops = index64![2, 4];
        let offsets =
            jagged_descend(&slicestarts, &slicestops, &fromstarts, &fromstops).unwrap();
        assert_eq!(&offsets[..], &[0, 2, 4]);
        let shortstops = index64![2, 3];
        assert!(
            jagged_descend(&slicestarts, &slicestops, &fromstarts, &shortstops).is_err()
        );
    }
}
