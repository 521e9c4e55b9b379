//! # **Reduce Kernels** - *Parents bookkeeping for grouped reductions*
//!
//! A reduction is driven by a `parents` map from element position to output
//! slot. Descending through a list dimension rewrites that map: reducing
//! *this* dimension groups each row's elements under the row (local), while
//! reducing a *deeper-nested* dimension groups element `j` of every row in
//! the same outer slot together (nonlocal, NumPy's axis-0 behavior on a
//! ragged dimension).

use vec64::Vec64;

use crate::structs::index::Index64;

/// Local regrouping: every element of row `i` maps to slot `parents[i]`'s
/// row, i.e. the row itself reduces away. `offsets` must be compact.
pub fn local_nextparents(offsets: &[i64]) -> Vec64<i64> {
    let rows = offsets.len() - 1;
    let mut out = Vec64::with_capacity(offsets[rows].max(0) as usize);
    for i in 0..rows {
        for _ in offsets[i]..offsets[i + 1] {
            out.push(i as i64);
        }
    }
    out
}

/// Offsets delimiting, per outer slot, how many rows landed there. Rebuilds
/// the list dimension above a local reduction's output.
pub fn counts_to_offsets(parents: &Index64, outlength: i64) -> Vec64<i64> {
    let mut counts = vec![0i64; outlength.max(0) as usize];
    for i in 0..parents.len() {
        let p = parents.get(i);
        if p >= 0 {
            counts[p as usize] += 1;
        }
    }
    let mut offsets = Vec64::with_capacity(outlength.max(0) as usize + 1);
    offsets.push(0);
    let mut total = 0;
    for c in counts {
        total += c;
        offsets.push(total);
    }
    offsets
}

/// Nonlocal regrouping: element `j` of row `i` maps to slot
/// `parents[i] * maxcount + j`, so same-position elements across rows of the
/// same outer slot reduce together. Returns the map and `maxcount` (the
/// longest row; the output's inner dimension).
pub fn nonlocal_nextparents(
    offsets: &[i64],
    parents: &Index64,
) -> (Vec64<i64>, i64) {
    let rows = offsets.len() - 1;
    let mut maxcount = 0;
    for i in 0..rows {
        maxcount = maxcount.max(offsets[i + 1] - offsets[i]);
    }
    let mut out = Vec64::with_capacity(offsets[rows].max(0) as usize);
    for i in 0..rows {
        let p = parents.get(i as i64);
        for j in 0..offsets[i + 1] - offsets[i] {
            if p < 0 {
                out.push(-1);
            } else {
                out.push(p * maxcount + j);
            }
        }
    }
    (out, maxcount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index64;

    #[test]
    fn test_local_nextparents() {
        let out = local_nextparents(&[0, 3, 3, 5]);
        assert_eq!(&out[..], &[0, 0, 0, 2, 2]);
    }

    #[test]
    fn test_counts_to_offsets() {
        let parents = index64![0, 0, 2];
        let offsets = counts_to_offsets(&parents, 3);
        assert_eq!(&offsets[..], &[0, 2, 2, 3]);
    }

    #[test]
    fn test_nonlocal_groups_by_position() {
        // Rows [3, 2] under one outer slot: columns 0..3, maxcount 3.
        let parents = index64![0, 0];
        let (out, maxcount) = nonlocal_nextparents(&[0, 3, 5], &parents);
        assert_eq!(maxcount, 3);
        assert_eq!(&out[..], &[0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_nonlocal_two_outer_slots() {
        let parents = index64![0, 1];
        let (out, maxcount) = nonlocal_nextparents(&[0, 2, 4], &parents);
        assert_eq!(maxcount, 2);
        assert_eq!(&out[..], &[0, 1, 2, 3]);
    }
}
