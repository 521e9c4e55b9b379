//! # **List Kernels** - *Structural loops over list and union indexes*
//!
//! Buffer-level pieces of `num`, `flatten`, `rpad`, `localindex`,
//! `combinations`, union bookkeeping, and the validity checks. Same
//! conventions as the getitem kernels: no layout knowledge, failures as
//! [`KernelError`].

use vec64::Vec64;

use crate::enums::error::KernelError;
use crate::structs::index::{Index8, Index64};

/// Per-row lengths of a starts/stops list dimension.
pub fn list_num(starts: &Index64, stops: &Index64) -> Result<Vec64<i64>, KernelError> {
    let mut out = Vec64::with_capacity(starts.len() as usize);
    for i in 0..starts.len() {
        let n = stops.get(i) - starts.get(i);
        if n < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        out.push(n);
    }
    Ok(out)
}

/// Compact offsets equivalent to a starts/stops pair: `offsets[0] == 0` and
/// each row's extent equals the original row length.
pub fn compact_offsets(
    starts: &Index64,
    stops: &Index64,
) -> Result<Vec64<i64>, KernelError> {
    let mut offsets = Vec64::with_capacity(starts.len() as usize + 1);
    offsets.push(0);
    let mut total = 0;
    for i in 0..starts.len() {
        let n = stops.get(i) - starts.get(i);
        if n < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        total += n;
        offsets.push(total);
    }
    Ok(offsets)
}

/// Flattens a starts/stops list dimension: every content position the rows
/// cover, row by row. Pairs with [`compact_offsets`].
pub fn flatten_carry(starts: &Index64, stops: &Index64) -> Vec64<i64> {
    let mut carry = Vec64::new();
    for i in 0..starts.len() {
        for j in starts.get(i)..stops.get(i) {
            carry.push(j);
        }
    }
    carry
}

/// Pads each row on the right with `-1` (missing) up to at least `target`
/// elements; rows longer than `target` are kept whole.
///
/// Returns `(offsets, index)`: new row extents and a projection into the
/// original content with `-1` for the padding.
pub fn list_rpad(
    starts: &Index64,
    stops: &Index64,
    target: i64,
) -> Result<(Vec64<i64>, Vec64<i64>), KernelError> {
    let mut offsets = Vec64::with_capacity(starts.len() as usize + 1);
    let mut index = Vec64::new();
    offsets.push(0);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        if rowlen < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        for j in 0..rowlen.max(target) {
            if j < rowlen {
                index.push(starts.get(i) + j);
            } else {
                index.push(-1);
            }
        }
        offsets.push(index.len() as i64);
    }
    Ok((offsets, index))
}

/// Pads and clips each row to exactly `target` elements.
pub fn list_rpad_and_clip(
    starts: &Index64,
    stops: &Index64,
    target: i64,
) -> Result<Vec64<i64>, KernelError> {
    let mut index = Vec64::with_capacity((starts.len() * target) as usize);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        if rowlen < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        for j in 0..target {
            if j < rowlen {
                index.push(starts.get(i) + j);
            } else {
                index.push(-1);
            }
        }
    }
    Ok(index)
}

/// Position of each element within its row: `[0, 1, ..., rowlen-1]` per row,
/// flattened. `offsets` must be compact.
pub fn list_localindex(offsets: &[i64]) -> Vec64<i64> {
    let rows = offsets.len() - 1;
    let mut out = Vec64::with_capacity(offsets[rows].max(0) as usize);
    for i in 0..rows {
        for j in 0..offsets[i + 1] - offsets[i] {
            out.push(j);
        }
    }
    out
}

/// Per-row n-tuples of content positions, in lexicographic order.
///
/// `replacement` allows an element to pair with itself. Returns the new row
/// extents plus one carry buffer per tuple slot; the caller projects the
/// content through each carry to build the tuple fields.
pub fn list_combinations(
    starts: &Index64,
    stops: &Index64,
    n: i64,
    replacement: bool,
) -> Result<(Vec64<i64>, Vec<Vec64<i64>>), KernelError> {
    if n < 1 {
        return Err(KernelError::value("in combinations, 'n' must be at least 1", None));
    }
    let n = n as usize;
    let mut offsets = Vec64::with_capacity(starts.len() as usize + 1);
    let mut tocarries: Vec<Vec64<i64>> = (0..n).map(|_| Vec64::new()).collect();
    offsets.push(0);
    for i in 0..starts.len() {
        let rowlen = stops.get(i) - starts.get(i);
        if rowlen < 0 {
            return Err(KernelError::value("stops[i] < starts[i]", Some(i)));
        }
        // Odometer over tuple positions within the row.
        let mut slots = vec![0i64; n];
        let mut valid = true;
        for (k, slot) in slots.iter_mut().enumerate() {
            *slot = if replacement { 0 } else { k as i64 };
            if *slot >= rowlen {
                valid = false;
            }
        }
        while valid {
            for (k, slot) in slots.iter().enumerate() {
                tocarries[k].push(starts.get(i) + slot);
            }
            // Advance the rightmost slot that can still move.
            let mut k = n;
            loop {
                if k == 0 {
                    valid = false;
                    break;
                }
                k -= 1;
                slots[k] += 1;
                let mut limit = rowlen;
                if !replacement {
                    limit -= (n - 1 - k) as i64;
                }
                if slots[k] < limit {
                    for j in k + 1..n {
                        slots[j] = if replacement {
                            slots[j - 1]
                        } else {
                            slots[j - 1] + 1
                        };
                        let mut jlimit = rowlen;
                        if !replacement {
                            jlimit -= (n - 1 - j) as i64;
                        }
                        if slots[j] >= jlimit {
                            valid = false;
                        }
                    }
                    break;
                }
            }
        }
        offsets.push(tocarries[0].len() as i64);
    }
    Ok((offsets, tocarries))
}

/// Index a union's elements within their own tag: element `i` gets the count
/// of earlier elements with the same tag. The standard index for a freshly
/// built union whose contents are stored tag-contiguously.
pub fn union_regular_index(tags: &Index8, numcontents: usize) -> Vec64<i64> {
    let mut counters = vec![0i64; numcontents];
    let mut index = Vec64::with_capacity(tags.len() as usize);
    for i in 0..tags.len() {
        let t = tags.get(i) as usize;
        index.push(counters[t]);
        counters[t] += 1;
    }
    index
}

/// Positions into `contents[which]` for the union elements with that tag,
/// in element order.
pub fn union_project(
    tags: &Index8,
    index: &Index64,
    which: i64,
) -> Result<Vec64<i64>, KernelError> {
    let mut carry = Vec64::new();
    for i in 0..tags.len() {
        if tags.get(i) == which {
            let j = index.get(i);
            if j < 0 {
                return Err(KernelError::value("union index is negative", Some(i)));
            }
            carry.push(j);
        }
    }
    Ok(carry)
}

/// Structural check for a starts/stops list over `contentlen` elements.
pub fn validate_list(
    starts: &Index64,
    stops: &Index64,
    contentlen: i64,
) -> Result<(), KernelError> {
    if stops.len() < starts.len() {
        return Err(KernelError::value("len(stops) < len(starts)", None));
    }
    for i in 0..starts.len() {
        let start = starts.get(i);
        let stop = stops.get(i);
        if start != stop {
            if start > stop {
                return Err(KernelError::value("start[i] > stop[i]", Some(i)));
            }
            if start < 0 {
                return Err(KernelError::value("start[i] < 0", Some(i)));
            }
            if stop > contentlen {
                return Err(KernelError::value("stop[i] > len(content)", Some(i)));
            }
        }
    }
    Ok(())
}

/// Structural check for a compact-or-not offsets buffer.
pub fn validate_offsets(offsets: &Index64, contentlen: i64) -> Result<(), KernelError> {
    if offsets.is_empty() {
        return Err(KernelError::value("offsets must have at least one element", None));
    }
    if offsets.get(0) < 0 {
        return Err(KernelError::value("offsets[0] < 0", None));
    }
    for i in 0..offsets.len() - 1 {
        if offsets.get(i + 1) < offsets.get(i) {
            return Err(KernelError::value(
                "offsets must be monotonically increasing",
                Some(i),
            ));
        }
    }
    if offsets.get(offsets.len() - 1) > contentlen {
        return Err(KernelError::value("offsets[-1] > len(content)", None));
    }
    Ok(())
}

/// Structural check for a projection index over `contentlen` elements.
/// Negative entries are allowed only when `allow_missing`.
pub fn validate_index(
    index: &Index64,
    contentlen: i64,
    allow_missing: bool,
) -> Result<(), KernelError> {
    for i in 0..index.len() {
        let v = index.get(i);
        if v < 0 {
            if !allow_missing {
                return Err(KernelError::value("index[i] < 0", Some(i)));
            }
        } else if v >= contentlen {
            return Err(KernelError::value("index[i] >= len(content)", Some(i)));
        }
    }
    Ok(())
}

/// Structural check for union tags and index against per-content lengths.
pub fn validate_union(
    tags: &Index8,
    index: &Index64,
    content_lengths: &[i64],
) -> Result<(), KernelError> {
    if index.len() < tags.len() {
        return Err(KernelError::value("len(index) < len(tags)", None));
    }
    for i in 0..tags.len() {
        let t = tags.get(i);
        if t < 0 || t as usize >= content_lengths.len() {
            return Err(KernelError::value("tags[i] >= len(contents)", Some(i)));
        }
        let j = index.get(i);
        if j < 0 {
            return Err(KernelError::value("index[i] < 0", Some(i)));
        }
        if j >= content_lengths[t as usize] {
            return Err(KernelError::value("index[i] >= len(content[tags[i]])", Some(i)));
        }
    }
    Ok(())
}
