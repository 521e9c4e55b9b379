//! # **Identities Module** - *Per-element provenance tags*
//!
//! An `Identities` table carries one row per element of its owning node. Each
//! row is the path of positional indexes (plus any record field names in
//! `fieldloc`) that reaches the element from the root of the original tree.
//! Structural operations that reorder or drop elements gather the table with
//! the same carry index they apply to the data, so error reports can name the
//! original location of an offending element.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};

use vec64::Vec64;

use crate::structs::buffer::Buffer;

static NEXT_REF: AtomicI64 = AtomicI64::new(0);

fn newref() -> i64 {
    NEXT_REF.fetch_add(1, Ordering::Relaxed)
}

/// Row-major table of element provenance paths.
#[derive(Clone, PartialEq)]
pub struct Identities {
    /// Session-unique id distinguishing independently created tables.
    ref_id: i64,
    /// Record field names interleaved into the path: `(column, field)` pairs.
    fieldloc: Vec<(i64, String)>,
    /// Path columns per row.
    width: i64,
    /// Rows; equals the owning node's length.
    length: i64,
    data: Buffer<i64>,
}

impl Identities {
    pub fn new(
        fieldloc: Vec<(i64, String)>,
        width: i64,
        length: i64,
        data: Buffer<i64>,
    ) -> Self {
        assert_eq!(data.len() as i64, width * length);
        Identities {
            ref_id: newref(),
            fieldloc,
            width,
            length,
            data,
        }
    }

    /// Fresh single-column table `[0, 1, ..., length-1]` for a root node.
    pub fn new_arange(length: i64) -> Self {
        let mut v = Vec64::with_capacity(length.max(0) as usize);
        for i in 0..length.max(0) {
            v.push(i);
        }
        Identities {
            ref_id: newref(),
            fieldloc: Vec::new(),
            width: 1,
            length: length.max(0),
            data: Buffer::from_vec64(v),
        }
    }

    #[inline]
    pub fn ref_id(&self) -> i64 {
        self.ref_id
    }

    #[inline]
    pub fn fieldloc(&self) -> &[(i64, String)] {
        &self.fieldloc
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.width
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Path row for element `row`.
    pub fn row(&self, row: i64) -> &[i64] {
        let w = self.width as usize;
        &self.data.as_slice()[row as usize * w..(row as usize + 1) * w]
    }

    /// Contiguous row window; zero-copy. Caller regularizes bounds.
    pub fn getitem_range_nowrap(&self, start: i64, stop: i64) -> Self {
        Identities {
            ref_id: self.ref_id,
            fieldloc: self.fieldloc.clone(),
            width: self.width,
            length: stop - start,
            data: self
                .data
                .window((start * self.width) as usize, ((stop - start) * self.width) as usize),
        }
    }

    /// Gathers rows by position. A carry value of `-1` produces a row of
    /// `-1` sentinels, matching missing elements introduced by option nodes.
    pub fn getitem_carry(&self, carry: &[i64]) -> Self {
        let w = self.width as usize;
        let mut v = Vec64::with_capacity(carry.len() * w);
        for &c in carry {
            if c < 0 {
                for _ in 0..w {
                    v.push(-1);
                }
            } else {
                v.extend_from_slice(self.row(c));
            }
        }
        Identities {
            ref_id: self.ref_id,
            fieldloc: self.fieldloc.clone(),
            width: self.width,
            length: carry.len() as i64,
            data: Buffer::from_vec64(v),
        }
    }

    /// Appends a path column, fixed to `value` for every row. Used when a
    /// node descends into regular or list structure.
    pub fn with_column(&self, value: i64) -> Self {
        let w = self.width as usize;
        let mut v = Vec64::with_capacity(self.length as usize * (w + 1));
        for row in 0..self.length {
            v.extend_from_slice(self.row(row));
            v.push(value);
        }
        Identities {
            ref_id: self.ref_id,
            fieldloc: self.fieldloc.clone(),
            width: self.width + 1,
            length: self.length,
            data: Buffer::from_vec64(v),
        }
    }

    /// Appends a record field name to the path at the current column.
    pub fn with_field(&self, field: &str) -> Self {
        let mut fieldloc = self.fieldloc.clone();
        fieldloc.push((self.width - 1, field.to_owned()));
        Identities {
            ref_id: self.ref_id,
            fieldloc,
            width: self.width,
            length: self.length,
            data: self.data.clone(),
        }
    }

    /// Human-readable path for error messages, e.g. `[2, "x", 0]`.
    pub fn location(&self, row: i64) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (col, value) in self.row(row).iter().enumerate() {
            parts.push(value.to_string());
            for (at, field) in &self.fieldloc {
                if *at == col as i64 {
                    parts.push(format!("{:?}", field));
                }
            }
        }
        format!("[{}]", parts.join(", "))
    }
}

impl Debug for Identities {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identities")
            .field("ref_id", &self.ref_id)
            .field("fieldloc", &self.fieldloc)
            .field("width", &self.width)
            .field("length", &self.length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_rows() {
        let ids = Identities::new_arange(4);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.width(), 1);
        assert_eq!(ids.row(2), &[2]);
    }

    #[test]
    fn test_carry_with_missing() {
        let ids = Identities::new_arange(3);
        let carried = ids.getitem_carry(&[2, -1, 0]);
        assert_eq!(carried.row(0), &[2]);
        assert_eq!(carried.row(1), &[-1]);
        assert_eq!(carried.row(2), &[0]);
    }

    #[test]
    fn test_range_window() {
        let ids = Identities::new_arange(5);
        let sub = ids.getitem_range_nowrap(1, 4);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.row(0), &[1]);
        assert_eq!(sub.ref_id(), ids.ref_id());
    }

    #[test]
    fn test_with_column_and_field_location() {
        let ids = Identities::new_arange(2).with_column(7).with_field("pt");
        assert_eq!(ids.width(), 2);
        assert_eq!(ids.row(1), &[1, 7]);
        assert_eq!(ids.location(1), "[1, 7, \"pt\"]");
    }
}
