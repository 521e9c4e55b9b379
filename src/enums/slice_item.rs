//! # **SliceItem Module** - *One dimension of a slice expression*
//!
//! A slice expression is a tuple of items, each consuming (or inserting) one
//! dimension of the array being sliced. [`SliceItem`] is the closed set of
//! item kinds the resolution engine understands; [`crate::Slice`] holds the
//! validated, broadcast tuple.

use std::fmt::{self, Display, Formatter};

use vec64::Vec64;

use crate::structs::index::Index64;

/// An integer fancy-index: a (possibly multi-dimensional) array of element
/// positions. Stored flat in row-major order with an explicit shape.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceArray64 {
    index: Index64,
    shape: Vec<i64>,
    /// True when this array came from a boolean mask; affects how it
    /// broadcasts against jagged slices.
    frombool: bool,
}

impl SliceArray64 {
    pub fn new(index: Index64, shape: Vec<i64>, frombool: bool) -> Self {
        debug_assert_eq!(index.len(), shape.iter().product::<i64>());
        SliceArray64 {
            index,
            shape,
            frombool,
        }
    }

    /// One-dimensional fancy-index from a list of positions.
    pub fn from_positions(positions: &[i64]) -> Self {
        SliceArray64 {
            index: Index64::from_slice(positions),
            shape: vec![positions.len() as i64],
            frombool: false,
        }
    }

    /// Converts a boolean mask to the positions of its `true` elements.
    pub fn from_bools(mask: &[bool]) -> Self {
        let mut v = Vec64::new();
        for (i, &b) in mask.iter().enumerate() {
            if b {
                v.push(i as i64);
            }
        }
        SliceArray64 {
            index: Index64::from_vec64(v),
            shape: vec![0],
            frombool: true,
        }
        .with_recomputed_shape()
    }

    fn with_recomputed_shape(mut self) -> Self {
        self.shape = vec![self.index.len()];
        self
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    #[inline]
    pub fn frombool(&self) -> bool {
        self.frombool
    }

    /// Total number of positions (product of the shape).
    pub fn length(&self) -> i64 {
        self.shape.iter().product()
    }

    /// Materialises this array broadcast to `shape` (right-aligned NumPy
    /// rules; each dimension must match or be 1).
    pub fn broadcast_to(&self, shape: &[i64]) -> SliceArray64 {
        if self.shape == shape {
            return self.clone();
        }
        let out_len: i64 = shape.iter().product();
        let mut v = Vec64::with_capacity(out_len.max(0) as usize);
        let ndim = shape.len();
        let pad = ndim - self.shape.len();
        let mut coords = vec![0i64; ndim];
        for _ in 0..out_len {
            let mut flat = 0i64;
            for (d, &extent) in self.shape.iter().enumerate() {
                let c = if extent == 1 { 0 } else { coords[pad + d] };
                flat = flat * extent + c;
            }
            v.push(self.index.get(flat));
            for d in (0..ndim).rev() {
                coords[d] += 1;
                if coords[d] < shape[d] {
                    break;
                }
                coords[d] = 0;
            }
        }
        SliceArray64 {
            index: Index64::from_vec64(v),
            shape: shape.to_vec(),
            frombool: self.frombool,
        }
    }
}

/// A fancy-index with missing entries: positions where `index` is `-1`
/// select "no element" and surface as option-type output.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceMissing64 {
    index: Index64,
    content: Box<SliceItem>,
}

impl SliceMissing64 {
    pub fn new(index: Index64, content: SliceItem) -> Self {
        SliceMissing64 {
            index,
            content: Box::new(content),
        }
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn content(&self) -> &SliceItem {
        &self.content
    }

    pub fn length(&self) -> i64 {
        self.index.len()
    }
}

/// A jagged slice: per-row inner slices, delimited by `offsets`, applied to
/// the correspondingly ragged dimension of the array.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceJagged64 {
    offsets: Index64,
    content: Box<SliceItem>,
}

impl SliceJagged64 {
    pub fn new(offsets: Index64, content: SliceItem) -> Self {
        SliceJagged64 {
            offsets,
            content: Box::new(content),
        }
    }

    #[inline]
    pub fn offsets(&self) -> &Index64 {
        &self.offsets
    }

    #[inline]
    pub fn content(&self) -> &SliceItem {
        &self.content
    }

    /// Number of rows this jagged slice addresses.
    pub fn length(&self) -> i64 {
        self.offsets.len() - 1
    }
}

/// One item of a slice tuple.
#[derive(Clone, Debug, PartialEq)]
pub enum SliceItem {
    /// Single integer: selects one element, dropping the dimension.
    At(i64),
    /// `start:stop:step` range; `None` endpoints follow NumPy defaults for
    /// the sign of `step`. `step` is never zero (rejected at construction).
    Range {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },
    /// `...`: expands to as many full-range items as needed.
    Ellipsis,
    /// `np.newaxis`: inserts a length-1 regular dimension.
    NewAxis,
    /// Integer fancy-index.
    Array(SliceArray64),
    /// Fancy-index with missing entries.
    Missing(SliceMissing64),
    /// Ragged per-row slices.
    Jagged(SliceJagged64),
    /// Record field projection.
    Field(String),
    /// Multi-field record projection.
    Fields(Vec<String>),
}

impl SliceItem {
    /// Full-range item (`:`), the unit of ellipsis expansion.
    pub fn full_range() -> SliceItem {
        SliceItem::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// Whether this item consumes a dimension of the array (as opposed to
    /// inserting one or projecting fields).
    pub fn consumes_dimension(&self) -> bool {
        !matches!(
            self,
            SliceItem::NewAxis | SliceItem::Field(_) | SliceItem::Fields(_)
        )
    }
}

impl Display for SliceItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SliceItem::At(v) => write!(f, "{}", v),
            SliceItem::Range { start, stop, step } => {
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                write!(f, ":")?;
                if let Some(s) = stop {
                    write!(f, "{}", s)?;
                }
                if *step != 1 {
                    write!(f, ":{}", step)?;
                }
                Ok(())
            }
            SliceItem::Ellipsis => write!(f, "..."),
            SliceItem::NewAxis => write!(f, "newaxis"),
            SliceItem::Array(a) => write!(f, "array{:?}{}", a.shape(), a.index()),
            SliceItem::Missing(m) => write!(f, "missing{}", m.index()),
            SliceItem::Jagged(j) => write!(f, "jagged{}({})", j.offsets(), j.content()),
            SliceItem::Field(name) => write!(f, "{:?}", name),
            SliceItem::Fields(names) => {
                write!(f, "[")?;
                for (i, n) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", n)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bools_positions() {
        let arr = SliceArray64::from_bools(&[true, false, true, true]);
        assert_eq!(arr.index().to_vec_i64(), vec![0, 2, 3]);
        assert!(arr.frombool());
        assert_eq!(arr.shape(), &[3]);
    }

    #[test]
    fn test_broadcast_scalar_like() {
        // shape [1] broadcast against [3] repeats the single value.
        let arr = SliceArray64::new(Index64::from_slice(&[5]), vec![1], false);
        let out = arr.broadcast_to(&[3]);
        assert_eq!(out.index().to_vec_i64(), vec![5, 5, 5]);
        assert_eq!(out.shape(), &[3]);
    }

    #[test]
    fn test_broadcast_2d() {
        // shape [2, 1] against [2, 3]: each row value repeats across columns.
        let arr = SliceArray64::new(Index64::from_slice(&[7, 9]), vec![2, 1], false);
        let out = arr.broadcast_to(&[2, 3]);
        assert_eq!(out.index().to_vec_i64(), vec![7, 7, 7, 9, 9, 9]);
    }

    #[test]
    fn test_broadcast_rank_extension() {
        // shape [3] against [2, 3]: the row repeats down the new axis.
        let arr = SliceArray64::from_positions(&[1, 2, 3]);
        let out = arr.broadcast_to(&[2, 3]);
        assert_eq!(out.index().to_vec_i64(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SliceItem::At(3)), "3");
        assert_eq!(
            format!(
                "{}",
                SliceItem::Range {
                    start: Some(1),
                    stop: None,
                    step: 2
                }
            ),
            "1::2"
        );
        assert_eq!(format!("{}", SliceItem::full_range()), ":");
        assert_eq!(format!("{}", SliceItem::Field("x".into())), "\"x\"");
    }
}
