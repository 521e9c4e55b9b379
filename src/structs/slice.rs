//! # **Slice Module** - *Validated slice tuples*
//!
//! A [`Slice`] is the validated form of a slice expression: a shared vector
//! of [`SliceItem`]s plus a cursor. The resolution engine walks the tuple by
//! taking `head()` and recursing with `tail()`; because the vector is behind
//! an `Arc`, a tail is a cursor bump, not a copy.
//!
//! Validation at construction:
//! - zero range steps are rejected;
//! - at most one ellipsis;
//! - integer fancy-indexes and missing-valued fancy-indexes cannot mix;
//! - all fancy-index items are broadcast to one common shape, so the engine
//!   can assume equal lengths when it spreads them.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::enums::error::RaggedError;
use crate::enums::slice_item::SliceItem;

/// A validated, broadcast slice tuple with a read cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    items: Arc<Vec<SliceItem>>,
    start: usize,
}

impl Slice {
    /// Validates and broadcasts a slice tuple.
    pub fn new(items: Vec<SliceItem>) -> Result<Slice, RaggedError> {
        let mut num_ellipsis = 0;
        let mut has_array = false;
        let mut has_missing = false;
        for item in &items {
            match item {
                SliceItem::Range { step, .. } => {
                    if *step == 0 {
                        return Err(RaggedError::InvalidArgument {
                            class: "Slice",
                            message: "slice step cannot be zero".into(),
                        });
                    }
                }
                SliceItem::Ellipsis => num_ellipsis += 1,
                SliceItem::Array(_) => has_array = true,
                SliceItem::Missing(_) => has_missing = true,
                _ => {}
            }
        }
        if num_ellipsis > 1 {
            return Err(RaggedError::InvalidArgument {
                class: "Slice",
                message: "a slice can have at most one ellipsis".into(),
            });
        }
        if has_array && has_missing {
            return Err(RaggedError::SliceMismatch {
                class: "Slice",
                message: "cannot mix missing values in a slice with integer fancy-indexes"
                    .into(),
            });
        }
        let items = broadcast_arrays(items)?;
        Ok(Slice {
            items: Arc::new(items),
            start: 0,
        })
    }

    /// Wraps items that are already validated and broadcast. Used by the
    /// engine for slice tuples it synthesises itself.
    pub fn new_unchecked(items: Vec<SliceItem>) -> Slice {
        Slice {
            items: Arc::new(items),
            start: 0,
        }
    }

    /// Empty tuple; `head()` is `None`.
    pub fn empty() -> Slice {
        Slice::new_unchecked(Vec::new())
    }

    /// The item under the cursor.
    #[inline]
    pub fn head(&self) -> Option<&SliceItem> {
        self.items.get(self.start)
    }

    /// The tuple with the cursor advanced past `head()`.
    #[inline]
    pub fn tail(&self) -> Slice {
        Slice {
            items: Arc::clone(&self.items),
            start: (self.start + 1).min(self.items.len()),
        }
    }

    /// Remaining items, `head()` included.
    pub fn remaining(&self) -> &[SliceItem] {
        &self.items[self.start..]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len() - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of array dimensions the remaining items consume.
    pub fn dimlength(&self) -> i64 {
        self.remaining()
            .iter()
            .filter(|i| i.consumes_dimension())
            .count() as i64
    }

    /// Replaces any ellipsis with enough full ranges to consume `depth`
    /// dimensions in total, and resets the cursor.
    pub fn expand_ellipsis(&self, depth: i64) -> Result<Slice, RaggedError> {
        let pos = self
            .remaining()
            .iter()
            .position(|i| matches!(i, SliceItem::Ellipsis));
        let Some(pos) = pos else {
            return Ok(self.clone());
        };
        // The ellipsis itself counts as dimension-consuming; subtract it.
        let consumed = self.dimlength() - 1;
        let missing = depth - consumed;
        if missing < 0 {
            return Err(RaggedError::SliceMismatch {
                class: "Slice",
                message: format!(
                    "too many dimensions in slice ({}) for array of depth {}",
                    consumed, depth
                ),
            });
        }
        let mut items: Vec<SliceItem> = Vec::with_capacity(self.len() + missing as usize);
        items.extend_from_slice(&self.remaining()[..pos]);
        for _ in 0..missing {
            items.push(SliceItem::full_range());
        }
        items.extend_from_slice(&self.remaining()[pos + 1..]);
        Ok(Slice::new_unchecked(items))
    }
}

/// Broadcasts every `Array` item to the common shape of all `Array` items.
fn broadcast_arrays(items: Vec<SliceItem>) -> Result<Vec<SliceItem>, RaggedError> {
    let shapes: Vec<&[i64]> = items
        .iter()
        .filter_map(|i| match i {
            SliceItem::Array(a) => Some(a.shape()),
            _ => None,
        })
        .collect();
    if shapes.len() < 2 {
        return Ok(items);
    }
    let mut common: Vec<i64> = Vec::new();
    for shape in &shapes {
        let pad = shape.len().max(common.len());
        let mut next = vec![1i64; pad];
        for (d, v) in common.iter().rev().enumerate() {
            next[pad - 1 - d] = *v;
        }
        for (d, v) in shape.iter().rev().enumerate() {
            let slot = &mut next[pad - 1 - d];
            if *slot == 1 {
                *slot = *v;
            } else if *v != 1 && *v != *slot {
                return Err(RaggedError::SliceMismatch {
                    class: "Slice",
                    message: format!(
                        "cannot broadcast fancy-index of shape {:?} against shape {:?}",
                        shape, common
                    ),
                });
            }
        }
        common = next;
    }
    let items = items
        .into_iter()
        .map(|item| match item {
            SliceItem::Array(a) => SliceItem::Array(a.broadcast_to(&common)),
            other => other,
        })
        .collect();
    Ok(items)
}

impl Display for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.remaining().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::slice_item::SliceArray64;
    use crate::structs::index::Index64;

    #[test]
    fn test_head_tail_walk() {
        let slice = Slice::new(vec![SliceItem::At(1), SliceItem::full_range()]).unwrap();
        assert_eq!(slice.head(), Some(&SliceItem::At(1)));
        let tail = slice.tail();
        assert_eq!(tail.head(), Some(&SliceItem::full_range()));
        assert!(tail.tail().head().is_none());
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = Slice::new(vec![SliceItem::Range {
            start: None,
            stop: None,
            step: 0,
        }])
        .unwrap_err();
        assert!(matches!(err, RaggedError::InvalidArgument { .. }));
    }

    #[test]
    fn test_double_ellipsis_rejected() {
        let err =
            Slice::new(vec![SliceItem::Ellipsis, SliceItem::At(0), SliceItem::Ellipsis])
                .unwrap_err();
        assert!(matches!(err, RaggedError::InvalidArgument { .. }));
    }

    #[test]
    fn test_arrays_broadcast_to_common_shape() {
        let a = SliceArray64::new(Index64::from_slice(&[0, 1]), vec![2, 1], false);
        let b = SliceArray64::from_positions(&[5, 6, 7]);
        let slice = Slice::new(vec![SliceItem::Array(a), SliceItem::Array(b)]).unwrap();
        let shapes: Vec<Vec<i64>> = slice
            .remaining()
            .iter()
            .map(|i| match i {
                SliceItem::Array(a) => a.shape().to_vec(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(shapes, vec![vec![2, 3], vec![2, 3]]);
    }

    #[test]
    fn test_incompatible_broadcast_rejected() {
        let a = SliceArray64::from_positions(&[0, 1]);
        let b = SliceArray64::from_positions(&[5, 6, 7]);
        let err = Slice::new(vec![SliceItem::Array(a), SliceItem::Array(b)]).unwrap_err();
        assert!(matches!(err, RaggedError::SliceMismatch { .. }));
    }

    #[test]
    fn test_expand_ellipsis() {
        let slice = Slice::new(vec![SliceItem::At(0), SliceItem::Ellipsis, SliceItem::At(1)])
            .unwrap();
        let expanded = slice.expand_ellipsis(4).unwrap();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded.dimlength(), 4);
        assert_eq!(expanded.remaining()[1], SliceItem::full_range());
        assert_eq!(expanded.remaining()[2], SliceItem::full_range());
    }

    #[test]
    fn test_expand_ellipsis_too_deep() {
        let slice =
            Slice::new(vec![SliceItem::At(0), SliceItem::At(1), SliceItem::Ellipsis]).unwrap();
        assert!(slice.expand_ellipsis(1).is_err());
    }
}
