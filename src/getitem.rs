//! # **Getitem Module** - *The slice-resolution engine*
//!
//! Resolves a validated [`Slice`] against a layout tree with NumPy's mixed
//! basic/advanced indexing semantics, extended to ragged dimensions.
//!
//! ## Protocol
//! `getitem` wraps the array in a length-1 [`RegularArray`] so the first
//! slice item applies to the array's own outermost dimension, then walks the
//! tuple through `getitem_next(head, tail, advanced)`: each node consumes
//! `head` against the dimension *below itself*, carries its content by the
//! positions the head selects, and recurses with the rest of the tuple.
//! The result is unwrapped by taking element 0 of the wrapper.
//!
//! `advanced` implements NumPy's rule that all fancy-indexes iterate in
//! lock-step: it is empty until the first fancy-index is consumed, after
//! which it maps each row to its position within the broadcast index arrays.
//! Ranges spread it across their selections; later fancy-indexes select one
//! entry per row with it instead of fanning out again.
//!
//! Jagged slice items leave this protocol through `getitem_next_jagged`,
//! which pairs per-row inner slices with per-row content.
//!
//! Option nodes never participate directly: each computes a dense carry and
//! an out-index, recurses on dense data, and rewraps the result.

use std::sync::Arc;

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::enums::slice_item::{SliceArray64, SliceItem, SliceMissing64};
use crate::kernels::getitem as kernels;
use crate::structs::index::Index64;
use crate::structs::slice::Slice;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::utils::handle_error;

/// Recursion guard for adversarially deep trees or slice tuples.
const MAX_DEPTH: i64 = 512;

impl Content {
    /// Resolves a slice tuple against this array.
    pub fn getitem(&self, slice: &Slice) -> Result<Content, RaggedError> {
        if let Content::RecordScalar(_) = self {
            return Err(RaggedError::Unsupported {
                class: "Record",
                operation: "getitem",
            });
        }
        if slice.len() as i64 > MAX_DEPTH || self.minmax_depth().1 > MAX_DEPTH {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: format!("slice or array exceeds the depth limit of {}", MAX_DEPTH),
            });
        }
        let expanded = slice.expand_ellipsis(self.minmax_depth().0)?;
        let wrapper = Content::Regular(Arc::new(RegularArray::new(
            self.clone(),
            self.len(),
            1,
            None,
            Parameters::new(),
        )));
        let out = wrapper.getitem_next(expanded.head(), &expanded.tail(), &Index64::empty())?;
        if out.len() == 0 {
            Ok(unwrap_empty(&out))
        } else {
            out.getitem_at_nowrap(0)
        }
    }

    /// One step of the resolution walk; see the module docs for the
    /// protocol. `head` is `None` when the tuple is exhausted.
    pub(crate) fn getitem_next(
        &self,
        head: Option<&SliceItem>,
        tail: &Slice,
        advanced: &Index64,
    ) -> Result<Content, RaggedError> {
        let Some(item) = head else {
            return Ok(self.clone());
        };

        // Items that do not consume a dimension are uniform across nodes.
        match item {
            SliceItem::NewAxis => {
                let out = self.getitem_next(tail.head(), &tail.tail(), advanced)?;
                let length = out.len();
                return Ok(Content::Regular(Arc::new(RegularArray::new(
                    out,
                    1,
                    length,
                    None,
                    Parameters::new(),
                ))));
            }
            SliceItem::Field(key) => {
                return self
                    .getitem_field(key)?
                    .getitem_next(tail.head(), &tail.tail(), advanced);
            }
            SliceItem::Fields(keys) => {
                return self
                    .getitem_fields(keys)?
                    .getitem_next(tail.head(), &tail.tail(), advanced);
            }
            SliceItem::Ellipsis => {
                return Err(RaggedError::InvalidArgument {
                    class: self.classname(),
                    message: "unexpanded ellipsis reached the resolution engine".into(),
                });
            }
            _ => {}
        }

        match self {
            Content::Empty(_) => match item {
                SliceItem::Range { .. } => Ok(self.clone()),
                SliceItem::Array(a) if a.length() == 0 => Ok(self.clone()),
                _ => Err(RaggedError::IndexOutOfBounds {
                    class: "EmptyArray",
                    index: 0,
                    length: 0,
                }),
            },
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().getitem_next(head, tail, advanced)
                } else {
                    Err(RaggedError::SliceMismatch {
                        class: "NumpyArray",
                        message: "too many dimensions in the slice".into(),
                    })
                }
            }
            Content::List(a) => {
                list_getitem_next(a.starts(), a.stops(), a.content(), item, tail, advanced)
            }
            Content::ListOffset(a) => list_getitem_next(
                &a.starts(),
                &a.stops(),
                a.content(),
                item,
                tail,
                advanced,
            ),
            Content::Regular(a) => regular_getitem_next(a, item, tail, advanced),
            Content::Indexed(a) => {
                if a.is_option() {
                    let (nextcarry, outindex) = a.nextcarry_outindex();
                    let nextcontent = a.content().carry_unchecked(nextcarry.as_slice())?;
                    let out = nextcontent.getitem_next(head, tail, advanced)?;
                    IndexedArray::new(
                        outindex,
                        out,
                        true,
                        a.identities().cloned(),
                        a.parameters().clone(),
                    )
                    .simplified()
                } else {
                    a.project()?.getitem_next(head, tail, advanced)
                }
            }
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .getitem_next(head, tail, advanced),
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked()))
                    .getitem_next(head, tail, advanced)
            }
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    let trimmed = if c.len() == a.len() {
                        c.clone()
                    } else {
                        c.getitem_range_nowrap(0, a.len())
                    };
                    contents.push(trimmed.getitem_next(head, tail, advanced)?);
                }
                Ok(Content::Record(Arc::new(
                    crate::structs::variants::record::RecordArray::new(
                        contents,
                        a.fields().map(|f| f.to_vec()),
                        None,
                        None,
                        a.parameters().clone(),
                    ),
                )))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "getitem_next",
            }),
            Content::Union(a) => match item {
                SliceItem::At(_) | SliceItem::Range { .. } => {
                    let mut contents = Vec::with_capacity(a.contents().len());
                    for t in 0..a.numcontents() {
                        contents.push(a.project(t)?.getitem_next(head, tail, advanced)?);
                    }
                    Ok(Content::Union(Arc::new(UnionArray::from_tags_regular(
                        a.tags().clone(),
                        contents,
                        a.parameters().clone(),
                    ))))
                }
                _ => Err(RaggedError::Unsupported {
                    class: "UnionArray",
                    operation: "fancy or jagged indexing across a union",
                }),
            },
            Content::Virtual(a) => a.array()?.getitem_next(head, tail, advanced),
        }
    }

    /// Applies per-row inner slices (`slicecontent`, delimited by
    /// `slicestarts`/`slicestops`) to this node's rows, then continues with
    /// `tail`.
    pub(crate) fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content, RaggedError> {
        if slicestarts.len() != self.len() {
            return Err(RaggedError::SliceMismatch {
                class: self.classname(),
                message: format!(
                    "jagged slice of length {} cannot be applied to an array of length {}",
                    slicestarts.len(),
                    self.len()
                ),
            });
        }
        match self {
            Content::List(a) => list_getitem_next_jagged(
                a.starts(),
                a.stops(),
                a.content(),
                slicestarts,
                slicestops,
                slicecontent,
                tail,
            ),
            Content::ListOffset(a) => list_getitem_next_jagged(
                &a.starts(),
                &a.stops(),
                a.content(),
                slicestarts,
                slicestops,
                slicecontent,
                tail,
            ),
            Content::Regular(a) => Content::ListOffset(Arc::new(a.to_list_offset()))
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail),
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, outindex) = a.nextcarry_outindex();
                let substarts =
                    Index64::from_vec64(kernels::carry_index(slicestarts, nextcarry.as_slice()));
                let substops =
                    Index64::from_vec64(kernels::carry_index(slicestops, nextcarry.as_slice()));
                let nextcontent = a.content().carry_unchecked(nextcarry.as_slice())?;
                let out = nextcontent
                    .getitem_next_jagged(&substarts, &substops, slicecontent, tail)?;
                IndexedArray::new(
                    outindex,
                    out,
                    true,
                    a.identities().cloned(),
                    a.parameters().clone(),
                )
                .simplified()
            }
            Content::Indexed(a) => a
                .project()?
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail),
            Content::Virtual(a) => a
                .array()?
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail),
            _ => Err(RaggedError::SliceMismatch {
                class: self.classname(),
                message: "jagged slice applied to a dimension that is not ragged".into(),
            }),
        }
    }
}

/// `getitem_next` for a starts/stops list dimension.
fn list_getitem_next(
    starts: &Index64,
    stops: &Index64,
    content: &Content,
    item: &SliceItem,
    tail: &Slice,
    advanced: &Index64,
) -> Result<Content, RaggedError> {
    match item {
        SliceItem::At(at) => {
            let nextcarry = kernels::list_next_at(starts, stops, *at)
                .map_err(|e| handle_error(e, "ListArray"))?;
            let nextcontent = content.carry_unchecked(&nextcarry)?;
            nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
        }
        SliceItem::Range { start, stop, step } => {
            let (offsets, nextcarry) =
                kernels::list_next_range(starts, stops, *start, *stop, *step);
            let nextcontent = content.carry_unchecked(&nextcarry)?;
            let out = if advanced.is_empty() {
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)?
            } else {
                let nextadvanced =
                    Index64::from_vec64(kernels::spread_advanced(advanced, &offsets));
                nextcontent.getitem_next(tail.head(), &tail.tail(), &nextadvanced)?
            };
            Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                Index64::from_vec64(offsets),
                out,
                None,
                Parameters::new(),
            ))))
        }
        SliceItem::Array(array) => {
            if advanced.is_empty() {
                let (nextcarry, nextadvanced) =
                    kernels::list_next_array(starts, stops, array.index())
                        .map_err(|e| handle_error(e, "ListArray"))?;
                let nextcontent = content.carry_unchecked(&nextcarry)?;
                let nextadvanced = Index64::from_vec64(nextadvanced);
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), &nextadvanced)?;
                Ok(array_wrap(out, array.shape()))
            } else {
                let nextcarry =
                    kernels::list_next_array_advanced(starts, stops, array.index(), advanced)
                        .map_err(|e| handle_error(e, "ListArray"))?;
                let nextcontent = content.carry_unchecked(&nextcarry)?;
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
            }
        }
        SliceItem::Jagged(jagged) => {
            if !advanced.is_empty() {
                return Err(RaggedError::SliceMismatch {
                    class: "ListArray",
                    message: "cannot mix jagged slicing with NumPy-style advanced indexing"
                        .into(),
                });
            }
            if jagged.length() != starts.len() {
                return Err(RaggedError::SliceMismatch {
                    class: "ListArray",
                    message: format!(
                        "jagged slice of length {} does not fit an array of length {}",
                        jagged.length(),
                        starts.len()
                    ),
                });
            }
            let slicestarts = jagged.offsets().window(0, jagged.length());
            let slicestops = jagged.offsets().window(1, jagged.length());
            let list = Content::List(Arc::new(ListArray::new(
                starts.clone(),
                stops.clone(),
                content.clone(),
                None,
                Parameters::new(),
            )));
            list.getitem_next_jagged(&slicestarts, &slicestops, jagged.content(), tail)
        }
        SliceItem::Missing(_) => Err(RaggedError::SliceMismatch {
            class: "ListArray",
            message: "missing-value slices are only supported at regular dimensions".into(),
        }),
        _ => unreachable!("non-consuming items are handled before dispatch"),
    }
}

/// `getitem_next` for a regular dimension.
fn regular_getitem_next(
    a: &RegularArray,
    item: &SliceItem,
    tail: &Slice,
    advanced: &Index64,
) -> Result<Content, RaggedError> {
    match item {
        SliceItem::At(at) => {
            let nextcarry = kernels::regular_next_at(*at, a.size(), a.len())
                .map_err(|e| handle_error(e, "RegularArray"))?;
            let nextcontent = a.content().carry_unchecked(&nextcarry)?;
            nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
        }
        SliceItem::Range { start, stop, step } => {
            let (nextsize, nextcarry) =
                kernels::regular_next_range(a.size(), a.len(), *start, *stop, *step);
            let nextcontent = a.content().carry_unchecked(&nextcarry)?;
            let out = if advanced.is_empty() {
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)?
            } else {
                let mut offsets = Vec64::with_capacity(a.len() as usize + 1);
                for i in 0..=a.len() {
                    offsets.push(i * nextsize);
                }
                let nextadvanced =
                    Index64::from_vec64(kernels::spread_advanced(advanced, &offsets));
                nextcontent.getitem_next(tail.head(), &tail.tail(), &nextadvanced)?
            };
            Ok(Content::Regular(Arc::new(RegularArray::new(
                out,
                nextsize,
                a.len(),
                None,
                a.parameters().clone(),
            ))))
        }
        SliceItem::Array(array) => {
            if advanced.is_empty() {
                let (nextcarry, nextadvanced) =
                    kernels::regular_next_array(array.index(), a.size(), a.len())
                        .map_err(|e| handle_error(e, "RegularArray"))?;
                let nextcontent = a.content().carry_unchecked(&nextcarry)?;
                let nextadvanced = Index64::from_vec64(nextadvanced);
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), &nextadvanced)?;
                Ok(array_wrap(out, array.shape()))
            } else {
                let nextcarry = kernels::regular_next_array_advanced(
                    array.index(),
                    advanced,
                    a.size(),
                    a.len(),
                )
                .map_err(|e| handle_error(e, "RegularArray"))?;
                let nextcontent = a.content().carry_unchecked(&nextcarry)?;
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
            }
        }
        SliceItem::Jagged(jagged) => {
            if !advanced.is_empty() {
                return Err(RaggedError::SliceMismatch {
                    class: "RegularArray",
                    message: "cannot mix jagged slicing with NumPy-style advanced indexing"
                        .into(),
                });
            }
            let (multistarts, multistops) =
                kernels::jagged_expand(jagged.offsets(), a.size(), a.len())
                    .map_err(|e| handle_error(e, "RegularArray"))?;
            let out = a.content().getitem_next_jagged(
                &Index64::from_vec64(multistarts),
                &Index64::from_vec64(multistops),
                jagged.content(),
                tail,
            )?;
            Ok(Content::Regular(Arc::new(RegularArray::new(
                out,
                a.size(),
                a.len(),
                None,
                a.parameters().clone(),
            ))))
        }
        SliceItem::Missing(missing) => regular_getitem_next_missing(a, missing, tail, advanced),
        _ => unreachable!("non-consuming items are handled before dispatch"),
    }
}

/// A missing-valued fancy-index at a regular dimension: resolve the dense
/// inner item, then interleave `null` rows per the out-index.
fn regular_getitem_next_missing(
    a: &RegularArray,
    missing: &SliceMissing64,
    tail: &Slice,
    advanced: &Index64,
) -> Result<Content, RaggedError> {
    if !advanced.is_empty() {
        return Err(RaggedError::SliceMismatch {
            class: "RegularArray",
            message: "cannot mix missing values in a slice with advanced indexing".into(),
        });
    }
    let dense = Content::Regular(Arc::new(a.clone())).getitem_next(
        Some(missing.content()),
        tail,
        advanced,
    )?;
    let Content::Regular(out) = dense else {
        return Err(RaggedError::SliceMismatch {
            class: "RegularArray",
            message: "missing-value slice must resolve to a regular selection".into(),
        });
    };
    // One out-index block per row, shifted into that row's dense selection.
    let valid = out.size();
    let mut index = Vec64::with_capacity((out.len() * missing.length()) as usize);
    for row in 0..out.len() {
        for i in 0..missing.length() {
            let e = missing.index().get(i);
            if e < 0 {
                index.push(-1);
            } else {
                index.push(e + row * valid);
            }
        }
    }
    let option = IndexedArray::new(
        Index64::from_vec64(index),
        out.content().clone(),
        true,
        None,
        Parameters::new(),
    )
    .simplified()?;
    Ok(Content::Regular(Arc::new(RegularArray::new(
        option,
        missing.length(),
        out.len(),
        None,
        Parameters::new(),
    ))))
}

/// `getitem_next_jagged` for a starts/stops list dimension.
fn list_getitem_next_jagged(
    starts: &Index64,
    stops: &Index64,
    content: &Content,
    slicestarts: &Index64,
    slicestops: &Index64,
    slicecontent: &SliceItem,
    tail: &Slice,
) -> Result<Content, RaggedError> {
    match slicecontent {
        SliceItem::Array(array) => {
            let (tooffsets, tocarry) =
                kernels::jagged_apply(slicestarts, slicestops, array.index(), starts, stops)
                    .map_err(|e| handle_error(e, "ListArray"))?;
            let nextcontent = content.carry_unchecked(&tocarry)?;
            let out = nextcontent.getitem_next(tail.head(), &tail.tail(), &Index64::empty())?;
            Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                Index64::from_vec64(tooffsets),
                out,
                None,
                Parameters::new(),
            ))))
        }
        SliceItem::Missing(missing) => {
            let SliceItem::Array(valid_item) = missing.content() else {
                return Err(RaggedError::SliceMismatch {
                    class: "ListArray",
                    message: "missing entries in a jagged slice must wrap a fancy-index"
                        .into(),
                });
            };
            let (tocarry, smalloffsets, largeoffsets) =
                kernels::jagged_shrink(slicestarts, slicestops, missing.index());
            // Shrink the valid-entry fancy-index to the surviving positions.
            // `tocarry` addresses the flattened missing index; the valid
            // entries of `missing.index()` number the fancy-index entries.
            let mut shrunk = Vec64::with_capacity(tocarry.len());
            for &c in tocarry.iter() {
                shrunk.push(valid_item.index().get(missing.index().get(c)));
            }
            let rows = smalloffsets.len() - 1;
            let smallstarts =
                Index64::from_vec64(smalloffsets.clone()).window(0, rows as i64);
            let smallstops =
                Index64::from_vec64(smalloffsets.clone()).window(1, rows as i64);
            let dense_item = SliceItem::Array(SliceArray64::new(
                Index64::from_vec64(shrunk),
                vec![tocarry.len() as i64],
                false,
            ));
            let list = Content::List(Arc::new(ListArray::new(
                starts.clone(),
                stops.clone(),
                content.clone(),
                None,
                Parameters::new(),
            )));
            let out = list.getitem_next_jagged(&smallstarts, &smallstops, &dense_item, tail)?;
            if smalloffsets[..] == largeoffsets[..] {
                return Ok(out);
            }
            // Restore the missing positions inside each row.
            let Content::ListOffset(out) = out else {
                return Err(RaggedError::SliceMismatch {
                    class: "ListArray",
                    message: "jagged missing-value slice must resolve to list rows".into(),
                });
            };
            let mut outindex = Vec64::new();
            let mut count = 0i64;
            for i in 0..slicestarts.len() {
                for j in slicestarts.get(i)..slicestops.get(i) {
                    if missing.index().get(j) < 0 {
                        outindex.push(-1);
                    } else {
                        outindex.push(count);
                        count += 1;
                    }
                }
            }
            let option = IndexedArray::new(
                Index64::from_vec64(outindex),
                out.content().clone(),
                true,
                None,
                Parameters::new(),
            )
            .simplified()?;
            Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                Index64::from_vec64(largeoffsets),
                option,
                None,
                Parameters::new(),
            ))))
        }
        SliceItem::Jagged(inner) => {
            let tooffsets = kernels::jagged_descend(slicestarts, slicestops, starts, stops)
                .map_err(|e| handle_error(e, "ListArray"))?;
            let flat = crate::kernels::lists::flatten_carry(starts, stops);
            let down = content.carry_unchecked(&flat)?;
            let rows = inner.length();
            let innerstarts = inner.offsets().window(0, rows);
            let innerstops = inner.offsets().window(1, rows);
            let out =
                down.getitem_next_jagged(&innerstarts, &innerstops, inner.content(), tail)?;
            Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                Index64::from_vec64(tooffsets),
                out,
                None,
                Parameters::new(),
            ))))
        }
        _ => Err(RaggedError::SliceMismatch {
            class: "ListArray",
            message: "a jagged slice can only contain fancy-indexes, missing values, or \
                      deeper jagged slices"
                .into(),
        }),
    }
}

/// Restores the broadcast fancy-index shape above a resolved selection.
fn array_wrap(out: Content, shape: &[i64]) -> Content {
    let mut out = out;
    for &size in shape.iter().rev() {
        let length = if size > 0 { out.len() / size } else { 0 };
        out = Content::Regular(Arc::new(RegularArray::new(
            out,
            size,
            length,
            None,
            Parameters::new(),
        )));
    }
    out
}

/// Length-zero result at the wrapper level: drill one dimension down so the
/// caller gets an empty array of the right inner type.
fn unwrap_empty(out: &Content) -> Content {
    match out {
        Content::Regular(a) => a.content().getitem_range_nowrap(0, 0),
        Content::List(a) => a.content().getitem_range_nowrap(0, 0),
        Content::ListOffset(a) => a.content().getitem_range_nowrap(0, 0),
        other => other.getitem_range_nowrap(0, 0),
    }
}
