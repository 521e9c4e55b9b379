//! # **Structural Module** - *Shape-changing operations over layout trees*
//!
//! The operations that rewrite list structure rather than select from it:
//! per-row counts (`num`), removing a dimension (`flatten`), padding rows
//! with missing values (`rpad`/`rpad_and_clip`), per-row element positions
//! (`localindex`), per-row tuples (`combinations`), concatenation (`merge`
//! and its union fallback), and missing-value replacement (`fillna`).
//!
//! All of them resolve `axis` the same way: non-negative axes count down
//! from this node (axis 0 is the node's own dimension), negative axes count
//! up from the shallowest leaf. Option nodes never participate structurally:
//! each carries its dense elements, recurses, and rewraps, except where the
//! operation itself is about missingness (`flatten` drops missing rows,
//! `fillna` replaces them).

use std::sync::Arc;

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::kernels::lists;
use crate::structs::identities::Identities;
use crate::structs::index::{Index8, Index64};
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::bit_masked::BitMaskedArray;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::record::RecordArray;
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::structs::variants::virtual_array::VirtualArray;
use crate::traits::type_unions::Primitive;
use crate::utils::handle_error;

fn scalar_i64(value: i64) -> Content {
    Content::Numpy(<i64 as Primitive>::wrap(NumpyArray::scalar(value)))
}

fn i64_leaf(values: Vec64<i64>) -> Content {
    Content::Numpy(<i64 as Primitive>::wrap(NumpyArray::from_vec64(values)))
}

impl Content {
    /// Resolves a possibly-negative axis against this node's depth.
    fn resolve_axis(&self, axis: i64, op: &'static str) -> Result<i64, RaggedError> {
        if axis >= 0 {
            return Ok(axis);
        }
        let depth = self.minmax_depth().0;
        let posaxis = depth + axis;
        if posaxis < 0 {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: format!(
                    "axis {} is out of range for '{}' on an array of depth {}",
                    axis, op, depth
                ),
            });
        }
        Ok(posaxis)
    }

    fn axis_out_of_range(&self, op: &'static str) -> RaggedError {
        RaggedError::InvalidArgument {
            class: self.classname(),
            message: format!("'axis' out of range for '{}'", op),
        }
    }

    /// Number of elements at `axis`: a scalar for axis 0, otherwise an array
    /// of per-row counts nested to `axis - 1`.
    pub fn num(&self, axis: i64) -> Result<Content, RaggedError> {
        let axis = self.resolve_axis(axis, "num")?;
        if axis == 0 {
            return match self {
                Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                    class: "Record",
                    operation: "num",
                }),
                _ => Ok(scalar_i64(self.len())),
            };
        }
        match self {
            Content::Empty(_) => Err(self.axis_out_of_range("num")),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().num(axis)
                } else {
                    Err(self.axis_out_of_range("num"))
                }
            }
            Content::Regular(a) => {
                if axis == 1 {
                    let mut v = Vec64::with_capacity(a.len() as usize);
                    v.resize(a.len() as usize, a.size());
                    Ok(i64_leaf(v))
                } else {
                    let trimmed = a.content().getitem_range_nowrap(0, a.len() * a.size());
                    Ok(Content::Regular(Arc::new(RegularArray::new(
                        trimmed.num(axis - 1)?,
                        a.size(),
                        a.len(),
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::List(a) => {
                if axis == 1 {
                    let counts = lists::list_num(a.starts(), a.stops())
                        .map_err(|e| handle_error(e, "ListArray"))?;
                    Ok(i64_leaf(counts))
                } else {
                    Content::ListOffset(Arc::new(a.to_list_offset()?)).num(axis)
                }
            }
            Content::ListOffset(a) => {
                if axis == 1 {
                    let counts = lists::list_num(&a.starts(), &a.stops())
                        .map_err(|e| handle_error(e, "ListOffsetArray"))?;
                    Ok(i64_leaf(counts))
                } else {
                    let c = a.compact();
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        c.offsets().clone(),
                        c.content().num(axis - 1)?,
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, outindex) = a.nextcarry_outindex();
                let dense = a.content().carry(nextcarry.as_slice())?.num(axis)?;
                IndexedArray::new(outindex, dense, true, None, Parameters::new()).simplified()
            }
            Content::Indexed(a) => a.project()?.num(axis),
            Content::ByteMasked(a) => {
                Content::Indexed(Arc::new(a.to_indexed_option())).num(axis)
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).num(axis)
            }
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(c.getitem_range_nowrap(0, a.len()).num(axis)?);
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len()),
                    None,
                    Parameters::new(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "num",
            }),
            Content::Union(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for t in 0..a.numcontents() {
                    contents.push(a.project(t)?.num(axis)?);
                }
                Ok(Content::Union(Arc::new(UnionArray::from_tags_regular(
                    a.tags().clone(),
                    contents,
                    Parameters::new(),
                ))))
            }
            Content::Virtual(a) => a.array()?.num(axis),
        }
    }

    /// Removes the dimension at `axis` (at least 1), merging its rows into
    /// the level above. Missing rows at intervening option layers are
    /// dropped. Also returns the offsets that delimit, per row of this node,
    /// where the flattened elements came from.
    pub fn offsets_and_flattened(
        &self,
        axis: i64,
    ) -> Result<(Index64, Content), RaggedError> {
        let axis = self.resolve_axis(axis, "flatten")?;
        if axis < 1 {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: "'axis' must be at least 1 for 'flatten'".into(),
            });
        }
        match self {
            Content::Empty(_) => Err(self.axis_out_of_range("flatten")),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().offsets_and_flattened(axis)
                } else {
                    Err(self.axis_out_of_range("flatten"))
                }
            }
            Content::Regular(a) => Content::ListOffset(Arc::new(a.to_list_offset()))
                .offsets_and_flattened(axis),
            Content::List(a) => Content::ListOffset(Arc::new(a.to_list_offset()?))
                .offsets_and_flattened(axis),
            Content::ListOffset(a) => {
                let c = a.compact();
                if axis == 1 {
                    Ok((c.offsets().clone(), c.content().clone()))
                } else if axis == 2 {
                    // The level directly below goes away: this node's row
                    // extents become sums of its grandchildren counts.
                    let (inneroffsets, innerflat) =
                        c.content().offsets_and_flattened(1)?;
                    let mut v = Vec64::with_capacity(c.offsets().len() as usize);
                    for i in 0..c.offsets().len() {
                        v.push(inneroffsets.get(c.offsets().get(i)));
                    }
                    let outoffsets = Index64::from_vec64(v);
                    Ok((
                        outoffsets.clone(),
                        Content::ListOffset(Arc::new(ListOffsetArray::new(
                            outoffsets,
                            innerflat,
                            None,
                            Parameters::new(),
                        ))),
                    ))
                } else {
                    // Removed dimension is deeper than the grandchildren:
                    // this node's row extents are unchanged.
                    let flatchild = c.content().offsets_and_flattened(axis - 1)?.1;
                    Ok((
                        c.offsets().clone(),
                        Content::ListOffset(Arc::new(ListOffsetArray::new(
                            c.offsets().clone(),
                            flatchild,
                            None,
                            Parameters::new(),
                        ))),
                    ))
                }
            }
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, _) = a.nextcarry_outindex();
                a.content()
                    .carry(nextcarry.as_slice())?
                    .offsets_and_flattened(axis)
            }
            Content::Indexed(a) => a.project()?.offsets_and_flattened(axis),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .offsets_and_flattened(axis),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .offsets_and_flattened(axis),
            Content::Record(_) | Content::RecordScalar(_) => {
                Err(RaggedError::Unsupported {
                    class: "RecordArray",
                    operation: "flatten",
                })
            }
            Content::Union(a) => {
                let mut merged: Option<Content> = None;
                for t in 0..a.numcontents() {
                    let flat = a.project(t)?.offsets_and_flattened(axis)?.1;
                    merged = Some(match merged {
                        None => flat,
                        Some(acc) => acc.merge(&flat)?,
                    });
                }
                Ok((
                    Index64::empty(),
                    merged.unwrap_or(Content::Empty(Arc::new(EmptyArray::default()))),
                ))
            }
            Content::Virtual(a) => a.array()?.offsets_and_flattened(axis),
        }
    }

    /// The flattened array alone; see [`Content::offsets_and_flattened`].
    pub fn flatten(&self, axis: i64) -> Result<Content, RaggedError> {
        Ok(self.offsets_and_flattened(axis)?.1)
    }

    /// Pads rows at `axis` with missing values up to at least `target`
    /// elements; longer rows are kept whole.
    pub fn rpad(&self, target: i64, axis: i64) -> Result<Content, RaggedError> {
        self.rpad_impl(target, axis, false)
    }

    /// Pads and clips rows at `axis` to exactly `target` elements, making
    /// that dimension regular.
    pub fn rpad_and_clip(&self, target: i64, axis: i64) -> Result<Content, RaggedError> {
        self.rpad_impl(target, axis, true)
    }

    fn rpad_impl(&self, target: i64, axis: i64, clip: bool) -> Result<Content, RaggedError> {
        if target < 0 {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: "'target' must not be negative for 'rpad'".into(),
            });
        }
        let axis = self.resolve_axis(axis, "rpad")?;
        if axis == 0 {
            if let Content::RecordScalar(_) = self {
                return Err(RaggedError::Unsupported {
                    class: "Record",
                    operation: "rpad",
                });
            }
            let len = self.len();
            if !clip && target <= len {
                return Ok(self.clone());
            }
            let outlen = if clip { target } else { target.max(len) };
            let mut v = Vec64::with_capacity(outlen as usize);
            for i in 0..outlen {
                v.push(if i < len { i } else { -1 });
            }
            return IndexedArray::new(
                Index64::from_vec64(v),
                self.clone(),
                true,
                None,
                Parameters::new(),
            )
            .simplified();
        }
        match self {
            Content::Empty(_) => Err(self.axis_out_of_range("rpad")),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().rpad_impl(target, axis, clip)
                } else {
                    Err(self.axis_out_of_range("rpad"))
                }
            }
            Content::Regular(a) => {
                if axis == 1 {
                    let offsets = a.offsets();
                    let starts = offsets.window(0, a.len());
                    let stops = offsets.window(1, a.len());
                    pad_list_dimension(&starts, &stops, a.content(), target, clip)
                } else {
                    let trimmed = a.content().getitem_range_nowrap(0, a.len() * a.size());
                    Ok(Content::Regular(Arc::new(RegularArray::new(
                        trimmed.rpad_impl(target, axis - 1, clip)?,
                        a.size(),
                        a.len(),
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::List(a) => {
                if axis == 1 {
                    pad_list_dimension(a.starts(), a.stops(), a.content(), target, clip)
                } else {
                    Content::ListOffset(Arc::new(a.to_list_offset()?))
                        .rpad_impl(target, axis, clip)
                }
            }
            Content::ListOffset(a) => {
                if axis == 1 {
                    pad_list_dimension(&a.starts(), &a.stops(), a.content(), target, clip)
                } else {
                    let c = a.compact();
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        c.offsets().clone(),
                        c.content().rpad_impl(target, axis - 1, clip)?,
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, outindex) = a.nextcarry_outindex();
                let dense = a
                    .content()
                    .carry(nextcarry.as_slice())?
                    .rpad_impl(target, axis, clip)?;
                IndexedArray::new(outindex, dense, true, None, Parameters::new()).simplified()
            }
            Content::Indexed(a) => a.project()?.rpad_impl(target, axis, clip),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .rpad_impl(target, axis, clip),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .rpad_impl(target, axis, clip),
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(
                        c.getitem_range_nowrap(0, a.len()).rpad_impl(target, axis, clip)?,
                    );
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len()),
                    None,
                    Parameters::new(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "rpad",
            }),
            Content::Union(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for t in 0..a.numcontents() {
                    contents.push(a.project(t)?.rpad_impl(target, axis, clip)?);
                }
                Ok(Content::Union(Arc::new(UnionArray::from_tags_regular(
                    a.tags().clone(),
                    contents,
                    Parameters::new(),
                ))))
            }
            Content::Virtual(a) => a.array()?.rpad_impl(target, axis, clip),
        }
    }

    /// Position of each element within its row at `axis`; axis 0 is the
    /// identity `[0, 1, ..., len-1]`.
    pub fn localindex(&self, axis: i64) -> Result<Content, RaggedError> {
        let axis = self.resolve_axis(axis, "localindex")?;
        if axis == 0 {
            return match self {
                Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                    class: "Record",
                    operation: "localindex",
                }),
                _ => {
                    let mut v = Vec64::with_capacity(self.len() as usize);
                    for i in 0..self.len() {
                        v.push(i);
                    }
                    Ok(i64_leaf(v))
                }
            };
        }
        match self {
            Content::Empty(_) => Err(self.axis_out_of_range("localindex")),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().localindex(axis)
                } else {
                    Err(self.axis_out_of_range("localindex"))
                }
            }
            Content::Regular(a) => {
                if axis == 1 {
                    let local = lists::list_localindex(a.offsets().as_slice());
                    Ok(Content::Regular(Arc::new(RegularArray::new(
                        i64_leaf(local),
                        a.size(),
                        a.len(),
                        None,
                        Parameters::new(),
                    ))))
                } else {
                    let trimmed = a.content().getitem_range_nowrap(0, a.len() * a.size());
                    Ok(Content::Regular(Arc::new(RegularArray::new(
                        trimmed.localindex(axis - 1)?,
                        a.size(),
                        a.len(),
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::List(a) => {
                Content::ListOffset(Arc::new(a.to_list_offset()?)).localindex(axis)
            }
            Content::ListOffset(a) => {
                let c = a.compact();
                if axis == 1 {
                    let local = lists::list_localindex(c.offsets().as_slice());
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        c.offsets().clone(),
                        i64_leaf(local),
                        None,
                        Parameters::new(),
                    ))))
                } else {
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        c.offsets().clone(),
                        c.content().localindex(axis - 1)?,
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, outindex) = a.nextcarry_outindex();
                let dense = a.content().carry(nextcarry.as_slice())?.localindex(axis)?;
                IndexedArray::new(outindex, dense, true, None, Parameters::new()).simplified()
            }
            Content::Indexed(a) => a.project()?.localindex(axis),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .localindex(axis),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .localindex(axis),
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(c.getitem_range_nowrap(0, a.len()).localindex(axis)?);
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len()),
                    None,
                    Parameters::new(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "localindex",
            }),
            Content::Union(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for t in 0..a.numcontents() {
                    contents.push(a.project(t)?.localindex(axis)?);
                }
                Ok(Content::Union(Arc::new(UnionArray::from_tags_regular(
                    a.tags().clone(),
                    contents,
                    Parameters::new(),
                ))))
            }
            Content::Virtual(a) => a.array()?.localindex(axis),
        }
    }

    /// Per-row n-tuples of elements at `axis`, in lexicographic order, as a
    /// list of records. `fields` names the tuple slots (length must be `n`);
    /// `None` produces positional (tuple) records. `replacement` lets an
    /// element pair with itself.
    pub fn combinations(
        &self,
        n: i64,
        replacement: bool,
        fields: Option<Vec<String>>,
        axis: i64,
    ) -> Result<Content, RaggedError> {
        if let Some(names) = &fields {
            if names.len() as i64 != n {
                return Err(RaggedError::InvalidArgument {
                    class: self.classname(),
                    message: format!(
                        "in combinations, 'fields' has {} names but n is {}",
                        names.len(),
                        n
                    ),
                });
            }
        }
        let axis = self.resolve_axis(axis, "combinations")?;
        if axis < 1 {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: "in combinations, 'axis' must be at least 1".into(),
            });
        }
        match self {
            Content::Empty(_) => Err(self.axis_out_of_range("combinations")),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    a.to_regular().combinations(n, replacement, fields, axis)
                } else {
                    Err(self.axis_out_of_range("combinations"))
                }
            }
            Content::Regular(a) => {
                if axis == 1 {
                    let offsets = a.offsets();
                    let starts = offsets.window(0, a.len());
                    let stops = offsets.window(1, a.len());
                    tuples_of_list_dimension(
                        &starts,
                        &stops,
                        a.content(),
                        n,
                        replacement,
                        fields,
                    )
                } else {
                    let trimmed = a.content().getitem_range_nowrap(0, a.len() * a.size());
                    Ok(Content::Regular(Arc::new(RegularArray::new(
                        trimmed.combinations(n, replacement, fields, axis - 1)?,
                        a.size(),
                        a.len(),
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::List(a) => {
                if axis == 1 {
                    tuples_of_list_dimension(
                        a.starts(),
                        a.stops(),
                        a.content(),
                        n,
                        replacement,
                        fields,
                    )
                } else {
                    Content::ListOffset(Arc::new(a.to_list_offset()?))
                        .combinations(n, replacement, fields, axis)
                }
            }
            Content::ListOffset(a) => {
                if axis == 1 {
                    tuples_of_list_dimension(
                        &a.starts(),
                        &a.stops(),
                        a.content(),
                        n,
                        replacement,
                        fields,
                    )
                } else {
                    let c = a.compact();
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        c.offsets().clone(),
                        c.content().combinations(n, replacement, fields, axis - 1)?,
                        None,
                        Parameters::new(),
                    ))))
                }
            }
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, outindex) = a.nextcarry_outindex();
                let dense = a
                    .content()
                    .carry(nextcarry.as_slice())?
                    .combinations(n, replacement, fields, axis)?;
                IndexedArray::new(outindex, dense, true, None, Parameters::new()).simplified()
            }
            Content::Indexed(a) => a.project()?.combinations(n, replacement, fields, axis),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .combinations(n, replacement, fields, axis),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .combinations(n, replacement, fields, axis),
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(c.getitem_range_nowrap(0, a.len()).combinations(
                        n,
                        replacement,
                        fields.clone(),
                        axis,
                    )?);
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len()),
                    None,
                    Parameters::new(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "combinations",
            }),
            Content::Union(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for t in 0..a.numcontents() {
                    contents.push(a.project(t)?.combinations(
                        n,
                        replacement,
                        fields.clone(),
                        axis,
                    )?);
                }
                Ok(Content::Union(Arc::new(UnionArray::from_tags_regular(
                    a.tags().clone(),
                    contents,
                    Parameters::new(),
                ))))
            }
            Content::Virtual(a) => {
                a.array()?.combinations(n, replacement, fields, axis)
            }
        }
    }

    /// Whether `merge(other)` would succeed. `mergebool` decides whether
    /// booleans unify with numbers (as integers 0/1).
    pub fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        // Option and projection layers are transparent to merge typing.
        match self {
            Content::Indexed(a) => return a.content().mergeable(other, mergebool),
            Content::ByteMasked(a) => return a.content().mergeable(other, mergebool),
            Content::BitMasked(a) => return a.content().mergeable(other, mergebool),
            Content::Virtual(a) => {
                return match a.array() {
                    Ok(m) => m.mergeable(other, mergebool),
                    Err(_) => false,
                };
            }
            _ => {}
        }
        match other {
            Content::Indexed(b) => return self.mergeable(b.content(), mergebool),
            Content::ByteMasked(b) => return self.mergeable(b.content(), mergebool),
            Content::BitMasked(b) => return self.mergeable(b.content(), mergebool),
            Content::Virtual(b) => {
                return match b.array() {
                    Ok(m) => self.mergeable(&m, mergebool),
                    Err(_) => false,
                };
            }
            _ => {}
        }
        match (self, other) {
            (Content::Empty(_), _) | (_, Content::Empty(_)) => true,
            (Content::Union(_), _) | (_, Content::Union(_)) => true,
            (Content::Numpy(a), Content::Numpy(b)) => {
                if a.ndim() > 1 || b.ndim() > 1 {
                    return a.ndim() == b.ndim()
                        && a.to_regular().mergeable(&b.to_regular(), mergebool);
                }
                match (a.is_bool(), b.is_bool()) {
                    (true, true) => true,
                    (false, false) => true,
                    _ => mergebool,
                }
            }
            (
                Content::List(_) | Content::ListOffset(_) | Content::Regular(_),
                Content::List(_) | Content::ListOffset(_) | Content::Regular(_),
            ) => match (self.list_content(), other.list_content()) {
                (Some(a), Some(b)) => a.mergeable(&b, mergebool),
                _ => false,
            },
            (Content::Record(a), Content::Record(b)) => {
                if a.istuple() != b.istuple() || a.numfields() != b.numfields() {
                    return false;
                }
                for key in a.keys() {
                    let (Ok(fa), Ok(fb)) = (a.field(&key), b.field(&key)) else {
                        return false;
                    };
                    if !fa.mergeable(&fb, mergebool) {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn list_content(&self) -> Option<Content> {
        match self {
            Content::List(a) => Some(a.content().clone()),
            Content::ListOffset(a) => Some(a.content().clone()),
            Content::Regular(a) => Some(a.content().clone()),
            _ => None,
        }
    }

    /// Concatenates `other` after `self`, promoting dtypes where needed (any
    /// float makes `float64`, otherwise mixed integers make `int64`; bool
    /// promotes with numbers as 0/1). Errors with `IncompatibleMerge` when
    /// the types cannot unify; see [`Content::merge_as_union`] for the
    /// anything-goes fallback.
    pub fn merge(&self, other: &Content) -> Result<Content, RaggedError> {
        match (self, other) {
            (Content::Empty(_), _) => return Ok(other.clone()),
            (_, Content::Empty(_)) => return Ok(self.clone()),
            (Content::RecordScalar(_), _) | (_, Content::RecordScalar(_)) => {
                return Err(RaggedError::Unsupported {
                    class: "Record",
                    operation: "merge",
                });
            }
            _ => {}
        }
        if let Content::Virtual(a) = self {
            return a.array()?.merge(other);
        }
        if let Content::Virtual(b) = other {
            return self.merge(&b.array()?);
        }
        if matches!(self, Content::Union(_)) || matches!(other, Content::Union(_)) {
            let (tags1, index1, contents1) = union_pieces(self);
            let (tags2, index2, contents2) = union_pieces(other);
            let shift = contents1.len() as i8;
            let mut tags = tags1;
            for t in tags2.iter() {
                tags.push(t + shift);
            }
            let mut index = index1;
            index.extend_from_slice(&index2);
            let mut contents = contents1;
            contents.extend(contents2);
            return Ok(Content::Union(Arc::new(UnionArray::new(
                Index8::from_vec64(tags),
                Index64::from_vec64(index),
                contents,
                None,
                Parameters::new(),
            ))));
        }
        if self.is_option() || other.is_option() {
            let (index1, content1) = option_pieces(self);
            let (index2, content2) = option_pieces(other);
            let shift = content1.len();
            let merged = content1.merge(&content2)?;
            let mut index = index1;
            for &v in index2.iter() {
                index.push(if v < 0 { -1 } else { v + shift });
            }
            return IndexedArray::new(
                Index64::from_vec64(index),
                merged,
                true,
                None,
                Parameters::new(),
            )
            .simplified();
        }
        if let Content::Indexed(a) = self {
            return a.project()?.merge(other);
        }
        if let Content::Indexed(b) = other {
            return self.merge(&b.project()?);
        }
        match (self, other) {
            (Content::Numpy(a), Content::Numpy(b)) => {
                if a.ndim() > 1 || b.ndim() > 1 {
                    return a.to_regular().merge(&b.to_regular());
                }
                if let Some(out) = a.merge_same_dtype(b) {
                    return Ok(Content::Numpy(out));
                }
                let target = if a.is_float() || b.is_float() {
                    "float64"
                } else {
                    "int64"
                };
                let out = a
                    .cast_to(target)
                    .merge_same_dtype(&b.cast_to(target))
                    .ok_or(RaggedError::IncompatibleMerge {
                        from: "NumpyArray",
                        to: "NumpyArray",
                        message: Some("dtypes do not promote to a common type".into()),
                    })?;
                Ok(Content::Numpy(out))
            }
            (
                Content::List(_) | Content::ListOffset(_) | Content::Regular(_),
                Content::List(_) | Content::ListOffset(_) | Content::Regular(_),
            ) => {
                let a = self.as_compact_list()?;
                let b = other.as_compact_list()?;
                let merged = a.content().merge(b.content())?;
                let shift = a.content().len();
                let mut offsets = Vec64::with_capacity((a.len() + b.len()) as usize + 1);
                for i in 0..a.offsets().len() {
                    offsets.push(a.offsets().get(i));
                }
                for i in 1..b.offsets().len() {
                    offsets.push(b.offsets().get(i) + shift);
                }
                Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                    Index64::from_vec64(offsets),
                    merged,
                    None,
                    Parameters::new(),
                ))))
            }
            (Content::Record(a), Content::Record(b)) => {
                if a.istuple() != b.istuple() || a.numfields() != b.numfields() {
                    return Err(RaggedError::IncompatibleMerge {
                        from: "RecordArray",
                        to: "RecordArray",
                        message: Some("field sets differ".into()),
                    });
                }
                let mut contents = Vec::with_capacity(a.contents().len());
                for key in a.keys() {
                    let fb = b.field(&key).map_err(|_| RaggedError::IncompatibleMerge {
                        from: "RecordArray",
                        to: "RecordArray",
                        message: Some(format!("no field {:?} in the other record", key)),
                    })?;
                    contents.push(a.field(&key)?.merge(&fb)?);
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len() + b.len()),
                    None,
                    Parameters::new(),
                ))))
            }
            _ => Err(RaggedError::IncompatibleMerge {
                from: self.classname(),
                to: other.classname(),
                message: None,
            }),
        }
    }

    fn as_compact_list(&self) -> Result<ListOffsetArray, RaggedError> {
        match self {
            Content::List(a) => a.to_list_offset(),
            Content::ListOffset(a) => Ok(a.compact()),
            Content::Regular(a) => Ok(a.to_list_offset()),
            _ => Err(RaggedError::IncompatibleMerge {
                from: self.classname(),
                to: "ListOffsetArray",
                message: Some("not a list dimension".into()),
            }),
        }
    }

    /// Concatenation that never fails on type grounds: the result is a
    /// [`UnionArray`] with `self`'s elements tagged 0 and `other`'s tagged 1.
    pub fn merge_as_union(&self, other: &Content) -> Content {
        let total = (self.len().max(0) + other.len().max(0)) as usize;
        let mut tags = Vec64::with_capacity(total);
        let mut index = Vec64::with_capacity(total);
        for i in 0..self.len() {
            tags.push(0i8);
            index.push(i);
        }
        for i in 0..other.len() {
            tags.push(1i8);
            index.push(i);
        }
        Content::Union(Arc::new(UnionArray::new(
            Index8::from_vec64(tags),
            Index64::from_vec64(index),
            vec![self.clone(), other.clone()],
            None,
            Parameters::new(),
        )))
    }

    /// Replaces missing values with `value` (a length-1 array) at every
    /// option layer of the tree.
    pub fn fillna(&self, value: &Content) -> Result<Content, RaggedError> {
        if value.len() != 1 {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: format!(
                    "fill value must have length 1, not {}",
                    value.len()
                ),
            });
        }
        match self {
            Content::Empty(_) | Content::Numpy(_) => Ok(self.clone()),
            Content::List(a) => Ok(Content::List(Arc::new(ListArray::new(
                a.starts().clone(),
                a.stops().clone(),
                a.content().fillna(value)?,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ListOffset(a) => Ok(Content::ListOffset(Arc::new(
                ListOffsetArray::new(
                    a.offsets().clone(),
                    a.content().fillna(value)?,
                    a.identities().cloned(),
                    a.parameters().clone(),
                ),
            ))),
            Content::Regular(a) => Ok(Content::Regular(Arc::new(RegularArray::new(
                a.content().fillna(value)?,
                a.size(),
                a.len(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::Indexed(a) if a.is_option() => {
                let (tags, outindex) = crate::kernels::missing::fillna_tags_index(a.index());
                let (nextcarry, _) = a.nextcarry_outindex();
                let dense = a.content().carry(nextcarry.as_slice())?.fillna(value)?;
                let union = UnionArray::new(
                    Index8::from_vec64(tags),
                    Index64::from_vec64(outindex),
                    vec![dense, value.clone()],
                    None,
                    Parameters::new(),
                );
                union.simplified(true)
            }
            Content::Indexed(a) => Ok(Content::Indexed(Arc::new(IndexedArray::new(
                a.index().clone(),
                a.content().fillna(value)?,
                false,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ByteMasked(a) => {
                Content::Indexed(Arc::new(a.to_indexed_option())).fillna(value)
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).fillna(value)
            }
            Content::Record(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(c.getitem_range_nowrap(0, a.len()).fillna(value)?);
                }
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(a.len()),
                    a.identities().cloned(),
                    a.parameters().clone(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "fillna",
            }),
            Content::Union(a) => {
                let mut contents = Vec::with_capacity(a.contents().len());
                for c in a.contents() {
                    contents.push(c.fillna(value)?);
                }
                Ok(Content::Union(Arc::new(UnionArray::new(
                    a.tags().clone(),
                    a.index().clone(),
                    contents,
                    a.identities().cloned(),
                    a.parameters().clone(),
                ))))
            }
            Content::Virtual(a) => a.array()?.fillna(value),
        }
    }

    /// Materialises projection layers and drops missing elements; plain
    /// nodes pass through unchanged.
    pub fn project(&self) -> Result<Content, RaggedError> {
        match self {
            Content::Indexed(a) if a.is_option() => {
                let (nextcarry, _) = a.nextcarry_outindex();
                a.content().carry(nextcarry.as_slice())
            }
            Content::Indexed(a) => a.project(),
            Content::ByteMasked(a) => {
                Content::Indexed(Arc::new(a.to_indexed_option())).project()
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).project()
            }
            Content::Virtual(a) => a.array()?.project(),
            other => Ok(other.clone()),
        }
    }

    /// This node with one parameter added.
    pub fn with_parameter(&self, key: &str, value: &str) -> Content {
        let mut parameters = self.parameters();
        parameters.insert(key.to_owned(), value.to_owned());
        self.with_parameters(parameters)
    }

    /// This node with its parameters replaced; children are untouched.
    pub fn with_parameters(&self, parameters: Parameters) -> Content {
        self.rebuild(parameters, self.identities())
    }

    /// This node with its identities replaced; children are untouched.
    pub fn with_identities(&self, identities: Option<Identities>) -> Content {
        self.rebuild(self.parameters(), identities)
    }

    fn rebuild(&self, parameters: Parameters, identities: Option<Identities>) -> Content {
        match self {
            Content::Empty(_) => {
                Content::Empty(Arc::new(EmptyArray::new(identities, parameters)))
            }
            Content::Numpy(a) => {
                Content::Numpy(a.with_parameters(parameters).with_identities(identities))
            }
            Content::List(a) => Content::List(Arc::new(ListArray::new(
                a.starts().clone(),
                a.stops().clone(),
                a.content().clone(),
                identities,
                parameters,
            ))),
            Content::ListOffset(a) => Content::ListOffset(Arc::new(ListOffsetArray::new(
                a.offsets().clone(),
                a.content().clone(),
                identities,
                parameters,
            ))),
            Content::Regular(a) => Content::Regular(Arc::new(RegularArray::new(
                a.content().clone(),
                a.size(),
                a.len(),
                identities,
                parameters,
            ))),
            Content::Indexed(a) => Content::Indexed(Arc::new(IndexedArray::new(
                a.index().clone(),
                a.content().clone(),
                a.is_option(),
                identities,
                parameters,
            ))),
            Content::ByteMasked(a) => Content::ByteMasked(Arc::new(ByteMaskedArray::new(
                a.mask().clone(),
                a.content().clone(),
                a.valid_when(),
                identities,
                parameters,
            ))),
            Content::BitMasked(a) => Content::BitMasked(Arc::new(BitMaskedArray::new(
                a.mask().clone(),
                a.content().clone(),
                a.valid_when(),
                a.len(),
                a.lsb_order(),
                identities,
                parameters,
            ))),
            Content::Record(a) => Content::Record(Arc::new(RecordArray::new(
                a.contents().to_vec(),
                a.fields().map(|f| f.to_vec()),
                Some(a.len()),
                identities,
                parameters,
            ))),
            Content::RecordScalar(_) => self.clone(),
            Content::Union(a) => Content::Union(Arc::new(UnionArray::new(
                a.tags().clone(),
                a.index().clone(),
                a.contents().to_vec(),
                identities,
                parameters,
            ))),
            Content::Virtual(a) => Content::Virtual(Arc::new(VirtualArray::new(
                a.generator().clone(),
                a.cache().cloned(),
                Some(a.cache_key().to_owned()),
                identities,
                parameters,
            ))),
        }
    }
}

impl UnionArray {
    /// Merges contents that share a mergeable type, group-wise and in
    /// first-seen order; contents no earlier group accepts stay distinct.
    /// A single surviving group collapses to a plain array.
    pub fn simplified(&self, mergebool: bool) -> Result<Content, RaggedError> {
        let mut groups: Vec<Content> = Vec::new();
        // Per input content: its output group and offset within it.
        let mut mapping: Vec<(usize, i64)> = Vec::with_capacity(self.contents().len());
        for c in self.contents() {
            let found = groups.iter().position(|g| g.mergeable(c, mergebool));
            match found {
                Some(g) => {
                    let base = groups[g].len();
                    groups[g] = groups[g].merge(c)?;
                    mapping.push((g, base));
                }
                None => {
                    mapping.push((groups.len(), 0));
                    groups.push(c.clone());
                }
            }
        }
        if groups.len() == 1 {
            let mut carry = Vec::with_capacity(self.len().max(0) as usize);
            for i in 0..self.len() {
                let (_, base) = mapping[self.tags().get(i) as usize];
                carry.push(base + self.index().get(i));
            }
            return groups[0].carry(&carry);
        }
        let mut tags = Vec64::with_capacity(self.len().max(0) as usize);
        let mut index = Vec64::with_capacity(self.len().max(0) as usize);
        for i in 0..self.len() {
            let (g, base) = mapping[self.tags().get(i) as usize];
            tags.push(g as i8);
            index.push(base + self.index().get(i));
        }
        Ok(Content::Union(Arc::new(UnionArray::new(
            Index8::from_vec64(tags),
            Index64::from_vec64(index),
            groups,
            None,
            self.parameters().clone(),
        ))))
    }
}

/// The rpad core for one list dimension: an option-projection over the
/// existing content, wrapped ragged (`rpad`) or regular (`rpad_and_clip`).
fn pad_list_dimension(
    starts: &Index64,
    stops: &Index64,
    content: &Content,
    target: i64,
    clip: bool,
) -> Result<Content, RaggedError> {
    if clip {
        let index = lists::list_rpad_and_clip(starts, stops, target)
            .map_err(|e| handle_error(e, "ListArray"))?;
        let option = IndexedArray::new(
            Index64::from_vec64(index),
            content.clone(),
            true,
            None,
            Parameters::new(),
        )
        .simplified()?;
        Ok(Content::Regular(Arc::new(RegularArray::new(
            option,
            target,
            starts.len(),
            None,
            Parameters::new(),
        ))))
    } else {
        let (offsets, index) = lists::list_rpad(starts, stops, target)
            .map_err(|e| handle_error(e, "ListArray"))?;
        let option = IndexedArray::new(
            Index64::from_vec64(index),
            content.clone(),
            true,
            None,
            Parameters::new(),
        )
        .simplified()?;
        Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
            Index64::from_vec64(offsets),
            option,
            None,
            Parameters::new(),
        ))))
    }
}

/// The combinations core for one list dimension: a list of n-field records.
fn tuples_of_list_dimension(
    starts: &Index64,
    stops: &Index64,
    content: &Content,
    n: i64,
    replacement: bool,
    fields: Option<Vec<String>>,
) -> Result<Content, RaggedError> {
    let (offsets, carries) = lists::list_combinations(starts, stops, n, replacement)
        .map_err(|e| handle_error(e, "ListArray"))?;
    let mut contents = Vec::with_capacity(carries.len());
    for carry in &carries {
        contents.push(content.carry(carry)?);
    }
    let record = Content::Record(Arc::new(RecordArray::new(
        contents,
        fields,
        None,
        None,
        Parameters::new(),
    )));
    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
        Index64::from_vec64(offsets),
        record,
        None,
        Parameters::new(),
    ))))
}

/// A union's pieces, or a single-content union view of anything else.
fn union_pieces(c: &Content) -> (Vec64<i8>, Vec64<i64>, Vec<Content>) {
    match c {
        Content::Union(u) => {
            let mut tags = Vec64::with_capacity(u.len() as usize);
            let mut index = Vec64::with_capacity(u.len() as usize);
            for i in 0..u.len() {
                tags.push(u.tags().get(i) as i8);
                index.push(u.index().get(i));
            }
            (tags, index, u.contents().to_vec())
        }
        other => {
            let mut tags = Vec64::with_capacity(other.len() as usize);
            let mut index = Vec64::with_capacity(other.len() as usize);
            for i in 0..other.len() {
                tags.push(0i8);
                index.push(i);
            }
            (tags, index, vec![other.clone()])
        }
    }
}

/// An option node's `(index, dense content)`, or an identity projection view
/// of a non-option node.
fn option_pieces(c: &Content) -> (Vec64<i64>, Content) {
    match c {
        Content::Indexed(a) if a.is_option() => {
            let mut index = Vec64::with_capacity(a.len() as usize);
            for i in 0..a.len() {
                index.push(a.index().get(i));
            }
            (index, a.content().clone())
        }
        Content::ByteMasked(a) => {
            option_pieces(&Content::Indexed(Arc::new(a.to_indexed_option())))
        }
        Content::BitMasked(a) => {
            option_pieces(&Content::ByteMasked(Arc::new(a.to_byte_masked())))
        }
        other => {
            let mut index = Vec64::with_capacity(other.len() as usize);
            for i in 0..other.len() {
                index.push(i);
            }
            (index, other.clone())
        }
    }
}
