//! # **Content Module** - *The layout node sum type and its common contract*
//!
//! `Content` closes the set of layout nodes into one enum, so every
//! polymorphic operation is an exhaustive `match` rather than a vtable. This
//! file holds the basic contract shared by all nodes: lengths, element and
//! range access, field access, gather (`carry`), key queries, depth, the
//! validity check, and `Display`. The slice-resolution engine lives in
//! [`crate::getitem`], structural operations in [`crate::structural`], and
//! reductions in [`crate::reduce`], all as further `impl Content` blocks.
//!
//! ## Missing scalars
//! `getitem_at` on a missing element of an option node yields
//! [`Content::Empty`]: the one value that carries no type commitment, the
//! closest layout analogue of `None`.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::error::RaggedError;
use crate::enums::primitive_array::PrimitiveArray;
use crate::kernels::{getitem as getitem_kernels, lists, missing};
use crate::structs::identities::Identities;
use crate::structs::index::{Index8, Index64};
use crate::structs::variants::bit_masked::BitMaskedArray;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::record::{Record, RecordArray};
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::structs::variants::virtual_array::VirtualArray;
use crate::utils::{handle_error, regularize_at, regularize_range};

/// A node of a layout tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Empty(Arc<EmptyArray>),
    Numpy(PrimitiveArray),
    List(Arc<ListArray>),
    ListOffset(Arc<ListOffsetArray>),
    Regular(Arc<RegularArray>),
    Indexed(Arc<IndexedArray>),
    ByteMasked(Arc<ByteMaskedArray>),
    BitMasked(Arc<BitMaskedArray>),
    Record(Arc<RecordArray>),
    /// One row of a record array: a scalar, produced by `getitem_at` and
    /// never nested inside another node.
    RecordScalar(Arc<Record>),
    Union(Arc<UnionArray>),
    Virtual(Arc<VirtualArray>),
}

impl Content {
    pub fn classname(&self) -> &'static str {
        match self {
            Content::Empty(_) => "EmptyArray",
            Content::Numpy(_) => "NumpyArray",
            Content::List(_) => "ListArray",
            Content::ListOffset(_) => "ListOffsetArray",
            Content::Regular(_) => "RegularArray",
            Content::Indexed(a) => {
                if a.is_option() {
                    "IndexedOptionArray"
                } else {
                    "IndexedArray"
                }
            }
            Content::ByteMasked(_) => "ByteMaskedArray",
            Content::BitMasked(_) => "BitMaskedArray",
            Content::Record(_) => "RecordArray",
            Content::RecordScalar(_) => "Record",
            Content::Union(_) => "UnionArray",
            Content::Virtual(_) => "VirtualArray",
        }
    }

    /// Element count. A record scalar reports `-1`: it is not an array and
    /// must not be treated as one.
    ///
    /// A virtual array answers from its declared length without
    /// materialising. With no declared length it must generate, and since
    /// `len` is infallible a failing generator degrades to 0 here; the
    /// generation error itself surfaces from the first fallible operation
    /// that materialises the array.
    pub fn len(&self) -> i64 {
        match self {
            Content::Empty(_) => 0,
            Content::Numpy(a) => a.len(),
            Content::List(a) => a.len(),
            Content::ListOffset(a) => a.len(),
            Content::Regular(a) => a.len(),
            Content::Indexed(a) => a.len(),
            Content::ByteMasked(a) => a.len(),
            Content::BitMasked(a) => a.len(),
            Content::Record(a) => a.len(),
            Content::RecordScalar(_) => -1,
            Content::Union(a) => a.len(),
            Content::Virtual(a) => match a.declared_length() {
                Some(n) => n,
                None => a.array().map(|c| c.len()).unwrap_or(0),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parameters(&self) -> Parameters {
        match self {
            Content::Empty(a) => a.parameters().clone(),
            Content::Numpy(a) => a.parameters(),
            Content::List(a) => a.parameters().clone(),
            Content::ListOffset(a) => a.parameters().clone(),
            Content::Regular(a) => a.parameters().clone(),
            Content::Indexed(a) => a.parameters().clone(),
            Content::ByteMasked(a) => a.parameters().clone(),
            Content::BitMasked(a) => a.parameters().clone(),
            Content::Record(a) => a.parameters().clone(),
            Content::RecordScalar(r) => r.array().parameters().clone(),
            Content::Union(a) => a.parameters().clone(),
            Content::Virtual(a) => a.parameters().clone(),
        }
    }

    pub fn identities(&self) -> Option<Identities> {
        match self {
            Content::Empty(a) => a.identities().cloned(),
            Content::Numpy(a) => a.identities(),
            Content::List(a) => a.identities().cloned(),
            Content::ListOffset(a) => a.identities().cloned(),
            Content::Regular(a) => a.identities().cloned(),
            Content::Indexed(a) => a.identities().cloned(),
            Content::ByteMasked(a) => a.identities().cloned(),
            Content::BitMasked(a) => a.identities().cloned(),
            Content::Record(a) => a.identities().cloned(),
            Content::RecordScalar(r) => r.array().identities().cloned(),
            Content::Union(a) => a.identities().cloned(),
            Content::Virtual(a) => a.identities().cloned(),
        }
    }

    /// Whether this node introduces missing values.
    pub fn is_option(&self) -> bool {
        match self {
            Content::Indexed(a) => a.is_option(),
            Content::ByteMasked(_) | Content::BitMasked(_) => true,
            _ => false,
        }
    }

    /// Single element, with one negative wrap.
    pub fn getitem_at(&self, at: i64) -> Result<Content, RaggedError> {
        let reg = regularize_at(at, self.len(), self.classname())?;
        self.getitem_at_nowrap(reg)
    }

    /// Single element, bounds already checked.
    pub fn getitem_at_nowrap(&self, at: i64) -> Result<Content, RaggedError> {
        match self {
            Content::Empty(_) => Err(RaggedError::IndexOutOfBounds {
                class: "EmptyArray",
                index: at,
                length: 0,
            }),
            Content::Numpy(a) => Ok(Content::Numpy(a.getitem_at_nowrap(at))),
            Content::List(a) => Ok(a
                .content()
                .getitem_range_nowrap(a.starts().get(at), a.stops().get(at))),
            Content::ListOffset(a) => Ok(a
                .content()
                .getitem_range_nowrap(a.offsets().get(at), a.offsets().get(at + 1))),
            Content::Regular(a) => Ok(a
                .content()
                .getitem_range_nowrap(at * a.size(), (at + 1) * a.size())),
            Content::Indexed(a) => {
                let i = a.index().get(at);
                if i < 0 {
                    if a.is_option() {
                        Ok(Content::Empty(Arc::new(EmptyArray::default())))
                    } else {
                        Err(RaggedError::InvalidStructure {
                            class: "IndexedArray",
                            message: "negative index in a non-option IndexedArray".into(),
                            id: Some(at),
                        })
                    }
                } else {
                    a.content().getitem_at_nowrap(i)
                }
            }
            Content::ByteMasked(a) => {
                if a.is_valid(at) {
                    a.content().getitem_at_nowrap(at)
                } else {
                    Ok(Content::Empty(Arc::new(EmptyArray::default())))
                }
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).getitem_at_nowrap(at)
            }
            Content::Record(a) => Ok(Content::RecordScalar(Arc::new(Record::new(
                Arc::clone(a),
                at,
            )))),
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "getitem_at",
            }),
            Content::Union(a) => {
                let t = a.tags().get(at);
                let i = a.index().get(at);
                a.content(t)?.getitem_at_nowrap(i)
            }
            Content::Virtual(a) => a.array()?.getitem_at_nowrap(at),
        }
    }

    /// Range with Python clamping semantics, step 1.
    pub fn getitem_range(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
    ) -> Result<Content, RaggedError> {
        if let Content::RecordScalar(_) = self {
            return Err(RaggedError::Unsupported {
                class: "Record",
                operation: "getitem_range",
            });
        }
        let (first, last) = regularize_range(start, stop, self.len());
        Ok(self.getitem_range_nowrap(first, last))
    }

    /// Contiguous window, bounds already regularized. Zero-copy on every
    /// node kind (bit masks unpack to byte masks; virtual arrays stay lazy).
    pub fn getitem_range_nowrap(&self, start: i64, stop: i64) -> Content {
        let len = stop - start;
        match self {
            Content::Empty(_) | Content::RecordScalar(_) => self.clone(),
            Content::Numpy(a) => Content::Numpy(a.getitem_range_nowrap(start, stop)),
            Content::List(a) => Content::List(Arc::new(ListArray::new(
                a.starts().window(start, len),
                a.stops().window(start, len),
                a.content().clone(),
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::ListOffset(a) => Content::ListOffset(Arc::new(ListOffsetArray::new(
                a.offsets().window(start, len + 1),
                a.content().clone(),
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::Regular(a) => Content::Regular(Arc::new(RegularArray::new(
                a.content()
                    .getitem_range_nowrap(start * a.size(), stop * a.size()),
                a.size(),
                len,
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::Indexed(a) => Content::Indexed(Arc::new(IndexedArray::new(
                a.index().window(start, len),
                a.content().clone(),
                a.is_option(),
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::ByteMasked(a) => Content::ByteMasked(Arc::new(ByteMaskedArray::new(
                a.mask().window(start, len),
                a.content().getitem_range_nowrap(start, stop),
                a.valid_when(),
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked()))
                    .getitem_range_nowrap(start, stop)
            }
            Content::Record(a) => {
                let contents = a
                    .contents()
                    .iter()
                    .map(|c| c.getitem_range_nowrap(start, stop))
                    .collect();
                Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(len),
                    a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                    a.parameters().clone(),
                )))
            }
            Content::Union(a) => Content::Union(Arc::new(UnionArray::new(
                a.tags().window(start, len),
                a.index().window(start, len),
                a.contents().to_vec(),
                a.identities().map(|ids| ids.getitem_range_nowrap(start, stop)),
                a.parameters().clone(),
            ))),
            Content::Virtual(a) => Content::Virtual(Arc::new(a.slice_range(start, stop))),
        }
    }

    /// A length-zero window of this node; the result of an empty selection.
    pub fn getitem_nothing(&self) -> Content {
        self.getitem_range_nowrap(0, 0)
    }

    /// Record field projection, passed through every wrapper down to the
    /// record (or union of records) that owns the field.
    pub fn getitem_field(&self, key: &str) -> Result<Content, RaggedError> {
        match self {
            Content::Empty(_) | Content::Numpy(_) => Err(RaggedError::FieldError {
                class: self.classname(),
                message: format!("cannot select field {:?} from a fieldless array", key),
            }),
            Content::List(a) => Ok(Content::List(Arc::new(ListArray::new(
                a.starts().clone(),
                a.stops().clone(),
                a.content().getitem_field(key)?,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ListOffset(a) => Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                a.offsets().clone(),
                a.content().getitem_field(key)?,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::Regular(a) => Ok(Content::Regular(Arc::new(RegularArray::new(
                a.content().getitem_field(key)?,
                a.size(),
                a.len(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::Indexed(a) => Ok(Content::Indexed(Arc::new(IndexedArray::new(
                a.index().clone(),
                a.content().getitem_field(key)?,
                a.is_option(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ByteMasked(a) => Ok(Content::ByteMasked(Arc::new(ByteMaskedArray::new(
                a.mask().clone(),
                a.content().getitem_field(key)?,
                a.valid_when(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).getitem_field(key)
            }
            Content::Record(a) => a.field(key),
            Content::RecordScalar(r) => r.field(key),
            Content::Union(a) => {
                let contents = a
                    .contents()
                    .iter()
                    .map(|c| c.getitem_field(key))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Content::Union(Arc::new(UnionArray::new(
                    a.tags().clone(),
                    a.index().clone(),
                    contents,
                    a.identities().cloned(),
                    a.parameters().clone(),
                ))))
            }
            Content::Virtual(a) => Ok(Content::Virtual(Arc::new(a.slice_field(key)))),
        }
    }

    /// Multi-field projection: keeps a record (with only those fields) at
    /// the position where a single field would be extracted.
    pub fn getitem_fields(&self, keys: &[String]) -> Result<Content, RaggedError> {
        match self {
            Content::Empty(_) | Content::Numpy(_) => Err(RaggedError::FieldError {
                class: self.classname(),
                message: format!("cannot select fields {:?} from a fieldless array", keys),
            }),
            Content::List(a) => Ok(Content::List(Arc::new(ListArray::new(
                a.starts().clone(),
                a.stops().clone(),
                a.content().getitem_fields(keys)?,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ListOffset(a) => Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                a.offsets().clone(),
                a.content().getitem_fields(keys)?,
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::Regular(a) => Ok(Content::Regular(Arc::new(RegularArray::new(
                a.content().getitem_fields(keys)?,
                a.size(),
                a.len(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::Indexed(a) => Ok(Content::Indexed(Arc::new(IndexedArray::new(
                a.index().clone(),
                a.content().getitem_fields(keys)?,
                a.is_option(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::ByteMasked(a) => Ok(Content::ByteMasked(Arc::new(ByteMaskedArray::new(
                a.mask().clone(),
                a.content().getitem_fields(keys)?,
                a.valid_when(),
                a.identities().cloned(),
                a.parameters().clone(),
            )))),
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).getitem_fields(keys)
            }
            Content::Record(a) => Ok(Content::Record(Arc::new(a.project_fields(keys)?))),
            Content::RecordScalar(r) => {
                let projected = r.array().project_fields(keys)?;
                Ok(Content::RecordScalar(Arc::new(Record::new(
                    Arc::new(projected),
                    r.at(),
                ))))
            }
            Content::Union(a) => {
                let contents = a
                    .contents()
                    .iter()
                    .map(|c| c.getitem_fields(keys))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Content::Union(Arc::new(UnionArray::new(
                    a.tags().clone(),
                    a.index().clone(),
                    contents,
                    a.identities().cloned(),
                    a.parameters().clone(),
                ))))
            }
            Content::Virtual(a) => a.array()?.getitem_fields(keys),
        }
    }

    /// Gathers elements by position. Carry entries must be in range; this is
    /// checked once here, so user-supplied carries fail cleanly.
    pub fn carry(&self, carry: &[i64]) -> Result<Content, RaggedError> {
        let len = self.len();
        for &c in carry {
            if c < 0 || c >= len {
                return Err(RaggedError::IndexOutOfBounds {
                    class: self.classname(),
                    index: c,
                    length: len,
                });
            }
        }
        self.carry_unchecked(carry)
    }

    pub(crate) fn carry_unchecked(&self, carry: &[i64]) -> Result<Content, RaggedError> {
        match self {
            Content::Empty(_) => Ok(self.clone()),
            Content::Numpy(a) => Ok(Content::Numpy(a.carry(carry))),
            Content::List(a) => Ok(Content::List(Arc::new(ListArray::new(
                Index64::from_vec64(getitem_kernels::carry_index(a.starts(), carry)),
                Index64::from_vec64(getitem_kernels::carry_index(a.stops(), carry)),
                a.content().clone(),
                a.identities().map(|ids| ids.getitem_carry(carry)),
                a.parameters().clone(),
            )))),
            Content::ListOffset(a) => {
                // A gathered offset list is no longer compact: becomes a
                // starts/stops list over the same content.
                let starts = a.starts();
                let stops = a.stops();
                Ok(Content::List(Arc::new(ListArray::new(
                    Index64::from_vec64(getitem_kernels::carry_index(&starts, carry)),
                    Index64::from_vec64(getitem_kernels::carry_index(&stops, carry)),
                    a.content().clone(),
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::Regular(a) => {
                let size = a.size();
                let mut expanded = Vec::with_capacity(carry.len() * size as usize);
                for &c in carry {
                    for j in 0..size {
                        expanded.push(c * size + j);
                    }
                }
                Ok(Content::Regular(Arc::new(RegularArray::new(
                    a.content().carry_unchecked(&expanded)?,
                    size,
                    carry.len() as i64,
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::Indexed(a) => {
                let index = missing::index_carry(a.index(), carry)
                    .map_err(|e| handle_error(e, self.classname()))?;
                Ok(Content::Indexed(Arc::new(IndexedArray::new(
                    Index64::from_vec64(index),
                    a.content().clone(),
                    a.is_option(),
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::ByteMasked(a) => {
                let mut mask = Vec64::with_capacity(carry.len());
                for &c in carry {
                    mask.push(a.mask().get(c) as i8);
                }
                Ok(Content::ByteMasked(Arc::new(ByteMaskedArray::new(
                    Index8::from_vec64(mask),
                    a.content().carry_unchecked(carry)?,
                    a.valid_when(),
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).carry_unchecked(carry)
            }
            Content::Record(a) => {
                let contents = a
                    .contents()
                    .iter()
                    .map(|c| c.carry_unchecked(carry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Content::Record(Arc::new(RecordArray::new(
                    contents,
                    a.fields().map(|f| f.to_vec()),
                    Some(carry.len() as i64),
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "Record",
                operation: "carry",
            }),
            Content::Union(a) => {
                let mut tags = Vec64::with_capacity(carry.len());
                let mut index = Vec64::with_capacity(carry.len());
                for &c in carry {
                    tags.push(a.tags().get(c) as i8);
                    index.push(a.index().get(c));
                }
                Ok(Content::Union(Arc::new(UnionArray::new(
                    Index8::from_vec64(tags),
                    Index64::from_vec64(index),
                    a.contents().to_vec(),
                    a.identities().map(|ids| ids.getitem_carry(carry)),
                    a.parameters().clone(),
                ))))
            }
            Content::Virtual(a) => a.array()?.carry_unchecked(carry),
        }
    }

    pub fn numfields(&self) -> i64 {
        match self {
            Content::Record(a) => a.numfields(),
            Content::RecordScalar(r) => r.array().numfields(),
            Content::List(a) => a.content().numfields(),
            Content::ListOffset(a) => a.content().numfields(),
            Content::Regular(a) => a.content().numfields(),
            Content::Indexed(a) => a.content().numfields(),
            Content::ByteMasked(a) => a.content().numfields(),
            Content::BitMasked(a) => a.content().numfields(),
            Content::Union(_) => self.keys().len() as i64,
            Content::Virtual(a) => a.array().map(|c| c.numfields()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Field keys visible at this node; for a union, the keys common to
    /// every possibility.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Content::Record(a) => a.keys(),
            Content::RecordScalar(r) => r.keys(),
            Content::List(a) => a.content().keys(),
            Content::ListOffset(a) => a.content().keys(),
            Content::Regular(a) => a.content().keys(),
            Content::Indexed(a) => a.content().keys(),
            Content::ByteMasked(a) => a.content().keys(),
            Content::BitMasked(a) => a.content().keys(),
            Content::Union(a) => {
                let mut iter = a.contents().iter();
                let Some(first) = iter.next() else {
                    return Vec::new();
                };
                let mut keys = first.keys();
                for c in iter {
                    let theirs = c.keys();
                    keys.retain(|k| theirs.contains(k));
                }
                keys
            }
            Content::Virtual(a) => a.array().map(|c| c.keys()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn haskey(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    pub fn istuple(&self) -> bool {
        match self {
            Content::Record(a) => a.istuple(),
            Content::RecordScalar(r) => r.istuple(),
            Content::List(a) => a.content().istuple(),
            Content::ListOffset(a) => a.content().istuple(),
            Content::Regular(a) => a.content().istuple(),
            Content::Indexed(a) => a.content().istuple(),
            Content::ByteMasked(a) => a.content().istuple(),
            Content::BitMasked(a) => a.content().istuple(),
            _ => false,
        }
    }

    /// Minimum and maximum nesting depth across branches. A leaf is depth 1
    /// (its own dimension); each list dimension adds one; records and unions
    /// branch.
    pub fn minmax_depth(&self) -> (i64, i64) {
        match self {
            Content::Empty(_) => (1, 1),
            Content::Numpy(a) => {
                let d = a.ndim().max(1);
                (d, d)
            }
            Content::List(a) => add_depth(a.content().minmax_depth()),
            Content::ListOffset(a) => add_depth(a.content().minmax_depth()),
            Content::Regular(a) => add_depth(a.content().minmax_depth()),
            Content::Indexed(a) => a.content().minmax_depth(),
            Content::ByteMasked(a) => a.content().minmax_depth(),
            Content::BitMasked(a) => a.content().minmax_depth(),
            Content::Record(a) => branch_depth(a.contents()),
            Content::RecordScalar(r) => branch_depth(r.array().contents()),
            Content::Union(a) => branch_depth(a.contents()),
            Content::Virtual(a) => {
                a.array().map(|c| c.minmax_depth()).unwrap_or((1, 1))
            }
        }
    }

    /// Per-element validity: `1` where an element exists.
    pub fn bytemask(&self) -> Index8 {
        match self {
            Content::Indexed(a) if a.is_option() => {
                let mut out = Vec64::with_capacity(a.len() as usize);
                for i in 0..a.len() {
                    out.push((a.index().get(i) >= 0) as i8);
                }
                Index8::from_vec64(out)
            }
            Content::ByteMasked(a) => {
                let mut out = Vec64::with_capacity(a.len() as usize);
                for i in 0..a.len() {
                    out.push(a.is_valid(i) as i8);
                }
                Index8::from_vec64(out)
            }
            Content::BitMasked(a) => {
                Content::ByteMasked(Arc::new(a.to_byte_masked())).bytemask()
            }
            Content::Union(a) => {
                let masks: Vec<Index8> =
                    a.contents().iter().map(|c| c.bytemask()).collect();
                let mut out = Vec64::with_capacity(a.len() as usize);
                for i in 0..a.len() {
                    let t = a.tags().get(i) as usize;
                    let j = a.index().get(i);
                    out.push(masks[t].get(j) as i8);
                }
                Index8::from_vec64(out)
            }
            Content::Virtual(a) => match a.array() {
                Ok(c) => c.bytemask(),
                Err(_) => Index8::empty(),
            },
            _ => {
                let mut out = Vec64::with_capacity(self.len().max(0) as usize);
                out.resize(self.len().max(0) as usize, 1);
                Index8::from_vec64(out)
            }
        }
    }

    /// Recursive structural check. `None` means the tree is well formed;
    /// otherwise a message naming the offending node and element.
    pub fn validity_error(&self) -> Option<String> {
        match self {
            Content::Empty(_) | Content::Numpy(_) | Content::RecordScalar(_) => None,
            Content::List(a) => {
                lists::validate_list(a.starts(), a.stops(), a.content().len())
                    .err()
                    .map(|e| render_validity(e, "ListArray"))
                    .or_else(|| a.content().validity_error())
            }
            Content::ListOffset(a) => {
                lists::validate_offsets(a.offsets(), a.content().len())
                    .err()
                    .map(|e| render_validity(e, "ListOffsetArray"))
                    .or_else(|| a.content().validity_error())
            }
            Content::Regular(a) => {
                if a.size() * a.len() > a.content().len() {
                    Some(format!(
                        "in RegularArray: content of length {} is too short for {} rows of size {}",
                        a.content().len(),
                        a.len(),
                        a.size()
                    ))
                } else {
                    a.content().validity_error()
                }
            }
            Content::Indexed(a) => {
                lists::validate_index(a.index(), a.content().len(), a.is_option())
                    .err()
                    .map(|e| render_validity(e, self.classname()))
                    .or_else(|| a.content().validity_error())
            }
            Content::ByteMasked(a) => {
                if a.len() > a.content().len() {
                    Some(format!(
                        "in ByteMaskedArray: mask of length {} is longer than its content ({})",
                        a.len(),
                        a.content().len()
                    ))
                } else {
                    a.content().validity_error()
                }
            }
            Content::BitMasked(a) => {
                if a.len() > a.content().len() {
                    Some(format!(
                        "in BitMaskedArray: length {} is longer than its content ({})",
                        a.len(),
                        a.content().len()
                    ))
                } else {
                    a.content().validity_error()
                }
            }
            Content::Record(a) => {
                for (i, c) in a.contents().iter().enumerate() {
                    if c.len() < a.len() {
                        return Some(format!(
                            "in RecordArray: field {} has length {}, shorter than the record ({})",
                            i,
                            c.len(),
                            a.len()
                        ));
                    }
                }
                a.contents().iter().find_map(|c| c.validity_error())
            }
            Content::Union(a) => {
                let lengths: Vec<i64> = a.contents().iter().map(|c| c.len()).collect();
                lists::validate_union(a.tags(), a.index(), &lengths)
                    .err()
                    .map(|e| render_validity(e, "UnionArray"))
                    .or_else(|| a.contents().iter().find_map(|c| c.validity_error()))
            }
            Content::Virtual(a) => match a.array() {
                Ok(c) => c.validity_error(),
                Err(e) => Some(format!("in VirtualArray: generation failed: {}", e)),
            },
        }
    }
}

fn add_depth((min, max): (i64, i64)) -> (i64, i64) {
    (min + 1, max + 1)
}

fn branch_depth(contents: &[Content]) -> (i64, i64) {
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    for c in contents {
        let (cmin, cmax) = c.minmax_depth();
        min = min.min(cmin);
        max = max.max(cmax);
    }
    if contents.is_empty() { (1, 1) } else { (min, max) }
}

fn render_validity(e: crate::enums::error::KernelError, class: &str) -> String {
    match e.id {
        Some(id) => format!("in {}: {} at element {}", class, e.message, id),
        None => format!("in {}: {}", class, e.message),
    }
}

/// Full-value JSON-style rendering; the human-readable oracle for tests.
impl Display for Content {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Content::Empty(_) => write!(f, "[]"),
            Content::Numpy(a) => write!(f, "{}", a),
            Content::RecordScalar(r) => {
                let keys = r.keys();
                let (open, close) = if r.istuple() { ("(", ")") } else { ("{", "}") };
                write!(f, "{}", open)?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if !r.istuple() {
                        write!(f, "{:?}: ", key)?;
                    }
                    match r.field(key) {
                        Ok(value) => write!(f, "{}", value)?,
                        Err(_) => write!(f, "?")?,
                    }
                }
                write!(f, "{}", close)
            }
            _ if self.is_option() => {
                let mask = self.bytemask();
                write!(f, "[")?;
                for i in 0..self.len() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if mask.get(i) == 0 {
                        write!(f, "null")?;
                    } else {
                        match self.getitem_at_nowrap(i) {
                            Ok(element) => write!(f, "{}", element)?,
                            Err(_) => write!(f, "?")?,
                        }
                    }
                }
                write!(f, "]")
            }
            _ => {
                write!(f, "[")?;
                for i in 0..self.len() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match self.getitem_at_nowrap(i) {
                        Ok(element) => write!(f, "{}", element)?,
                        Err(_) => write!(f, "?")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index64;
    use crate::structs::variants::record::RecordBuilder;

    fn leaf(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    fn listoffset(offsets: &[i64], values: &[i64]) -> Content {
        Content::ListOffset(Arc::new(ListOffsetArray::new(
            Index64::from_slice(offsets),
            leaf(values),
            None,
            Parameters::new(),
        )))
    }

    #[test]
    fn test_getitem_at_wraps_once() {
        let a = listoffset(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        assert_eq!(format!("{}", a.getitem_at(-1).unwrap()), "[4, 5]");
        assert!(a.getitem_at(3).is_err());
        assert!(a.getitem_at(-4).is_err());
    }

    #[test]
    fn test_range_is_window() {
        let a = listoffset(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        let w = a.getitem_range(Some(1), None).unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(format!("{}", w), "[[], [4, 5]]");
    }

    #[test]
    fn test_carry_reorders_and_duplicates() {
        let a = listoffset(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        let c = a.carry(&[2, 0, 0]).unwrap();
        assert_eq!(format!("{}", c), "[[4, 5], [1, 2, 3], [1, 2, 3]]");
        assert!(a.carry(&[3]).is_err());
    }

    #[test]
    fn test_option_display_and_missing_scalar() {
        let a = Content::Indexed(Arc::new(IndexedArray::new(
            index64![1, -1, 0],
            leaf(&[10, 20]),
            true,
            None,
            Parameters::new(),
        )));
        assert_eq!(format!("{}", a), "[20, null, 10]");
        match a.getitem_at(1).unwrap() {
            Content::Empty(_) => {}
            other => panic!("expected missing scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_field_through_list() {
        let rec = RecordBuilder::new()
            .field("x", leaf(&[1, 2, 3, 4, 5]))
            .field("y", leaf(&[6, 7, 8, 9, 10]))
            .build()
            .unwrap();
        let a = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 3, 5],
            Content::Record(Arc::new(rec)),
            None,
            Parameters::new(),
        )));
        let ys = a.getitem_field("y").unwrap();
        assert_eq!(format!("{}", ys), "[[6, 7, 8], [9, 10]]");
        assert!(a.haskey("x"));
        assert!(!a.haskey("z"));
    }

    #[test]
    fn test_record_display() {
        let rec = RecordBuilder::new()
            .field("x", leaf(&[1, 2]))
            .field("y", leaf(&[3, 4]))
            .build()
            .unwrap();
        let a = Content::Record(Arc::new(rec));
        assert_eq!(format!("{}", a), "[{\"x\": 1, \"y\": 3}, {\"x\": 2, \"y\": 4}]");
        assert_eq!(a.getitem_at(0).unwrap().len(), -1);
    }

    #[test]
    fn test_minmax_depth_branches() {
        let rec = RecordBuilder::new()
            .field("flat", leaf(&[1, 2]))
            .field("jagged", listoffset(&[0, 1, 2], &[1, 2]))
            .build()
            .unwrap();
        assert_eq!(Content::Record(Arc::new(rec)).minmax_depth(), (1, 2));
    }

    #[test]
    fn test_validity_error_reports_deep_problems() {
        let bad = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 3, 2],
            leaf(&[1, 2, 3]),
            None,
            Parameters::new(),
        )));
        let msg = bad.validity_error().unwrap();
        assert!(msg.contains("ListOffsetArray"));
        let nested = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 1],
            bad,
            None,
            Parameters::new(),
        )));
        assert!(nested.validity_error().is_some());
        let good = listoffset(&[0, 2], &[1, 2]);
        assert!(good.validity_error().is_none());
    }
}
