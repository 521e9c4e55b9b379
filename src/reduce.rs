//! # **Reduce Module** - *Structural engine for grouped reductions*
//!
//! [`Content::reduce`] collapses one dimension of a layout tree under a
//! [`Reducer`]. The engine walks the tree carrying a `parents` map (element
//! position → output slot) and a `negaxis` counted up from the leaf; each
//! list dimension either survives (the reduced dimension is deeper, so its
//! rows regroup locally) or is itself consumed (NumPy's axis-0 behavior on
//! a ragged dimension, where same-position elements across rows reduce
//! together). All arithmetic happens once, at the leaf, in
//! [`Reducer::apply`]; everything here is offsets bookkeeping.
//!
//! A ragged dimension reduced columnwise yields a rectangular result of
//! width `maxcount`: positions no row reaches hold the reducer's identity,
//! or `null` when `mask` is set. `keepdims` leaves a length-1 regular
//! dimension where the reduced one was.

use std::sync::Arc;

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::enums::primitive_array::PrimitiveArray;
use crate::kernels::reduce::{counts_to_offsets, local_nextparents, nonlocal_nextparents};
use crate::match_primitive;
use crate::structs::index::{Index8, Index64};
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::regular::RegularArray;
use crate::traits::reducer::Reducer;

impl Content {
    /// Reduces the dimension at `axis` under `reducer`. `mask` makes output
    /// slots that no element reached `null` instead of the reducer's
    /// identity; `keepdims` keeps the reduced dimension as length-1 lists.
    pub fn reduce<R: Reducer>(
        &self,
        reducer: &R,
        axis: i64,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content, RaggedError> {
        if let Content::RecordScalar(_) = self {
            return Err(RaggedError::Unsupported {
                class: "Record",
                operation: "reduce",
            });
        }
        let (mindepth, maxdepth) = self.minmax_depth();
        if mindepth != maxdepth {
            return Err(RaggedError::InvalidStructure {
                class: self.classname(),
                message: format!(
                    "cannot reduce an array of non-uniform depth ({} to {})",
                    mindepth, maxdepth
                ),
                id: None,
            });
        }
        let posaxis = if axis < 0 { mindepth + axis } else { axis };
        if posaxis < 0 || posaxis >= mindepth {
            return Err(RaggedError::InvalidArgument {
                class: self.classname(),
                message: format!(
                    "axis {} is out of range for a reduction over depth {}",
                    axis, mindepth
                ),
            });
        }
        let negaxis = mindepth - posaxis;
        let starts = Index64::from_slice(&[0]);
        let parents = Index64::zeros(self.len());
        let out = self.reduce_next(reducer, negaxis, &starts, &parents, 1, mask, keepdims)?;
        out.getitem_at_nowrap(0)
    }

    /// One step of the reduction walk. `negaxis` counts the target dimension
    /// up from the leaf (1 reduces the innermost); `parents` maps this
    /// node's elements to `outlength` output slots; `starts` marks where
    /// each slot's group begins.
    pub fn reduce_next<R: Reducer>(
        &self,
        reducer: &R,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: i64,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content, RaggedError> {
        match self {
            Content::Empty(a) => Content::Numpy(a.to_numpy()).reduce_next(
                reducer, negaxis, starts, parents, outlength, mask, keepdims,
            ),
            Content::Numpy(a) => {
                if a.ndim() > 1 {
                    return a.to_regular().reduce_next(
                        reducer, negaxis, starts, parents, outlength, mask, keepdims,
                    );
                }
                let out = match_primitive!(a, inner => {
                    let contiguous = inner.contiguous();
                    reducer.apply(contiguous.data().as_slice(), parents, outlength)
                });
                Ok(finish_leaf(out, parents, outlength, mask, keepdims))
            }
            Content::Regular(a) => Content::ListOffset(Arc::new(a.to_list_offset()))
                .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims),
            Content::List(a) => Content::ListOffset(Arc::new(a.to_list_offset()?))
                .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims),
            Content::ListOffset(a) => {
                let c = a.compact();
                let depth = self.minmax_depth().0;
                if negaxis < depth {
                    // The reduced dimension is at or below this node's
                    // content: rows survive, elements regroup under them.
                    let nextparents =
                        Index64::from_vec64(local_nextparents(c.offsets().as_slice()));
                    let nextstarts = c.offsets().window(0, c.len());
                    let outcontent = c.content().reduce_next(
                        reducer,
                        negaxis,
                        &nextstarts,
                        &nextparents,
                        c.len(),
                        mask,
                        keepdims,
                    )?;
                    let outoffsets =
                        Index64::from_vec64(counts_to_offsets(parents, outlength));
                    Ok(Content::ListOffset(Arc::new(ListOffsetArray::new(
                        outoffsets,
                        outcontent,
                        None,
                        Parameters::new(),
                    ))))
                } else {
                    // This list dimension itself reduces away, columnwise.
                    if c.content().minmax_depth() != (1, 1) {
                        return Err(RaggedError::Unsupported {
                            class: self.classname(),
                            operation: "columnwise reduction below another nested dimension",
                        });
                    }
                    let (nextparents, maxcount) =
                        nonlocal_nextparents(c.offsets().as_slice(), parents);
                    let outcontent = c.content().reduce_next(
                        reducer,
                        negaxis - 1,
                        starts,
                        &Index64::from_vec64(nextparents),
                        outlength * maxcount,
                        mask,
                        false,
                    )?;
                    let mut out = Content::Regular(Arc::new(RegularArray::new(
                        outcontent,
                        maxcount,
                        outlength,
                        None,
                        Parameters::new(),
                    )));
                    if keepdims {
                        out = Content::Regular(Arc::new(RegularArray::new(
                            out,
                            1,
                            outlength,
                            None,
                            Parameters::new(),
                        )));
                    }
                    Ok(out)
                }
            }
            Content::Indexed(a) if a.is_option() => {
                // Missing elements contribute nothing: drop them from both
                // the data and the parents map.
                let (nextcarry, _) = a.nextcarry_outindex();
                let dense = a.content().carry(nextcarry.as_slice())?;
                let mut gathered = Vec64::with_capacity(nextcarry.len() as usize);
                for i in 0..a.len() {
                    if a.index().get(i) >= 0 {
                        gathered.push(parents.get(i));
                    }
                }
                dense.reduce_next(
                    reducer,
                    negaxis,
                    starts,
                    &Index64::from_vec64(gathered),
                    outlength,
                    mask,
                    keepdims,
                )
            }
            Content::Indexed(a) => a.project()?.reduce_next(
                reducer, negaxis, starts, parents, outlength, mask, keepdims,
            ),
            Content::ByteMasked(a) => Content::Indexed(Arc::new(a.to_indexed_option()))
                .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims),
            Content::BitMasked(a) => Content::ByteMasked(Arc::new(a.to_byte_masked()))
                .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims),
            Content::Record(_) | Content::RecordScalar(_) => Err(RaggedError::Unsupported {
                class: "RecordArray",
                operation: "reduce",
            }),
            Content::Union(_) => Err(RaggedError::Unsupported {
                class: "UnionArray",
                operation: "reduce",
            }),
            Content::Virtual(a) => a.array()?.reduce_next(
                reducer, negaxis, starts, parents, outlength, mask, keepdims,
            ),
        }
    }
}

/// Leaf post-processing: the option wrap for `mask` (slots with no
/// contributors become `null`) and the length-1 regular wrap for `keepdims`.
fn finish_leaf(
    out: PrimitiveArray,
    parents: &Index64,
    outlength: i64,
    mask: bool,
    keepdims: bool,
) -> Content {
    let mut result = Content::Numpy(out);
    if mask {
        let mut counts = vec![0i64; outlength.max(0) as usize];
        for i in 0..parents.len() {
            let p = parents.get(i);
            if p >= 0 {
                counts[p as usize] += 1;
            }
        }
        let mut bytemask = Vec64::with_capacity(outlength.max(0) as usize);
        for c in &counts {
            bytemask.push(if *c > 0 { 1i8 } else { 0i8 });
        }
        result = Content::ByteMasked(Arc::new(ByteMaskedArray::new(
            Index8::from_vec64(bytemask),
            result,
            true,
            None,
            Parameters::new(),
        )));
    }
    if keepdims {
        result = Content::Regular(Arc::new(RegularArray::new(
            result,
            1,
            outlength,
            None,
            Parameters::new(),
        )));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index64;
    use crate::structs::variants::indexed::IndexedArray;
    use crate::traits::reducer::{All, Any, Count, Max, Min, Sum};

    fn leaf(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    fn floats(values: &[f64]) -> Content {
        Content::Numpy(PrimitiveArray::from_f64_values(values))
    }

    fn jagged(offsets: &[i64], values: &[i64]) -> Content {
        Content::ListOffset(Arc::new(ListOffsetArray::new(
            Index64::from_slice(offsets),
            leaf(values),
            None,
            Parameters::new(),
        )))
    }

    #[test]
    fn test_sum_innermost() {
        let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        assert_eq!(format!("{}", a.reduce(&Sum, 1, false, false).unwrap()), "[6, 0, 9]");
        assert_eq!(format!("{}", a.reduce(&Sum, -1, false, false).unwrap()), "[6, 0, 9]");
    }

    #[test]
    fn test_sum_flat_array_gives_scalar() {
        let a = leaf(&[1, 2, 3, 4, 5]);
        assert_eq!(format!("{}", a.reduce(&Sum, 0, false, false).unwrap()), "15");
    }

    #[test]
    fn test_sum_columnwise_over_ragged_rows() {
        // Columns of [[1, 2, 3], [], [4, 5]] are [1, 4], [2, 5], [3].
        let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        assert_eq!(format!("{}", a.reduce(&Sum, 0, false, false).unwrap()), "[5, 7, 3]");
    }

    #[test]
    fn test_keepdims_innermost() {
        let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        let out = a.reduce(&Sum, 1, false, true).unwrap();
        assert_eq!(format!("{}", out), "[[6], [0], [9]]");
    }

    #[test]
    fn test_keepdims_columnwise() {
        let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        let out = a.reduce(&Sum, 0, false, true).unwrap();
        assert_eq!(format!("{}", out), "[[5, 7, 3]]");
    }

    #[test]
    fn test_mask_marks_empty_rows() {
        let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
        let out = a.reduce(&Sum, 1, true, false).unwrap();
        assert_eq!(format!("{}", out), "[6, null, 9]");
    }

    #[test]
    fn test_count_innermost() {
        let a = jagged(&[0, 3, 3, 5], &[9, 9, 9, 9, 9]);
        let out = a.reduce(&Count, 1, false, false).unwrap();
        assert_eq!(format!("{}", out), "[3, 0, 2]");
        match out {
            Content::Numpy(n) => assert_eq!(n.dtype_name(), "int64"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_min_max_empty_row_identities() {
        let a = jagged(&[0, 2, 2], &[5, 3]);
        assert_eq!(
            format!("{}", a.reduce(&Min, 1, false, false).unwrap()),
            format!("[3, {}]", i64::MAX)
        );
        assert_eq!(
            format!("{}", a.reduce(&Max, 1, true, false).unwrap()),
            "[5, null]"
        );
    }

    #[test]
    fn test_float_sums_stay_floating() {
        let a = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 2, 3],
            floats(&[1.5, 2.0, 0.25]),
            None,
            Parameters::new(),
        )));
        let out = a.reduce(&Sum, 1, false, false).unwrap();
        match &out {
            Content::Numpy(n) => assert_eq!(n.dtype_name(), "float64"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(format!("{}", out), "[3.5, 0.25]");
    }

    #[test]
    fn test_any_all() {
        let a = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 2, 3, 3],
            Content::Numpy(PrimitiveArray::from_bool_values(&[true, false, false])),
            None,
            Parameters::new(),
        )));
        assert_eq!(
            format!("{}", a.reduce(&Any, 1, false, false).unwrap()),
            "[true, false, false]"
        );
        // The empty row is vacuously true.
        assert_eq!(
            format!("{}", a.reduce(&All, 1, false, false).unwrap()),
            "[false, false, true]"
        );
    }

    #[test]
    fn test_missing_rows_contribute_nothing() {
        let rows = jagged(&[0, 2, 3], &[1, 2, 3]);
        let option = Content::Indexed(Arc::new(IndexedArray::new(
            index64![0, -1, 1],
            rows,
            true,
            None,
            Parameters::new(),
        )));
        let out = option.reduce(&Sum, 1, false, false).unwrap();
        assert_eq!(format!("{}", out), "[3, 3]");
    }

    #[test]
    fn test_depth_three_innermost() {
        let inner = jagged(&[0, 2, 3, 4], &[1, 2, 3, 4]);
        let outer = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 2, 3],
            inner,
            None,
            Parameters::new(),
        )));
        let out = outer.reduce(&Sum, 2, false, false).unwrap();
        assert_eq!(format!("{}", out), "[[3, 3], [4]]");
    }

    #[test]
    fn test_columnwise_below_nesting_refused() {
        let inner = jagged(&[0, 2, 3, 4], &[1, 2, 3, 4]);
        let outer = Content::ListOffset(Arc::new(ListOffsetArray::new(
            index64![0, 2, 3],
            inner,
            None,
            Parameters::new(),
        )));
        assert!(matches!(
            outer.reduce(&Sum, 0, false, false).unwrap_err(),
            RaggedError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_axis_out_of_range() {
        let a = jagged(&[0, 2], &[1, 2]);
        assert!(a.reduce(&Sum, 2, false, false).is_err());
        assert!(a.reduce(&Sum, -3, false, false).is_err());
    }

    #[test]
    fn test_records_refuse() {
        use crate::structs::variants::record::RecordBuilder;
        let rec = RecordBuilder::new().field("x", leaf(&[1, 2])).build().unwrap();
        let a = Content::Record(Arc::new(rec));
        assert!(matches!(
            a.reduce(&Count, 0, false, false).unwrap_err(),
            RaggedError::Unsupported { .. }
        ));
    }
}
