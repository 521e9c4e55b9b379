//! End-to-end slice resolution through the public `Content::getitem` entry,
//! covering mixed basic/advanced tuples, jagged and missing fancy-indexes,
//! field projection, and error surfaces.

use std::sync::Arc;

use ragged::{
    Content, Index64, ListOffsetArray, Parameters, PrimitiveArray, RaggedError,
    RecordBuilder, Slice, SliceArray64, SliceItem, SliceJagged64, SliceMissing64,
    index64,
};

fn leaf(values: &[i64]) -> Content {
    Content::Numpy(PrimitiveArray::from_i64_values(values))
}

fn jagged(offsets: &[i64], values: &[i64]) -> Content {
    Content::ListOffset(Arc::new(ListOffsetArray::new(
        Index64::from_slice(offsets),
        leaf(values),
        None,
        Parameters::new(),
    )))
}

fn get(a: &Content, items: Vec<SliceItem>) -> Content {
    a.getitem(&Slice::new(items).unwrap()).unwrap()
}

fn range(start: i64, stop: i64) -> SliceItem {
    SliceItem::Range {
        start: Some(start),
        stop: Some(stop),
        step: 1,
    }
}

#[test]
fn boolean_mask_selects_rows() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    let out = get(
        &a,
        vec![SliceItem::Array(SliceArray64::from_bools(&[
            true, false, true,
        ]))],
    );
    assert_eq!(format!("{}", out), "[[1, 2, 3], [4, 5]]");
}

#[test]
fn basic_then_advanced() {
    let a = jagged(&[0, 2, 4, 6], &[1, 2, 3, 4, 5, 6]);
    // a[1:3, [1]] -> the second element of rows 1 and 2, one per row.
    let out = get(
        &a,
        vec![
            range(1, 3),
            SliceItem::Array(SliceArray64::from_positions(&[1])),
        ],
    );
    assert_eq!(format!("{}", out), "[[4], [6]]");
}

#[test]
fn inner_boolean_mask() {
    let a = jagged(&[0, 2, 4, 6], &[1, 2, 3, 4, 5, 6]);
    let out = get(
        &a,
        vec![
            SliceItem::full_range(),
            SliceItem::Array(SliceArray64::from_bools(&[false, true])),
        ],
    );
    assert_eq!(format!("{}", out), "[[2], [4], [6]]");
}

#[test]
fn scalar_descent() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    let out = get(&a, vec![SliceItem::At(0), SliceItem::At(2)]);
    assert_eq!(format!("{}", out), "3");
    let out = get(&a, vec![SliceItem::At(-1), SliceItem::At(-2)]);
    assert_eq!(format!("{}", out), "4");
}

#[test]
fn reversing_the_outer_dimension() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    let out = get(
        &a,
        vec![SliceItem::Range {
            start: None,
            stop: None,
            step: -1,
        }],
    );
    assert_eq!(format!("{}", out), "[[4, 5], [], [1, 2, 3]]");
}

#[test]
fn jagged_slice_selects_per_row() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    // Per-row picks: [2, 0] from row 0, nothing from row 1, [1] from row 2.
    let jag = SliceJagged64::new(
        index64![0, 2, 2, 3],
        SliceItem::Array(SliceArray64::from_positions(&[2, 0, 1])),
    );
    let out = get(&a, vec![SliceItem::full_range(), SliceItem::Jagged(jag)]);
    assert_eq!(format!("{}", out), "[[3, 1], [], [5]]");
}

#[test]
fn missing_fancy_index_yields_options() {
    let a = leaf(&[10, 20, 30]);
    let missing = SliceMissing64::new(
        index64![0, -1, 1],
        SliceItem::Array(SliceArray64::from_positions(&[0, 2])),
    );
    let out = get(&a, vec![SliceItem::Missing(missing)]);
    assert_eq!(format!("{}", out), "[10, null, 30]");
}

#[test]
fn newaxis_then_fancy() {
    let a = jagged(&[0, 2, 4], &[1, 2, 3, 4]);
    let out = get(
        &a,
        vec![
            SliceItem::NewAxis,
            SliceItem::full_range(),
            SliceItem::At(0),
        ],
    );
    assert_eq!(format!("{}", out), "[[1, 3]]");
}

#[test]
fn field_projection_descends_records() {
    let rec = RecordBuilder::new()
        .field("x", leaf(&[1, 2, 3]))
        .field("y", leaf(&[10, 20, 30]))
        .build()
        .unwrap();
    let a = Content::ListOffset(Arc::new(ListOffsetArray::new(
        index64![0, 2, 3],
        Content::Record(Arc::new(rec)),
        None,
        Parameters::new(),
    )));
    let out = get(
        &a,
        vec![SliceItem::full_range(), SliceItem::Field("y".into())],
    );
    assert_eq!(format!("{}", out), "[[10, 20], [30]]");
    let out = get(
        &a,
        vec![
            SliceItem::full_range(),
            SliceItem::Fields(vec!["x".into()]),
        ],
    );
    assert_eq!(format!("{}", out), "[[{\"x\": 1}, {\"x\": 2}], [{\"x\": 3}]]");
}

#[test]
fn fancy_out_of_range_is_an_index_failure() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    let err = a
        .getitem(
            &Slice::new(vec![SliceItem::Array(SliceArray64::from_positions(&[5]))])
                .unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, RaggedError::SliceMismatch { .. }));
    assert!(format!("{}", err).contains("5"));
}

#[test]
fn jagged_slice_against_flat_buffer_is_rejected() {
    let a = leaf(&[1, 2, 3]);
    let jag = SliceJagged64::new(
        index64![0, 1, 2, 3],
        SliceItem::Array(SliceArray64::from_positions(&[0, 0, 0])),
    );
    let err = a
        .getitem(&Slice::new(vec![SliceItem::Jagged(jag)]).unwrap())
        .unwrap_err();
    assert!(matches!(err, RaggedError::SliceMismatch { .. }));
}

#[test]
fn mixing_missing_and_plain_fancy_rejected_at_construction() {
    let missing = SliceMissing64::new(
        index64![0, -1],
        SliceItem::Array(SliceArray64::from_positions(&[0])),
    );
    let err = Slice::new(vec![
        SliceItem::Missing(missing),
        SliceItem::Array(SliceArray64::from_positions(&[0, 1])),
    ])
    .unwrap_err();
    assert!(matches!(err, RaggedError::SliceMismatch { .. }));
}

#[test]
fn empty_slice_is_identity() {
    let a = jagged(&[0, 3, 3, 5], &[1, 2, 3, 4, 5]);
    let out = a.getitem(&Slice::empty()).unwrap();
    assert_eq!(format!("{}", out), format!("{}", a));
}
