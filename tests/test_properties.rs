//! Cross-cutting invariants of the layout tree, exercised end to end through
//! the public surface rather than per module.

use std::sync::Arc;

use ragged::{
    Content, Index64, IndexedArray, ListOffsetArray, Parameters, PrimitiveArray,
    RegularArray, Slice, SliceArray64, SliceItem, UnionArray, index8, index64,
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

fn rendered(c: &Content) -> String {
    format!("{}", c)
}

#[test]
fn rows_are_content_windows() {
    let offsets = [0i64, 3, 3, 5, 9];
    let values: Vec<i64> = (0..9).collect();
    let a = jagged(&offsets, &values);
    let content = leaf(&values);
    for i in 0..offsets.len() as i64 - 1 {
        let row = a.getitem_at_nowrap(i).unwrap();
        let window = content
            .getitem_range(Some(offsets[i as usize]), Some(offsets[i as usize + 1]))
            .unwrap();
        assert_eq!(rendered(&row), rendered(&window), "row {}", i);
    }
}

#[test]
fn identity_carry_preserves_values() {
    let fixtures = vec![
        leaf(&[7, 8, 9]),
        jagged(&[0, 2, 2, 5], &[1, 2, 3, 4, 5]),
        Content::Indexed(Arc::new(IndexedArray::new(
            index64![1, -1, 0],
            leaf(&[10, 20]),
            true,
            None,
            Parameters::new(),
        ))),
    ];
    for a in fixtures {
        let arange = Index64::arange(a.len());
        let carried = a.carry(arange.as_slice()).unwrap();
        assert_eq!(rendered(&carried), rendered(&a));
    }
}

#[test]
fn option_projection_and_bytemask() {
    let a = Content::Indexed(Arc::new(IndexedArray::new(
        index64![2, -1, 0, -1, 1],
        leaf(&[10, 20, 30]),
        true,
        None,
        Parameters::new(),
    )));
    assert_eq!(rendered(&a.project().unwrap()), "[30, 10, 20]");
    assert_eq!(a.bytemask().to_vec_i64(), vec![1, 0, 1, 0, 1]);
}

#[test]
fn advanced_indexes_broadcast_like_numpy() {
    // rows = [[1, 2, 3], [4, 5], [6]]
    let a = jagged(&[0, 3, 5, 6], &[1, 2, 3, 4, 5, 6]);
    // a[[0, 2], [0]] -> [a[0][0], a[2][0]]
    let slice = Slice::new(vec![
        SliceItem::Array(SliceArray64::from_positions(&[0, 2])),
        SliceItem::Array(SliceArray64::from_positions(&[0])),
    ])
    .unwrap();
    assert_eq!(rendered(&a.getitem(&slice).unwrap()), "[1, 6]");
    // a[[1, 2], [1, 0]] -> [a[1][1], a[2][0]]
    let slice = Slice::new(vec![
        SliceItem::Array(SliceArray64::from_positions(&[1, 2])),
        SliceItem::Array(SliceArray64::from_positions(&[1, 0])),
    ])
    .unwrap();
    assert_eq!(rendered(&a.getitem(&slice).unwrap()), "[5, 6]");
    // a[[0, 0, 1], [2, 1, 0]] -> [3, 2, 4]
    let slice = Slice::new(vec![
        SliceItem::Array(SliceArray64::from_positions(&[0, 0, 1])),
        SliceItem::Array(SliceArray64::from_positions(&[2, 1, 0])),
    ])
    .unwrap();
    assert_eq!(rendered(&a.getitem(&slice).unwrap()), "[3, 2, 4]");
}

#[test]
fn ellipsis_matches_explicit_full_ranges() {
    // A 2 x 3 x 2 regular nesting over 0..12.
    let values: Vec<i64> = (0..12).collect();
    let inner = Content::Regular(Arc::new(RegularArray::new(
        leaf(&values),
        2,
        6,
        None,
        Parameters::new(),
    )));
    let a = Content::Regular(Arc::new(RegularArray::new(
        inner,
        3,
        2,
        None,
        Parameters::new(),
    )));
    let with_ellipsis = Slice::new(vec![SliceItem::Ellipsis, SliceItem::At(0)]).unwrap();
    let explicit = Slice::new(vec![
        SliceItem::full_range(),
        SliceItem::full_range(),
        SliceItem::At(0),
    ])
    .unwrap();
    assert_eq!(
        rendered(&a.getitem(&with_ellipsis).unwrap()),
        rendered(&a.getitem(&explicit).unwrap())
    );
    assert_eq!(
        rendered(&a.getitem(&with_ellipsis).unwrap()),
        "[[0, 2, 4], [6, 8, 10]]"
    );
}

#[test]
fn union_self_merge_simplifies_to_concatenation() {
    let u = Content::Union(Arc::new(UnionArray::new(
        index8![0, 1, 0],
        index64![0, 0, 1],
        vec![
            leaf(&[1, 2]),
            Content::Numpy(PrimitiveArray::from_f64_values(&[0.5])),
        ],
        None,
        Parameters::new(),
    )));
    assert_eq!(rendered(&u), "[1, 0.5, 2]");
    let merged = u.merge(&u).unwrap();
    let Content::Union(m) = &merged else {
        panic!("merge of unions is a union");
    };
    let flat = m.simplified(true).unwrap();
    assert!(!matches!(flat, Content::Union(_)));
    assert_eq!(rendered(&flat), "[1, 0.5, 2, 1, 0.5, 2]");
}

#[test]
fn negative_indices_wrap_exactly_once() {
    let a = leaf(&[10, 20, 30, 40, 50]);
    assert_eq!(
        rendered(&a.getitem_at(-1).unwrap()),
        rendered(&a.getitem_at(4).unwrap())
    );
    assert!(a.getitem_at(5).is_err());
    assert!(a.getitem_at(-6).is_err());
}

#[test]
fn validity_error_flags_corruption_only() {
    let fixtures = vec![
        leaf(&[1, 2, 3]),
        jagged(&[0, 2, 2, 5], &[1, 2, 3, 4, 5]),
        Content::Indexed(Arc::new(IndexedArray::new(
            index64![1, -1, 0],
            leaf(&[10, 20]),
            true,
            None,
            Parameters::new(),
        ))),
        Content::Union(Arc::new(UnionArray::new(
            index8![0, 1],
            index64![0, 0],
            vec![leaf(&[1]), leaf(&[2])],
            None,
            Parameters::new(),
        ))),
    ];
    for a in &fixtures {
        assert_eq!(a.validity_error(), None, "fixture {:?}", a);
    }
    // Decreasing offsets are structurally invalid.
    let corrupt = jagged(&[0, 5, 3], &[1, 2, 3, 4, 5]);
    assert!(corrupt.validity_error().is_some());
}
