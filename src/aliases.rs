use std::collections::BTreeMap;

/// Free-form key→value metadata attached to a single layout node.
///
/// Parameters belong to the node they are set on, not to its children, and
/// survive structural operations that rebuild the same node kind (slicing a
/// `ListOffsetArray` keeps its parameters; the lists produced *inside* a
/// deeper slice do not inherit them).
///
/// A `BTreeMap` keeps iteration order deterministic, which keeps `Display`
/// output and `validity_error` reports stable.
pub type Parameters = BTreeMap<String, String>;

/// Logical element count of a layout node.
pub type Length = i64;

/// A dimension count (tree depth). Records and unions can have a *range* of
/// depths across branches, hence `(min, max)` pairs in depth queries.
pub type Depth = i64;
