//! # **Ragged** - *Columnar jagged-array layouts with a polymorphic slicing engine*
//!
//! `ragged` represents arbitrarily nested, variable-length, possibly-missing data as
//! immutable trees of columnar layout nodes, and resolves NumPy-style multi-dimensional
//! slice expressions against those trees.
//!
//! ## Layout nodes
//! - [`NumpyArray`]: flat typed buffer with shape/strides (the leaves).
//! - [`ListArray`] / [`ListOffsetArray`]: variable-length lists via starts/stops or offsets.
//! - [`RegularArray`]: fixed-size lists.
//! - [`IndexedArray`]: index-based projection, optionally with missing values.
//! - [`ByteMaskedArray`] / [`BitMaskedArray`]: mask-based optional values.
//! - [`RecordArray`]: heterogeneous named or positional fields (struct-of-arrays).
//! - [`UnionArray`]: tagged, per-element heterogeneous types.
//! - [`VirtualArray`]: lazily generated arrays behind a generator/cache boundary.
//!
//! All nodes share one polymorphic contract ([`Content`]): element access, range and
//! fancy slicing with NumPy's mixed basic/advanced indexing rules, gather (`carry`),
//! concatenation (`merge`), structural operations (`num`, `flatten`, `rpad`,
//! `localindex`, `combinations`), reductions, and recursive validity checking.
//!
//! Nodes are immutable after construction and share children by reference counting,
//! so every transform returns a new tree and existing trees are safe to read from
//! any number of threads.

pub mod enums {
    pub mod content;
    pub mod error;
    pub mod primitive_array;
    pub mod slice_item;
}

pub mod structs {
    pub mod variants {
        pub mod bit_masked;
        pub mod byte_masked;
        pub mod empty;
        pub mod indexed;
        pub mod list;
        pub mod list_offset;
        pub mod numpy;
        pub mod record;
        pub mod regular;
        pub mod union;
        pub mod virtual_array;
    }
    pub mod bitmask;
    pub mod buffer;
    pub mod identities;
    pub mod index;
    pub mod slice;
}

pub mod kernels {
    pub mod getitem;
    pub mod lists;
    pub mod missing;
    pub mod reduce;
}

pub mod traits {
    pub mod generator;
    pub mod reducer;
    pub mod type_unions;
}

pub mod aliases;
pub mod getitem;
pub mod macros;
pub mod reduce;
pub mod structural;
pub mod utils;

pub use aliases::Parameters;
pub use enums::content::Content;
pub use enums::error::{KernelError, RaggedError};
pub use enums::primitive_array::PrimitiveArray;
pub use enums::slice_item::{SliceArray64, SliceItem, SliceJagged64, SliceMissing64};
pub use structs::bitmask::Bitmask;
pub use structs::buffer::Buffer;
pub use structs::identities::Identities;
pub use structs::index::{Index, Index8, Index64};
pub use structs::slice::Slice;
pub use structs::variants::bit_masked::BitMaskedArray;
pub use structs::variants::byte_masked::ByteMaskedArray;
pub use structs::variants::empty::EmptyArray;
pub use structs::variants::indexed::IndexedArray;
pub use structs::variants::list::ListArray;
pub use structs::variants::list_offset::ListOffsetArray;
pub use structs::variants::numpy::NumpyArray;
pub use structs::variants::record::{Record, RecordArray, RecordBuilder};
pub use structs::variants::regular::RegularArray;
pub use structs::variants::union::UnionArray;
pub use structs::variants::virtual_array::{SliceGenerator, VirtualArray};
pub use traits::generator::{ArrayCache, ArrayGenerator, FnGenerator, TransientCache};
pub use traits::reducer::{All, Any, Count, Max, Min, Prod, Reducer, Sum};
pub use traits::type_unions::Primitive;
