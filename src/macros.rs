//! # **Macros Module** - *Construction and dispatch helpers*
//!
//! - [`index64!`] / [`index8!`]: literal `Index` construction, used heavily in
//!   tests and examples.
//! - [`match_primitive!`]: expands one generic expression across every dtype
//!   variant of [`crate::PrimitiveArray`], so per-dtype monomorphisation stays
//!   in one place instead of being copy-pasted at every dispatch site.

/// Builds an [`crate::Index64`] from a literal list of `i64` values.
///
/// ```
/// use ragged::index64;
/// let offsets = index64![0, 3, 3, 5];
/// assert_eq!(offsets.len(), 4);
/// ```
#[macro_export]
macro_rules! index64 {
    () => {
        $crate::Index64::empty()
    };
    ($($v:expr),+ $(,)?) => {
        $crate::Index64::from_slice(&[$($v as i64),+])
    };
}

/// Builds an [`crate::Index8`] from a literal list of `i8` values.
#[macro_export]
macro_rules! index8 {
    () => {
        $crate::Index8::empty()
    };
    ($($v:expr),+ $(,)?) => {
        $crate::Index8::from_slice(&[$($v as i8),+])
    };
}

/// Dispatches over every dtype variant of [`crate::PrimitiveArray`], binding
/// the inner `Arc<NumpyArray<T>>` to the given pattern and evaluating the body
/// once per concrete `T`.
#[macro_export]
macro_rules! match_primitive {
    ($value:expr, $inner:pat => $body:expr) => {
        match $value {
            $crate::PrimitiveArray::Bool($inner) => $body,
            $crate::PrimitiveArray::Int32($inner) => $body,
            $crate::PrimitiveArray::Int64($inner) => $body,
            $crate::PrimitiveArray::UInt32($inner) => $body,
            $crate::PrimitiveArray::UInt64($inner) => $body,
            $crate::PrimitiveArray::Float32($inner) => $body,
            $crate::PrimitiveArray::Float64($inner) => $body,
            #[cfg(feature = "extended_numeric_types")]
            $crate::PrimitiveArray::Int8($inner) => $body,
            #[cfg(feature = "extended_numeric_types")]
            $crate::PrimitiveArray::Int16($inner) => $body,
            #[cfg(feature = "extended_numeric_types")]
            $crate::PrimitiveArray::UInt8($inner) => $body,
            #[cfg(feature = "extended_numeric_types")]
            $crate::PrimitiveArray::UInt16($inner) => $body,
        }
    };
}
