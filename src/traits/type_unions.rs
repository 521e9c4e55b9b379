//! # **Type Unions Module** - *The primitive dtype bound*
//!
//! [`Primitive`] is the single trait bound that every leaf dtype satisfies.
//! It carries the dtype name used in `Display` and error output, the
//! classification flags merge promotion needs, lossless-enough conversions
//! for the reducers, and `wrap`, which lifts a typed leaf into the
//! [`crate::PrimitiveArray`] dispatch enum.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::enums::primitive_array::PrimitiveArray;
use crate::structs::variants::numpy::NumpyArray;

/// Element types storable in a [`NumpyArray`].
pub trait Primitive:
    Copy + Default + PartialEq + PartialOrd + Debug + Display + Send + Sync + 'static
{
    /// Dtype name as rendered in `Display` output, e.g. `"int64"`.
    const NAME: &'static str;
    const IS_FLOAT: bool;
    const IS_BOOL: bool;
    const IS_SIGNED: bool;

    /// Lifts a typed leaf into the dtype dispatch enum.
    fn wrap(array: NumpyArray<Self>) -> PrimitiveArray;

    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
    fn to_i64(self) -> i64;
    fn from_i64(v: i64) -> Self;

    /// Largest representable value; identity for `min` reduction.
    fn max_value() -> Self;
    /// Smallest representable value; identity for `max` reduction.
    fn min_value() -> Self;
}

macro_rules! impl_primitive_numeric {
    ($t:ty, $name:literal, $variant:ident, float: $isf:literal, signed: $iss:literal) => {
        impl Primitive for $t {
            const NAME: &'static str = $name;
            const IS_FLOAT: bool = $isf;
            const IS_BOOL: bool = false;
            const IS_SIGNED: bool = $iss;

            #[inline]
            fn wrap(array: NumpyArray<Self>) -> PrimitiveArray {
                PrimitiveArray::$variant(Arc::new(array))
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }
            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $t
            }

            #[inline]
            fn max_value() -> Self {
                <$t>::MAX
            }
            #[inline]
            fn min_value() -> Self {
                <$t>::MIN
            }
        }
    };
}

impl_primitive_numeric!(i32, "int32", Int32, float: false, signed: true);
impl_primitive_numeric!(i64, "int64", Int64, float: false, signed: true);
impl_primitive_numeric!(u32, "uint32", UInt32, float: false, signed: false);
impl_primitive_numeric!(u64, "uint64", UInt64, float: false, signed: false);

#[cfg(feature = "extended_numeric_types")]
impl_primitive_numeric!(i8, "int8", Int8, float: false, signed: true);
#[cfg(feature = "extended_numeric_types")]
impl_primitive_numeric!(i16, "int16", Int16, float: false, signed: true);
#[cfg(feature = "extended_numeric_types")]
impl_primitive_numeric!(u8, "uint8", UInt8, float: false, signed: false);
#[cfg(feature = "extended_numeric_types")]
impl_primitive_numeric!(u16, "uint16", UInt16, float: false, signed: false);

macro_rules! impl_primitive_float {
    ($t:ty, $name:literal, $variant:ident) => {
        impl Primitive for $t {
            const NAME: &'static str = $name;
            const IS_FLOAT: bool = true;
            const IS_BOOL: bool = false;
            const IS_SIGNED: bool = true;

            #[inline]
            fn wrap(array: NumpyArray<Self>) -> PrimitiveArray {
                PrimitiveArray::$variant(Arc::new(array))
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }
            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $t
            }

            #[inline]
            fn max_value() -> Self {
                <$t>::INFINITY
            }
            #[inline]
            fn min_value() -> Self {
                <$t>::NEG_INFINITY
            }
        }
    };
}

impl_primitive_float!(f32, "float32", Float32);
impl_primitive_float!(f64, "float64", Float64);

impl Primitive for bool {
    const NAME: &'static str = "bool";
    const IS_FLOAT: bool = false;
    const IS_BOOL: bool = true;
    const IS_SIGNED: bool = false;

    #[inline]
    fn wrap(array: NumpyArray<Self>) -> PrimitiveArray {
        PrimitiveArray::Bool(Arc::new(array))
    }

    #[inline]
    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v != 0
    }

    #[inline]
    fn max_value() -> Self {
        true
    }
    #[inline]
    fn min_value() -> Self {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_flags() {
        assert_eq!(<i64 as Primitive>::NAME, "int64");
        assert!(!<i64 as Primitive>::IS_FLOAT);
        assert!(<i64 as Primitive>::IS_SIGNED);
        assert_eq!(<f64 as Primitive>::NAME, "float64");
        assert!(<f64 as Primitive>::IS_FLOAT);
        assert!(<bool as Primitive>::IS_BOOL);
        assert!(!<u64 as Primitive>::IS_SIGNED);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(<bool as Primitive>::from_i64(2), true);
        assert_eq!(3.5f64.to_i64(), 3);
        assert_eq!(<i32 as Primitive>::from_f64(2.9), 2);
    }

    #[test]
    fn test_reduction_identities() {
        assert_eq!(<i64 as Primitive>::max_value(), i64::MAX);
        assert_eq!(<f64 as Primitive>::min_value(), f64::NEG_INFINITY);
        assert_eq!(<bool as Primitive>::max_value(), true);
    }
}
