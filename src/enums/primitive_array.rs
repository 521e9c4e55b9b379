//! # **PrimitiveArray Module** - *Dtype dispatch over typed leaves*
//!
//! [`NumpyArray<T>`] is generic over its element type; the rest of the crate
//! is not. `PrimitiveArray` closes the dtype set into one enum so
//! [`crate::Content`] stays object-free and `match`-able. Operations that
//! are uniform across dtypes live here, expanded per variant by
//! [`crate::match_primitive!`]; anything dtype-specific (reduction monoids,
//! merge promotion) matches on the classification flags instead.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::match_primitive;
use crate::structs::identities::Identities;
use crate::structs::variants::numpy::NumpyArray;
use crate::traits::type_unions::Primitive;

/// A typed leaf behind dtype dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveArray {
    Bool(Arc<NumpyArray<bool>>),
    Int32(Arc<NumpyArray<i32>>),
    Int64(Arc<NumpyArray<i64>>),
    UInt32(Arc<NumpyArray<u32>>),
    UInt64(Arc<NumpyArray<u64>>),
    Float32(Arc<NumpyArray<f32>>),
    Float64(Arc<NumpyArray<f64>>),
    #[cfg(feature = "extended_numeric_types")]
    Int8(Arc<NumpyArray<i8>>),
    #[cfg(feature = "extended_numeric_types")]
    Int16(Arc<NumpyArray<i16>>),
    #[cfg(feature = "extended_numeric_types")]
    UInt8(Arc<NumpyArray<u8>>),
    #[cfg(feature = "extended_numeric_types")]
    UInt16(Arc<NumpyArray<u16>>),
}

impl PrimitiveArray {
    pub fn dtype_name(&self) -> &'static str {
        match_primitive!(self, a => dtype_of(a))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, PrimitiveArray::Bool(_))
    }

    pub fn is_float(&self) -> bool {
        match_primitive!(self, a => flags_of(a).0)
    }

    pub fn is_signed(&self) -> bool {
        match_primitive!(self, a => flags_of(a).1)
    }

    pub fn len(&self) -> i64 {
        match_primitive!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ndim(&self) -> i64 {
        match_primitive!(self, a => a.ndim())
    }

    pub fn shape(&self) -> Vec<i64> {
        match_primitive!(self, a => a.shape().to_vec())
    }

    pub fn is_scalar(&self) -> bool {
        match_primitive!(self, a => a.is_scalar())
    }

    pub fn identities(&self) -> Option<Identities> {
        match_primitive!(self, a => a.identities().cloned())
    }

    pub fn parameters(&self) -> Parameters {
        match_primitive!(self, a => a.parameters().clone())
    }

    pub fn getitem_at_nowrap(&self, at: i64) -> PrimitiveArray {
        match_primitive!(self, a => Primitive::wrap(a.getitem_at_nowrap(at)))
    }

    pub fn getitem_range_nowrap(&self, start: i64, stop: i64) -> PrimitiveArray {
        match_primitive!(self, a => Primitive::wrap(a.getitem_range_nowrap(start, stop)))
    }

    pub fn carry(&self, carry: &[i64]) -> PrimitiveArray {
        match_primitive!(self, a => Primitive::wrap(a.carry(carry)))
    }

    /// Multidimensional leaves rewritten as `RegularArray`s; one-dimensional
    /// leaves pass through.
    pub fn to_regular(&self) -> Content {
        match_primitive!(self, a => a.to_regular())
    }

    pub fn with_parameters(&self, parameters: Parameters) -> PrimitiveArray {
        match_primitive!(
            self,
            a => Primitive::wrap(a.as_ref().clone().with_parameters(parameters))
        )
    }

    pub fn with_identities(&self, identities: Option<Identities>) -> PrimitiveArray {
        match_primitive!(
            self,
            a => Primitive::wrap(a.as_ref().clone().with_identities(identities))
        )
    }

    /// The scalar's value as `f64`. Meaningful only when `is_scalar()`.
    pub fn value_f64(&self) -> f64 {
        match_primitive!(self, a => a.value().to_f64())
    }

    /// Flat contiguous values widened to `f64`. Lossy above 2^53 for wide
    /// integers; used by tests, truthiness, and float merges.
    pub fn to_vec_f64(&self) -> Vec<f64> {
        match_primitive!(
            self,
            a => a.contiguous().data().iter().map(|v| v.to_f64()).collect()
        )
    }

    /// Flat contiguous values truncated to `i64`.
    pub fn to_vec_i64(&self) -> Vec<i64> {
        match_primitive!(
            self,
            a => a.contiguous().data().iter().map(|v| v.to_i64()).collect()
        )
    }

    pub fn from_i64_values(values: &[i64]) -> PrimitiveArray {
        <i64 as Primitive>::wrap(NumpyArray::from_slice(values))
    }

    pub fn from_f64_values(values: &[f64]) -> PrimitiveArray {
        <f64 as Primitive>::wrap(NumpyArray::from_slice(values))
    }

    pub fn from_bool_values(values: &[bool]) -> PrimitiveArray {
        <bool as Primitive>::wrap(NumpyArray::from_slice(values))
    }

    /// Re-expresses the values in the named dtype (`"bool"`, `"int64"` or
    /// `"float64"`), the three merge promotion targets.
    pub fn cast_to(&self, dtype: &str) -> PrimitiveArray {
        match dtype {
            "bool" => {
                let values: Vec<bool> =
                    self.to_vec_f64().iter().map(|&v| v != 0.0).collect();
                PrimitiveArray::from_bool_values(&values)
            }
            "float64" => PrimitiveArray::from_f64_values(&self.to_vec_f64()),
            _ => PrimitiveArray::from_i64_values(&self.to_vec_i64()),
        }
    }

    /// Appends another leaf's values, in this leaf's own dtype. Both sides
    /// must already share a dtype; promotion happens before this call.
    pub fn merge_same_dtype(&self, other: &PrimitiveArray) -> Option<PrimitiveArray> {
        fn merged<T: Primitive>(
            a: &NumpyArray<T>,
            b: &NumpyArray<T>,
        ) -> PrimitiveArray {
            let a = a.contiguous();
            let b = b.contiguous();
            let mut out = Vec64::with_capacity(a.data().len() + b.data().len());
            out.extend_from_slice(a.data().as_slice());
            out.extend_from_slice(b.data().as_slice());
            T::wrap(NumpyArray::from_vec64(out))
        }
        match (self, other) {
            (PrimitiveArray::Bool(a), PrimitiveArray::Bool(b)) => Some(merged(a, b)),
            (PrimitiveArray::Int32(a), PrimitiveArray::Int32(b)) => Some(merged(a, b)),
            (PrimitiveArray::Int64(a), PrimitiveArray::Int64(b)) => Some(merged(a, b)),
            (PrimitiveArray::UInt32(a), PrimitiveArray::UInt32(b)) => Some(merged(a, b)),
            (PrimitiveArray::UInt64(a), PrimitiveArray::UInt64(b)) => Some(merged(a, b)),
            (PrimitiveArray::Float32(a), PrimitiveArray::Float32(b)) => Some(merged(a, b)),
            (PrimitiveArray::Float64(a), PrimitiveArray::Float64(b)) => Some(merged(a, b)),
            #[cfg(feature = "extended_numeric_types")]
            (PrimitiveArray::Int8(a), PrimitiveArray::Int8(b)) => Some(merged(a, b)),
            #[cfg(feature = "extended_numeric_types")]
            (PrimitiveArray::Int16(a), PrimitiveArray::Int16(b)) => Some(merged(a, b)),
            #[cfg(feature = "extended_numeric_types")]
            (PrimitiveArray::UInt8(a), PrimitiveArray::UInt8(b)) => Some(merged(a, b)),
            #[cfg(feature = "extended_numeric_types")]
            (PrimitiveArray::UInt16(a), PrimitiveArray::UInt16(b)) => Some(merged(a, b)),
            _ => None,
        }
    }
}

fn dtype_of<T: Primitive>(_: &Arc<NumpyArray<T>>) -> &'static str {
    T::NAME
}

fn flags_of<T: Primitive>(_: &Arc<NumpyArray<T>>) -> (bool, bool) {
    (T::IS_FLOAT, T::IS_SIGNED)
}

impl Display for PrimitiveArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match_primitive!(self, a => write!(f, "{}", a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_names_and_flags() {
        let ints = PrimitiveArray::from_i64_values(&[1, 2]);
        assert_eq!(ints.dtype_name(), "int64");
        assert!(!ints.is_float());
        assert!(ints.is_signed());
        let bools = PrimitiveArray::from_bool_values(&[true]);
        assert!(bools.is_bool());
    }

    #[test]
    fn test_scalar_extraction() {
        let a = PrimitiveArray::from_f64_values(&[1.5, 2.5]);
        let s = a.getitem_at_nowrap(1);
        assert!(s.is_scalar());
        assert_eq!(s.value_f64(), 2.5);
    }

    #[test]
    fn test_cast_targets() {
        let a = PrimitiveArray::from_i64_values(&[0, 2, -1]);
        assert_eq!(a.cast_to("float64").to_vec_f64(), vec![0.0, 2.0, -1.0]);
        assert_eq!(a.cast_to("bool").to_vec_f64(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_merge_same_dtype() {
        let a = PrimitiveArray::from_i64_values(&[1, 2]);
        let b = PrimitiveArray::from_i64_values(&[3]);
        let m = a.merge_same_dtype(&b).unwrap();
        assert_eq!(m.to_vec_i64(), vec![1, 2, 3]);
        let f = PrimitiveArray::from_f64_values(&[1.0]);
        assert!(a.merge_same_dtype(&f).is_none());
    }
}
