//! # **Reducer Module** - *Grouped reduction semantics*
//!
//! A [`Reducer`] turns a flat buffer of leaf values plus a `parents` map
//! (element position → output slot) into one output value per slot. The
//! engine in [`crate::reduce`] owns all structural work (deciding which
//! dimension reduces away, rebuilding list structure above the result);
//! reducers only define the monoid: identity, combine, and output dtype.
//!
//! Output dtypes follow NumPy: `count` is always `int64`; `any`/`all` are
//! `bool`; `sum`/`prod` promote integers (and bool) to `int64` and floats to
//! `float64`; `min`/`max` keep the input dtype.
//!
//! Elements whose parent is `-1` are missing and contribute nothing.

use vec64::Vec64;

use crate::enums::primitive_array::PrimitiveArray;
use crate::structs::index::Index64;
use crate::structs::variants::numpy::NumpyArray;
use crate::traits::type_unions::Primitive;

/// A grouped-reduction operation over one leaf buffer.
pub trait Reducer {
    fn name(&self) -> &'static str;

    /// Reduces `data` into `outlength` slots according to `parents`.
    /// Slots no element maps to hold the reducer's identity.
    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray;
}

/// Per-slot element counts; dtype `int64` regardless of input.
pub struct Count;

impl Reducer for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        let mut out = Vec64::with_capacity(outlength as usize);
        out.resize(outlength as usize, 0i64);
        for i in 0..data.len() {
            let p = parents.get(i as i64);
            if p >= 0 {
                out[p as usize] += 1;
            }
        }
        <i64 as Primitive>::wrap(NumpyArray::from_vec64(out))
    }
}

/// Per-slot sums; integers and bool promote to `int64`, floats to `float64`.
pub struct Sum;

impl Reducer for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        if T::IS_FLOAT {
            accumulate_f64(data, parents, outlength, 0.0, |acc, v| acc + v)
        } else {
            accumulate_i64(data, parents, outlength, 0, |acc, v| acc + v)
        }
    }
}

/// Per-slot products; same promotion as [`Sum`].
pub struct Prod;

impl Reducer for Prod {
    fn name(&self) -> &'static str {
        "prod"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        if T::IS_FLOAT {
            accumulate_f64(data, parents, outlength, 1.0, |acc, v| acc * v)
        } else {
            accumulate_i64(data, parents, outlength, 1, |acc, v| acc * v)
        }
    }
}

/// Per-slot minima; keeps the input dtype. Empty slots hold the dtype's
/// maximum (floats: `+inf`).
pub struct Min;

impl Reducer for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        let mut out = Vec64::with_capacity(outlength as usize);
        out.resize(outlength as usize, T::max_value());
        for (i, &v) in data.iter().enumerate() {
            let p = parents.get(i as i64);
            if p >= 0 && v < out[p as usize] {
                out[p as usize] = v;
            }
        }
        T::wrap(NumpyArray::from_vec64(out))
    }
}

/// Per-slot maxima; keeps the input dtype. Empty slots hold the dtype's
/// minimum (floats: `-inf`).
pub struct Max;

impl Reducer for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        let mut out = Vec64::with_capacity(outlength as usize);
        out.resize(outlength as usize, T::min_value());
        for (i, &v) in data.iter().enumerate() {
            let p = parents.get(i as i64);
            if p >= 0 && v > out[p as usize] {
                out[p as usize] = v;
            }
        }
        T::wrap(NumpyArray::from_vec64(out))
    }
}

/// Per-slot logical or of truthiness; dtype `bool`.
pub struct Any;

impl Reducer for Any {
    fn name(&self) -> &'static str {
        "any"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        let mut out = Vec64::with_capacity(outlength as usize);
        out.resize(outlength as usize, false);
        for (i, &v) in data.iter().enumerate() {
            let p = parents.get(i as i64);
            if p >= 0 && v.to_f64() != 0.0 {
                out[p as usize] = true;
            }
        }
        <bool as Primitive>::wrap(NumpyArray::from_vec64(out))
    }
}

/// Per-slot logical and of truthiness; dtype `bool`. Empty slots are `true`
/// (vacuous truth).
pub struct All;

impl Reducer for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn apply<T: Primitive>(
        &self,
        data: &[T],
        parents: &Index64,
        outlength: i64,
    ) -> PrimitiveArray {
        let mut out = Vec64::with_capacity(outlength as usize);
        out.resize(outlength as usize, true);
        for (i, &v) in data.iter().enumerate() {
            let p = parents.get(i as i64);
            if p >= 0 && v.to_f64() == 0.0 {
                out[p as usize] = false;
            }
        }
        <bool as Primitive>::wrap(NumpyArray::from_vec64(out))
    }
}

fn accumulate_i64<T: Primitive>(
    data: &[T],
    parents: &Index64,
    outlength: i64,
    identity: i64,
    combine: impl Fn(i64, i64) -> i64,
) -> PrimitiveArray {
    let mut out = Vec64::with_capacity(outlength as usize);
    out.resize(outlength as usize, identity);
    for (i, &v) in data.iter().enumerate() {
        let p = parents.get(i as i64);
        if p >= 0 {
            out[p as usize] = combine(out[p as usize], v.to_i64());
        }
    }
    <i64 as Primitive>::wrap(NumpyArray::from_vec64(out))
}

fn accumulate_f64<T: Primitive>(
    data: &[T],
    parents: &Index64,
    outlength: i64,
    identity: f64,
    combine: impl Fn(f64, f64) -> f64,
) -> PrimitiveArray {
    let mut out = Vec64::with_capacity(outlength as usize);
    out.resize(outlength as usize, identity);
    for (i, &v) in data.iter().enumerate() {
        let p = parents.get(i as i64);
        if p >= 0 {
            out[p as usize] = combine(out[p as usize], v.to_f64());
        }
    }
    <f64 as Primitive>::wrap(NumpyArray::from_vec64(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index64;

    #[test]
    fn test_sum_groups() {
        let parents = index64![0, 0, 1, 2, 2];
        let out = Sum.apply(&[1i64, 2, 3, 4, 5], &parents, 3);
        assert_eq!(out.to_vec_f64(), vec![3.0, 3.0, 9.0]);
        assert_eq!(out.dtype_name(), "int64");
    }

    #[test]
    fn test_sum_float_promotes_to_f64() {
        let parents = index64![0, 1];
        let out = Sum.apply(&[1.5f32, 2.5], &parents, 2);
        assert_eq!(out.dtype_name(), "float64");
    }

    #[test]
    fn test_count_and_empty_slot() {
        let parents = index64![0, 0, 2];
        let out = Count.apply(&[9i64, 9, 9], &parents, 3);
        assert_eq!(out.to_vec_f64(), vec![2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_min_max_identities() {
        let parents = index64![0, 0];
        let min = Min.apply(&[3.0f64, 1.0], &parents, 2);
        assert_eq!(min.to_vec_f64(), vec![1.0, f64::INFINITY]);
        let max = Max.apply(&[3.0f64, 1.0], &parents, 2);
        assert_eq!(max.to_vec_f64(), vec![3.0, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_any_all_vacuous() {
        let parents = index64![0, 0, 1];
        let any = Any.apply(&[0i64, 1, 0], &parents, 3);
        assert_eq!(any.to_vec_f64(), vec![1.0, 0.0, 0.0]);
        let all = All.apply(&[0i64, 1, 0], &parents, 3);
        // Slot 2 has no elements: vacuously true.
        assert_eq!(all.to_vec_f64(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_parent_skipped() {
        let parents = index64![0, -1, 0];
        let out = Sum.apply(&[1i64, 100, 2], &parents, 1);
        assert_eq!(out.to_vec_f64(), vec![3.0]);
    }
}
