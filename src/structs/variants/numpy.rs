//! # **NumpyArray Module** - *The typed leaf node*
//!
//! A `NumpyArray<T>` is a shape/strides view over a flat [`Buffer`] of one
//! primitive dtype. One-dimensional leaves are the normal case; a
//! multidimensional leaf is equivalent to nesting in `RegularArray`s, and
//! [`NumpyArray::to_regular`] performs exactly that rewrite so the slice
//! engine only ever handles regular structure explicitly.
//!
//! Strides are in elements, not bytes. Non-contiguous views (produced
//! upstream by IO adapters) are materialised by [`NumpyArray::contiguous`]
//! before any element-moving operation.

use std::fmt::{self, Display, Formatter};

use vec64::Vec64;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::structs::buffer::Buffer;
use crate::structs::identities::Identities;
use crate::structs::variants::regular::RegularArray;
use crate::traits::type_unions::Primitive;

/// Row-major strides for a contiguous array of the given shape.
pub fn contiguous_strides(shape: &[i64]) -> Vec<i64> {
    let mut strides = vec![1i64; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Typed leaf: flat buffer plus shape and element strides.
///
/// An empty `shape` is a scalar (the result of exhausting every dimension
/// with integer indexes); its length is reported as 1.
#[derive(Clone, Debug, PartialEq)]
pub struct NumpyArray<T: Primitive> {
    data: Buffer<T>,
    shape: Vec<i64>,
    strides: Vec<i64>,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl<T: Primitive> NumpyArray<T> {
    pub fn new(
        data: Buffer<T>,
        shape: Vec<i64>,
        strides: Option<Vec<i64>>,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        let strides = strides.unwrap_or_else(|| contiguous_strides(&shape));
        assert_eq!(shape.len(), strides.len());
        NumpyArray {
            data,
            shape,
            strides,
            identities,
            parameters,
        }
    }

    /// One-dimensional leaf over an owned vector.
    pub fn from_vec64(values: Vec64<T>) -> Self {
        let shape = vec![values.len() as i64];
        NumpyArray {
            data: Buffer::from_vec64(values),
            strides: contiguous_strides(&shape),
            shape,
            identities: None,
            parameters: Parameters::new(),
        }
    }

    /// One-dimensional leaf copied from a slice.
    pub fn from_slice(values: &[T]) -> Self {
        NumpyArray {
            data: Buffer::from_slice(values),
            shape: vec![values.len() as i64],
            strides: vec![1],
            identities: None,
            parameters: Parameters::new(),
        }
    }

    /// Zero-dimensional scalar.
    pub fn scalar(value: T) -> Self {
        NumpyArray {
            data: Buffer::from_slice(&[value]),
            shape: Vec::new(),
            strides: Vec::new(),
            identities: None,
            parameters: Parameters::new(),
        }
    }

    pub fn with_identities(mut self, identities: Option<Identities>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[inline]
    pub fn data(&self) -> &Buffer<T> {
        &self.data
    }

    #[inline]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[i64] {
        &self.strides
    }

    #[inline]
    pub fn identities(&self) -> Option<&Identities> {
        self.identities.as_ref()
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[inline]
    pub fn ndim(&self) -> i64 {
        self.shape.len() as i64
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Length along the first dimension; 1 for a scalar.
    pub fn len(&self) -> i64 {
        if self.shape.is_empty() { 1 } else { self.shape[0] }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total element count across all dimensions.
    pub fn flat_len(&self) -> i64 {
        self.shape.iter().product()
    }

    pub fn is_contiguous(&self) -> bool {
        self.strides == contiguous_strides(&self.shape)
    }

    /// The scalar's value. Meaningful only when `is_scalar()`.
    pub fn value(&self) -> T {
        debug_assert!(self.is_scalar());
        self.data[0]
    }

    /// Row-major copy; identity when already contiguous.
    pub fn contiguous(&self) -> NumpyArray<T> {
        if self.is_contiguous() {
            return self.clone();
        }
        let flat = self.flat_len().max(0);
        let mut out = Vec64::with_capacity(flat as usize);
        let mut coords = vec![0i64; self.shape.len()];
        for _ in 0..flat {
            let mut pos = 0i64;
            for (d, &c) in coords.iter().enumerate() {
                pos += c * self.strides[d];
            }
            out.push(self.data[pos as usize]);
            for d in (0..coords.len()).rev() {
                coords[d] += 1;
                if coords[d] < self.shape[d] {
                    break;
                }
                coords[d] = 0;
            }
        }
        NumpyArray {
            data: Buffer::from_vec64(out),
            strides: contiguous_strides(&self.shape),
            shape: self.shape.clone(),
            identities: self.identities.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Element (or inner array) at `at`, bounds already checked. A
    /// one-dimensional leaf yields a scalar; deeper leaves drop their first
    /// dimension.
    pub fn getitem_at_nowrap(&self, at: i64) -> NumpyArray<T> {
        let this = self.contiguous();
        let inner: i64 = this.shape[1..].iter().product();
        NumpyArray {
            data: this.data.window((at * inner) as usize, inner as usize),
            shape: this.shape[1..].to_vec(),
            strides: this.strides[1..].to_vec(),
            identities: None,
            parameters: this.parameters.clone(),
        }
    }

    /// Window along the first dimension, bounds already regularized.
    pub fn getitem_range_nowrap(&self, start: i64, stop: i64) -> NumpyArray<T> {
        let this = self.contiguous();
        let inner: i64 = this.shape[1..].iter().product();
        let mut shape = this.shape.clone();
        shape[0] = stop - start;
        NumpyArray {
            data: this
                .data
                .window((start * inner) as usize, ((stop - start) * inner) as usize),
            strides: this.strides.clone(),
            shape,
            identities: self
                .identities
                .as_ref()
                .map(|ids| ids.getitem_range_nowrap(start, stop)),
            parameters: this.parameters,
        }
    }

    /// Gathers along the first dimension. Carry positions are produced by
    /// the engine and already in range.
    pub fn carry(&self, carry: &[i64]) -> NumpyArray<T> {
        let this = self.contiguous();
        let inner: i64 = this.shape[1..].iter().product();
        let mut out = Vec64::with_capacity(carry.len() * inner as usize);
        for &c in carry {
            debug_assert!(0 <= c && c < this.len());
            out.extend_from_slice(
                &this.data.as_slice()[(c * inner) as usize..((c + 1) * inner) as usize],
            );
        }
        let mut shape = this.shape.clone();
        shape[0] = carry.len() as i64;
        NumpyArray {
            data: Buffer::from_vec64(out),
            strides: contiguous_strides(&shape),
            shape,
            identities: self.identities.as_ref().map(|ids| ids.getitem_carry(carry)),
            parameters: this.parameters,
        }
    }

    /// Rewrites a multidimensional leaf as `RegularArray`s over a
    /// one-dimensional leaf. One-dimensional leaves return themselves.
    pub fn to_regular(&self) -> Content {
        if self.ndim() <= 1 {
            return Content::Numpy(T::wrap(self.clone()));
        }
        let this = self.contiguous();
        let flat = NumpyArray {
            data: this.data.clone(),
            shape: vec![this.flat_len()],
            strides: vec![1],
            identities: None,
            parameters: this.parameters.clone(),
        };
        let mut out = Content::Numpy(T::wrap(flat));
        for d in (1..this.shape.len()).rev() {
            let length: i64 = this.shape[..d].iter().product();
            out = Content::Regular(std::sync::Arc::new(RegularArray::new(
                out,
                this.shape[d],
                length,
                None,
                Parameters::new(),
            )));
        }
        out
    }
}

impl<T: Primitive> Display for NumpyArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fn render<T: Primitive>(
            f: &mut Formatter<'_>,
            array: &NumpyArray<T>,
        ) -> fmt::Result {
            if array.is_scalar() {
                return write!(f, "{}", array.value());
            }
            write!(f, "[")?;
            for i in 0..array.len() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(f, &array.getitem_at_nowrap(i))?;
            }
            write!(f, "]")
        }
        render(f, &self.contiguous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_dimensional_access() {
        let a = NumpyArray::from_slice(&[10i64, 20, 30]);
        assert_eq!(a.len(), 3);
        assert_eq!(a.ndim(), 1);
        let scalar = a.getitem_at_nowrap(1);
        assert!(scalar.is_scalar());
        assert_eq!(scalar.value(), 20);
        assert_eq!(scalar.len(), 1);
    }

    #[test]
    fn test_range_and_carry() {
        let a = NumpyArray::from_slice(&[1i64, 2, 3, 4, 5]);
        let r = a.getitem_range_nowrap(1, 4);
        assert_eq!(r.data().as_slice(), &[2, 3, 4]);
        let c = a.carry(&[4, 0, 4]);
        assert_eq!(c.data().as_slice(), &[5, 1, 5]);
    }

    #[test]
    fn test_multidim_drops_first_dimension() {
        let a = NumpyArray::new(
            Buffer::from_slice(&[1i64, 2, 3, 4, 5, 6]),
            vec![2, 3],
            None,
            None,
            Parameters::new(),
        );
        assert_eq!(a.len(), 2);
        let row = a.getitem_at_nowrap(1);
        assert_eq!(row.shape(), &[3]);
        assert_eq!(row.data().as_slice(), &[4, 5, 6]);
    }

    #[test]
    fn test_noncontiguous_materialises() {
        // A transposed 2x3 view of a 3x2 buffer.
        let a = NumpyArray::new(
            Buffer::from_slice(&[1i64, 2, 3, 4, 5, 6]),
            vec![2, 3],
            Some(vec![1, 2]),
            None,
            Parameters::new(),
        );
        assert!(!a.is_contiguous());
        let c = a.contiguous();
        assert_eq!(c.data().as_slice(), &[1, 3, 5, 2, 4, 6]);
    }

    #[test]
    fn test_to_regular_shape() {
        let a = NumpyArray::new(
            Buffer::from_slice(&[0i64, 1, 2, 3, 4, 5]),
            vec![2, 3],
            None,
            None,
            Parameters::new(),
        );
        match a.to_regular() {
            Content::Regular(reg) => {
                assert_eq!(reg.len(), 2);
                assert_eq!(reg.size(), 3);
            }
            other => panic!("expected RegularArray, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let a = NumpyArray::from_slice(&[1i64, 2, 3]);
        assert_eq!(format!("{}", a), "[1, 2, 3]");
        let m = NumpyArray::new(
            Buffer::from_slice(&[1i64, 2, 3, 4]),
            vec![2, 2],
            None,
            None,
            Parameters::new(),
        );
        assert_eq!(format!("{}", m), "[[1, 2], [3, 4]]");
    }
}
