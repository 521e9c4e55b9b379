//! # **EmptyArray Module** - *The unknown-type placeholder*
//!
//! A length-zero node with no dtype commitment: what an untyped builder
//! produces before seeing any data. It merges with anything and converts to
//! an empty `float64` leaf whenever an operation needs a concrete dtype.

use crate::aliases::Parameters;
use crate::enums::primitive_array::PrimitiveArray;
use crate::structs::identities::Identities;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct EmptyArray {
    identities: Option<Identities>,
    parameters: Parameters,
}

impl EmptyArray {
    pub fn new(identities: Option<Identities>, parameters: Parameters) -> Self {
        EmptyArray {
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn identities(&self) -> Option<&Identities> {
        self.identities.as_ref()
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn len(&self) -> i64 {
        0
    }

    pub fn is_empty(&self) -> bool {
        true
    }

    /// Concrete dtype commitment: an empty `float64` leaf.
    pub fn to_numpy(&self) -> PrimitiveArray {
        PrimitiveArray::from_f64_values(&[])
    }
}
