//! # **ListArray Module** - *Variable-length lists via starts/stops*
//!
//! Row `i` is content `[starts[i], stops[i])`. Rows may overlap, leave gaps,
//! or appear out of order; that generality is what makes `ListArray` the
//! workhorse of slice resolution, where windows of a shared offsets buffer
//! get carried arbitrarily. `ListOffsetArray` is the compact special case.

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::kernels::lists;
use crate::structs::identities::Identities;
use crate::structs::index::Index64;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::utils::handle_error;

#[derive(Clone, Debug, PartialEq)]
pub struct ListArray {
    starts: Index64,
    stops: Index64,
    content: Content,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl ListArray {
    pub fn new(
        starts: Index64,
        stops: Index64,
        content: Content,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        debug_assert!(stops.len() >= starts.len());
        ListArray {
            starts,
            stops,
            content,
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn starts(&self) -> &Index64 {
        &self.starts
    }

    #[inline]
    pub fn stops(&self) -> &Index64 {
        &self.stops
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
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
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Rewrites as a compact `ListOffsetArray`: contiguous, in-order,
    /// gap-free content. Always copies the covered content.
    pub fn to_list_offset(&self) -> Result<ListOffsetArray, RaggedError> {
        let offsets = lists::compact_offsets(&self.starts, &self.stops)
            .map_err(|e| handle_error(e, "ListArray"))?;
        let carry = lists::flatten_carry(&self.starts, &self.stops);
        let content = self.content.carry(&carry)?;
        Ok(ListOffsetArray::new(
            Index64::from_vec64(offsets),
            content,
            self.identities.clone(),
            self.parameters.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::primitive_array::PrimitiveArray;
    use crate::index64;

    fn leaf(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    #[test]
    fn test_noncontiguous_to_list_offset() {
        // Rows out of order and overlapping: [[5, 6], [1, 2], [5]]
        let l = ListArray::new(
            index64![4, 0, 4],
            index64![6, 2, 5],
            leaf(&[1, 2, 3, 4, 5, 6]),
            None,
            Parameters::new(),
        );
        let lo = l.to_list_offset().unwrap();
        assert_eq!(lo.offsets().to_vec_i64(), vec![0, 2, 4, 5]);
        match lo.content() {
            Content::Numpy(n) => assert_eq!(n.to_vec_i64(), vec![5, 6, 1, 2, 5]),
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rows_fail_conversion() {
        let l = ListArray::new(
            index64![2],
            index64![0],
            leaf(&[1, 2, 3]),
            None,
            Parameters::new(),
        );
        assert!(l.to_list_offset().is_err());
    }
}
