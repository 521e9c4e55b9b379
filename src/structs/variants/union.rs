//! # **UnionArray Module** - *Tagged per-element heterogeneous types*
//!
//! Element `i` is `contents[tags[i]][index[i]]`: a sum type over whole
//! arrays. The tags byte selects the variant; the index locates the element
//! within that variant's content, so contents can be stored densely in any
//! order.

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::kernels::lists;
use crate::structs::identities::Identities;
use crate::structs::index::{Index8, Index64};
use crate::utils::handle_error;

#[derive(Clone, Debug, PartialEq)]
pub struct UnionArray {
    tags: Index8,
    index: Index64,
    contents: Vec<Content>,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl UnionArray {
    pub fn new(
        tags: Index8,
        index: Index64,
        contents: Vec<Content>,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        debug_assert!(index.len() >= tags.len());
        UnionArray {
            tags,
            index,
            contents,
            identities,
            parameters,
        }
    }

    /// Builds the standard index for tag-contiguous contents: each element
    /// points at the next unused slot of its variant.
    pub fn from_tags_regular(
        tags: Index8,
        contents: Vec<Content>,
        parameters: Parameters,
    ) -> Self {
        let index = lists::union_regular_index(&tags, contents.len());
        UnionArray {
            tags,
            index: Index64::from_vec64(index),
            contents,
            identities: None,
            parameters,
        }
    }

    #[inline]
    pub fn tags(&self) -> &Index8 {
        &self.tags
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn contents(&self) -> &[Content] {
        &self.contents
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
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn numcontents(&self) -> i64 {
        self.contents.len() as i64
    }

    pub fn content(&self, which: i64) -> Result<&Content, RaggedError> {
        self.contents.get(which as usize).ok_or_else(|| {
            RaggedError::InvalidArgument {
                class: "UnionArray",
                message: format!(
                    "content {} requested of union with {} contents",
                    which,
                    self.contents.len()
                ),
            }
        })
    }

    /// The elements carrying tag `which`, in element order, as a plain array
    /// of that variant's type.
    pub fn project(&self, which: i64) -> Result<Content, RaggedError> {
        let content = self.content(which)?.clone();
        let carry = lists::union_project(&self.tags, &self.index, which)
            .map_err(|e| handle_error(e, "UnionArray"))?;
        content.carry(&carry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::primitive_array::PrimitiveArray;
    use crate::index8;

    fn ints(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    fn floats(values: &[f64]) -> Content {
        Content::Numpy(PrimitiveArray::from_f64_values(values))
    }

    #[test]
    fn test_regular_index_projection() {
        let u = UnionArray::from_tags_regular(
            index8![0, 1, 0, 1],
            vec![ints(&[10, 20]), floats(&[0.5, 1.5])],
            Parameters::new(),
        );
        assert_eq!(u.len(), 4);
        assert_eq!(u.index().to_vec_i64(), vec![0, 0, 1, 1]);
        match u.project(1).unwrap() {
            Content::Numpy(n) => assert_eq!(n.to_vec_f64(), vec![0.5, 1.5]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_content_out_of_range() {
        let u = UnionArray::from_tags_regular(
            index8![0],
            vec![ints(&[1])],
            Parameters::new(),
        );
        assert!(u.content(1).is_err());
    }
}
