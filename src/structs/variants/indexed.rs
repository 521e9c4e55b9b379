//! # **IndexedArray Module** - *Projection, with or without missing values*
//!
//! Element `i` is `content[index[i]]`: a lazy gather that deduplicates
//! (dictionary encoding) or reorders without touching the content. With
//! `is_option` set, `-1` entries mean "missing", and this node is the
//! computational normal form of every option type: masks convert to it
//! before any recursion.

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::kernels::missing;
use crate::structs::identities::Identities;
use crate::structs::index::Index64;
use crate::utils::handle_error;

#[derive(Clone, Debug, PartialEq)]
pub struct IndexedArray {
    index: Index64,
    content: Content,
    is_option: bool,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl IndexedArray {
    pub fn new(
        index: Index64,
        content: Content,
        is_option: bool,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        IndexedArray {
            index,
            content,
            is_option,
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Whether `-1` index entries are legal (and mean missing).
    #[inline]
    pub fn is_option(&self) -> bool {
        self.is_option
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
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn numnull(&self) -> i64 {
        if self.is_option {
            missing::numnull(&self.index)
        } else {
            0
        }
    }

    /// Dense carry over the valid entries plus the out-index that restores
    /// missing positions afterwards.
    pub fn nextcarry_outindex(&self) -> (Index64, Index64) {
        let (nextcarry, outindex) = missing::nextcarry_outindex(&self.index);
        (Index64::from_vec64(nextcarry), Index64::from_vec64(outindex))
    }

    /// Materialises the projection. Errors on a missing entry: callers that
    /// tolerate missing values go through `nextcarry_outindex` instead.
    pub fn project(&self) -> Result<Content, RaggedError> {
        let mut carry = Vec::with_capacity(self.index.len() as usize);
        for i in 0..self.index.len() {
            let v = self.index.get(i);
            if v < 0 {
                return Err(RaggedError::InvalidStructure {
                    class: "IndexedArray",
                    message: "cannot project an array with missing values".into(),
                    id: Some(i),
                });
            }
            carry.push(v);
        }
        self.content.carry(&carry)
    }

    /// Collapses a stacked projection (this node over another indexed or
    /// option node) into a single layer. Non-indexed content passes through
    /// unchanged.
    pub fn simplified(&self) -> Result<Content, RaggedError> {
        let inner = match &self.content {
            Content::Indexed(inner) => inner.clone(),
            Content::ByteMasked(m) => std::sync::Arc::new(m.to_indexed_option()),
            Content::BitMasked(m) => {
                std::sync::Arc::new(m.to_byte_masked().to_indexed_option())
            }
            _ => {
                return Ok(Content::Indexed(std::sync::Arc::new(self.clone())));
            }
        };
        let combined = missing::simplify_index(&self.index, inner.index())
            .map_err(|e| handle_error(e, "IndexedArray"))?;
        Ok(Content::Indexed(std::sync::Arc::new(IndexedArray::new(
            Index64::from_vec64(combined),
            inner.content().clone(),
            self.is_option || inner.is_option(),
            self.identities.clone(),
            self.parameters.clone(),
        ))))
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
    fn test_project_dense() {
        let a = IndexedArray::new(
            index64![2, 0, 2],
            leaf(&[10, 20, 30]),
            false,
            None,
            Parameters::new(),
        );
        match a.project().unwrap() {
            Content::Numpy(n) => assert_eq!(n.to_vec_i64(), vec![30, 10, 30]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_project_rejects_missing() {
        let a = IndexedArray::new(
            index64![0, -1],
            leaf(&[10]),
            true,
            None,
            Parameters::new(),
        );
        assert!(a.project().is_err());
        assert_eq!(a.numnull(), 1);
    }

    #[test]
    fn test_simplified_collapses_layers() {
        let inner = IndexedArray::new(
            index64![-1, 5, 6],
            leaf(&[0, 1, 2, 3, 4, 50, 60]),
            true,
            None,
            Parameters::new(),
        );
        let outer = IndexedArray::new(
            index64![2, -1, 0],
            Content::Indexed(std::sync::Arc::new(inner)),
            true,
            None,
            Parameters::new(),
        );
        match outer.simplified().unwrap() {
            Content::Indexed(a) => {
                assert_eq!(a.index().to_vec_i64(), vec![6, -1, -1]);
                assert!(a.is_option());
                assert_eq!(a.content().len(), 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
