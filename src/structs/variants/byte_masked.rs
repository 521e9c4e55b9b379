//! # **ByteMaskedArray Module** - *Byte-per-element optional values*
//!
//! Element `i` is missing unless `(mask[i] != 0) == valid_when`; content is
//! kept in place under the mask (Arrow's convention), so masking never moves
//! data. All computation routes through
//! [`ByteMaskedArray::to_indexed_option`].

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::kernels::missing;
use crate::structs::identities::Identities;
use crate::structs::index::{Index8, Index64};
use crate::structs::variants::indexed::IndexedArray;

#[derive(Clone, Debug, PartialEq)]
pub struct ByteMaskedArray {
    mask: Index8,
    content: Content,
    valid_when: bool,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl ByteMaskedArray {
    pub fn new(
        mask: Index8,
        content: Content,
        valid_when: bool,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        ByteMaskedArray {
            mask,
            content,
            valid_when,
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn mask(&self) -> &Index8 {
        &self.mask
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[inline]
    pub fn valid_when(&self) -> bool {
        self.valid_when
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
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn is_valid(&self, i: i64) -> bool {
        (self.mask.get(i) != 0) == self.valid_when
    }

    pub fn numnull(&self) -> i64 {
        (0..self.len()).filter(|&i| !self.is_valid(i)).count() as i64
    }

    /// The option-index normal form: valid elements project to themselves,
    /// masked elements to `-1`.
    pub fn to_indexed_option(&self) -> IndexedArray {
        let index = missing::bytemask_to_index(&self.mask, self.valid_when);
        IndexedArray::new(
            Index64::from_vec64(index),
            self.content.clone(),
            true,
            self.identities.clone(),
            self.parameters.clone(),
        )
    }
}
