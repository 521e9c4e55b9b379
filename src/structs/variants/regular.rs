//! # **RegularArray Module** - *Fixed-size lists*
//!
//! Every row has exactly `size` elements, so no offsets buffer is stored:
//! row `i` is content `[i*size, (i+1)*size)`. A regular dimension is what a
//! multidimensional leaf flattens into, and it is the only list kind a
//! `newaxis` inserts.
//!
//! `size == 0` makes the length underdetermined by the content, so `length`
//! is stored explicitly.

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::structs::identities::Identities;
use crate::structs::index::Index64;
use crate::structs::variants::list_offset::ListOffsetArray;

#[derive(Clone, Debug, PartialEq)]
pub struct RegularArray {
    content: Content,
    size: i64,
    length: i64,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl RegularArray {
    pub fn new(
        content: Content,
        size: i64,
        length: i64,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        debug_assert!(size >= 0 && length >= 0);
        RegularArray {
            content,
            size,
            length,
            identities,
            parameters,
        }
    }

    /// Length inferred from the content; requires `size > 0`.
    pub fn from_content(content: Content, size: i64, parameters: Parameters) -> Self {
        debug_assert!(size > 0);
        let length = content.len() / size;
        RegularArray {
            content,
            size,
            length,
            identities: None,
            parameters,
        }
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[inline]
    pub fn size(&self) -> i64 {
        self.size
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn identities(&self) -> Option<&Identities> {
        self.identities.as_ref()
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Row boundaries as explicit offsets `[0, size, 2*size, ...]`.
    pub fn offsets(&self) -> Index64 {
        let mut v = vec64::Vec64::with_capacity(self.length as usize + 1);
        for i in 0..=self.length {
            v.push(i * self.size);
        }
        Index64::from_vec64(v)
    }

    /// The same rows with explicit offsets; the escape hatch for operations
    /// that only exist in ragged form.
    pub fn to_list_offset(&self) -> ListOffsetArray {
        ListOffsetArray::new(
            self.offsets(),
            self.content
                .getitem_range_nowrap(0, self.length * self.size),
            self.identities.clone(),
            self.parameters.clone(),
        )
    }
}
