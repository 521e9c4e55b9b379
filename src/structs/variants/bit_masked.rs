//! # **BitMaskedArray Module** - *Bit-packed optional values*
//!
//! The storage-density end of the option family: one validity bit per
//! element, packed eight to a byte in either bit order. Because the packed
//! form cannot be windowed at arbitrary positions, `length` is explicit and
//! every operation first unpacks to [`crate::ByteMaskedArray`].

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::structs::bitmask::Bitmask;
use crate::structs::identities::Identities;
use crate::structs::index::Index8;
use crate::structs::variants::byte_masked::ByteMaskedArray;

#[derive(Clone, Debug, PartialEq)]
pub struct BitMaskedArray {
    mask: Bitmask,
    content: Content,
    valid_when: bool,
    length: i64,
    lsb_order: bool,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl BitMaskedArray {
    pub fn new(
        mask: Bitmask,
        content: Content,
        valid_when: bool,
        length: i64,
        lsb_order: bool,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        debug_assert!(length as usize <= mask.len());
        BitMaskedArray {
            mask,
            content,
            valid_when,
            length,
            lsb_order,
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn mask(&self) -> &Bitmask {
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
    pub fn lsb_order(&self) -> bool {
        self.lsb_order
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
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Unpacks the mask to a byte per element, honoring the bit order.
    pub fn to_byte_masked(&self) -> ByteMaskedArray {
        let bools = self.mask.to_bools(self.lsb_order);
        let bytes: Vec<i8> = bools[..self.length as usize]
            .iter()
            .map(|&b| b as i8)
            .collect();
        ByteMaskedArray::new(
            Index8::from_slice(&bytes),
            self.content.clone(),
            self.valid_when,
            self.identities.clone(),
            self.parameters.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::primitive_array::PrimitiveArray;

    fn leaf(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    #[test]
    fn test_lsb_unpack() {
        let mask = Bitmask::from_bools(&[true, false, true, true, false]);
        let b = BitMaskedArray::new(
            mask,
            leaf(&[1, 2, 3, 4, 5]),
            true,
            5,
            true,
            None,
            Parameters::new(),
        );
        let bytes = b.to_byte_masked();
        assert_eq!(bytes.mask().to_vec_i64(), vec![1, 0, 1, 1, 0]);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn test_msb_unpack() {
        // Byte 0b1010_0000 in MSB order reads [1, 0, 1].
        let mask = Bitmask::from_bytes(
            crate::structs::buffer::Buffer::from_slice(&[0b1010_0000u8]),
            3,
        );
        let b = BitMaskedArray::new(
            mask,
            leaf(&[1, 2, 3]),
            true,
            3,
            false,
            None,
            Parameters::new(),
        );
        assert_eq!(b.to_byte_masked().mask().to_vec_i64(), vec![1, 0, 1]);
    }

    #[test]
    fn test_length_truncates_mask() {
        let mask = Bitmask::new_set_all(8, true);
        let b = BitMaskedArray::new(
            mask,
            leaf(&[1, 2, 3]),
            true,
            3,
            true,
            None,
            Parameters::new(),
        );
        assert_eq!(b.len(), 3);
        assert_eq!(b.to_byte_masked().len(), 3);
    }
}
