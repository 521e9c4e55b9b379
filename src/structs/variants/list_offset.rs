//! # **ListOffsetArray Module** - *Variable-length lists via offsets*
//!
//! Row `i` is content `[offsets[i], offsets[i+1])`: monotonic offsets make
//! rows contiguous and in order, which is what builders produce and IO
//! formats store. `starts()`/`stops()` are zero-copy windows over the same
//! offsets buffer, so anything written against `ListArray` applies here
//! without conversion cost.

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::structs::identities::Identities;
use crate::structs::index::Index64;
use crate::structs::variants::list::ListArray;

#[derive(Clone, Debug, PartialEq)]
pub struct ListOffsetArray {
    offsets: Index64,
    content: Content,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl ListOffsetArray {
    pub fn new(
        offsets: Index64,
        content: Content,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        debug_assert!(!offsets.is_empty());
        ListOffsetArray {
            offsets,
            content,
            identities,
            parameters,
        }
    }

    /// Builds compact offsets from per-row counts.
    pub fn from_counts(counts: &[i64], content: Content, parameters: Parameters) -> Self {
        let mut v = vec64::Vec64::with_capacity(counts.len() + 1);
        v.push(0);
        let mut total = 0;
        for &c in counts {
            total += c;
            v.push(total);
        }
        ListOffsetArray {
            offsets: Index64::from_vec64(v),
            content,
            identities: None,
            parameters,
        }
    }

    #[inline]
    pub fn offsets(&self) -> &Index64 {
        &self.offsets
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
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-copy row starts.
    pub fn starts(&self) -> Index64 {
        self.offsets.window(0, self.len())
    }

    /// Zero-copy row stops.
    pub fn stops(&self) -> Index64 {
        self.offsets.window(1, self.len())
    }

    /// Whether `offsets[0] == 0` (no leading content skipped).
    pub fn offsets_are_compact(&self) -> bool {
        !self.offsets.is_empty() && self.offsets.get(0) == 0
    }

    /// The starts/stops view of the same rows; zero-copy.
    pub fn to_list(&self) -> ListArray {
        ListArray::new(
            self.starts(),
            self.stops(),
            self.content.clone(),
            self.identities.clone(),
            self.parameters.clone(),
        )
    }

    /// Offsets rebased to start at zero, trimming unreferenced content on
    /// both sides. Zero-copy when already based at zero.
    pub fn compact(&self) -> ListOffsetArray {
        let base = self.offsets.get(0);
        let last = self.offsets.get(self.offsets.len() - 1);
        let content = self.content.getitem_range_nowrap(base, last);
        if base == 0 {
            return ListOffsetArray {
                offsets: self.offsets.clone(),
                content,
                identities: self.identities.clone(),
                parameters: self.parameters.clone(),
            };
        }
        let mut v = vec64::Vec64::with_capacity(self.offsets.len() as usize);
        for i in 0..self.offsets.len() {
            v.push(self.offsets.get(i) - base);
        }
        ListOffsetArray {
            offsets: Index64::from_vec64(v),
            content,
            identities: self.identities.clone(),
            parameters: self.parameters.clone(),
        }
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
    fn test_starts_stops_are_windows() {
        let lo = ListOffsetArray::new(
            index64![0, 3, 3, 5],
            leaf(&[1, 2, 3, 4, 5]),
            None,
            Parameters::new(),
        );
        assert_eq!(lo.len(), 3);
        assert_eq!(lo.starts().to_vec_i64(), vec![0, 3, 3]);
        assert_eq!(lo.stops().to_vec_i64(), vec![3, 3, 5]);
    }

    #[test]
    fn test_from_counts() {
        let lo = ListOffsetArray::from_counts(&[2, 0, 1], leaf(&[7, 8, 9]), Parameters::new());
        assert_eq!(lo.offsets().to_vec_i64(), vec![0, 2, 2, 3]);
    }

    #[test]
    fn test_compact_rebases() {
        // A range-sliced list whose offsets no longer start at zero.
        let lo = ListOffsetArray::new(
            index64![2, 4, 5],
            leaf(&[0, 1, 2, 3, 4]),
            None,
            Parameters::new(),
        );
        let c = lo.compact();
        assert_eq!(c.offsets().to_vec_i64(), vec![0, 2, 3]);
        assert_eq!(c.content().len(), 3);
    }
}
