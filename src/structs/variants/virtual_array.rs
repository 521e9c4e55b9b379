//! # **VirtualArray Module** - *Lazy arrays behind a generator boundary*
//!
//! A `VirtualArray` stands in for a layout that has not been read yet:
//! columns of a file that only materialise when touched. Operations that can
//! be answered from the generator's declared length (length itself, range
//! windows, field selection) stay lazy by wrapping a new generator;
//! everything else materialises through [`VirtualArray::array`], optionally
//! memoised in an [`ArrayCache`] under this node's key.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::enums::slice_item::SliceItem;
use crate::structs::identities::Identities;
use crate::structs::slice::Slice;
use crate::traits::generator::{ArrayCache, ArrayGenerator};

static NEXT_KEY: AtomicU64 = AtomicU64::new(0);

fn fresh_key() -> String {
    format!("ragged-{}", NEXT_KEY.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone)]
pub struct VirtualArray {
    generator: Arc<dyn ArrayGenerator>,
    cache: Option<Arc<dyn ArrayCache>>,
    cache_key: String,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl VirtualArray {
    pub fn new(
        generator: Arc<dyn ArrayGenerator>,
        cache: Option<Arc<dyn ArrayCache>>,
        cache_key: Option<String>,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        VirtualArray {
            generator,
            cache,
            cache_key: cache_key.unwrap_or_else(fresh_key),
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn generator(&self) -> &Arc<dyn ArrayGenerator> {
        &self.generator
    }

    #[inline]
    pub fn cache(&self) -> Option<&Arc<dyn ArrayCache>> {
        self.cache.as_ref()
    }

    #[inline]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    #[inline]
    pub fn identities(&self) -> Option<&Identities> {
        self.identities.as_ref()
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Declared length, without materialising.
    pub fn declared_length(&self) -> Option<i64> {
        self.generator.length()
    }

    /// Materialises the layout, consulting and filling the cache, and
    /// checking the result against the declared length.
    pub fn array(&self) -> Result<Content, RaggedError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&self.cache_key) {
                return Ok(hit);
            }
        }
        let out = self.generator.generate()?;
        if let Some(expected) = self.generator.length() {
            if out.len() != expected {
                return Err(RaggedError::InvalidStructure {
                    class: "VirtualArray",
                    message: format!(
                        "generated array has length {}, generator promised {}",
                        out.len(),
                        expected
                    ),
                    id: None,
                });
            }
        }
        if let Some(cache) = &self.cache {
            cache.set(&self.cache_key, &out);
        }
        Ok(out)
    }

    /// A lazy window: a new virtual array whose generator slices this one's
    /// output on materialisation. `start`/`stop` are already regularized.
    pub fn slice_range(&self, start: i64, stop: i64) -> VirtualArray {
        let slice = Slice::new_unchecked(vec![SliceItem::Range {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }]);
        VirtualArray {
            generator: Arc::new(SliceGenerator::new(
                self.clone(),
                slice,
                Some(stop - start),
            )),
            cache: self.cache.clone(),
            cache_key: fresh_key(),
            identities: self
                .identities
                .as_ref()
                .map(|ids| ids.getitem_range_nowrap(start, stop)),
            parameters: self.parameters.clone(),
        }
    }

    /// Lazy field selection; the length is unchanged.
    pub fn slice_field(&self, field: &str) -> VirtualArray {
        let slice = Slice::new_unchecked(vec![SliceItem::Field(field.to_owned())]);
        VirtualArray {
            generator: Arc::new(SliceGenerator::new(
                self.clone(),
                slice,
                self.generator.length(),
            )),
            cache: self.cache.clone(),
            cache_key: fresh_key(),
            identities: None,
            parameters: Parameters::new(),
        }
    }
}

impl Debug for VirtualArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualArray")
            .field("cache_key", &self.cache_key)
            .field("length", &self.generator.length())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

/// Identity of the generator and key, not of the generated values: two
/// virtual arrays are equal when materialising them is guaranteed to give
/// the same result without doing so.
impl PartialEq for VirtualArray {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.generator, &other.generator)
            && self.cache_key == other.cache_key
            && self.parameters == other.parameters
    }
}

/// Generator that materialises a base virtual array and applies a stored
/// slice; what keeps range and field access on virtual arrays lazy.
pub struct SliceGenerator {
    base: VirtualArray,
    slice: Slice,
    length: Option<i64>,
}

impl SliceGenerator {
    pub fn new(base: VirtualArray, slice: Slice, length: Option<i64>) -> Self {
        SliceGenerator {
            base,
            slice,
            length,
        }
    }
}

impl ArrayGenerator for SliceGenerator {
    fn length(&self) -> Option<i64> {
        self.length
    }

    fn generate(&self) -> Result<Content, RaggedError> {
        self.base.array()?.getitem(&self.slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::primitive_array::PrimitiveArray;
    use crate::traits::generator::{FnGenerator, TransientCache};

    fn leaf(values: &[i64]) -> Content {
        Content::Numpy(PrimitiveArray::from_i64_values(values))
    }

    #[test]
    fn test_materialise_checks_length() {
        let good = VirtualArray::new(
            Arc::new(FnGenerator::new(Some(3), || Ok(leaf(&[1, 2, 3])))),
            None,
            None,
            None,
            Parameters::new(),
        );
        assert_eq!(good.array().unwrap().len(), 3);
        let bad = VirtualArray::new(
            Arc::new(FnGenerator::new(Some(5), || Ok(leaf(&[1, 2, 3])))),
            None,
            None,
            None,
            Parameters::new(),
        );
        assert!(bad.array().is_err());
    }

    #[test]
    fn test_cache_hit_skips_generation() {
        let cache: Arc<dyn ArrayCache> = Arc::new(TransientCache::new());
        let v = VirtualArray::new(
            Arc::new(FnGenerator::new(Some(2), || Ok(leaf(&[7, 8])))),
            Some(cache.clone()),
            Some("col".into()),
            None,
            Parameters::new(),
        );
        let _ = v.array().unwrap();
        assert!(cache.get("col").is_some());
        // A poisoned cache entry is what comes back: proof the generator is
        // not re-run.
        cache.set("col", &leaf(&[99, 100]));
        match v.array().unwrap() {
            Content::Numpy(n) => assert_eq!(n.to_vec_i64(), vec![99, 100]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failing_generator_degrades_length_and_surfaces_on_use() {
        let v = Content::Virtual(Arc::new(VirtualArray::new(
            Arc::new(FnGenerator::new(None, || {
                Err(RaggedError::InvalidArgument {
                    class: "VirtualArray",
                    message: "backing column went away".into(),
                })
            })),
            None,
            None,
            None,
            Parameters::new(),
        )));
        // No declared length and a failing generator: the infallible length
        // degrades to 0, and the generation error comes back from the first
        // operation that materialises.
        assert_eq!(v.len(), 0);
        assert!(matches!(
            v.project().unwrap_err(),
            RaggedError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_slice_range_stays_lazy() {
        let v = VirtualArray::new(
            Arc::new(FnGenerator::new(Some(5), || Ok(leaf(&[0, 1, 2, 3, 4])))),
            None,
            None,
            None,
            Parameters::new(),
        );
        let window = v.slice_range(1, 4);
        assert_eq!(window.declared_length(), Some(3));
        match window.array().unwrap() {
            Content::Numpy(n) => assert_eq!(n.to_vec_i64(), vec![1, 2, 3]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
