//! # **Generator Module** - *Lazy materialisation behind [`crate::VirtualArray`]*
//!
//! An [`ArrayGenerator`] produces a layout on demand; an [`ArrayCache`]
//! optionally memoises the result under the virtual node's cache key.
//! Both are object-safe so virtual nodes can hold them as trait objects and
//! still be shared across threads.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::enums::content::Content;
use crate::enums::error::RaggedError;

/// Produces a layout on demand.
pub trait ArrayGenerator: Send + Sync {
    /// Length the generated array will have, when known without generating.
    /// `None` forces materialisation for any length-dependent operation.
    fn length(&self) -> Option<i64>;

    /// Materialises the layout. Must be consistent with `length()`.
    fn generate(&self) -> Result<Content, RaggedError>;
}

/// Memoisation surface for generated layouts.
pub trait ArrayCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Content>;
    fn set(&self, key: &str, value: &Content);
}

/// In-memory cache with no eviction; lives as long as the process.
#[derive(Default)]
pub struct TransientCache {
    inner: Mutex<HashMap<String, Content>>,
}

impl TransientCache {
    pub fn new() -> Self {
        TransientCache::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArrayCache for TransientCache {
    fn get(&self, key: &str) -> Option<Content> {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &Content) {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_owned(), value.clone());
    }
}

/// Generator from a closure; the common case in tests and IO adapters.
pub struct FnGenerator {
    length: Option<i64>,
    f: Box<dyn Fn() -> Result<Content, RaggedError> + Send + Sync>,
}

impl FnGenerator {
    pub fn new(
        length: Option<i64>,
        f: impl Fn() -> Result<Content, RaggedError> + Send + Sync + 'static,
    ) -> Self {
        FnGenerator {
            length,
            f: Box::new(f),
        }
    }
}

impl ArrayGenerator for FnGenerator {
    fn length(&self) -> Option<i64> {
        self.length
    }

    fn generate(&self) -> Result<Content, RaggedError> {
        (self.f)()
    }
}
