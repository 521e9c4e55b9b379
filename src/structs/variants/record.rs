//! # **RecordArray Module** - *Struct-of-arrays records*
//!
//! One content per field, all sharing the record array's length; a record is
//! never materialised row-wise. Fields are either named or positional
//! ("tuples"); a positional field answers to its number as a string, and
//! named fields answer to their position too, so `field("0")` is always
//! meaningful.
//!
//! A `RecordArray` can outlive its contents' lengths: `length` is stored
//! explicitly and must not exceed any field (this also allows zero-field
//! records of nonzero length).

use std::sync::Arc;

use crate::aliases::Parameters;
use crate::enums::content::Content;
use crate::enums::error::RaggedError;
use crate::structs::identities::Identities;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordArray {
    contents: Vec<Content>,
    fields: Option<Vec<String>>,
    length: i64,
    identities: Option<Identities>,
    parameters: Parameters,
}

impl RecordArray {
    /// `length: None` takes the shortest field's length; zero-field records
    /// must give one explicitly.
    pub fn new(
        contents: Vec<Content>,
        fields: Option<Vec<String>>,
        length: Option<i64>,
        identities: Option<Identities>,
        parameters: Parameters,
    ) -> Self {
        if let Some(names) = &fields {
            debug_assert_eq!(names.len(), contents.len());
        }
        let length = length.unwrap_or_else(|| {
            contents.iter().map(|c| c.len()).min().unwrap_or(0)
        });
        RecordArray {
            contents,
            fields,
            length,
            identities,
            parameters,
        }
    }

    #[inline]
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    #[inline]
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
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

    pub fn istuple(&self) -> bool {
        self.fields.is_none()
    }

    pub fn numfields(&self) -> i64 {
        self.contents.len() as i64
    }

    /// Field names, or stringified positions for a tuple.
    pub fn keys(&self) -> Vec<String> {
        match &self.fields {
            Some(names) => names.clone(),
            None => (0..self.contents.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Resolves a key to a field position: by name first, then as a number.
    pub fn field_index(&self, key: &str) -> Result<usize, RaggedError> {
        if let Some(names) = &self.fields {
            if let Some(pos) = names.iter().position(|n| n == key) {
                return Ok(pos);
            }
        }
        if let Ok(pos) = key.parse::<usize>() {
            if pos < self.contents.len() {
                return Ok(pos);
            }
        }
        Err(RaggedError::FieldError {
            class: "RecordArray",
            message: format!("no field {:?} in record with keys {:?}", key, self.keys()),
        })
    }

    pub fn haskey(&self, key: &str) -> bool {
        self.field_index(key).is_ok()
    }

    /// The named field's content, trimmed to this record array's length.
    pub fn field(&self, key: &str) -> Result<Content, RaggedError> {
        let at = self.field_index(key)?;
        let content = &self.contents[at];
        if content.len() == self.length {
            Ok(content.clone())
        } else {
            Ok(content.getitem_range_nowrap(0, self.length))
        }
    }

    /// A record array of the named fields only, in the given order.
    pub fn project_fields(&self, keys: &[String]) -> Result<RecordArray, RaggedError> {
        let mut contents = Vec::with_capacity(keys.len());
        for key in keys {
            contents.push(self.field(key)?);
        }
        let fields = if self.istuple() {
            None
        } else {
            Some(keys.to_vec())
        };
        Ok(RecordArray::new(
            contents,
            fields,
            Some(self.length),
            self.identities.clone(),
            self.parameters.clone(),
        ))
    }
}

/// One row of a [`RecordArray`]: a scalar, not an array.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    array: Arc<RecordArray>,
    at: i64,
}

impl Record {
    pub fn new(array: Arc<RecordArray>, at: i64) -> Self {
        debug_assert!(0 <= at && at < array.len());
        Record { array, at }
    }

    #[inline]
    pub fn array(&self) -> &Arc<RecordArray> {
        &self.array
    }

    #[inline]
    pub fn at(&self) -> i64 {
        self.at
    }

    pub fn istuple(&self) -> bool {
        self.array.istuple()
    }

    pub fn keys(&self) -> Vec<String> {
        self.array.keys()
    }

    pub fn haskey(&self, key: &str) -> bool {
        self.array.haskey(key)
    }

    /// The scalar at this row of the named field.
    pub fn field(&self, key: &str) -> Result<Content, RaggedError> {
        self.array.field(key)?.getitem_at_nowrap(self.at)
    }
}

/// Incremental [`RecordArray`] construction with mixing checks.
#[derive(Default)]
pub struct RecordBuilder {
    contents: Vec<Content>,
    names: Vec<String>,
    positional: bool,
}

impl RecordBuilder {
    pub fn new() -> Self {
        RecordBuilder::default()
    }

    /// Adds a named field.
    pub fn field(mut self, name: impl Into<String>, content: Content) -> Self {
        self.names.push(name.into());
        self.contents.push(content);
        self
    }

    /// Adds a positional (tuple) field.
    pub fn item(mut self, content: Content) -> Self {
        self.positional = true;
        self.contents.push(content);
        self
    }

    pub fn build(self) -> Result<RecordArray, RaggedError> {
        self.build_inner(None)
    }

    /// Builds with an explicit length; required for zero-field records.
    pub fn build_with_length(self, length: i64) -> Result<RecordArray, RaggedError> {
        self.build_inner(Some(length))
    }

    fn build_inner(self, length: Option<i64>) -> Result<RecordArray, RaggedError> {
        if self.positional && !self.names.is_empty() {
            return Err(RaggedError::InvalidArgument {
                class: "RecordBuilder",
                message: "cannot mix named fields and positional items".into(),
            });
        }
        if self.contents.is_empty() && length.is_none() {
            return Err(RaggedError::InvalidArgument {
                class: "RecordBuilder",
                message: "a record with no fields needs an explicit length".into(),
            });
        }
        if let Some(length) = length {
            for (i, c) in self.contents.iter().enumerate() {
                if c.len() < length {
                    return Err(RaggedError::InvalidArgument {
                        class: "RecordBuilder",
                        message: format!(
                            "field {} has length {}, shorter than the requested {}",
                            i,
                            c.len(),
                            length
                        ),
                    });
                }
            }
        }
        let fields = if self.positional || self.names.is_empty() && !self.contents.is_empty()
        {
            None
        } else {
            Some(self.names)
        };
        Ok(RecordArray::new(
            self.contents,
            fields,
            length,
            None,
            Parameters::new(),
        ))
    }
}
