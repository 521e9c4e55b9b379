//! # Error Module - Custom *Ragged* Error Type
//!
//! Defines the unified error type for Ragged, plus the kernel-level error
//! record that the low-level buffer kernels report and that
//! [`crate::utils::handle_error`] translates into [`RaggedError`].
//!
//! ## Taxonomy
//! - `IndexOutOfBounds`: out-of-bounds single-element access or fancy index,
//!   after exactly one negative-index wrap.
//! - `SliceMismatch`: a slice item applied to a node kind that cannot resolve
//!   it (jagged slice against a flat buffer, too many dimensions, disallowed
//!   mixing of advanced and missing indices).
//! - `FieldError`: field access on a fieldless node, or an unknown key.
//! - `IncompatibleMerge`: `merge` between contents that `mergeable` rejects.
//! - `InvalidStructure`: a structural invariant violation detected by
//!   `validity_error` or by a kernel (non-monotonic offsets, union tag out of
//!   range).
//! - `InvalidArgument`: malformed request parameters (zero slice step,
//!   negative axis, bad combinations arity).
//! - `Unsupported`: operations that are not meaningful for a node kind.
//!   These indicate programmer error, not data error.

use std::error::Error;
use std::fmt;

/// Catch-all error type for `Ragged`.
#[derive(Debug, PartialEq)]
pub enum RaggedError {
    IndexOutOfBounds {
        class: &'static str,
        index: i64,
        length: i64,
    },
    SliceMismatch {
        class: &'static str,
        message: String,
    },
    FieldError {
        class: &'static str,
        message: String,
    },
    IncompatibleMerge {
        from: &'static str,
        to: &'static str,
        message: Option<String>,
    },
    InvalidStructure {
        class: &'static str,
        message: String,
        id: Option<i64>,
    },
    InvalidArgument {
        class: &'static str,
        message: String,
    },
    Unsupported {
        class: &'static str,
        operation: &'static str,
    },
}

impl fmt::Display for RaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaggedError::IndexOutOfBounds { class, index, length } => {
                write!(
                    f,
                    "Index error: index {} is out of bounds for {} of length {}.",
                    index, class, length
                )
            }
            RaggedError::SliceMismatch { class, message } => {
                write!(f, "Slice error in {}: {}.", class, message)
            }
            RaggedError::FieldError { class, message } => {
                write!(f, "Field error in {}: {}.", class, message)
            }
            RaggedError::IncompatibleMerge { from, to, message } => {
                if let Some(msg) = message {
                    write!(f, "Merge error: cannot merge '{}' with '{}': {}", from, to, msg)
                } else {
                    write!(f, "Merge error: cannot merge '{}' with '{}'.", from, to)
                }
            }
            RaggedError::InvalidStructure { class, message, id } => {
                if let Some(id) = id {
                    write!(f, "Structure error in {} at element {}: {}.", class, id, message)
                } else {
                    write!(f, "Structure error in {}: {}.", class, message)
                }
            }
            RaggedError::InvalidArgument { class, message } => {
                write!(f, "Invalid argument to {}: {}.", class, message)
            }
            RaggedError::Unsupported { class, operation } => {
                write!(f, "Unsupported operation: {}::{}.", class, operation)
            }
        }
    }
}

impl Error for RaggedError {}

/// Classifies a kernel failure so the translation funnel can pick the right
/// [`RaggedError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelErrorKind {
    /// An element index was out of range (IndexError-class).
    Index,
    /// A structural invariant does not hold (ValueError-class).
    Value,
}

/// Failure record returned by the primitive kernels.
///
/// Kernels never construct [`RaggedError`] directly: they do not know which
/// node class invoked them. Translation happens in exactly one place,
/// [`crate::utils::handle_error`], which attaches the caller's class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelError {
    pub kind: KernelErrorKind,
    pub message: &'static str,
    /// Offending element position, when the kernel can identify one.
    pub id: Option<i64>,
    /// Offending index value for `Index`-kind failures.
    pub attempted: Option<i64>,
}

impl KernelError {
    pub fn index(message: &'static str, id: i64, attempted: i64) -> Self {
        KernelError {
            kind: KernelErrorKind::Index,
            message,
            id: Some(id),
            attempted: Some(attempted),
        }
    }

    pub fn value(message: &'static str, id: Option<i64>) -> Self {
        KernelError {
            kind: KernelErrorKind::Value,
            message,
            id,
            attempted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_index_out_of_bounds() {
        let err = RaggedError::IndexOutOfBounds {
            class: "NumpyArray",
            index: 7,
            length: 5,
        };
        let text = format!("{}", err);
        assert!(text.contains("7"));
        assert!(text.contains("NumpyArray"));
        assert!(text.contains("5"));
    }

    #[test]
    fn test_display_merge_with_and_without_message() {
        let plain = RaggedError::IncompatibleMerge {
            from: "ListOffsetArray",
            to: "NumpyArray",
            message: None,
        };
        assert!(format!("{}", plain).ends_with("'NumpyArray'."));
        let detailed = RaggedError::IncompatibleMerge {
            from: "RecordArray",
            to: "RecordArray",
            message: Some("field sets differ".into()),
        };
        assert!(format!("{}", detailed).contains("field sets differ"));
    }

    #[test]
    fn test_kernel_error_constructors() {
        let idx = KernelError::index("index out of range", 3, 99);
        assert_eq!(idx.kind, KernelErrorKind::Index);
        assert_eq!(idx.id, Some(3));
        assert_eq!(idx.attempted, Some(99));
        let val = KernelError::value("offsets must be monotonically increasing", None);
        assert_eq!(val.kind, KernelErrorKind::Value);
        assert_eq!(val.attempted, None);
    }
}
