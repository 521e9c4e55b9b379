//! # **Utils Module** - *Shared helpers for the layout nodes*
//!
//! The error-translation funnel plus the index regularisation helpers every
//! node uses for element and range access.

use crate::enums::error::{KernelError, KernelErrorKind, RaggedError};

/// Translates a kernel failure into a [`RaggedError`], attaching the class
/// name of the node that invoked the kernel. The single point where kernel
/// errors become user-facing.
pub fn handle_error(err: KernelError, class: &'static str) -> RaggedError {
    match err.kind {
        KernelErrorKind::Index => {
            let mut message = err.message.to_string();
            if let Some(attempted) = err.attempted {
                message.push_str(&format!(" (attempting index {})", attempted));
            }
            if let Some(id) = err.id {
                message.push_str(&format!(" at element {}", id));
            }
            RaggedError::SliceMismatch { class, message }
        }
        KernelErrorKind::Value => RaggedError::InvalidStructure {
            class,
            message: err.message.to_string(),
            id: err.id,
        },
    }
}

/// Wraps a user-supplied element index exactly once and bounds-checks it.
pub fn regularize_at(
    at: i64,
    length: i64,
    class: &'static str,
) -> Result<i64, RaggedError> {
    let reg = if at < 0 { at + length } else { at };
    if reg < 0 || reg >= length {
        return Err(RaggedError::IndexOutOfBounds {
            class,
            index: at,
            length,
        });
    }
    Ok(reg)
}

/// Resolves a step-1 range request against `length`, Python-style: wrap
/// once, then clamp. Never errors.
pub fn regularize_range(
    start: Option<i64>,
    stop: Option<i64>,
    length: i64,
) -> (i64, i64) {
    let (first, count) = crate::kernels::getitem::resolve_range(length, start, stop, 1);
    (first, first + count)
}
