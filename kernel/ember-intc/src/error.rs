//! Recoverable interrupt-controller errors.

use core::fmt;

use ember_core::id::IrqVector;

/// Error type for interrupt-controller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntcError {
    /// Vector is outside `0..VECTOR_COUNT`.
    InvalidVector(IrqVector),
}

impl fmt::Display for IntcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVector(v) => write!(f, "invalid interrupt vector {v}"),
        }
    }
}
