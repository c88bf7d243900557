//! Error types for PME driver operations
//!
//! Register-level operations keep the engine's own failure signalling
//! (clamping and the `0xFFFF` sentinel). These errors cover everything around
//! the register protocol: mapping the device, decoding stored knowledge and
//! the checked variants of the pattern operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for PME operations
pub type Result<T> = std::result::Result<T, PmeError>;

/// Errors that can occur during PME operations
#[derive(Debug, Error)]
pub enum PmeError {
    /// Device node not found at the expected path
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// I/O error while opening or mapping the device
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Mapping the register window failed
    #[error("Failed to map PME registers: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },

    /// Pattern longer than the engine accepts
    #[error("Vector of {len} components exceeds maximum of {max}")]
    VectorTooLong {
        /// Submitted length
        len: usize,
        /// Largest accepted length
        max: usize,
    },

    /// Pattern with no components
    #[error("Vector has no components")]
    EmptyVector,

    /// More neuron records than the engine can hold
    #[error("{count} neurons exceed capacity of {max}")]
    TooManyNeurons {
        /// Number of records supplied
        count: usize,
        /// Neurons available on the die
        max: usize,
    },

    /// Stored knowledge blob could not be decoded
    #[error("Invalid knowledge data: {reason}")]
    InvalidKnowledge {
        /// Reason for failure
        reason: String,
    },
}

impl PmeError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create a mapping error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Create a vector length error, distinguishing empty from over-long.
    pub const fn vector_length(len: usize, max: usize) -> Self {
        if len == 0 {
            Self::EmptyVector
        } else {
            Self::VectorTooLong { len, max }
        }
    }

    /// Create an invalid knowledge error
    pub fn invalid_knowledge(reason: impl Into<String>) -> Self {
        Self::InvalidKnowledge {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let e = PmeError::VectorTooLong { len: 200, max: 128 };
        assert_eq!(e.to_string(), "Vector of 200 components exceeds maximum of 128");

        let e = PmeError::invalid_knowledge("bad magic");
        assert_eq!(e.to_string(), "Invalid knowledge data: bad magic");
    }

    #[test]
    fn empty_and_long_vectors_differ() {
        assert!(matches!(PmeError::vector_length(0, 128), PmeError::EmptyVector));
        assert!(matches!(
            PmeError::vector_length(129, 128),
            PmeError::VectorTooLong { len: 129, max: 128 }
        ));
        assert_eq!(PmeError::EmptyVector.to_string(), "Vector has no components");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: PmeError = io.into();
        assert!(matches!(e, PmeError::Io { .. }));
    }
}
