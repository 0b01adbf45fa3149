//! Error types for ml-samples crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in ml-samples operations.
#[derive(Debug, Error)]
pub enum SamplesError {
    /// Feature and target counts disagree.
    #[error("length mismatch: {features} features vs {targets} targets")]
    LengthMismatch {
        /// Number of feature rows.
        features: usize,
        /// Number of targets.
        targets: usize,
    },

    /// Per-sample feature shapes are incompatible.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected per-sample shape.
        expected: Vec<usize>,
        /// Actual per-sample shape.
        actual: Vec<usize>,
    },

    /// Array shape does not describe its data.
    #[error("invalid shape {shape:?} for {len} elements")]
    InvalidShape {
        /// Declared shape.
        shape: Vec<usize>,
        /// Number of stored elements.
        len: usize,
    },

    /// Batch size of zero.
    #[error("invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    /// Range outside the sample set.
    #[error("index range {start}..{end} out of bounds for {len} samples")]
    IndexOutOfRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Sample count.
        len: usize,
    },

    /// A caller-supplied feature transform failed.
    #[error("transform failed at sample {index}: {reason}")]
    Transform {
        /// Index of the failing sample.
        index: usize,
        /// Reason reported by the transform.
        reason: String,
    },

    /// Envelope lacks a required key.
    #[error("missing key in envelope: {0}")]
    MissingKey(String),

    /// Named group not present in a container.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// Format support was not compiled in.
    #[error("{format} support is not available (enable the `{feature}` feature)")]
    FormatUnavailable {
        /// Format name.
        format: &'static str,
        /// Cargo feature providing it.
        feature: &'static str,
    },

    /// File extension not recognized.
    #[error("unknown envelope format: .{0}")]
    UnknownFormat(String),

    /// Read attempted on a closed handle.
    #[error("container is closed: {}", path.display())]
    Closed {
        /// Path of the container.
        path: PathBuf,
    },

    /// Envelope content is malformed.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SamplesError {
    /// Creates a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(features: usize, targets: usize) -> Self {
        Self::LengthMismatch { features, targets }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates an invalid shape error.
    #[must_use]
    pub fn invalid_shape(shape: &[usize], len: usize) -> Self {
        Self::InvalidShape {
            shape: shape.to_vec(),
            len,
        }
    }

    /// Creates a transform error.
    #[must_use]
    pub fn transform(index: usize, reason: impl Into<String>) -> Self {
        Self::Transform {
            index,
            reason: reason.into(),
        }
    }

    /// Creates a missing key error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// Creates a group not found error.
    #[must_use]
    pub fn group_not_found(name: impl Into<String>) -> Self {
        Self::GroupNotFound(name.into())
    }

    /// Creates a closed container error.
    #[must_use]
    pub fn closed(path: impl Into<PathBuf>) -> Self {
        Self::Closed { path: path.into() }
    }

    /// Creates an invalid envelope error.
    #[must_use]
    pub fn invalid_envelope(reason: impl Into<String>) -> Self {
        Self::InvalidEnvelope(reason.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization(reason.into())
    }

    /// Returns `true` for errors caused by missing compile-time support.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::FormatUnavailable { .. })
    }
}

impl From<serde_pickle::Error> for SamplesError {
    fn from(err: serde_pickle::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for SamplesError {
    fn from(err: hdf5::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for ml-samples operations.
pub type Result<T> = std::result::Result<T, SamplesError>;
