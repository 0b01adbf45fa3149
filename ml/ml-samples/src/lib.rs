//! Feature/target sample sets for training pipelines.
//!
//! # Sample Sets
//!
//! - [`Samples`] - Immutable features plus integer targets
//! - [`Batches`] / [`RawBatches`] - Lazy, restartable batch iterators
//! - [`ArrayData`] - Shaped array blob stored in envelopes
//!
//! # Persistence
//!
//! - [`Format`] - Pickle, HDF5 (feature `hdf5`) or MAT-file (feature `mat`)
//! - [`Samples::save`] / [`load`] - Write and read `{features, targets}`
//!   envelopes
//!
//! # Handle-backed Sets
//!
//! - [`HandleSamples`] - Materializes groups of an open container on demand
//! - [`ContainerBackend`] / [`ContainerHandle`] - Container seam
//! - [`MemoryBackend`] - In-memory containers
//!
//! # Example
//!
//! ```
//! use ml_samples::Samples;
//!
//! let samples = Samples::from_rows(
//!     vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
//!     vec![0, 1, 0],
//! )
//! .unwrap();
//!
//! let shuffled = samples.shuffle_seeded(42);
//! assert_eq!(shuffled.targets_set(), samples.targets_set());
//!
//! for batch in shuffled.batches(2).unwrap() {
//!     assert!(batch.len() <= 2);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod array;
mod envelope;
mod error;
mod format;
#[cfg(feature = "hdf5")]
mod h5;
mod handle;
#[cfg(feature = "mat")]
mod mat;
mod pickle;
mod samples;

// Re-export sample types
pub use samples::{Batches, RawBatches, Samples};

// Re-export envelope types
pub use array::ArrayData;
pub use envelope::{ArrayBlob, Envelope, FEATURES, NestedList, RawEnvelope, TARGETS};
pub use format::{Format, load, load_auto};

// Re-export handle types
pub use handle::{
    ContainerBackend, ContainerHandle, HandleSamples, HandleState, MemoryBackend, MemoryHandle,
    ROOT_GROUP,
};

#[cfg(feature = "hdf5")]
pub use h5::{Hdf5Backend, Hdf5Handle, append_hdf5_group};

// Re-export error types
pub use error::{Result, SamplesError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ArrayData, ContainerBackend, ContainerHandle, Format, HandleSamples, MemoryBackend,
        Samples, SamplesError, load, load_auto,
    };
}
