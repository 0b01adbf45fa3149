//! Pickle envelope.
//!
//! The file holds a single dict:
//!
//! ```text
//! {
//!     "features": {"shape": [N, d0, d1, ...], "data": [f0, f1, ...]},
//!     "targets":  {"shape": [N],              "data": [t0, t1, ...]},
//! }
//! ```
//!
//! Arrays are plain lists, so Python can read the file with `pickle.load`
//! and no numpy dependency.
//!
//! Loading also accepts each key as a plain nested list, one entry per
//! sample: `{"features": [[1.0, 2.0], [3.0, 4.0]], "targets": [0, 1]}`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_pickle::{DeOptions, SerOptions};

use crate::envelope::{Envelope, RawEnvelope};
use crate::error::Result;
use crate::samples::Samples;

/// Writes `samples` as a pickle envelope, replacing any existing file.
///
/// # Errors
///
/// Returns an IO or serialization error.
pub fn save_pickle(samples: &Samples, path: &Path) -> Result<()> {
    let envelope = Envelope::from(samples.clone());
    let mut writer = BufWriter::new(File::create(path)?);
    serde_pickle::to_writer(&mut writer, &envelope, SerOptions::new())?;
    writer.flush()?;
    Ok(())
}

/// Reads a pickle envelope.
///
/// # Errors
///
/// Returns [`SamplesError::MissingKey`](crate::SamplesError::MissingKey) if
/// `features` or `targets` is absent, or an IO/serialization error.
pub fn load_pickle(path: &Path) -> Result<Samples> {
    let reader = BufReader::new(File::open(path)?);
    let raw: RawEnvelope = serde_pickle::from_reader(reader, DeOptions::new())?;
    Samples::try_from(raw.into_envelope()?)
}
