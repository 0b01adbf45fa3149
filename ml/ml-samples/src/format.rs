//! Envelope format selection and dispatch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SamplesError};
use crate::samples::Samples;

/// Supported envelope formats.
///
/// Every variant exists regardless of build configuration; formats whose
/// support was not compiled in fail at call time with
/// [`SamplesError::FormatUnavailable`].
///
/// # Example
///
/// ```
/// use ml_samples::Format;
///
/// assert_eq!(Format::from_extension("pkl"), Some(Format::Pickle));
/// assert_eq!(Format::from_extension("H5"), Some(Format::Hdf5));
/// assert!(Format::Pickle.is_available());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Format {
    /// Python pickle of a `{features, targets}` dict.
    #[default]
    Pickle,

    /// HDF5 file with `features`/`targets` datasets (requires `hdf5`).
    Hdf5,

    /// MATLAB Level 5 MAT-file (requires `mat`).
    Mat,
}

impl Format {
    /// All formats.
    pub const ALL: [Self; 3] = [Self::Pickle, Self::Hdf5, Self::Mat];

    /// Determines format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pkl" | "pickle" | "p" => Some(Self::Pickle),
            "h5" | "hdf5" | "hdf" => Some(Self::Hdf5),
            "mat" => Some(Self::Mat),
            _ => None,
        }
    }

    /// Determines format from a file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Like [`from_path`](Self::from_path), but returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::UnknownFormat`] for unrecognized extensions.
    pub fn detect(path: &Path) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| {
            SamplesError::UnknownFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            )
        })
    }

    /// Returns the canonical file extension.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pickle => "pkl",
            Self::Hdf5 => "h5",
            Self::Mat => "mat",
        }
    }

    /// Returns the format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pickle => "pickle",
            Self::Hdf5 => "hdf5",
            Self::Mat => "mat",
        }
    }

    /// Returns the cargo feature providing this format, if any.
    #[must_use]
    pub const fn feature(&self) -> Option<&'static str> {
        match self {
            Self::Pickle => None,
            Self::Hdf5 => Some("hdf5"),
            Self::Mat => Some("mat"),
        }
    }

    /// Returns `true` if support for this format was compiled in.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        match self {
            Self::Pickle => true,
            Self::Hdf5 => cfg!(feature = "hdf5"),
            Self::Mat => cfg!(feature = "mat"),
        }
    }

    /// Fails unless support for this format was compiled in.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::FormatUnavailable`].
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            return Ok(());
        }
        Err(self.unavailable())
    }

    fn unavailable(self) -> SamplesError {
        SamplesError::FormatUnavailable {
            format: self.name(),
            feature: self.feature().unwrap_or("default"),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Writes `samples` to `path` in `format`.
pub(crate) fn save(samples: &Samples, path: &Path, format: Format) -> Result<()> {
    format.ensure_available()?;
    debug!(
        path = %path.display(),
        %format,
        samples = samples.len(),
        "saving samples"
    );

    match format {
        Format::Pickle => crate::pickle::save_pickle(samples, path),
        Format::Hdf5 => save_hdf5(samples, path),
        Format::Mat => save_mat(samples, path),
    }
}

/// Loads a sample set from `path` in `format`.
///
/// `group` selects a sub-container and is only meaningful for
/// [`Format::Hdf5`]; other formats reject it.
///
/// # Errors
///
/// Returns [`SamplesError::FormatUnavailable`] if the format was not
/// compiled in, [`SamplesError::MissingKey`] if the envelope lacks
/// `features` or `targets`, or an IO/serialization error.
///
/// # Example
///
/// ```no_run
/// use ml_samples::{Format, load};
///
/// let train = load("train.pkl", Format::Pickle, None)?;
/// println!("{} samples", train.len());
/// # Ok::<(), ml_samples::SamplesError>(())
/// ```
pub fn load(path: impl AsRef<Path>, format: Format, group: Option<&str>) -> Result<Samples> {
    let path = path.as_ref();
    format.ensure_available()?;

    if group.is_some() && format != Format::Hdf5 {
        return Err(SamplesError::invalid_envelope(format!(
            "{format} envelopes have no groups"
        )));
    }

    let samples = match format {
        Format::Pickle => crate::pickle::load_pickle(path)?,
        Format::Hdf5 => load_hdf5(path, group)?,
        Format::Mat => load_mat(path)?,
    };

    debug!(
        path = %path.display(),
        %format,
        samples = samples.len(),
        "loaded samples"
    );
    Ok(samples)
}

/// Loads a sample set, choosing the format from the file extension.
///
/// # Errors
///
/// Returns [`SamplesError::UnknownFormat`] for unrecognized extensions,
/// plus everything [`load`] can return.
pub fn load_auto(path: impl AsRef<Path>) -> Result<Samples> {
    let path = path.as_ref();
    load(path, Format::detect(path)?, None)
}

#[cfg(feature = "hdf5")]
fn save_hdf5(samples: &Samples, path: &Path) -> Result<()> {
    crate::h5::save_hdf5(samples, path, None)
}

#[cfg(not(feature = "hdf5"))]
fn save_hdf5(_samples: &Samples, _path: &Path) -> Result<()> {
    Err(Format::Hdf5.unavailable())
}

#[cfg(feature = "hdf5")]
fn load_hdf5(path: &Path, group: Option<&str>) -> Result<Samples> {
    crate::h5::load_hdf5(path, group)
}

#[cfg(not(feature = "hdf5"))]
fn load_hdf5(_path: &Path, _group: Option<&str>) -> Result<Samples> {
    Err(Format::Hdf5.unavailable())
}

#[cfg(feature = "mat")]
fn save_mat(samples: &Samples, path: &Path) -> Result<()> {
    crate::mat::save_mat(samples, path)
}

#[cfg(not(feature = "mat"))]
fn save_mat(_samples: &Samples, _path: &Path) -> Result<()> {
    Err(Format::Mat.unavailable())
}

#[cfg(feature = "mat")]
fn load_mat(path: &Path) -> Result<Samples> {
    crate::mat::load_mat(path)
}

#[cfg(not(feature = "mat"))]
fn load_mat(_path: &Path) -> Result<Samples> {
    Err(Format::Mat.unavailable())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_extension("pkl"), Some(Format::Pickle));
        assert_eq!(Format::from_extension("pickle"), Some(Format::Pickle));
        assert_eq!(Format::from_extension("p"), Some(Format::Pickle));
        assert_eq!(Format::from_extension("h5"), Some(Format::Hdf5));
        assert_eq!(Format::from_extension("HDF5"), Some(Format::Hdf5));
        assert_eq!(Format::from_extension("mat"), Some(Format::Mat));
        assert_eq!(Format::from_extension("csv"), None);
    }

    #[test]
    fn format_from_path() {
        assert_eq!(
            Format::from_path(Path::new("/data/train.p")),
            Some(Format::Pickle)
        );
        assert_eq!(Format::from_path(Path::new("train")), None);
    }

    #[test]
    fn format_detect_unknown() {
        let err = Format::detect(Path::new("train.csv")).unwrap_err();
        assert!(matches!(err, SamplesError::UnknownFormat(ref e) if e == "csv"));

        let err = Format::detect(Path::new("train")).unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn format_extension_roundtrip() {
        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn format_display() {
        assert_eq!(format!("{}", Format::Pickle), "pickle");
        assert_eq!(format!("{}", Format::Hdf5), "hdf5");
        assert_eq!(format!("{}", Format::Mat), "mat");
    }

    #[test]
    fn format_availability_matches_features() {
        assert!(Format::Pickle.is_available());
        assert_eq!(Format::Hdf5.is_available(), cfg!(feature = "hdf5"));
        assert_eq!(Format::Mat.is_available(), cfg!(feature = "mat"));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn format_unavailable_is_configuration_error() {
        let samples = Samples::empty(vec![1]);
        let err = save(&samples, Path::new("unused.h5"), Format::Hdf5).unwrap_err();
        assert!(err.is_configuration());

        let err = load("unused.h5", Format::Hdf5, None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn load_rejects_group_outside_hdf5() {
        let err = load("unused.pkl", Format::Pickle, Some("train")).unwrap_err();
        assert!(matches!(err, SamplesError::InvalidEnvelope(_)));
    }

    #[test]
    fn format_serialization() {
        let json = serde_json::to_string(&Format::Mat).unwrap();
        let parsed: Format = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Format::Mat);
    }
}
