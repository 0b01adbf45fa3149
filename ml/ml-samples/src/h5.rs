//! HDF5 envelope and container backend.
//!
//! Datasets `features` (`f32`, shape `[N, ..feature_shape]`) and `targets`
//! (`i64`, shape `[N]`) live at the file root or under a named group.
//! Integer and floating-point datasets of other widths are converted on
//! read by the HDF5 library.

use std::path::Path;

use hdf5::{File, Group};
use tracing::debug;

use crate::array::ArrayData;
use crate::envelope::{FEATURES, TARGETS};
use crate::error::{Result, SamplesError};
use crate::handle::{ContainerBackend, ContainerHandle, HandleSamples, ROOT_GROUP};
use crate::samples::Samples;

/// Writes `samples` to a new HDF5 file, replacing any existing file.
///
/// With `group`, the datasets are written under that group instead of the
/// root.
///
/// # Errors
///
/// Returns an HDF5 error if the file or a dataset cannot be written.
pub fn save_hdf5(samples: &Samples, path: &Path, group: Option<&str>) -> Result<()> {
    let file = File::create(path)?;
    let target = match group {
        Some(name) => file.create_group(name)?,
        None => file.group(ROOT_GROUP)?,
    };
    write_envelope(&target, samples)?;
    drop(target);
    file.close()?;
    Ok(())
}

/// Appends `samples` as a new group of an existing HDF5 file.
///
/// # Errors
///
/// Returns an HDF5 error if the file cannot be opened or the group exists.
pub fn append_hdf5_group(samples: &Samples, path: &Path, group: &str) -> Result<()> {
    let file = File::append(path)?;
    let target = file.create_group(group)?;
    write_envelope(&target, samples)?;
    debug!(path = %path.display(), group, samples = samples.len(), "appended group");
    drop(target);
    file.close()?;
    Ok(())
}

fn write_envelope(group: &Group, samples: &Samples) -> Result<()> {
    let features = samples.features_array();
    group
        .new_dataset::<f32>()
        .shape(features.shape.clone())
        .create(FEATURES)?
        .write_raw(features.data.as_slice())?;

    let targets = samples.targets_array();
    group
        .new_dataset::<i64>()
        .shape(targets.shape.clone())
        .create(TARGETS)?
        .write_raw(targets.data.as_slice())?;
    Ok(())
}

/// Reads the envelope at the root, or under `group`.
///
/// # Errors
///
/// Returns [`SamplesError::GroupNotFound`] or [`SamplesError::MissingKey`]
/// if the group or a dataset is absent, or an HDF5 error.
pub fn load_hdf5(path: &Path, group: Option<&str>) -> Result<Samples> {
    HandleSamples::scoped(path, Hdf5Backend, |set| {
        set.group(group.unwrap_or(ROOT_GROUP))
    })
}

/// Container backend for HDF5 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Backend;

impl ContainerBackend for Hdf5Backend {
    type Handle = Hdf5Handle;

    fn open(&self, path: &Path) -> Result<Hdf5Handle> {
        let file = File::open(path)?;
        Ok(Hdf5Handle { file })
    }
}

/// An open, read-only HDF5 file.
#[derive(Debug)]
pub struct Hdf5Handle {
    file: File,
}

impl Hdf5Handle {
    fn group(&self, name: &str) -> Result<Group> {
        if name != ROOT_GROUP && !self.file.link_exists(name) {
            return Err(SamplesError::group_not_found(name));
        }
        Ok(self.file.group(name)?)
    }

    fn dataset(&self, group: &str, name: &str) -> Result<hdf5::Dataset> {
        let group = self.group(group)?;
        if !group.link_exists(name) {
            return Err(SamplesError::missing_key(name));
        }
        Ok(group.dataset(name)?)
    }
}

impl ContainerHandle for Hdf5Handle {
    fn read_f32(&self, group: &str, name: &str) -> Result<ArrayData<f32>> {
        let dataset = self.dataset(group, name)?;
        ArrayData::new(dataset.shape(), dataset.read_raw::<f32>()?)
    }

    fn read_i64(&self, group: &str, name: &str) -> Result<ArrayData<i64>> {
        let dataset = self.dataset(group, name)?;
        let data = dataset.read_raw::<i64>()?;
        // Targets may be stored as a row or column vector.
        Ok(ArrayData::vector(data))
    }

    fn group_names(&self) -> Result<Vec<String>> {
        Ok(self
            .file
            .groups()?
            .iter()
            .map(|g| g.name().trim_start_matches('/').to_string())
            .collect())
    }

    fn close(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}
