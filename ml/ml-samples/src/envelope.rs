//! The labeled on-disk structure holding `features` and `targets`.

use serde::{Deserialize, Serialize};

use crate::array::ArrayData;
use crate::error::{Result, SamplesError};

/// Envelope key for the feature array.
pub const FEATURES: &str = "features";

/// Envelope key for the target array.
pub const TARGETS: &str = "targets";

/// A complete envelope, as written by every format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Feature array, shape `[N, ..feature_shape]`.
    pub features: ArrayData<f32>,

    /// Target array, shape `[N]`.
    pub targets: ArrayData<i64>,
}

/// An array as stored under an envelope key.
///
/// Writers always produce [`ArrayBlob::Shaped`]. Readers also take plain
/// nested lists, e.g. `{"features": [[1.0, 2.0], [3.0, 4.0]], "targets": [0, 1]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArrayBlob<T> {
    /// A list of values or of equally sized lists.
    Nested(NestedList<T>),

    /// An explicit `{shape, data}` record.
    Shaped(ArrayData<T>),
}

impl<T> ArrayBlob<T> {
    /// Converts the blob into a dense array.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidEnvelope`] for a bare scalar or a
    /// ragged list, and [`SamplesError::InvalidShape`] for a shaped record
    /// whose shape disagrees with its data.
    pub fn into_array(self) -> Result<ArrayData<T>> {
        match self {
            Self::Nested(list) => list.into_array(),
            Self::Shaped(array) => {
                array.validate()?;
                Ok(array)
            }
        }
    }
}

impl<T> From<ArrayData<T>> for ArrayBlob<T> {
    fn from(array: ArrayData<T>) -> Self {
        Self::Shaped(array)
    }
}

/// A value or a list of nested lists, of any depth.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NestedList<T> {
    /// A single element.
    Leaf(T),

    /// One level of nesting.
    List(Vec<NestedList<T>>),
}

impl<T> NestedList<T> {
    /// Flattens the list row-major, inferring the shape from its first
    /// elements.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidEnvelope`] for a bare scalar or when
    /// sibling lists differ in length or depth.
    pub fn into_array(self) -> Result<ArrayData<T>> {
        let mut shape = Vec::new();
        let mut level = &self;
        while let Self::List(items) = level {
            shape.push(items.len());
            match items.first() {
                Some(first) => level = first,
                None => break,
            }
        }
        if shape.is_empty() {
            return Err(SamplesError::invalid_envelope("expected a list, found a scalar"));
        }

        let mut data = Vec::new();
        self.flatten(&shape, &mut data)?;
        Ok(ArrayData { shape, data })
    }

    fn flatten(self, shape: &[usize], out: &mut Vec<T>) -> Result<()> {
        match (self, shape.split_first()) {
            (Self::Leaf(value), None) => {
                out.push(value);
                Ok(())
            }
            (Self::List(items), Some((&len, rest))) if items.len() == len => {
                for item in items {
                    item.flatten(rest, out)?;
                }
                Ok(())
            }
            _ => Err(SamplesError::invalid_envelope(format!(
                "ragged nested list, expected shape {shape:?}"
            ))),
        }
    }
}

/// An envelope as read from disk, before required keys are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnvelope {
    /// Feature array, if present.
    #[serde(default)]
    pub features: Option<ArrayBlob<f32>>,

    /// Target array, if present.
    #[serde(default)]
    pub targets: Option<ArrayBlob<i64>>,
}

impl RawEnvelope {
    /// Checks that both keys are present.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::MissingKey`] naming the first absent key, or
    /// an error from [`ArrayBlob::into_array`].
    pub fn into_envelope(self) -> Result<Envelope> {
        let features = self
            .features
            .ok_or_else(|| SamplesError::missing_key(FEATURES))?
            .into_array()?;
        let targets = self
            .targets
            .ok_or_else(|| SamplesError::missing_key(TARGETS))?
            .into_array()?;
        Ok(Envelope { features, targets })
    }
}
