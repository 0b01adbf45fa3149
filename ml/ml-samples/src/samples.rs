//! The immutable feature/target sample set.

use std::collections::HashSet;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::array::ArrayData;
use crate::envelope::{Envelope, RawEnvelope};
use crate::error::{Result, SamplesError};
use crate::format::{self, Format};

/// A set of feature/target pairs.
///
/// Features are stored flattened in row-major order; every sample has the
/// same `feature_shape`. Targets are integer labels, one per sample.
///
/// `Samples` is a value type: shuffling, appending, slicing, batching and
/// mapping all return new sets and leave `self` untouched.
///
/// # Example
///
/// ```
/// use ml_samples::Samples;
///
/// let samples = Samples::from_rows(
///     vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
///     vec![0, 1, 0],
/// )
/// .unwrap();
///
/// assert_eq!(samples.len(), 3);
/// assert_eq!(samples.feature(1), &[3.0, 4.0]);
/// assert_eq!(samples.targets_set().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope", into = "Envelope")]
pub struct Samples {
    features: Vec<f32>,
    feature_shape: Vec<usize>,
    targets: Vec<i64>,
}

impl Samples {
    /// Creates a sample set from flattened features.
    ///
    /// An empty `feature_shape` is treated as a scalar feature, shape `[1]`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidShape`] if `features` is not a whole
    /// number of samples, or [`SamplesError::LengthMismatch`] if the sample
    /// count differs from the target count.
    pub fn new(features: Vec<f32>, feature_shape: Vec<usize>, targets: Vec<i64>) -> Result<Self> {
        let feature_shape = if feature_shape.is_empty() {
            vec![1]
        } else {
            feature_shape
        };
        let feature_len: usize = feature_shape.iter().product();

        let rows = if feature_len == 0 {
            if !features.is_empty() {
                return Err(SamplesError::invalid_shape(&feature_shape, features.len()));
            }
            targets.len()
        } else {
            if features.len() % feature_len != 0 {
                return Err(SamplesError::invalid_shape(&feature_shape, features.len()));
            }
            features.len() / feature_len
        };

        if rows != targets.len() {
            return Err(SamplesError::length_mismatch(rows, targets.len()));
        }

        Ok(Self {
            features,
            feature_shape,
            targets,
        })
    }

    /// Creates a sample set from feature rows of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::ShapeMismatch`] if rows differ in length, or
    /// [`SamplesError::LengthMismatch`] if the row count differs from the
    /// target count.
    pub fn from_rows(rows: Vec<Vec<f32>>, targets: Vec<i64>) -> Result<Self> {
        if rows.len() != targets.len() {
            return Err(SamplesError::length_mismatch(rows.len(), targets.len()));
        }

        let width = rows.first().map_or(0, Vec::len);
        let mut features = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(SamplesError::shape_mismatch(&[width], &[row.len()]));
            }
            features.extend(row);
        }

        Self::new(features, vec![width], targets)
    }

    /// Creates a sample set from envelope arrays.
    ///
    /// `features` must have shape `[N, ..feature_shape]`; `targets` is
    /// flattened and must hold `N` labels.
    ///
    /// # Errors
    ///
    /// Returns an error if either array is malformed or the counts differ.
    pub fn from_arrays(features: ArrayData<f32>, targets: ArrayData<i64>) -> Result<Self> {
        features.validate()?;
        targets.validate()?;

        let rows = features.rows();
        if rows != targets.len() {
            return Err(SamplesError::length_mismatch(rows, targets.len()));
        }

        let feature_shape = features.row_shape().to_vec();
        Self::new(features.data, feature_shape, targets.data)
    }

    /// Creates an empty sample set with the given per-sample shape.
    #[must_use]
    pub fn empty(feature_shape: Vec<usize>) -> Self {
        let feature_shape = if feature_shape.is_empty() {
            vec![1]
        } else {
            feature_shape
        };
        Self {
            features: Vec::new(),
            feature_shape,
            targets: Vec::new(),
        }
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the shape of one feature.
    #[must_use]
    pub fn feature_shape(&self) -> &[usize] {
        &self.feature_shape
    }

    /// Returns the number of values in one feature.
    #[must_use]
    pub fn feature_len(&self) -> usize {
        self.feature_shape.iter().product()
    }

    /// Returns all features, flattened row-major.
    #[must_use]
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Returns all targets.
    #[must_use]
    pub fn targets(&self) -> &[i64] {
        &self.targets
    }

    /// Returns the feature of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn feature(&self, index: usize) -> &[f32] {
        let width = self.feature_len();
        &self.features[index * width..(index + 1) * width]
    }

    /// Returns the target of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn target(&self, index: usize) -> i64 {
        self.targets[index]
    }

    /// Iterates `(feature, target)` pairs in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&[f32], i64)> + '_ {
        (0..self.len()).map(|i| (self.feature(i), self.targets[i]))
    }

    /// Returns the distinct target values.
    #[must_use]
    pub fn targets_set(&self) -> HashSet<i64> {
        self.targets.iter().copied().collect()
    }

    /// Returns a copy with features and targets permuted together.
    ///
    /// The permutation is drawn from entropy; use
    /// [`shuffle_seeded`](Self::shuffle_seeded) for reproducible order.
    #[must_use]
    pub fn shuffle(&self) -> Self {
        self.shuffle_with(None)
    }

    /// Returns a copy shuffled with a fixed seed.
    #[must_use]
    pub fn shuffle_seeded(&self, seed: u64) -> Self {
        self.shuffle_with(Some(seed))
    }

    fn shuffle_with(&self, seed: Option<u64>) -> Self {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        indices.shuffle(&mut rng);
        self.gather(&indices)
    }

    /// Collects the samples at `indices`, in that order.
    fn gather(&self, indices: &[usize]) -> Self {
        let mut features = Vec::with_capacity(indices.len() * self.feature_len());
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            features.extend_from_slice(self.feature(i));
            targets.push(self.targets[i]);
        }
        Self {
            features,
            feature_shape: self.feature_shape.clone(),
            targets,
        }
    }

    /// Returns `self` followed by `other`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::ShapeMismatch`] if the per-sample feature
    /// shapes differ.
    pub fn append(&self, other: &Self) -> Result<Self> {
        if self.feature_shape != other.feature_shape {
            return Err(SamplesError::shape_mismatch(
                &self.feature_shape,
                &other.feature_shape,
            ));
        }

        let mut features = Vec::with_capacity(self.features.len() + other.features.len());
        features.extend_from_slice(&self.features);
        features.extend_from_slice(&other.features);

        let mut targets = Vec::with_capacity(self.len() + other.len());
        targets.extend_from_slice(&self.targets);
        targets.extend_from_slice(&other.targets);

        Ok(Self {
            features,
            feature_shape: self.feature_shape.clone(),
            targets,
        })
    }

    /// Returns the samples in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::IndexOutOfRange`] if the range is reversed or
    /// extends past the end.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(SamplesError::IndexOutOfRange {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        Ok(self.slice_unchecked(range))
    }

    fn slice_unchecked(&self, range: Range<usize>) -> Self {
        let width = self.feature_len();
        Self {
            features: self.features[range.start * width..range.end * width].to_vec(),
            feature_shape: self.feature_shape.clone(),
            targets: self.targets[range].to_vec(),
        }
    }

    /// Returns a lazy iterator of consecutive batches.
    ///
    /// Every batch but possibly the last holds exactly `batch_size` samples.
    /// The iterator is `Clone`, so a pass can be restarted at any point.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidBatchSize`] if `batch_size` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use ml_samples::Samples;
    ///
    /// let samples = Samples::from_rows(
    ///     vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
    ///     vec![0, 1, 0],
    /// )
    /// .unwrap();
    ///
    /// let sizes: Vec<usize> = samples.batches(2).unwrap().map(|b| b.len()).collect();
    /// assert_eq!(sizes, vec![2, 1]);
    /// ```
    pub fn batches(&self, batch_size: usize) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(SamplesError::InvalidBatchSize(batch_size));
        }
        Ok(Batches {
            samples: self,
            batch_size,
            start: 0,
        })
    }

    /// Like [`batches`](Self::batches), but yields borrowed
    /// `(features, targets)` slices instead of new sets.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidBatchSize`] if `batch_size` is zero.
    pub fn raw_batches(&self, batch_size: usize) -> Result<RawBatches<'_>> {
        if batch_size == 0 {
            return Err(SamplesError::InvalidBatchSize(batch_size));
        }
        Ok(RawBatches {
            samples: self,
            batch_size,
            start: 0,
        })
    }

    /// Applies `f` to every feature, keeping the targets.
    ///
    /// If every output keeps the feature length, the feature shape is
    /// preserved; otherwise all outputs must share one length and the new
    /// shape is one-dimensional.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::Transform`] for the first failing feature, or
    /// [`SamplesError::ShapeMismatch`] if output lengths differ. No partial
    /// result is returned.
    pub fn map<F, E>(&self, f: F) -> Result<Self>
    where
        F: FnMut(&[f32]) -> std::result::Result<Vec<f32>, E>,
        E: Display,
    {
        let (features, width) = self.map_features(f)?;
        let feature_shape = match width {
            Some(w) if w != self.feature_len() => vec![w],
            _ => self.feature_shape.clone(),
        };
        Self::new(features, feature_shape, self.targets.clone())
    }

    /// Applies `f` to every feature and reshapes the outputs to `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::Transform`] for the first failing feature, or
    /// [`SamplesError::ShapeMismatch`] if an output does not hold
    /// `prod(shape)` values.
    pub fn map_with_shape<F, E>(&self, shape: Vec<usize>, f: F) -> Result<Self>
    where
        F: FnMut(&[f32]) -> std::result::Result<Vec<f32>, E>,
        E: Display,
    {
        let (features, width) = self.map_features(f)?;
        let expected: usize = shape.iter().product();
        if let Some(w) = width {
            if w != expected {
                return Err(SamplesError::shape_mismatch(&shape, &[w]));
            }
        }
        Self::new(features, shape, self.targets.clone())
    }

    /// Runs `f` over all features, checking that outputs share one length.
    fn map_features<F, E>(&self, mut f: F) -> Result<(Vec<f32>, Option<usize>)>
    where
        F: FnMut(&[f32]) -> std::result::Result<Vec<f32>, E>,
        E: Display,
    {
        let mut features = Vec::with_capacity(self.features.len());
        let mut width = None;

        for index in 0..self.len() {
            let out = f(self.feature(index)).map_err(|e| SamplesError::transform(index, e.to_string()))?;
            match width {
                None => width = Some(out.len()),
                Some(w) if w != out.len() => {
                    return Err(SamplesError::shape_mismatch(&[w], &[out.len()]));
                }
                Some(_) => {}
            }
            features.extend(out);
        }

        Ok((features, width))
    }

    /// Returns the features as an envelope array of shape `[N, ..feature_shape]`.
    #[must_use]
    pub fn features_array(&self) -> ArrayData<f32> {
        let mut shape = Vec::with_capacity(self.feature_shape.len() + 1);
        shape.push(self.len());
        shape.extend_from_slice(&self.feature_shape);
        ArrayData {
            shape,
            data: self.features.clone(),
        }
    }

    /// Returns the targets as an envelope array of shape `[N]`.
    #[must_use]
    pub fn targets_array(&self) -> ArrayData<i64> {
        ArrayData::vector(self.targets.clone())
    }

    /// Writes the set to `path` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::FormatUnavailable`] if the format was not
    /// compiled in, or an IO/serialization error.
    pub fn save(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        format::save(self, path.as_ref(), format)
    }

    /// Writes the set to `path`, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::UnknownFormat`] for unrecognized extensions,
    /// plus everything [`save`](Self::save) can return.
    pub fn save_auto(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save(path, Format::detect(path)?)
    }
}

/// Iterator over consecutive [`Samples`] batches.
///
/// Created by [`Samples::batches`].
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    samples: &'a Samples,
    batch_size: usize,
    start: usize,
}

impl Iterator for Batches<'_> {
    type Item = Samples;

    fn next(&mut self) -> Option<Self::Item> {
        let range = next_range(&mut self.start, self.batch_size, self.samples.len())?;
        Some(self.samples.slice_unchecked(range))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = remaining(self.start, self.batch_size, self.samples.len());
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// Iterator over consecutive borrowed `(features, targets)` batches.
///
/// Created by [`Samples::raw_batches`].
#[derive(Debug, Clone)]
pub struct RawBatches<'a> {
    samples: &'a Samples,
    batch_size: usize,
    start: usize,
}

impl<'a> Iterator for RawBatches<'a> {
    type Item = (&'a [f32], &'a [i64]);

    fn next(&mut self) -> Option<Self::Item> {
        let samples = self.samples;
        let range = next_range(&mut self.start, self.batch_size, samples.len())?;
        let width = samples.feature_len();
        Some((
            &samples.features[range.start * width..range.end * width],
            &samples.targets[range],
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = remaining(self.start, self.batch_size, self.samples.len());
        (n, Some(n))
    }
}

impl ExactSizeIterator for RawBatches<'_> {}

fn next_range(start: &mut usize, batch_size: usize, len: usize) -> Option<Range<usize>> {
    if *start >= len {
        return None;
    }
    let end = (*start + batch_size).min(len);
    let range = *start..end;
    *start = end;
    Some(range)
}

fn remaining(start: usize, batch_size: usize, len: usize) -> usize {
    len.saturating_sub(start).div_ceil(batch_size)
}

impl From<Samples> for Envelope {
    fn from(samples: Samples) -> Self {
        Self {
            features: samples.features_array(),
            targets: samples.targets_array(),
        }
    }
}

impl TryFrom<Envelope> for Samples {
    type Error = SamplesError;

    fn try_from(envelope: Envelope) -> Result<Self> {
        Self::from_arrays(envelope.features, envelope.targets)
    }
}

impl TryFrom<RawEnvelope> for Samples {
    type Error = SamplesError;

    fn try_from(raw: RawEnvelope) -> Result<Self> {
        Self::try_from(raw.into_envelope()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Samples {
        Samples::from_rows(
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            vec![0, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn samples_new_validates_counts() {
        assert!(Samples::new(vec![0.0; 6], vec![2], vec![0, 1, 2]).is_ok());

        let err = Samples::new(vec![0.0; 6], vec![2], vec![0, 1]).unwrap_err();
        assert!(matches!(
            err,
            SamplesError::LengthMismatch {
                features: 3,
                targets: 2
            }
        ));

        let err = Samples::new(vec![0.0; 5], vec![2], vec![0, 1]).unwrap_err();
        assert!(matches!(err, SamplesError::InvalidShape { .. }));
    }

    #[test]
    fn samples_new_scalar_shape() {
        let samples = Samples::new(vec![1.0, 2.0], vec![], vec![3, 4]).unwrap();
        assert_eq!(samples.feature_shape(), &[1]);
        assert_eq!(samples.feature(1), &[2.0]);
    }

    #[test]
    fn samples_zero_width_features() {
        let samples = Samples::new(vec![], vec![0], vec![1, 2]).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.feature(0).is_empty());
    }

    #[test]
    fn samples_from_rows_rejects_ragged() {
        let err = Samples::from_rows(vec![vec![1.0], vec![1.0, 2.0]], vec![0, 1]).unwrap_err();
        assert!(matches!(err, SamplesError::ShapeMismatch { .. }));
    }

    #[test]
    fn samples_from_arrays() {
        let features = ArrayData::new(vec![2, 2, 2], vec![0.0; 8]).unwrap();
        let targets = ArrayData::vector(vec![1, 2]);
        let samples = Samples::from_arrays(features, targets).unwrap();
        assert_eq!(samples.feature_shape(), &[2, 2]);
        assert_eq!(samples.feature_len(), 4);
    }

    #[test]
    fn samples_from_arrays_count_mismatch() {
        let features = ArrayData::new(vec![2, 1], vec![0.0; 2]).unwrap();
        let targets = ArrayData::vector(vec![1, 2, 3]);
        assert!(Samples::from_arrays(features, targets).is_err());
    }

    #[test]
    fn samples_targets_set() {
        let set = scenario().targets_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&0));
        assert!(set.contains(&1));
    }

    #[test]
    fn samples_shuffle_keeps_pairs() {
        let samples = Samples::from_rows(
            (0..50).map(|i| vec![i as f32, -(i as f32)]).collect(),
            (0..50).collect(),
        )
        .unwrap();

        let shuffled = samples.shuffle();
        assert_eq!(shuffled.len(), samples.len());
        assert_eq!(shuffled.targets_set(), samples.targets_set());
        for (feature, target) in shuffled.iter() {
            assert_eq!(feature, &[target as f32, -(target as f32)]);
        }
    }

    #[test]
    fn samples_shuffle_seeded_reproducible() {
        let samples = Samples::from_rows((0..20).map(|i| vec![i as f32]).collect(), (0..20).collect())
            .unwrap();
        assert_eq!(samples.shuffle_seeded(42), samples.shuffle_seeded(42));
        assert_ne!(samples.shuffle_seeded(42).targets(), samples.targets());
    }

    #[test]
    fn samples_shuffle_leaves_original() {
        let samples = scenario();
        let before = samples.clone();
        let _ = samples.shuffle_seeded(7);
        assert_eq!(samples, before);
    }

    #[test]
    fn samples_append() {
        let a = scenario();
        let b = Samples::from_rows(vec![vec![7.0, 8.0]], vec![2]).unwrap();
        let joined = a.append(&b).unwrap();

        assert_eq!(joined.len(), 4);
        assert_eq!(joined.feature(3), &[7.0, 8.0]);
        assert_eq!(joined.targets(), &[0, 1, 0, 2]);
        assert_eq!(joined.slice(0..3).unwrap(), a);
        assert_eq!(joined.slice(3..4).unwrap(), b);
    }

    #[test]
    fn samples_append_shape_mismatch() {
        let a = scenario();
        let b = Samples::from_rows(vec![vec![7.0, 8.0, 9.0]], vec![2]).unwrap();
        assert!(matches!(
            a.append(&b),
            Err(SamplesError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn samples_append_empty() {
        let a = scenario();
        let joined = a.append(&Samples::empty(vec![2])).unwrap();
        assert_eq!(joined, a);
    }

    #[test]
    fn samples_slice_out_of_range() {
        let samples = scenario();
        assert!(samples.slice(0..4).is_err());
        assert!(samples.slice(3..3).unwrap().is_empty());
    }

    #[test]
    fn samples_batches_scenario() {
        let samples = scenario();
        let batches: Vec<Samples> = samples.batches(2).unwrap().collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].features(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(batches[0].targets(), &[0, 1]);
        assert_eq!(batches[1].features(), &[5.0, 6.0]);
        assert_eq!(batches[1].targets(), &[0]);
    }

    #[test]
    fn samples_batches_restartable() {
        let samples = scenario();
        let mut batches = samples.batches(2).unwrap();
        let restart = batches.clone();

        assert_eq!(batches.len(), 2);
        let first = batches.next();
        assert_eq!(batches.len(), 1);
        assert_eq!(restart.count(), 2);
        assert_eq!(first.map(|b| b.len()), Some(2));
    }

    #[test]
    fn samples_batches_zero_size() {
        assert!(matches!(
            scenario().batches(0),
            Err(SamplesError::InvalidBatchSize(0))
        ));
        assert!(scenario().raw_batches(0).is_err());
    }

    #[test]
    fn samples_batches_empty_set() {
        let samples = Samples::empty(vec![3]);
        assert_eq!(samples.batches(4).unwrap().count(), 0);
    }

    #[test]
    fn samples_raw_batches() {
        let samples = scenario();
        let raw: Vec<(&[f32], &[i64])> = samples.raw_batches(2).unwrap().collect();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0], (&[1.0, 2.0, 3.0, 4.0][..], &[0, 1][..]));
        assert_eq!(raw[1], (&[5.0, 6.0][..], &[0][..]));
    }

    #[test]
    fn samples_map_identity() {
        let samples = scenario();
        let mapped = samples
            .map(|f| Ok::<_, std::convert::Infallible>(f.to_vec()))
            .unwrap();
        assert_eq!(mapped, samples);
    }

    #[test]
    fn samples_map_keeps_shape() {
        let samples = Samples::new(vec![1.0; 8], vec![2, 2], vec![0, 1]).unwrap();
        let mapped = samples
            .map(|f| Ok::<_, String>(f.iter().map(|v| v * 2.0).collect()))
            .unwrap();
        assert_eq!(mapped.feature_shape(), &[2, 2]);
        assert_eq!(mapped.features(), &[2.0; 8]);
        assert_eq!(mapped.targets(), samples.targets());
    }

    #[test]
    fn samples_map_changes_width() {
        let mapped = scenario()
            .map(|f| Ok::<_, String>(vec![f.iter().sum()]))
            .unwrap();
        assert_eq!(mapped.feature_shape(), &[1]);
        assert_eq!(mapped.features(), &[3.0, 7.0, 11.0]);
    }

    #[test]
    fn samples_map_error_has_index() {
        let err = scenario()
            .map(|f| {
                if f[0] > 4.0 {
                    Err("too bright")
                } else {
                    Ok(f.to_vec())
                }
            })
            .unwrap_err();
        assert!(matches!(err, SamplesError::Transform { index: 2, .. }));
    }

    #[test]
    fn samples_map_ragged_output() {
        let err = scenario()
            .map(|f| Ok::<_, String>(vec![0.0; f[0] as usize]))
            .unwrap_err();
        assert!(matches!(err, SamplesError::ShapeMismatch { .. }));
    }

    #[test]
    fn samples_map_with_shape() {
        let samples = Samples::new(vec![1.0; 8], vec![4], vec![0, 1]).unwrap();
        let mapped = samples
            .map_with_shape(vec![2, 2], |f| Ok::<_, String>(f.to_vec()))
            .unwrap();
        assert_eq!(mapped.feature_shape(), &[2, 2]);

        let err = samples
            .map_with_shape(vec![3], |f| Ok::<_, String>(f.to_vec()))
            .unwrap_err();
        assert!(matches!(err, SamplesError::ShapeMismatch { .. }));
    }

    #[test]
    fn samples_arrays() {
        let samples = scenario();
        assert_eq!(samples.features_array().shape, vec![3, 2]);
        assert_eq!(samples.targets_array().shape, vec![3]);
    }

    #[test]
    fn samples_serialization() {
        let samples = scenario();
        let json = serde_json::to_string(&samples).unwrap();
        assert!(json.contains("\"features\""));
        assert!(json.contains("\"targets\""));

        let parsed: Samples = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, samples);
    }

    #[test]
    fn samples_deserialize_missing_targets() {
        let json = r#"{"features": {"shape": [1, 1], "data": [0.5]}}"#;
        let parsed: std::result::Result<Samples, _> = serde_json::from_str(json);
        let err = parsed.unwrap_err();
        assert!(err.to_string().contains("targets"));
    }

    #[test]
    fn samples_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Samples>();
    }
}
