//! Shaped array blobs stored inside envelopes.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SamplesError};

/// A dense row-major array: a shape plus flattened data.
///
/// This is the unit every envelope format stores. Features are stored with
/// shape `[N, ..feature_shape]` and targets with shape `[N]`.
///
/// # Example
///
/// ```
/// use ml_samples::ArrayData;
///
/// let array = ArrayData::new(vec![2, 3], vec![0.0_f32; 6]).unwrap();
/// assert_eq!(array.rows(), 2);
/// assert_eq!(array.row_shape(), &[3]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayData<T> {
    /// Dimensions, outermost first.
    pub shape: Vec<usize>,

    /// Row-major elements.
    pub data: Vec<T>,
}

impl<T> ArrayData<T> {
    /// Creates a validated array.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidShape`] if the shape is empty or its
    /// element count differs from `data.len()`.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let array = Self { shape, data };
        array.validate()?;
        Ok(array)
    }

    /// Creates a one-dimensional array.
    #[must_use]
    pub fn vector(data: Vec<T>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Checks that the shape describes the data.
    ///
    /// # Errors
    ///
    /// Returns [`SamplesError::InvalidShape`] on disagreement.
    pub fn validate(&self) -> Result<()> {
        if self.shape.is_empty() || self.shape.iter().product::<usize>() != self.data.len() {
            return Err(SamplesError::invalid_shape(&self.shape, self.data.len()));
        }
        Ok(())
    }

    /// Returns the outermost dimension.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Returns the shape of one row (all dimensions but the first).
    #[must_use]
    pub fn row_shape(&self) -> &[usize] {
        self.shape.get(1..).unwrap_or(&[])
    }

    /// Returns the total element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Applies `f` to every element.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ArrayData<U> {
        ArrayData {
            shape: self.shape,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(feature = "mat")]
/// Reorders row-major data into column-major (Fortran) order.
pub(crate) fn to_column_major<T: Copy>(data: &[T], shape: &[usize]) -> Vec<T> {
    reorder(data, shape, false)
}

#[cfg(feature = "mat")]
/// Reorders column-major (Fortran) data into row-major order.
pub(crate) fn to_row_major<T: Copy>(data: &[T], shape: &[usize]) -> Vec<T> {
    reorder(data, shape, true)
}

#[cfg(feature = "mat")]
fn reorder<T: Copy>(data: &[T], shape: &[usize], from_column_major: bool) -> Vec<T> {
    if shape.len() < 2 || data.is_empty() {
        return data.to_vec();
    }

    let rank = shape.len();
    let mut row_strides = vec![1usize; rank];
    let mut col_strides = vec![1usize; rank];
    for axis in (0..rank - 1).rev() {
        row_strides[axis] = row_strides[axis + 1] * shape[axis + 1];
    }
    for axis in 1..rank {
        col_strides[axis] = col_strides[axis - 1] * shape[axis - 1];
    }

    // Walk the destination order, gathering from the source layout.
    let src_strides = if from_column_major {
        &col_strides
    } else {
        &row_strides
    };
    let mut out = Vec::with_capacity(data.len());
    let mut index = vec![0usize; rank];
    for _ in 0..data.len() {
        let offset: usize = index.iter().zip(src_strides).map(|(i, s)| i * s).sum();
        out.push(data[offset]);

        if from_column_major {
            for axis in (0..rank).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        } else {
            for axis in 0..rank {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_new_validates() {
        assert!(ArrayData::new(vec![2, 2], vec![1, 2, 3, 4]).is_ok());
        assert!(ArrayData::new(vec![2, 3], vec![1, 2, 3, 4]).is_err());
        assert!(ArrayData::<i32>::new(vec![], vec![]).is_err());
    }

    #[test]
    fn array_zero_rows() {
        let array = ArrayData::<f32>::new(vec![0, 4], vec![]).unwrap();
        assert_eq!(array.rows(), 0);
        assert_eq!(array.row_shape(), &[4]);
        assert!(array.is_empty());
    }

    #[test]
    fn array_vector() {
        let array = ArrayData::vector(vec![1_i64, 2, 3]);
        assert_eq!(array.shape, vec![3]);
        assert!(array.row_shape().is_empty());
    }

    #[test]
    fn array_map() {
        let array = ArrayData::vector(vec![1_i64, 2]).map(|v| v * 10);
        assert_eq!(array.data, vec![10, 20]);
    }

    #[cfg(feature = "mat")]
    #[test]
    fn column_major_matrix() {
        // [[1, 2, 3], [4, 5, 6]]
        let data = [1, 2, 3, 4, 5, 6];
        let col = to_column_major(&data, &[2, 3]);
        assert_eq!(col, vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(to_row_major(&col, &[2, 3]), data.to_vec());
    }

    #[cfg(feature = "mat")]
    #[test]
    fn column_major_rank3() {
        let shape = [2, 3, 4];
        let data: Vec<u32> = (0..24).collect();
        let col = to_column_major(&data, &shape);
        // First column-major elements walk the outermost axis fastest.
        assert_eq!(&col[..3], &[0, 12, 4]);
        assert_eq!(to_row_major(&col, &shape), data);
    }
}
