/**
One-hot encoding of label indices, for feeding the labels to a model.
*/
use ndarray::{Array1, Array2};
use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingError {
    /// The index is not smaller than the number of labels.
    IndexOutOfRange { index: usize, total: usize },
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, total } => write!(
                f,
                "Index {} is out of range for {} labels",
                index, total
            ),
        }
    }
}

impl Error for EncodingError {}

fn check_index(index: usize, total: usize) -> Result<(), EncodingError> {
    if index >= total {
        return Err(EncodingError::IndexOutOfRange { index, total });
    }
    Ok(())
}

/// Vector of `total` zeros with a one at `index`.
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use spaneval::one_hot;
///
/// assert_eq!(one_hot(2, 4).unwrap(), array![0, 0, 1, 0]);
/// ```
pub fn one_hot(index: usize, total: usize) -> Result<Array1<u8>, EncodingError> {
    check_index(index, total)?;
    let mut encoded = Array1::zeros(total);
    encoded[index] = 1;
    Ok(encoded)
}

/// Encodes every index as a row of a `(indices.len(), total)` matrix.
pub fn one_hot_batch(indices: &[usize], total: usize) -> Result<Array2<u8>, EncodingError> {
    let mut encoded = Array2::zeros((indices.len(), total));
    for (mut row, &index) in encoded.rows_mut().into_iter().zip(indices) {
        check_index(index, total)?;
        row[index] = 1;
    }
    Ok(encoded)
}
