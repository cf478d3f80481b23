use std::error::Error;
use std::fmt::Display;
use std::slice::Iter;

/// Flattened batch of sentences. Every sentence is padded to the same width, the way a model
/// receives its inputs, and the batch remembers both the padded and the true length of each
/// sentence.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Default)]
pub struct PaddedBatch<T> {
    pub(crate) tokens: Box<[T]>,
    pub(crate) padded_lens: Box<[usize]>,
    pub(crate) true_lens: Box<[usize]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    /// A sentence (index, length) is longer than the requested width.
    SentenceTooLong(usize, usize, usize),
}

impl Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SentenceTooLong(index, len, width) => write!(
                f,
                "Sentence {} has length {}, which does not fit in a width of {}",
                index, len, width
            ),
        }
    }
}

impl Error for BatchError {}

impl<T: Clone> PaddedBatch<T> {
    /// Builds the batch, padding every sentence to the length of the longest one.
    ///
    /// * `sentences`: The sentences of the batch.
    /// * `pad`: Value appended to the sentences shorter than the longest one.
    pub fn new(sentences: Vec<Vec<T>>, pad: T) -> Self {
        let width = sentences.iter().map(|v| v.len()).max().unwrap_or(0);
        Self::pad_to(sentences, pad, width)
    }

    /// Builds the batch, padding every sentence to `width`. Fails if a sentence is longer than
    /// `width`.
    pub fn with_width(sentences: Vec<Vec<T>>, pad: T, width: usize) -> Result<Self, BatchError> {
        if let Some((index, v)) = sentences.iter().enumerate().find(|(_, v)| v.len() > width) {
            return Err(BatchError::SentenceTooLong(index, v.len(), width));
        }
        Ok(Self::pad_to(sentences, pad, width))
    }

    #[inline(always)]
    fn pad_to(sentences: Vec<Vec<T>>, pad: T, width: usize) -> Self {
        let mut flattened = Vec::with_capacity(width * sentences.len());
        let mut padded_lens = Vec::with_capacity(sentences.len());
        let mut true_lens = Vec::with_capacity(sentences.len());
        for vec in sentences.into_iter() {
            let len = vec.len();
            true_lens.push(len);
            padded_lens.push(width);
            flattened.extend(vec);
            flattened.extend(std::iter::repeat(pad.clone()).take(width - len));
        }
        Self {
            tokens: flattened.into_boxed_slice(),
            padded_lens: padded_lens.into_boxed_slice(),
            true_lens: true_lens.into_boxed_slice(),
        }
    }
}

impl<T> PaddedBatch<T> {
    /// The flattened and padded buffer.
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }
    pub fn padded_lens(&self) -> &[usize] {
        &self.padded_lens
    }
    pub fn true_lens(&self) -> &[usize] {
        &self.true_lens
    }
    /// Number of sentences in the batch.
    pub fn len(&self) -> usize {
        self.true_lens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.true_lens.is_empty()
    }
    pub fn iter(&self) -> Iter<'_, T> {
        self.tokens.iter()
    }
    /// Iterates over the sentences, without their padding.
    pub fn iter_vec(&self) -> VecsIter<'_, T> {
        VecsIter::new(self)
    }
}

pub struct VecsIter<'a, T>
where
    T: 'a,
{
    sentence_index: usize,
    offset: usize,
    batch: &'a PaddedBatch<T>,
}

impl<'a, T> VecsIter<'a, T> {
    fn new(batch: &'a PaddedBatch<T>) -> Self {
        Self {
            sentence_index: 0,
            offset: 0,
            batch,
        }
    }
}

impl<'a, T> Iterator for VecsIter<'a, T> {
    type Item = &'a [T];
    fn next(&mut self) -> Option<Self::Item> {
        let padded = *self.batch.padded_lens.get(self.sentence_index)?;
        let len = *self.batch.true_lens.get(self.sentence_index)?;
        let start = self.offset;
        self.sentence_index += 1;
        self.offset = start.checked_add(padded)?;
        self.batch.tokens.get(start..start.checked_add(len)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn build_vecs() -> Vec<Vec<&'static str>> {
        vec![
            vec!["O", "O", "O", "MISC_B", "MISC_I", "MISC_I", "O"],
            vec!["PER_B", "PER_I", "O"],
        ]
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_new_PaddedBatch() {
        let actual = PaddedBatch::new(build_vecs(), "O");
        let expected_tokens = Box::new([
            "O", "O", "O", "MISC_B", "MISC_I", "MISC_I", "O", "PER_B", "PER_I", "O", "O", "O",
            "O", "O",
        ]);
        let expected = PaddedBatch {
            tokens: expected_tokens as Box<[&str]>,
            padded_lens: Box::new([7usize, 7]) as Box<[usize]>,
            true_lens: Box::new([7usize, 3]) as Box<[usize]>,
        };
        assert_eq!(expected, actual);
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_iter_PaddedBatch() {
        let batch = PaddedBatch::new(build_vecs(), "PAD");
        let actual: Vec<Vec<&str>> = batch.iter_vec().map(Vec::from).collect();
        assert_eq!(actual, build_vecs());
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.iter().filter(|t| **t == "PAD").count(), 4);
    }

    #[test]
    fn test_with_width() {
        let batch = PaddedBatch::with_width(build_vecs(), "O", 10).unwrap();
        assert_eq!(batch.padded_lens(), &[10, 10]);
        assert_eq!(batch.true_lens(), &[7, 3]);
        assert_eq!(batch.tokens().len(), 20);
        let too_narrow = PaddedBatch::with_width(build_vecs(), "O", 5);
        assert_eq!(too_narrow, Err(BatchError::SentenceTooLong(0, 7, 5)));
    }

    #[test]
    fn test_iter_stops_on_overflowing_lengths() {
        let batch = PaddedBatch {
            tokens: Box::new(["PER_B", "O"]) as Box<[&str]>,
            padded_lens: Box::new([usize::MAX, usize::MAX, 1]) as Box<[usize]>,
            true_lens: Box::new([1usize, 0, 1]) as Box<[usize]>,
        };
        let actual: Vec<&[&str]> = batch.iter_vec().collect();
        assert_eq!(actual, vec![&["PER_B"][..]]);
    }

    #[test]
    fn test_empty_batch() {
        let batch: PaddedBatch<&str> = PaddedBatch::new(vec![], "O");
        assert!(batch.is_empty());
        assert_eq!(batch.iter_vec().count(), 0);
    }
}
