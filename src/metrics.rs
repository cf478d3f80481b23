/**
This module computes the entity-level metrics (precision, recall, f-score, support) of a gold
sequence and a predicted sequence.
*/
use crate::config::EvalConfig;
use crate::datastructure::PaddedBatch;
use crate::entity::{extract_spans, ParsingError, Spans, OUTSIDE};
use crate::reporter::{Average, ClassMetricsInner, OverallAverage, Reporter};
use crate::TagFormat;
use ahash::AHashMap;
use core::fmt;
use itertools::multizip;
use ndarray::{array, Array1, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{Debug, Display},
    ops::AddAssign,
    slice::Iter,
    str::FromStr,
};
use tracing::{debug, warn};

const WARN_FOR: [Metric; 3] = [Metric::Precision, Metric::Recall, Metric::FScore];

#[derive(Debug, PartialEq, Hash, Clone, Copy)]
enum Metric {
    FScore,
    Precision,
    Recall,
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// How do we handle a precision or a recall whose denominator is 0? Do we replace the result by
/// 0, by 1, or return an error? The default is `ReplaceBy0`. The `ReturnError` strategy will stop
/// the computation; it can be useful if you believe there should be no 0 in the denominator.
pub enum DivByZeroStrat {
    /// Returns 1 when the denominator is 0
    ReplaceBy1,
    /// Returns an error
    ReturnError,
    /// Returns 0 when the denominator is 0
    #[default]
    ReplaceBy0,
}

impl Display for DivByZeroStrat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug)]
pub struct ParsingDivisionByZeroStrategyError<S: Debug + Display>(S);

impl<S: Debug + Display> Display for ParsingDivisionByZeroStrategyError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse the {} into a `DivByZeroStrat`",
            self.0
        )
    }
}
impl<S: Debug + Display> Error for ParsingDivisionByZeroStrategyError<S> {}

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "replaceby1" | "replacebyone" => Ok(DivByZeroStrat::ReplaceBy1),
            "replaceby0" | "replacebyzero" => Ok(DivByZeroStrat::ReplaceBy0),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionByZeroError;

impl Display for DivisionByZeroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encountered division by zero")
    }
}

impl Error for DivisionByZeroError {}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Error type to represent when two lists or arrays are not of the
/// same length (when they should be).
pub struct InconsistentLengthError(pub usize, pub usize);

impl Display for InconsistentLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inconsistent length between two lists. The first one is length {}, the second one is length {}",
            self.0, self.1
        )
    }
}
impl Error for InconsistentLengthError {}

fn check_consistent_length<T, U>(
    y_true: &[Vec<T>],
    y_pred: &[Vec<U>],
) -> Result<(), InconsistentLengthError> {
    if y_true.len() != y_pred.len() {
        return Err(InconsistentLengthError(y_true.len(), y_pred.len()));
    }
    for (t, p) in y_true.iter().zip(y_pred) {
        if t.len() != p.len() {
            return Err(InconsistentLengthError(t.len(), p.len()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing many type of failures that could happen when computing the precison,
/// recall and f-score of a batch.
pub enum ComputationError {
    BetaNotPositive,
    InconsistentLength(InconsistentLengthError),
    /// The true length of a sentence (index, true length, padded length) is larger than its
    /// padded length.
    LengthExceedsPadding(usize, usize, usize),
    /// The slice of a sentence (index, end of the slice) falls outside of a buffer of the given
    /// length.
    OutOfBounds(usize, usize, usize),
    Parsing(ParsingError),
    DivisionByZero(DivisionByZeroError),
    InputError(MultiInputError),
}

impl Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BetaNotPositive => write!(f, "Beta value is not positive"),
            Self::InconsistentLength(length_err) => std::fmt::Display::fmt(length_err, f),
            Self::LengthExceedsPadding(sentence, len, padded) => write!(
                f,
                "Sentence {} has a true length of {} but a padded length of {}",
                sentence, len, padded
            ),
            Self::OutOfBounds(sentence, end, buffer_len) => write!(
                f,
                "Sentence {} ends at index {}, outside of a buffer of length {}",
                sentence, end, buffer_len
            ),
            Self::Parsing(parsing_err) => std::fmt::Display::fmt(parsing_err, f),
            Self::DivisionByZero(div_err) => std::fmt::Display::fmt(div_err, f),
            Self::InputError(input_err) => std::fmt::Display::fmt(input_err, f),
        }
    }
}
impl Error for ComputationError {}

impl From<InconsistentLengthError> for ComputationError {
    fn from(value: InconsistentLengthError) -> Self {
        Self::InconsistentLength(value)
    }
}
impl From<ParsingError> for ComputationError {
    fn from(value: ParsingError) -> Self {
        Self::Parsing(value)
    }
}
impl From<DivisionByZeroError> for ComputationError {
    fn from(value: DivisionByZeroError) -> Self {
        Self::DivisionByZero(value)
    }
}
impl From<MultiInputError> for ComputationError {
    fn from(value: MultiInputError) -> Self {
        Self::InputError(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// Span-level confusion counts.
pub struct SpanCounts {
    /// Gold spans with an exact match among the predicted spans.
    pub true_positives: usize,
    /// Predicted spans without an exact match among the gold spans.
    pub false_positives: usize,
    /// Gold spans without an exact match among the predicted spans.
    pub false_negatives: usize,
}

impl SpanCounts {
    /// Denominator of the precision.
    pub fn predicted(&self) -> usize {
        self.true_positives + self.false_positives
    }
    /// Denominator of the recall. Also the number of gold spans.
    pub fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

impl AddAssign for SpanCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positives += rhs.true_positives;
        self.false_positives += rhs.false_positives;
        self.false_negatives += rhs.false_negatives;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Entity-level metrics of a whole batch.
pub struct EntityScores {
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    pub counts: SpanCounts,
}

impl EntityScores {
    fn from_counts(counts: SpanCounts, config: &EvalConfig) -> Result<Self, ComputationError> {
        let tp = array![counts.true_positives as f32];
        let precision = prf_divide(
            &tp,
            &array![counts.predicted() as f32],
            false,
            Metric::Precision,
            config.zero_division,
        )?;
        let recall = prf_divide(
            &tp,
            &array![counts.support() as f32],
            false,
            Metric::Recall,
            config.zero_division,
        )?;
        let fscore = f_beta(&precision, &recall, 1.0, false);
        Ok(Self {
            precision: precision[0],
            recall: recall[0],
            fscore: fscore[0],
            counts,
        })
    }
}

/// `(precision, recall, f1)`
impl From<EntityScores> for (f32, f32, f32) {
    fn from(value: EntityScores) -> Self {
        (value.precision, value.recall, value.fscore)
    }
}

/// Iterates over the sentences of a flattened batch and returns the gold and predicted spans of
/// each sentence.
struct SentenceSpans<'a, G, P> {
    gold: &'a [G],
    pred: &'a [P],
    lens: std::iter::Zip<Iter<'a, usize>, Iter<'a, usize>>,
    index: usize,
    /// Start of the next sentence, `None` once the padded lengths overflow.
    offset: Option<usize>,
    format: TagFormat,
}

impl<'a, G: AsRef<str>, P: AsRef<str>> SentenceSpans<'a, G, P> {
    fn new(
        gold: &'a [G],
        pred: &'a [P],
        padded_lens: &'a [usize],
        true_lens: &'a [usize],
        format: TagFormat,
    ) -> Result<Self, InconsistentLengthError> {
        if padded_lens.len() != true_lens.len() {
            return Err(InconsistentLengthError(padded_lens.len(), true_lens.len()));
        }
        Ok(Self {
            gold,
            pred,
            lens: padded_lens.iter().zip(true_lens.iter()),
            index: 0,
            offset: Some(0),
            format,
        })
    }

    fn extract(
        &self,
        sentence: usize,
        start: Option<usize>,
        padded: usize,
        len: usize,
    ) -> Result<(Spans<'a>, Spans<'a>), ComputationError> {
        if len > padded {
            return Err(ComputationError::LengthExceedsPadding(sentence, len, padded));
        }
        let start = start.ok_or(ComputationError::OutOfBounds(
            sentence,
            usize::MAX,
            self.gold.len(),
        ))?;
        let gold = slice_sentence(self.gold, sentence, start, len)?;
        let pred = slice_sentence(self.pred, sentence, start, len)?;
        Ok((
            extract_spans(gold, self.format)?,
            extract_spans(pred, self.format)?,
        ))
    }
}

impl<'a, G: AsRef<str>, P: AsRef<str>> Iterator for SentenceSpans<'a, G, P> {
    type Item = Result<(Spans<'a>, Spans<'a>), ComputationError>;
    fn next(&mut self) -> Option<Self::Item> {
        let (padded, len) = self.lens.next()?;
        let sentence = self.index;
        let start = self.offset;
        self.index += 1;
        // The offset moves by the padded length, the slice only covers the true length.
        self.offset = start.and_then(|s| s.checked_add(*padded));
        Some(self.extract(sentence, start, *padded, *len))
    }
}

fn slice_sentence<T>(
    buffer: &[T],
    sentence: usize,
    start: usize,
    len: usize,
) -> Result<&[T], ComputationError> {
    let end = start.checked_add(len).ok_or(ComputationError::OutOfBounds(
        sentence,
        usize::MAX,
        buffer.len(),
    ))?;
    buffer
        .get(start..end)
        .ok_or(ComputationError::OutOfBounds(sentence, end, buffer.len()))
}

/// Counts the matches between the spans of one sentence. A span matches when a span with the same
/// length, start and type exists on the other side; spans are not consumed by a match.
fn count_matches<'a>(gold: &Spans<'a>, pred: &Spans<'a>) -> SpanCounts {
    let mut counts = SpanCounts::default();
    for g in gold.iter() {
        if pred.contains(g) {
            counts.true_positives += 1;
        } else {
            counts.false_negatives += 1;
        }
    }
    counts.false_positives = pred.iter().filter(|p| !gold.contains(p)).count();
    counts
}

/// Same as `count_matches`, but the counts are accumulated per entity type.
fn count_matches_by_type<'a>(
    gold: &Spans<'a>,
    pred: &Spans<'a>,
    by_type: &mut AHashMap<String, SpanCounts>,
) {
    for g in gold.iter() {
        let counts = by_type.entry(g.tag.to_string()).or_default();
        if pred.contains(g) {
            counts.true_positives += 1;
        } else {
            counts.false_negatives += 1;
        }
    }
    for p in pred.iter().filter(|p| !gold.contains(p)) {
        by_type.entry(p.tag.to_string()).or_default().false_positives += 1;
    }
}

/// Main entrypoint of the library. This function extracts the entity spans of every sentence of
/// a flattened batch and computes the precision, recall and f1 of the predicted spans. A sentence
/// without any span on both sides is skipped.
///
/// * `gold`: Gold tags of the whole batch, concatenated.
/// * `pred`: Predicted tags of the whole batch, concatenated.
/// * `padded_lens`: Length of each sentence in the buffers, padding included.
/// * `true_lens`: Length of each sentence without its padding.
/// * `config`: Tag format and division by zero strategy.
///
/// # Example
/// ```rust
/// use spaneval::{score_batch, EvalConfig};
///
/// let gold = ["PER_B", "PER_I", "O", "O", "LOC_B", "O"];
/// let pred = ["PER_B", "PER_I", "O", "O", "O", "O"];
/// let scores = score_batch(&gold, &pred, &[3, 3], &[3, 2], &EvalConfig::default()).unwrap();
/// assert_eq!((scores.precision, scores.recall), (1.0, 0.5));
/// ```
pub fn score_batch<G: AsRef<str>, P: AsRef<str>>(
    gold: &[G],
    pred: &[P],
    padded_lens: &[usize],
    true_lens: &[usize],
    config: &EvalConfig,
) -> Result<EntityScores, ComputationError> {
    let mut counts = SpanCounts::default();
    let mut skipped = 0;
    for pair in SentenceSpans::new(gold, pred, padded_lens, true_lens, config.format)? {
        let (gold_spans, pred_spans) = pair?;
        if gold_spans.is_empty() && pred_spans.is_empty() {
            skipped += 1;
            continue;
        }
        counts += count_matches(&gold_spans, &pred_spans);
    }
    debug!(
        sentences = true_lens.len(),
        skipped,
        true_positives = counts.true_positives,
        false_positives = counts.false_positives,
        false_negatives = counts.false_negatives,
        "scored batch"
    );
    EntityScores::from_counts(counts, config)
}

/// Scores sentences given as separate, unpadded, lists of tags. The sentences are flattened into
/// padded batches before being scored with `score_batch`. The gold and predicted sentences must
/// have the same lengths.
pub fn score_sentences<G: AsRef<str>, P: AsRef<str>>(
    gold: &[Vec<G>],
    pred: &[Vec<P>],
    config: &EvalConfig,
) -> Result<EntityScores, ComputationError> {
    check_consistent_length(gold, pred)?;
    let gold_batch = PaddedBatch::new(as_str_vecs(gold), OUTSIDE);
    let pred_batch = PaddedBatch::new(as_str_vecs(pred), OUTSIDE);
    score_batch(
        gold_batch.tokens(),
        pred_batch.tokens(),
        gold_batch.padded_lens(),
        gold_batch.true_lens(),
        config,
    )
}

fn as_str_vecs<S: AsRef<str>>(sentences: &[Vec<S>]) -> Vec<Vec<&str>> {
    sentences
        .iter()
        .map(|v| v.iter().map(|s| s.as_ref()).collect())
        .collect()
}

/// Type alias for representing the output of `precision_recall_fscore_support`. The first array
/// contains the precision, the second the recall, the third the f-score and the last one the
/// support.
type PrecisionRecallFScoreTrueSum = (Array1<f32>, Array1<f32>, Array1<f32>, Array1<usize>);

/// Per-type counts, as arrays ordered like the type names.
struct CountArrays {
    tp_sum: Array1<f32>,
    pred_sum: Array1<f32>,
    true_sum: Array1<usize>,
}

impl CountArrays {
    fn new<'a>(counts: impl Iterator<Item = &'a SpanCounts> + Clone) -> Self {
        Self {
            tp_sum: counts.clone().map(|c| c.true_positives as f32).collect(),
            pred_sum: counts.clone().map(|c| c.predicted() as f32).collect(),
            true_sum: counts.map(|c| c.support()).collect(),
        }
    }
}

/// Value of an average computed over nothing: no entity type at all, or no gold span for the
/// weighted average.
fn empty_average(zero_division: DivByZeroStrat, metric: Metric) -> Result<f32, ComputationError> {
    warn!("Averaging the {} over no entity", metric);
    match zero_division {
        DivByZeroStrat::ReplaceBy0 => Ok(0.0),
        DivByZeroStrat::ReplaceBy1 => Ok(1.0),
        DivByZeroStrat::ReturnError => Err(ComputationError::DivisionByZero(DivisionByZeroError)),
    }
}

fn precision_recall_fscore_support(
    counts: &CountArrays,
    average: Average,
    config: &EvalConfig,
) -> Result<PrecisionRecallFScoreTrueSum, ComputationError> {
    if config.beta.is_sign_negative() {
        return Err(ComputationError::BetaNotPositive);
    }
    let (tp_sum, pred_sum, true_sum) = if matches!(average, Average::Micro) {
        (
            array![counts.tp_sum.sum()],
            array![counts.pred_sum.sum()],
            array![counts.true_sum.sum()],
        )
    } else {
        (
            counts.tp_sum.clone(),
            counts.pred_sum.clone(),
            counts.true_sum.clone(),
        )
    };
    let precision = prf_divide(
        &tp_sum,
        &pred_sum,
        config.parallel,
        Metric::Precision,
        config.zero_division,
    )?;
    let recall = prf_divide(
        &tp_sum,
        &true_sum.mapv(|x| x as f32),
        config.parallel,
        Metric::Recall,
        config.zero_division,
    )?;
    let f_score = f_beta(&precision, &recall, config.beta.powi(2), config.parallel);
    match average {
        Average::None | Average::Micro => Ok((precision, recall, f_score, true_sum)),
        Average::Macro => {
            let support = array![true_sum.sum()];
            let mean = |a: &Array1<f32>, metric: Metric| match a.mean() {
                Some(m) => Ok(m),
                None => empty_average(config.zero_division, metric),
            };
            Ok((
                array![mean(&precision, Metric::Precision)?],
                array![mean(&recall, Metric::Recall)?],
                array![mean(&f_score, Metric::FScore)?],
                support,
            ))
        }
        Average::Weighted => {
            let support = true_sum.sum();
            if support == 0 {
                return Ok((
                    array![empty_average(config.zero_division, Metric::Precision)?],
                    array![empty_average(config.zero_division, Metric::Recall)?],
                    array![empty_average(config.zero_division, Metric::FScore)?],
                    array![0],
                ));
            }
            let weights = true_sum.mapv(|x| x as f32);
            Ok((
                array![precision.weighted_mean(&weights)?],
                array![recall.weighted_mean(&weights)?],
                array![f_score.weighted_mean(&weights)?],
                array![support],
            ))
        }
    }
}

/// Computes the per-type metrics of a flattened batch, along with the micro, macro and weighted
/// averages. The spans are matched exactly like in `score_batch`, so the micro average is equal
/// to its result. The support of a type is its number of gold spans.
///
/// * `gold`: Gold tags of the whole batch, concatenated.
/// * `pred`: Predicted tags of the whole batch, concatenated.
/// * `padded_lens`: Length of each sentence in the buffers, padding included.
/// * `true_lens`: Length of each sentence without its padding.
/// * `config`: Tag format, division by zero strategy, beta and parallelism.
pub fn classification_report<G: AsRef<str>, P: AsRef<str>>(
    gold: &[G],
    pred: &[P],
    padded_lens: &[usize],
    true_lens: &[usize],
    config: &EvalConfig,
) -> Result<Reporter, ComputationError> {
    let mut by_type: AHashMap<String, SpanCounts> = AHashMap::default();
    for pair in SentenceSpans::new(gold, pred, padded_lens, true_lens, config.format)? {
        let (gold_spans, pred_spans) = pair?;
        count_matches_by_type(&gold_spans, &pred_spans, &mut by_type);
    }
    let sorted: BTreeMap<String, SpanCounts> = by_type.into_iter().collect();
    let counts = CountArrays::new(sorted.values());
    let (p, r, f, s) = precision_recall_fscore_support(&counts, Average::None, config)?;
    let mut reporter = Reporter::default();
    for ((name, class_counts), precision, recall, fscore, support) in multizip((
        sorted.iter(),
        p.into_iter(),
        r.into_iter(),
        f.into_iter(),
        s.into_iter(),
    )) {
        reporter.insert(ClassMetricsInner {
            class: name.clone(),
            average: Average::None,
            precision,
            recall,
            fscore,
            support,
            counts: *class_counts,
        });
    }
    let mut total = SpanCounts::default();
    for c in sorted.values() {
        total += *c;
    }
    for avg in [
        OverallAverage::Micro,
        OverallAverage::Macro,
        OverallAverage::Weighted,
    ] {
        let (p, r, f, s) = precision_recall_fscore_support(&counts, avg.into(), config)?;
        reporter.insert(ClassMetricsInner::new_overall(
            avg, p[0], r[0], f[0], s[0], total,
        ));
    }
    Ok(reporter)
}

/// Divides the numerator by the denominator, applying the division by zero strategy wherever the
/// denominator is 0.
fn prf_divide(
    numerator: &Array1<f32>,
    denominator: &Array1<f32>,
    parallel: bool,
    metric: Metric,
    zero_division: DivByZeroStrat,
) -> Result<Array1<f32>, DivisionByZeroError> {
    let (result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator)
    } else {
        prf_divide_results_and_mask(numerator, denominator)
    };
    if !zero_mask.iter().any(|m| *m == 0.0) {
        return Ok(result);
    }
    if WARN_FOR.contains(&metric) {
        warn!(
            "Encountered a division by zero while computing the {}",
            metric
        );
    }
    match zero_division {
        DivByZeroStrat::ReturnError => Err(DivisionByZeroError),
        DivByZeroStrat::ReplaceBy0 => Ok(result * &zero_mask),
        DivByZeroStrat::ReplaceBy1 => Ok(Zip::from(&result)
            .and(&zero_mask)
            .map_collect(|r, m| if *m == 0.0 { 1.0 } else { *r })),
    }
}

/// The F-beta score, taking `beta` squared. A zero denominator gives a score of 0.
fn f_beta(precision: &Array1<f32>, recall: &Array1<f32>, beta2: f32, parallel: bool) -> Array1<f32> {
    if beta2.is_infinite() && beta2.is_sign_positive() {
        return recall.clone();
    }
    let denom = precision * beta2 + recall;
    let denom_non_zero = if parallel {
        par_replace(denom, 0.0, 1.0)
    } else {
        replace(denom, 0.0, 1.0)
    };
    (precision * recall) * (1.0 + beta2) / denom_non_zero
}

/// This function computes the result in parallel. For a synchronous
/// version of this function, see `prf_divide_results_and_mask`. The mask
/// is 0 wherever the denominator is 0 and 1 elsewhere.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn par_prf_divide_results_and_mask(
    numerator: &Array1<f32>,
    denominator: &Array1<f32>,
) -> (Array1<f32>, Array1<f32>) {
    let zero_at_mask =
        Zip::from(denominator).par_map_collect(|d| if *d == 0.0 { 0.0 } else { 1.0 });
    let denominator_non_zero = par_replace(denominator.clone(), 0.0, 1.0);
    (numerator / &denominator_non_zero, zero_at_mask)
}

/// This function computes the result synchronously. For a parallel
/// version of this function, see `par_prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn prf_divide_results_and_mask(
    numerator: &Array1<f32>,
    denominator: &Array1<f32>,
) -> (Array1<f32>, Array1<f32>) {
    let zero_at_mask = denominator.mapv(|d| if d == 0.0 { 0.0 } else { 1.0 });
    let denominator_non_zero = replace(denominator.clone(), 0.0, 1.0);
    (numerator / &denominator_non_zero, zero_at_mask)
}

/// Helper function to replace values from an array.
fn replace(mut array: Array1<f32>, replaced: f32, new_value: f32) -> Array1<f32> {
    array.mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Helper function to replace values from an array in parallel.
fn par_replace(mut array: Array1<f32>, replaced: f32, new_value: f32) -> Array1<f32> {
    array.par_mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}
