/**
This modules gives a few tools to prettyprint the per-type and the overall metrics of a batch.
*/
use crate::metrics::SpanCounts;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, PartialOrd};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;

/// The reporter holds the metrics of every entity type and the overall metrics. It can be used to
/// display the results as if they were collected into a dataframe and can be consumed to obtain a
/// `HashSet` containing the metrics. The reporter is built with the `classification_report`
/// function.
///
/// # Example
///
/// ```rust
/// use spaneval::{classification_report, EvalConfig};
///
/// let gold = ["PER_B", "PER_I", "O", "LOC_B", "O", "O"];
/// let pred = ["PER_B", "PER_I", "O", "O", "O", "ORG_B"];
///
/// let reporter = classification_report(&gold, &pred, &[3, 3], &[3, 3], &EvalConfig::default())
///     .unwrap();
///
/// let expected_report =
/// "Class, Precision, Recall, Fscore, Support
/// Overall_Weighted, 0.5, 0.5, 0.5, 2
/// Overall_Micro, 0.5, 0.5, 0.5, 2
/// Overall_Macro, 0.33333334, 0.33333334, 0.33333334, 2
/// LOC, 0, 0, 0, 1
/// ORG, 0, 0, 0, 0
/// PER, 1, 1, 1, 1\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Reporter {
    pub(crate) classes: BTreeSet<ClassMetricsInner>,
}

/// By converting the reporter into a `HashSet` of `ClassMetrics`, you lose the ordering
/// implemented for the reporter. If you mean to consume the data without prettypriting it, this
/// is not a problem.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().map(ClassMetrics::from).collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: ClassMetricsInner) -> bool {
        self.classes.insert(metrics)
    }

    /// Metrics of a single entity type, such as `PER`.
    pub fn class<S: AsRef<str>>(&self, class: S) -> Option<ClassMetrics> {
        self.classes
            .iter()
            .find(|c| c.average == Average::None && c.class == class.as_ref())
            .cloned()
            .map(ClassMetrics::from)
    }

    /// One of the overall rows.
    pub fn overall(&self, average: OverallAverage) -> Option<ClassMetrics> {
        let average = Average::from(average);
        self.classes
            .iter()
            .find(|c| c.average == average)
            .cloned()
            .map(ClassMetrics::from)
    }

    /// Number of entity types in the report, the overall rows excluded.
    pub fn n_classes(&self) -> usize {
        self.classes
            .iter()
            .filter(|c| c.average == Average::None)
            .count()
    }
}

/// The Reporter struct acts as a dataframe when displayed. The overall rows come first, from the
/// greatest average to the smallest.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter().rev().filter(|c| c.average != Average::None) {
            writeln!(f, "{}", v)?
        }
        for v in self.classes.iter().filter(|c| c.average == Average::None) {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
/// Datastructure holding metrics about a given class.
pub struct ClassMetrics {
    /// The class, such as "PER", "GEO", "MISC", etc.
    pub class: String,
    /// The average used to compute this class' metrics
    pub average: Average,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    /// Number of gold spans.
    pub support: usize,
    /// Confusion counts behind the metrics. For the macro and weighted rows, these are the counts
    /// of the whole batch.
    pub counts: SpanCounts,
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

impl From<ClassMetricsInner> for ClassMetrics {
    fn from(value: ClassMetricsInner) -> Self {
        Self {
            class: value.class,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
            counts: value.counts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// Line of the reporter. Two lines are equal when they share their class and their average, and
/// they are ordered by average, then by class.
pub(crate) struct ClassMetricsInner {
    pub(crate) class: String,
    pub(crate) average: Average,
    pub(crate) precision: f32,
    pub(crate) recall: f32,
    pub(crate) fscore: f32,
    pub(crate) support: usize,
    pub(crate) counts: SpanCounts,
}

impl PartialEq for ClassMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetricsInner {}

impl PartialOrd for ClassMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassMetricsInner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.average
            .cmp(&other.average)
            .then_with(|| self.class.cmp(&other.class))
    }
}

impl ClassMetricsInner {
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
        counts: SpanCounts,
    ) -> Self {
        ClassMetricsInner {
            class: average.to_string(),
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
            counts,
        }
    }
}

/// The ClassMetricsInner struct acts as a line in a dataframe when displayed.
impl Display for ClassMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging supported by this crate. The per-type rows
/// (`None`) are the smallest, then come `Macro`, `Micro` and `Weighted`.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    None,
    Macro,
    Micro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(class: &str, precision: f32) -> ClassMetricsInner {
        ClassMetricsInner {
            class: String::from(class),
            average: Average::None,
            precision,
            recall: precision,
            fscore: precision,
            support: 1,
            counts: SpanCounts::default(),
        }
    }

    fn build_reporter() -> Reporter {
        let mut reporter = Reporter::default();
        reporter.insert(row("PER", 1.0));
        reporter.insert(row("LOC", 0.5));
        for avg in [
            OverallAverage::Macro,
            OverallAverage::Weighted,
            OverallAverage::Micro,
        ] {
            reporter.insert(ClassMetricsInner::new_overall(
                avg,
                0.75,
                0.75,
                0.75,
                2,
                SpanCounts::default(),
            ));
        }
        reporter
    }

    #[test]
    fn test_display_reporter() {
        let expected = "Class, Precision, Recall, Fscore, Support
Overall_Weighted, 0.75, 0.75, 0.75, 2
Overall_Micro, 0.75, 0.75, 0.75, 2
Overall_Macro, 0.75, 0.75, 0.75, 2
LOC, 0.5, 0.5, 0.5, 1
PER, 1, 1, 1, 1\n";
        assert_eq!(build_reporter().to_string(), expected);
    }

    #[test]
    fn test_lookups() {
        let reporter = build_reporter();
        assert_eq!(reporter.n_classes(), 2);
        assert_eq!(reporter.class("LOC").map(|c| c.precision), Some(0.5));
        assert!(reporter.class("Overall_Micro").is_none());
        let micro = reporter.overall(OverallAverage::Micro).unwrap();
        assert_eq!(micro.class, "Overall_Micro");
        assert_eq!(micro.average, Average::Micro);
    }

    #[test]
    fn test_insert_same_class_twice() {
        let mut reporter = build_reporter();
        assert!(!reporter.insert(row("PER", 0.0)));
        assert_eq!(reporter.class("PER").map(|c| c.precision), Some(1.0));
    }

    #[test]
    fn test_into_hash_set() {
        let set: HashSet<ClassMetrics> = build_reporter().into();
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_average_order() {
        assert!(Average::None < Average::Macro);
        assert!(Average::Macro < Average::Micro);
        assert!(Average::Micro < Average::Weighted);
        assert_ne!(Average::Micro.cmp(&Average::Macro), Ordering::Equal);
        let averages: Vec<Average> = build_reporter().classes.iter().map(|c| c.average).collect();
        assert_eq!(
            averages,
            vec![
                Average::None,
                Average::None,
                Average::Macro,
                Average::Micro,
                Average::Weighted
            ]
        );
    }

    #[test]
    fn test_serialize_reporter() {
        let json = serde_json::to_string(&build_reporter()).unwrap();
        let back: Reporter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, build_reporter());
    }
}
