/*
 * This modules contains some quality of life structs. Most importantly, it contains the
 * `EvalConfig` struct, which implements the default trait. This config is passed to the scoring
 * functions to simplify their arguments.
*/
use crate::metrics::DivByZeroStrat;
use std::fmt::{Debug, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Describes how a tag is laid out: which character separates the marker from the entity type,
/// and whether the marker is located at the end (`PER_B`) or at the start (`B-PER`) of the tag.
pub struct TagFormat {
    /// The character separating the marker from the entity type.
    pub delimiter: char,
    /// Is the marker located at the end of the tag? If so, this parameter should be `true`.
    pub suffix: bool,
}

impl TagFormat {
    /// Tags such as `PER_B` and `LOC_I`. This is the format of the annotation files.
    pub const SUFFIX_UNDERSCORE: TagFormat = TagFormat {
        delimiter: '_',
        suffix: true,
    };
    /// Tags such as `B-PER` and `I-LOC`.
    pub const PREFIX_DASH: TagFormat = TagFormat {
        delimiter: '-',
        suffix: false,
    };
}

impl Default for TagFormat {
    fn default() -> Self {
        Self::SUFFIX_UNDERSCORE
    }
}

impl Display for TagFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.suffix {
            write!(f, "TYPE{}MARKER", self.delimiter)
        } else {
            write!(f, "MARKER{}TYPE", self.delimiter)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Config struct used to simplify the inputs of parameters to the scoring functions. It
/// implements the default trait.
pub struct EvalConfig {
    /// Layout of the tags found in the gold and predicted sequences.
    pub(crate) format: TagFormat,
    /// This parameter describes what to do when we encounter a division by zero when computing
    /// precision and recall. The most common solution is to replace the results by 0.
    pub(crate) zero_division: DivByZeroStrat,
    /// Value of the `beta` parameter of the fscore. `beta=1` for F1 and `beta=0.5` for F0.5. Only
    /// used by the classification report; the batch score is always the F1.
    pub(crate) beta: f32,
    /// Can we use multiple cores to compute the per-type metrics? In practice, the number of
    /// entity types is small and it is better to *not* parallelize the computations.
    pub(crate) parallel: bool,
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn format(&self) -> TagFormat {
        self.format
    }
    pub fn zero_division(&self) -> DivByZeroStrat {
        self.zero_division
    }
    pub fn beta(&self) -> f32 {
        self.beta
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            format: TagFormat::default(),
            zero_division: DivByZeroStrat::ReplaceBy0,
            beta: 1.0,
            parallel: false,
        }
    }
}

impl Display for EvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Tag format: {}\n Strategy when encountering a division by zero: {:?}\n Beta: {}\n Using parallel computations: {}", self.format, self.zero_division, self.beta, self.parallel);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize an `EvalConfig` stucture.
#[derive(Debug, Clone, Default)]
pub struct EvalConfigBuilder {
    inner: EvalConfig,
}

impl EvalConfigBuilder {
    pub fn format(mut self, format: TagFormat) -> Self {
        self.inner.format = format;
        self
    }
    pub fn division_by_zero(mut self, division_by_zero: DivByZeroStrat) -> Self {
        self.inner.zero_division = division_by_zero;
        self
    }
    pub fn beta(mut self, beta: f32) -> Self {
        self.inner.beta = beta;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.inner.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        Self::default()
    }
    pub fn build(self) -> EvalConfig {
        self.inner
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// Options of the annotation file parsers.
pub struct ParseConfig {
    /// Should a sentence whose tokens do not all carry the same number of role columns be
    /// rejected? When `false`, the column count of the first token is used and the other tokens
    /// are truncated or leave short columns behind.
    pub strict_columns: bool,
}

impl Display for ParseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rejecting ragged role columns: {}", self.strict_columns)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DivByZeroStrat::ReplaceBy1)]
    #[case(DivByZeroStrat::ReplaceBy0)]
    #[case(DivByZeroStrat::ReturnError)]
    fn test_builder_setters_division_by_zero(#[case] strat: DivByZeroStrat) {
        let builder = EvalConfigBuilder::default();
        let config = builder.division_by_zero(strat).build();
        assert_eq!(config.zero_division, strat)
    }

    #[rstest]
    #[case(TagFormat::SUFFIX_UNDERSCORE)]
    #[case(TagFormat::PREFIX_DASH)]
    #[case(TagFormat { delimiter: ':', suffix: true })]
    fn test_builder_setters_format(#[case] format: TagFormat) {
        let config = EvalConfigBuilder::default().format(format).build();
        assert_eq!(config.format(), format)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel, parallel)
    }

    #[test]
    fn test_builder_setters_beta() {
        let config = EvalConfigBuilder::new().beta(0.5).build();
        assert_eq!(config.beta(), 0.5)
    }

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.format(), TagFormat::SUFFIX_UNDERSCORE);
        assert_eq!(config.zero_division(), DivByZeroStrat::ReplaceBy0);
        assert_eq!(config.beta(), 1.0);
        assert!(!config.parallel());
    }

    #[rstest]
    #[case(TagFormat::SUFFIX_UNDERSCORE, "TYPE_MARKER")]
    #[case(TagFormat::PREFIX_DASH, "MARKER-TYPE")]
    fn test_display_format(#[case] format: TagFormat, #[case] expected: &str) {
        assert_eq!(format.to_string(), expected)
    }
}
