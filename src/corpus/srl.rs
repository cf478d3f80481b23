use super::{CorpusError, SentenceFormat, Sentences};
use crate::config::ParseConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const COMMENT: &str = ";;";
const MIN_FIELDS: usize = 13;
const WORD_FIELD: usize = 2;
const PREDICATE_FIELD: usize = 12;
const FIRST_ROLE_FIELD: usize = 14;

/// One line of an SRL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrlToken {
    pub word: String,
    /// 0-based position of the predicate, when the line is flagged as a predicate.
    pub predicate: Option<usize>,
    pub labels: Vec<String>,
}

/// A sentence of an SRL file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SrlSentence {
    pub words: Vec<String>,
    /// Positions of the predicates of the sentence, in file order.
    pub predicates: Vec<usize>,
    /// Role labels of every token, one list per token.
    pub labels: Vec<Vec<String>>,
    /// The role labels grouped by column: one list per role, holding the label of every token for
    /// that role. The number of columns is the number of labels of the first token.
    pub role_columns: Vec<Vec<String>>,
}

/// Tab-separated lines where the word is the third field, a `Y` in the thirteenth field flags a
/// predicate and the role labels start at the fifteenth field. Lines starting with `;;` are
/// comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrlFormat {
    config: ParseConfig,
}

impl SrlFormat {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl SentenceFormat for SrlFormat {
    type Token = SrlToken;
    type Sentence = SrlSentence;

    fn parse_line(&self, line: usize, content: &str) -> Result<Option<SrlToken>, CorpusError> {
        if content.starts_with(COMMENT) {
            return Ok(None);
        }
        let fields: Vec<&str> = content.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(CorpusError::FieldCount {
                line,
                expected: MIN_FIELDS,
                found: fields.len(),
            });
        }
        let predicate = if fields[PREDICATE_FIELD] == "Y" {
            Some(predicate_index(line, fields[0])?)
        } else {
            None
        };
        let labels = fields
            .get(FIRST_ROLE_FIELD..)
            .unwrap_or_default()
            .iter()
            .map(|l| String::from(*l))
            .collect();
        Ok(Some(SrlToken {
            word: String::from(fields[WORD_FIELD]),
            predicate,
            labels,
        }))
    }

    fn close(&self, tokens: Vec<(usize, SrlToken)>) -> Result<SrlSentence, CorpusError> {
        let n_columns = tokens.first().map(|(_, t)| t.labels.len()).unwrap_or(0);
        let mut role_columns: Vec<Vec<String>> = vec![Vec::new(); n_columns];
        let mut sentence = SrlSentence::default();
        for (line, token) in tokens {
            let found = token.labels.len();
            if found != n_columns {
                if self.config.strict_columns {
                    return Err(CorpusError::RaggedColumns {
                        line,
                        expected: n_columns,
                        found,
                    });
                }
                warn!(
                    line,
                    expected = n_columns,
                    found,
                    "Token does not have as many role columns as the first token of its sentence"
                );
            }
            // Extra labels are dropped, missing ones leave their column short.
            for (column, label) in role_columns.iter_mut().zip(token.labels.iter()) {
                column.push(label.clone());
            }
            sentence.words.push(token.word);
            sentence.predicates.extend(token.predicate);
            sentence.labels.push(token.labels);
        }
        sentence.role_columns = role_columns;
        Ok(sentence)
    }
}

fn predicate_index(line: usize, value: &str) -> Result<usize, CorpusError> {
    match value.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index - 1),
        _ => Err(CorpusError::PredicateIndex {
            line,
            value: String::from(value),
        }),
    }
}

pub type SrlSentences<R> = Sentences<R, SrlFormat>;

/// Lazily parses the sentences of an SRL reader.
pub fn parse_srl<R: BufRead>(reader: R, config: ParseConfig) -> SrlSentences<R> {
    Sentences::new(reader, SrlFormat::new(config))
}

/// An SRL file on disk. Every call to `sentences` re-opens the file and parses it from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrlFile {
    path: PathBuf,
    config: ParseConfig,
}

impl SrlFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(path, ParseConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: ParseConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sentences(&self) -> Result<SrlSentences<BufReader<File>>, CorpusError> {
        debug!(path = %self.path.display(), config = %self.config, "parsing SRL file");
        let file = File::open(&self.path)?;
        Ok(parse_srl(BufReader::new(file), self.config))
    }
}

/// Every sentence of an SRL file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SrlCorpus(Vec<SrlSentence>);

impl SrlCorpus {
    /// Splits the corpus into three parallel sequences: the words, the predicate positions and
    /// the role columns of every sentence.
    #[allow(clippy::type_complexity)]
    pub fn into_parallel(self) -> (Vec<Vec<String>>, Vec<Vec<usize>>, Vec<Vec<Vec<String>>>) {
        let mut words = Vec::with_capacity(self.0.len());
        let mut predicates = Vec::with_capacity(self.0.len());
        let mut columns = Vec::with_capacity(self.0.len());
        for sentence in self.0 {
            words.push(sentence.words);
            predicates.push(sentence.predicates);
            columns.push(sentence.role_columns);
        }
        (words, predicates, columns)
    }
}

impl Deref for SrlCorpus {
    type Target = Vec<SrlSentence>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<SrlSentence> for SrlCorpus {
    fn from_iter<T: IntoIterator<Item = SrlSentence>>(iter: T) -> Self {
        SrlCorpus(iter.into_iter().collect())
    }
}

/// Reads every sentence of an SRL file.
pub fn read_srl<P: AsRef<Path>>(path: P, config: ParseConfig) -> Result<SrlCorpus, CorpusError> {
    SrlFile::with_config(path, config).sentences()?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Builds a line with the word, the predicate flag and the role labels at their positions.
    fn srl_line(id: usize, word: &str, predicate: bool, labels: &[&str]) -> String {
        let mut fields = vec![id.to_string(), String::from("_"), String::from(word)];
        fields.extend((3..PREDICATE_FIELD).map(|_| String::from("_")));
        fields.push(String::from(if predicate { "Y" } else { "_" }));
        fields.push(String::from("lemma"));
        fields.extend(labels.iter().map(|l| String::from(*l)));
        fields.join("\t")
    }

    fn parse(content: &str, config: ParseConfig) -> Result<Vec<SrlSentence>, CorpusError> {
        parse_srl(content.as_bytes(), config).collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| String::from(*v)).collect()
    }

    #[test]
    fn test_parse_srl() {
        let content = [
            String::from(";; first sentence"),
            srl_line(1, "John", false, &["A0", "_"]),
            srl_line(2, "ate", true, &["V", "A1"]),
            srl_line(3, "apples", false, &["A1", "_"]),
            String::new(),
            srl_line(1, "Rain", false, &[]),
        ]
        .join("\n");
        let sentences = parse(&content, ParseConfig::default()).unwrap();
        assert_eq!(sentences.len(), 2);
        let first = &sentences[0];
        assert_eq!(first.words, strings(&["John", "ate", "apples"]));
        assert_eq!(first.predicates, vec![1]);
        assert_eq!(first.labels[1], strings(&["V", "A1"]));
        assert_eq!(
            first.role_columns,
            vec![strings(&["A0", "V", "A1"]), strings(&["_", "A1", "_"])]
        );
        assert_eq!(sentences[1].words, strings(&["Rain"]));
        assert!(sentences[1].role_columns.is_empty());
    }

    #[test]
    fn test_blank_line_without_tokens_yields_empty_sentence() {
        let content = format!("{}\n\n\n", srl_line(1, "Go", true, &["V"]));
        let sentences = parse(&content, ParseConfig::default()).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], SrlSentence::default());
    }

    #[test]
    fn test_ragged_columns_are_kept_by_default() {
        let content = [
            srl_line(1, "a", false, &["A0", "A1"]),
            srl_line(2, "b", false, &["V"]),
            srl_line(3, "c", false, &["A2", "A3", "A4"]),
        ]
        .join("\n");
        let sentences = parse(&content, ParseConfig::default()).unwrap();
        assert_eq!(
            sentences[0].role_columns,
            vec![strings(&["A0", "V", "A2"]), strings(&["A1", "A3"])]
        );
        assert_eq!(sentences[0].labels[2].len(), 3);
    }

    #[test]
    fn test_ragged_columns_fail_when_strict() {
        let content = [
            srl_line(1, "a", false, &["A0", "A1"]),
            srl_line(2, "b", false, &["V"]),
        ]
        .join("\n");
        let config = ParseConfig {
            strict_columns: true,
        };
        assert!(matches!(
            parse(&content, config),
            Err(CorpusError::RaggedColumns {
                line: 2,
                expected: 2,
                found: 1
            })
        ));
    }

    #[rstest]
    #[case("0")]
    #[case("-3")]
    #[case("first")]
    fn test_bad_predicate_index(#[case] id: &str) {
        let line = srl_line(1, "ate", true, &["V"]).replacen('1', id, 1);
        assert!(matches!(
            parse(&line, ParseConfig::default()),
            Err(CorpusError::PredicateIndex { line: 1, value }) if value == id
        ));
    }

    #[test]
    fn test_too_few_fields() {
        let content = "1\t_\tword\t_\t_";
        assert!(matches!(
            parse(content, ParseConfig::default()),
            Err(CorpusError::FieldCount {
                line: 1,
                expected: 13,
                found: 5
            })
        ));
    }

    #[test]
    fn test_into_parallel() {
        let content = [
            srl_line(1, "John", false, &["A0"]),
            srl_line(2, "runs", true, &["V"]),
            String::new(),
            srl_line(1, "Stop", true, &["V"]),
        ]
        .join("\n");
        let corpus: SrlCorpus = parse_srl(content.as_bytes(), ParseConfig::default())
            .collect::<Result<_, _>>()
            .unwrap();
        let (words, predicates, columns) = corpus.into_parallel();
        assert_eq!(words, vec![strings(&["John", "runs"]), strings(&["Stop"])]);
        assert_eq!(predicates, vec![vec![1], vec![0]]);
        assert_eq!(
            columns,
            vec![vec![strings(&["A0", "V"])], vec![strings(&["V"])]]
        );
    }
}
