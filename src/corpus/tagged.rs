use super::{CorpusError, SentenceFormat, Sentences};
use crate::entity::OUTSIDE;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::debug;

const FIELDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub tag: String,
}

/// A sentence of a token/tag file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedSentence(Vec<TaggedToken>);

impl TaggedSentence {
    pub fn tokens(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.token.as_str()).collect()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.tag.as_str()).collect()
    }
}

impl Deref for TaggedSentence {
    type Target = Vec<TaggedToken>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<TaggedToken>> for TaggedSentence {
    fn from(value: Vec<TaggedToken>) -> Self {
        TaggedSentence(value)
    }
}

impl IntoIterator for TaggedSentence {
    type Item = TaggedToken;
    type IntoIter = std::vec::IntoIter<TaggedToken>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Lines made of an id, a token and a tag, separated by tabs. A `-` tag is read as `O`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedFormat;

impl SentenceFormat for TaggedFormat {
    type Token = TaggedToken;
    type Sentence = TaggedSentence;

    fn parse_line(&self, line: usize, content: &str) -> Result<Option<TaggedToken>, CorpusError> {
        let fields: Vec<&str> = content.split('\t').collect();
        match fields.as_slice() {
            [_, token, tag] => {
                let tag = if *tag == "-" { OUTSIDE } else { *tag };
                Ok(Some(TaggedToken {
                    token: String::from(*token),
                    tag: String::from(tag),
                }))
            }
            _ => Err(CorpusError::FieldCount {
                line,
                expected: FIELDS,
                found: fields.len(),
            }),
        }
    }

    fn close(&self, tokens: Vec<(usize, TaggedToken)>) -> Result<TaggedSentence, CorpusError> {
        Ok(TaggedSentence(tokens.into_iter().map(|(_, t)| t).collect()))
    }
}

pub type TaggedSentences<R> = Sentences<R, TaggedFormat>;

/// Lazily parses the sentences of a token/tag reader.
///
/// # Example
/// ```rust
/// use spaneval::parse_tagged;
///
/// let content = "1\tJohn\tPER_B\n2\tsleeps\t-\n\n1\tHi\tO\n";
/// let sentences = parse_tagged(content.as_bytes())
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(sentences.len(), 2);
/// assert_eq!(sentences[0].tags(), vec!["PER_B", "O"]);
/// ```
pub fn parse_tagged<R: BufRead>(reader: R) -> TaggedSentences<R> {
    Sentences::new(reader, TaggedFormat)
}

/// A token/tag file on disk. Every call to `sentences` re-opens the file and parses it from the
/// start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    path: PathBuf,
}

impl TaggedFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sentences(&self) -> Result<TaggedSentences<BufReader<File>>, CorpusError> {
        debug!(path = %self.path.display(), "parsing token/tag file");
        let file = File::open(&self.path)?;
        Ok(parse_tagged(BufReader::new(file)))
    }
}

/// Reads every sentence of a token/tag file.
pub fn read_tagged<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedSentence>, CorpusError> {
    TaggedFile::new(path).sentences()?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn token(token: &str, tag: &str) -> TaggedToken {
        TaggedToken {
            token: String::from(token),
            tag: String::from(tag),
        }
    }

    #[test]
    fn test_parse_tagged() {
        let content = "1\tAda\tPER_B\n2\tLovelace\tPER_I\n3\twrote\t-\n\n1\tin\tO\n2\tLondon\tLOC_B\n\n";
        let sentences: Vec<TaggedSentence> = parse_tagged(content.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(
            *sentences[0],
            vec![
                token("Ada", "PER_B"),
                token("Lovelace", "PER_I"),
                token("wrote", "O")
            ]
        );
        assert_eq!(sentences[1].tokens(), vec!["in", "London"]);
        assert_eq!(sentences[1].tags(), vec!["O", "LOC_B"]);
    }

    #[test]
    fn test_remainder_is_flushed() {
        let content = "1\tAda\tPER_B\n\n1\tParis\tLOC_B";
        let sentences: Vec<TaggedSentence> = parse_tagged(content.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].tags(), vec!["LOC_B"]);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let content = "  1\tAda\tPER_B  \r\n   \n";
        let sentences: Vec<TaggedSentence> = parse_tagged(content.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(sentences, vec![TaggedSentence::from(vec![token("Ada", "PER_B")])]);
    }

    #[rstest]
    #[case("1\tAda\n", 2)]
    #[case("1\tAda\tPER_B\textra\n", 4)]
    #[case("Ada PER_B\n", 1)]
    fn test_wrong_field_count(#[case] line: &str, #[case] found: usize) {
        let content = format!("1\tok\tO\n{}", line);
        let results: Vec<Result<TaggedSentence, CorpusError>> =
            parse_tagged(content.as_bytes()).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(CorpusError::FieldCount { line: 2, expected: 3, found: f }) if f == found
        ));
    }

    #[test]
    fn test_missing_file() {
        let file = TaggedFile::new("this/file/does/not/exist.tsv");
        assert!(matches!(file.sentences(), Err(CorpusError::Io(_))));
        assert!(matches!(
            read_tagged("this/file/does/not/exist.tsv"),
            Err(CorpusError::Io(_))
        ));
    }
}
