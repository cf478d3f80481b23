/**
Readers for the annotation files. Both formats have one token per line and separate their
sentences with blank lines; they only differ in how a line is split into fields and how the
tokens of a sentence are put together.
*/
use std::error::Error;
use std::fmt::Display;
use std::io::{BufRead, Lines};

pub(crate) mod srl;
pub(crate) mod tagged;

#[derive(Debug)]
pub enum CorpusError {
    Io(std::io::Error),
    /// A line does not have the expected number of tab-separated fields.
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// The first field of a predicate line is not a positive integer.
    PredicateIndex { line: usize, value: String },
    /// A token does not have as many role columns as the first token of its sentence.
    RaggedColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl Display for CorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Could not read the file: {}", err),
            Self::FieldCount {
                line,
                expected,
                found,
            } => write!(
                f,
                "Line {}: expected {} tab-separated fields, found {}",
                line, expected, found
            ),
            Self::PredicateIndex { line, value } => write!(
                f,
                "Line {}: the token index `{}` of a predicate is not a positive integer",
                line, value
            ),
            Self::RaggedColumns {
                line,
                expected,
                found,
            } => write!(
                f,
                "Line {}: expected {} role columns, found {}",
                line, expected, found
            ),
        }
    }
}

impl Error for CorpusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CorpusError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// A line-oriented annotation format. Lines are trimmed and blank lines are handled by
/// `Sentences`; the format only sees the non-blank ones.
pub trait SentenceFormat {
    type Token;
    type Sentence;

    /// Parses a single line. `Ok(None)` skips the line.
    fn parse_line(&self, line: usize, content: &str) -> Result<Option<Self::Token>, CorpusError>;

    /// Builds a sentence out of its tokens, each paired with its line number.
    fn close(&self, tokens: Vec<(usize, Self::Token)>) -> Result<Self::Sentence, CorpusError>;
}

/// Lazy iterator over the sentences of a reader. Consecutive blank lines yield empty sentences
/// and the tokens left at the end of the input are flushed as a last sentence. The iterator stops
/// after the first error.
pub struct Sentences<R, F> {
    lines: Lines<R>,
    line: usize,
    format: F,
    done: bool,
}

impl<R: BufRead, F: SentenceFormat> Sentences<R, F> {
    pub(crate) fn new(reader: R, format: F) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            format,
            done: false,
        }
    }

    fn close(&mut self, buffer: Vec<(usize, F::Token)>) -> Option<Result<F::Sentence, CorpusError>> {
        let sentence = self.format.close(buffer);
        if sentence.is_err() {
            self.done = true;
        }
        Some(sentence)
    }

    fn fail(&mut self, err: CorpusError) -> Option<Result<F::Sentence, CorpusError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead, F: SentenceFormat> Iterator for Sentences<R, F> {
    type Item = Result<F::Sentence, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buffer = Vec::new();
        loop {
            let raw = match self.lines.next() {
                Some(Ok(raw)) => raw,
                Some(Err(err)) => return self.fail(err.into()),
                None => {
                    self.done = true;
                    if buffer.is_empty() {
                        return None;
                    }
                    return self.close(buffer);
                }
            };
            self.line += 1;
            let content = raw.trim();
            if content.is_empty() {
                return self.close(buffer);
            }
            match self.format.parse_line(self.line, content) {
                Ok(Some(token)) => buffer.push((self.line, token)),
                Ok(None) => {}
                Err(err) => return self.fail(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Keeps the first character of every line, skipping `#` lines.
    struct FirstChar;

    impl SentenceFormat for FirstChar {
        type Token = char;
        type Sentence = Vec<(usize, char)>;

        fn parse_line(&self, line: usize, content: &str) -> Result<Option<char>, CorpusError> {
            match content.chars().next() {
                Some('#') => Ok(None),
                Some('!') => Err(CorpusError::FieldCount {
                    line,
                    expected: 1,
                    found: 0,
                }),
                c => Ok(c),
            }
        }

        fn close(&self, tokens: Vec<(usize, char)>) -> Result<Self::Sentence, CorpusError> {
            Ok(tokens)
        }
    }

    fn collect(input: &str) -> Vec<Result<Vec<(usize, char)>, String>> {
        Sentences::new(Cursor::new(input), FirstChar)
            .map(|s| s.map_err(|e| e.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_lines_split_sentences() {
        let actual = collect("a\nb\n\n  c  \n");
        assert_eq!(
            actual,
            vec![Ok(vec![(1, 'a'), (2, 'b')]), Ok(vec![(4, 'c')])]
        );
    }

    #[test]
    fn test_consecutive_blank_lines_yield_empty_sentences() {
        let actual = collect("a\n\n\nb\n\n");
        assert_eq!(
            actual,
            vec![Ok(vec![(1, 'a')]), Ok(vec![]), Ok(vec![(4, 'b')])]
        );
    }

    #[test]
    fn test_skipped_lines_keep_their_number() {
        let actual = collect("# comment\na\n");
        assert_eq!(actual, vec![Ok(vec![(2, 'a')])]);
    }

    #[test]
    fn test_stops_after_first_error() {
        let actual = collect("a\n!\nb\n\nc\n");
        assert_eq!(
            actual,
            vec![Err(String::from(
                "Line 2: expected 1 tab-separated fields, found 0"
            ))]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").is_empty());
    }
}
