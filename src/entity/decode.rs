/**
This module renders a tagged sequence as human readable text, wrapping every entity as
`<token token:TYPE>`.
*/
use crate::config::TagFormat;
use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The tokens and the tags do not have the same length.
    InconsistentLength(usize, usize),
    /// A `B` tag without an entity type.
    MissingType(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InconsistentLength(tokens, tags) => write!(
                f,
                "Inconsistent length between the tokens ({}) and the tags ({})",
                tokens, tags
            ),
            Self::MissingType(tag) => write!(f, "The tag {} does not contain an entity type", tag),
        }
    }
}

impl Error for DecodeError {}

/// Renders `tokens` with their entities bracketed, using tags such as `B-PER` and `I-PER`.
///
/// # Example
/// ```rust
/// use spaneval::decode;
///
/// let tokens = ["John", "Smith", "works", "at", "Apple"];
/// let tags = ["B-PER", "I-PER", "O", "O", "B-ORG"];
/// assert_eq!(decode(&tokens, &tags).unwrap(), "<John Smith:PER> works at <Apple:ORG>");
/// ```
pub fn decode<T: AsRef<str>, S: AsRef<str>>(tokens: &[T], tags: &[S]) -> Result<String, DecodeError> {
    decode_with(tokens, tags, TagFormat::PREFIX_DASH)
}

/// Same as `decode`, with a custom tag layout. The marker is read from its side of the tag and
/// the type is the field right next to it.
///
/// An `I` tag is appended to the open entity without checking that its type matches the type of
/// the entity. Any tag other than `B` or `I` closes the open entity.
pub fn decode_with<T: AsRef<str>, S: AsRef<str>>(
    tokens: &[T],
    tags: &[S],
    format: TagFormat,
) -> Result<String, DecodeError> {
    if tokens.len() != tags.len() {
        return Err(DecodeError::InconsistentLength(tokens.len(), tags.len()));
    }
    let mut result = String::new();
    let mut open_type: Option<&str> = None;
    for (token, tag) in tokens.iter().zip(tags.iter()) {
        let (token, tag) = (token.as_ref(), tag.as_ref());
        let (marker, kind) = split_tag(tag, format);
        match marker {
            "B" => {
                if let Some(open) = open_type {
                    close(&mut result, open);
                }
                let kind = kind.ok_or_else(|| DecodeError::MissingType(String::from(tag)))?;
                open_type = Some(kind);
                result.push_str(" <");
                result.push_str(token);
            }
            "I" => {
                result.push(' ');
                result.push_str(token);
            }
            _ => {
                if let Some(open) = open_type.take() {
                    close(&mut result, open);
                }
                result.push(' ');
                result.push_str(token);
            }
        }
    }
    if let Some(open) = open_type {
        close(&mut result, open);
    }
    Ok(String::from(result.trim()))
}

fn close(result: &mut String, kind: &str) {
    result.push(':');
    result.push_str(kind);
    result.push('>');
}

/// Returns the marker and, if present, the type of a tag.
fn split_tag(tag: &str, format: TagFormat) -> (&str, Option<&str>) {
    if format.suffix {
        let mut parts = tag.rsplit(format.delimiter);
        let marker = parts.next().unwrap_or_default();
        (marker, parts.next())
    } else {
        let mut parts = tag.split(format.delimiter);
        let marker = parts.next().unwrap_or_default();
        (marker, parts.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec!["John", "Smith", "works"], vec!["B-PER", "I-PER", "O"], "<John Smith:PER> works")]
    #[case(vec!["in", "New", "York"], vec!["O", "B-LOC", "I-LOC"], "in <New York:LOC>")]
    #[case(vec!["Paris", "London"], vec!["B-LOC", "B-LOC"], "<Paris:LOC> <London:LOC>")]
    #[case(vec!["New", "York", "Ada"], vec!["B-LOC", "I-LOC", "B-PER"], "<New York:LOC> <Ada:PER>")]
    #[case(vec!["a", "b"], vec!["O", "O"], "a b")]
    #[case(vec![], vec![], "")]
    fn test_decode(#[case] tokens: Vec<&str>, #[case] tags: Vec<&str>, #[case] expected: &str) {
        assert_eq!(decode(&tokens, &tags).unwrap(), expected)
    }

    #[test]
    fn test_inside_does_not_check_type() {
        let tokens = ["Bank", "of", "Paris"];
        let tags = ["B-ORG", "I-LOC", "I-LOC"];
        assert_eq!(decode(&tokens, &tags).unwrap(), "<Bank of Paris:ORG>");
    }

    #[test]
    fn test_inside_without_open_entity_is_plain() {
        let tokens = ["the", "Smith"];
        let tags = ["O", "I-PER"];
        assert_eq!(decode(&tokens, &tags).unwrap(), "the Smith");
    }

    #[test]
    fn test_decode_with_suffix_format() {
        let tokens = ["Ada", "Lovelace", "wrote"];
        let tags = ["PER_B", "PER_I", "O"];
        let actual = decode_with(&tokens, &tags, TagFormat::SUFFIX_UNDERSCORE).unwrap();
        assert_eq!(actual, "<Ada Lovelace:PER> wrote");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            decode(&["a", "b"], &["O"]),
            Err(DecodeError::InconsistentLength(2, 1))
        );
        assert_eq!(
            decode(&["a"], &["B"]),
            Err(DecodeError::MissingType(String::from("B")))
        );
    }
}
