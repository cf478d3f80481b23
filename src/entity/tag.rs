/**
This module parses the raw tags of a sequence (`"PER_B"`, `"LOC_I"`, `"O"`, ...) into a marker and
an entity type.
*/
use crate::config::TagFormat;
use enum_iterator::Sequence;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// The tag marking a token outside of any entity.
pub(crate) const OUTSIDE: &str = "O";

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Sequence)]
/// The marker tells us where a token sits in an entity: `B` begins an entity and `I` continues
/// it. All markers are a single ascii character.
pub enum Marker {
    B,
    I,
}

impl FromStr for Marker {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Self::B),
            "I" => Ok(Self::I),
            _ => Err(ParsingError::UnknownMarker(String::from(s))),
        }
    }
}

impl Marker {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Marker::B => "B",
            Marker::I => "I",
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Could not parse the string into a tag.
pub enum ParsingError {
    /// The tag is not `O` and does not split into exactly two parts around the delimiter.
    MalformedTag(String),
    /// The marker part of the tag is neither `B` nor `I`.
    UnknownMarker(String),
    EmptyTag,
}

impl Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedTag(s) => write!(
                f,
                "Could not split the following tag into a type and a marker: {}",
                s
            ),
            Self::UnknownMarker(s) => write!(
                f,
                "Could not parse the following string into a marker (expected `B` or `I`): {}",
                s
            ),
            Self::EmptyTag => write!(f, "Received an empty tag"),
        }
    }
}

impl Error for ParsingError {}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A parsed tag. The entity type borrows from the raw tag.
pub(crate) enum Tag<'a> {
    Outside,
    Entity { kind: &'a str, marker: Marker },
}

impl<'a> Tag<'a> {
    /// Parses a raw tag.
    ///
    /// * `token`: The raw tag, such as `"PER_B"` or `"O"`.
    /// * `format`: Where the marker is located and what delimiter separates it from the type.
    pub(crate) fn try_new(token: &'a str, format: TagFormat) -> Result<Self, ParsingError> {
        if token.is_empty() {
            return Err(ParsingError::EmptyTag);
        }
        if token == OUTSIDE {
            return Ok(Tag::Outside);
        }
        let mut parts = token.split(format.delimiter);
        let (first, second) = match (parts.next(), parts.next(), parts.next()) {
            (Some(first), Some(second), None) => (first, second),
            _ => return Err(ParsingError::MalformedTag(String::from(token))),
        };
        let (kind, marker) = if format.suffix {
            (first, second)
        } else {
            (second, first)
        };
        Ok(Tag::Entity {
            kind,
            marker: marker.parse()?,
        })
    }
}
