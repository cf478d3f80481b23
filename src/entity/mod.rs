use crate::config::TagFormat;
use ahash::AHashSet;
use std::{
    borrow::{Borrow, Cow},
    fmt::Display,
    ops::Deref,
};

pub(crate) mod decode;
mod tag;

// Re-exporting
pub use tag::{Marker, ParsingError};
pub(crate) use tag::{Tag, OUTSIDE};

/// A span represents a named entity in a sequence. It contains its length, the index at which it
/// starts and its type (such as `LOC`, `PER`, `ORG`, etc.). Two spans are equal only if the three
/// fields are equal.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span<'a> {
    pub len: usize,
    pub start: usize,
    pub tag: Cow<'a, str>,
}

impl<'a> Span<'a> {
    pub fn new(len: usize, start: usize, tag: impl Into<Cow<'a, str>>) -> Self {
        Span {
            len,
            start,
            tag: tag.into(),
        }
    }

    /// Detaches the span from the sequence it was extracted from.
    pub fn into_owned(self) -> Span<'static> {
        Span {
            len: self.len,
            start: self.start,
            tag: Cow::Owned(self.tag.into_owned()),
        }
    }

    pub fn as_tuple(&self) -> (usize, usize, &str) {
        (self.len, self.start, self.tag.borrow())
    }
}

impl<'a> Display for Span<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.len, self.start, self.tag)
    }
}

/// The spans of a single sequence, ordered by start index.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Spans<'a>(Vec<Span<'a>>);

impl<'a> Deref for Spans<'a> {
    type Target = Vec<Span<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for Spans<'a> {
    type Item = Span<'a>;
    type IntoIter = std::vec::IntoIter<Span<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> From<Vec<Span<'a>>> for Spans<'a> {
    fn from(value: Vec<Span<'a>>) -> Self {
        Spans(value)
    }
}

impl<'a> Spans<'a> {
    /// Filters the spans for a given tag name.
    ///
    /// * `tag_name`: Only the spans whose tag is equal to `tag_name` are returned.
    pub fn filter<S: AsRef<str>>(&self, tag_name: S) -> impl Iterator<Item = &Span<'a>> {
        let tag_name = String::from(tag_name.as_ref());
        self.iter().filter(move |s| s.tag == tag_name.as_str())
    }

    pub fn unique_tags(&self) -> AHashSet<&str> {
        AHashSet::from_iter(self.iter().map(|s| s.tag.borrow()))
    }
}

/// The span currently being built.
#[derive(Debug)]
struct OpenSpan<'a> {
    start: usize,
    tag: &'a str,
    len: usize,
}

impl<'a> OpenSpan<'a> {
    fn close(self) -> Span<'a> {
        Span::new(self.len, self.start, self.tag)
    }
}

/// State threaded through the tags of a sequence while extracting its spans.
#[derive(Debug, Default)]
struct SpanState<'a> {
    /// The span being built, if any.
    open: Option<OpenSpan<'a>>,
    /// Index of the last `B` tag. It outlives the span it started.
    start: usize,
    /// Marker of the previous tag. `None` when the previous tag was `O`.
    prev_marker: Option<Marker>,
    /// Type of the previous tag. `None` when the previous tag was `O`.
    prev_type: Option<&'a str>,
    spans: Vec<Span<'a>>,
}

impl<'a> SpanState<'a> {
    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            self.spans.push(open.close());
        }
    }

    fn step(&mut self, index: usize, tag: Tag<'a>) {
        let (kind, marker) = match tag {
            Tag::Outside => {
                self.flush();
                self.prev_marker = None;
                self.prev_type = None;
                return;
            }
            Tag::Entity { kind, marker } => (kind, marker),
        };
        if marker == Marker::B {
            self.flush();
            self.start = index;
            self.open = Some(OpenSpan {
                start: index,
                tag: kind,
                len: 1,
            });
        }
        // Checked against the previous tag, before it is overwritten below.
        let continues = matches!(self.prev_marker, Some(Marker::B) | Some(Marker::I))
            && marker == Marker::I
            && self.prev_type == Some(kind);
        if continues {
            match self.open.as_mut() {
                Some(open) => open.len += 1,
                None => {
                    self.open = Some(OpenSpan {
                        start: self.start,
                        tag: kind,
                        len: 1,
                    })
                }
            }
        }
        self.prev_marker = Some(marker);
        self.prev_type = Some(kind);
    }

    fn finish(mut self) -> Spans<'a> {
        self.flush();
        Spans(self.spans)
    }
}

/// Extracts the entity spans of a single sequence of tags, in order of their start index.
///
/// A `B` tag always starts a new span. An `I` tag extends the open span only when the previous tag
/// is a `B` or an `I` of the same type; otherwise it is dropped.
///
/// * `tags`: The tags of a single sentence, such as `["PER_B", "PER_I", "O"]`.
/// * `format`: Layout of the tags.
///
/// # Example
/// ```rust
/// use spaneval::{extract_spans, Span, TagFormat};
///
/// let tags = ["PER_B", "PER_I", "O", "LOC_B"];
/// let spans = extract_spans(&tags, TagFormat::default()).unwrap();
/// assert_eq!(*spans, vec![Span::new(2, 0, "PER"), Span::new(1, 3, "LOC")]);
/// ```
pub fn extract_spans<S: AsRef<str>>(
    tags: &[S],
    format: TagFormat,
) -> Result<Spans<'_>, ParsingError> {
    let mut state = SpanState::default();
    for (index, raw) in tags.iter().enumerate() {
        let tag = Tag::try_new(raw.as_ref(), format)?;
        state.step(index, tag);
    }
    Ok(state.finish())
}
