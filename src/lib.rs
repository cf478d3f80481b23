/*!
This library evaluates named entity predictions at the entity level. It reads annotated corpora,
extracts the entity spans of tagged sentences and scores predicted spans against gold spans with
exact matching.

# Tags
A tag is either `O`, for a token outside of any entity, or an entity type and a marker joined by a
delimiter. The marker is `B` for the first token of an entity and `I` for the following ones. The
annotation files use the `PER_B` layout (type first, `_` delimiter); the bracket decoder uses the
`B-PER` layout. Both are described by a `TagFormat`.

# Terminology
* A span is an entity found in a sentence: its length, the index of its first token and its type.
  Two spans match only if the three are equal.
* A batch is a list of sentences flattened into a single buffer. Each sentence takes
  `padded_len` slots of the buffer, of which only the first `true_len` are tags; the rest is
  padding and is never read.
* The support of an entity type is its number of gold spans.

# Example
```rust
use spaneval::{score_sentences, EvalConfig};

let gold = vec![vec!["PER_B", "PER_I", "O"], vec!["O", "LOC_B"]];
let pred = vec![vec!["PER_B", "PER_I", "O"], vec!["O", "O"]];
let (precision, recall, f1): (f32, f32, f32) = score_sentences(&gold, &pred, &EvalConfig::default())
    .unwrap()
    .into();
assert_eq!((precision, recall), (1.0, 0.5));
assert!((f1 - 2.0 / 3.0).abs() < 1e-6);
```
*/

mod config;
mod corpus;
mod datastructure;
mod encoding;
mod entity;
mod metrics;
mod reporter;

// The public api starts here
pub use config::{EvalConfig, EvalConfigBuilder, ParseConfig, TagFormat};

pub use corpus::{
    srl::{
        parse_srl, read_srl, SrlCorpus, SrlFile, SrlFormat, SrlSentence, SrlSentences, SrlToken,
    },
    tagged::{
        parse_tagged, read_tagged, TaggedFile, TaggedFormat, TaggedSentence, TaggedSentences,
        TaggedToken,
    },
    CorpusError, SentenceFormat, Sentences,
};

pub use datastructure::{BatchError, PaddedBatch, VecsIter};

pub use encoding::{one_hot, one_hot_batch, EncodingError};

pub use entity::{
    decode::{decode, decode_with, DecodeError},
    extract_spans, Marker, ParsingError, Span, Spans,
};

pub use metrics::{
    classification_report, score_batch, score_sentences, ComputationError, DivByZeroStrat,
    DivisionByZeroError, EntityScores, InconsistentLengthError, ParsingDivisionByZeroStrategyError,
    SpanCounts,
};

pub use reporter::{Average, ClassMetrics, OverallAverage, Reporter};
