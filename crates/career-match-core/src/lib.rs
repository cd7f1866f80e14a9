//! Career match core library.
//! Questionnaire answers -> normalized trait vector -> cosine ranking against an expert corpus.

pub mod aggregate;
pub mod answers;
pub mod config;
pub mod corpus;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod scorer;
pub mod similarity;
pub mod vector;
pub mod vectorize;

pub use aggregate::{aggregate, AggregateOptions, RankedEntry, SupportRow, DEFAULT_SUPPORT_SIZE, DEFAULT_TOP_K};
pub use answers::{AnswerSet, AnswerValue, RankedPick};
pub use self::config::MatchConfig;
pub use corpus::{build_corpus, CorpusOptions, CorpusShape, CorpusSource, ReferenceCorpus, SourceRecord};
pub use error::{ConfigError, CorpusError, LoadError};
pub use mapping::{LikertItem, Polarity, QuestionMapping, SjtWeights};
pub use schema::TraitSchema;
pub use scorer::{CareerMatcher, MatcherOptions, MatcherSummary, ScoreDebug, ScoreResult, EMPTY_CORPUS_MESSAGE};
pub use similarity::{cosine, cosine_scores};
pub use vector::{RowMatrix, TraitVector};
pub use vectorize::{accumulate, parse_likert, vectorize, AnswerOutcome, AnswerTally, LikertParse, Vectorized};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
