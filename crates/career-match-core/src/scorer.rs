//! Scoring facade: answers -> trait vector -> similarities -> ranked roles.
//!
//! A `CareerMatcher` owns the validated mapping and the reference corpus. It is immutable once
//! built, so one instance can be shared behind `Arc` by any number of concurrent requests.
//! Reloading means building a new matcher and swapping the `Arc`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{aggregate, AggregateOptions, RankedEntry, DEFAULT_SUPPORT_SIZE, DEFAULT_TOP_K};
use crate::answers::AnswerSet;
use crate::config::MatchConfig;
use crate::corpus::{build_corpus, CorpusShape, CorpusSource, ReferenceCorpus};
use crate::error::LoadError;
use crate::mapping::QuestionMapping;
use crate::similarity::cosine_scores;
use crate::vector::TraitVector;
use crate::vectorize::{vectorize, AnswerTally};

pub const EMPTY_CORPUS_MESSAGE: &str = "No expert vectors loaded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherOptions {
    /// Used when a request gives no `top_k`, or a non-positive one.
    pub default_top_k: usize,
    pub support_size: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            support_size: DEFAULT_SUPPORT_SIZE,
        }
    }
}

/// Diagnostics attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDebug {
    #[serde(flatten)]
    pub answers: AnswerTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub traits: Vec<String>,
    pub user_vector: TraitVector,
    pub top: Vec<RankedEntry>,
    pub debug: ScoreDebug,
}

/// Corpus facts for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatcherSummary {
    pub experts: usize,
    pub traits: usize,
    pub labeled: bool,
    pub categories: usize,
    pub shape: CorpusShape,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CareerMatcher {
    mapping: QuestionMapping,
    corpus: ReferenceCorpus,
    options: MatcherOptions,
    built_at: DateTime<Utc>,
}

impl CareerMatcher {
    pub fn new(mapping: QuestionMapping, corpus: ReferenceCorpus, options: MatcherOptions) -> Self {
        assert_eq!(
            mapping.schema().dim(),
            corpus.dim(),
            "corpus width does not match trait schema"
        );
        Self {
            mapping,
            corpus,
            options,
            built_at: Utc::now(),
        }
    }

    /// Read the mapping and corpus named by `config` and build a matcher.
    pub fn load(config: &MatchConfig) -> Result<Self, LoadError> {
        let mapping = QuestionMapping::from_path(&config.mapping_path)?;
        let source = CorpusSource::from_path(&config.corpus_path)?;
        let corpus = build_corpus(&source, &mapping, &config.corpus_options())?;
        if corpus.is_empty() {
            tracing::warn!(path = %config.corpus_path, "{}", EMPTY_CORPUS_MESSAGE);
        }
        Ok(Self::new(mapping, corpus, config.matcher_options()))
    }

    pub fn mapping(&self) -> &QuestionMapping {
        &self.mapping
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    pub fn options(&self) -> MatcherOptions {
        self.options
    }

    pub fn summary(&self) -> MatcherSummary {
        MatcherSummary {
            experts: self.corpus.len(),
            traits: self.mapping.schema().dim(),
            labeled: self.corpus.is_labeled(),
            categories: self.corpus.category_count(),
            shape: self.corpus.shape(),
            built_at: self.built_at,
        }
    }

    /// `None`, zero or negative fall back to the configured default.
    pub fn resolve_top_k(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(k) if k > 0 => usize::try_from(k).unwrap_or(usize::MAX),
            _ => self.options.default_top_k,
        }
    }

    /// Score one answer set. Always returns a structurally valid result.
    pub fn score(&self, answers: &AnswerSet, top_k: Option<i64>) -> ScoreResult {
        let traits = self.mapping.schema().traits().to_vec();
        let out = vectorize(answers, &self.mapping);

        if self.corpus.is_empty() {
            return ScoreResult {
                traits,
                user_vector: out.vector,
                top: Vec::new(),
                debug: ScoreDebug {
                    answers: out.tally,
                    message: Some(EMPTY_CORPUS_MESSAGE.to_string()),
                },
            };
        }

        let scores = cosine_scores(&out.vector, &self.corpus);
        let options = AggregateOptions {
            top_k: self.resolve_top_k(top_k),
            support_size: self.options.support_size,
        };
        let top = aggregate(&scores, &self.corpus, &options);

        tracing::debug!(
            answered = answers.len(),
            applied = out.tally.applied,
            ignored = out.tally.ignored(),
            ranked = top.len(),
            "scored answer set"
        );

        ScoreResult {
            traits,
            user_vector: out.vector,
            top,
            debug: ScoreDebug {
                answers: out.tally,
                message: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping() -> QuestionMapping {
        QuestionMapping::from_value(json!({
            "TRAITS": ["debug", "data"],
            "FC_MAP": {"FC01": {"1": "debug", "2": "data"}},
            "LI_MAP": {},
            "SJT_MAP": {},
            "SJT_WEIGHTS": {"best": 2, "second": 1}
        }))
        .unwrap()
    }

    fn matcher(rows: &[Vec<f64>], labels: Option<Vec<String>>) -> CareerMatcher {
        CareerMatcher::new(
            mapping(),
            ReferenceCorpus::from_rows(2, rows, labels),
            MatcherOptions::default(),
        )
    }

    #[test]
    fn top_k_resolution() {
        let m = matcher(&[vec![1.0, 0.0]], None);
        assert_eq!(m.resolve_top_k(None), 5);
        assert_eq!(m.resolve_top_k(Some(0)), 5);
        assert_eq!(m.resolve_top_k(Some(-3)), 5);
        assert_eq!(m.resolve_top_k(Some(2)), 2);
    }

    #[test]
    fn scores_against_labeled_corpus() {
        let m = matcher(
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            Some(vec!["Debugger".into(), "Analyst".into(), "Debugger".into()]),
        );
        let mut answers = AnswerSet::new();
        answers.insert_choice("FC01", "1");
        let result = m.score(&answers, None);
        assert_eq!(result.traits, vec!["debug", "data"]);
        assert_eq!(result.user_vector.as_slice(), &[1.0, 0.0]);
        assert_eq!(result.top.len(), 2);
        assert_eq!(result.top[0].category, "Debugger");
        assert_eq!(result.top[0].support.len(), 2);
        assert_eq!(result.top[0].support[0].row_index, 0);
        assert_eq!(result.debug.answers.applied, 1);
        assert!(result.debug.message.is_none());
    }

    #[test]
    fn empty_corpus_returns_vector_and_note() {
        let m = CareerMatcher::new(mapping(), ReferenceCorpus::empty(2), MatcherOptions::default());
        let mut answers = AnswerSet::new();
        answers.insert_choice("FC01", "2");
        let result = m.score(&answers, Some(3));
        assert_eq!(result.user_vector.as_slice(), &[0.0, 1.0]);
        assert!(result.top.is_empty());
        assert_eq!(result.debug.message.as_deref(), Some(EMPTY_CORPUS_MESSAGE));

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["debug"]["message"], EMPTY_CORPUS_MESSAGE);
        assert_eq!(v["debug"]["applied"], 1);
        assert_eq!(v["user_vector"], json!([0.0, 1.0]));
    }

    #[test]
    fn summary_reports_corpus_facts() {
        let m = matcher(
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            Some(vec!["A".into(), "A".into()]),
        );
        let s = m.summary();
        assert_eq!(s.experts, 2);
        assert_eq!(s.traits, 2);
        assert!(s.labeled);
        assert_eq!(s.categories, 1);
    }

    #[test]
    fn matcher_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CareerMatcher>();
    }
}
