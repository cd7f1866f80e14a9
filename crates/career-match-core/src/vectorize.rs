//! Answer set -> trait vector.
//!
//! Forced-choice, Likert and situational answers add independent contributions into a zeroed
//! accumulator, which is then L2-normalized. Bad input never fails the call: every answer is
//! classified as applied, ignored-unknown or ignored-malformed and tallied for diagnostics.

use serde::Serialize;

use crate::answers::{AnswerSet, AnswerValue, RankedPick};
use crate::mapping::{LikertItem, OptionTable, QuestionMapping};
use crate::vector::TraitVector;

/// Contribution added for a recognised forced-choice option.
pub const FORCED_CHOICE_WEIGHT: f64 = 1.0;
/// Likert scale bounds and midpoint; `raw - midpoint` is the signed score.
pub const LIKERT_MIN: i64 = 1;
pub const LIKERT_MAX: i64 = 5;
pub const LIKERT_MIDPOINT: i64 = 3;

/// What happened to one answer (or one half of a situational pick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Applied,
    IgnoredMalformed,
    IgnoredUnknown,
}

/// Result of parsing a raw Likert answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikertParse {
    /// Signed score in `[-2, 2]`.
    Score(i64),
    Malformed,
}

/// Parse a Likert answer: trimmed integer in `[1, 5]`, shifted to `[-2, 2]`.
pub fn parse_likert(raw: &str) -> LikertParse {
    match raw.trim().parse::<i64>() {
        Ok(v) if (LIKERT_MIN..=LIKERT_MAX).contains(&v) => LikertParse::Score(v - LIKERT_MIDPOINT),
        _ => LikertParse::Malformed,
    }
}

/// Per-request counts of how answers were treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnswerTally {
    pub applied: usize,
    pub ignored_unknown: usize,
    pub ignored_malformed: usize,
}

impl AnswerTally {
    pub fn record(&mut self, outcome: AnswerOutcome) {
        match outcome {
            AnswerOutcome::Applied => self.applied += 1,
            AnswerOutcome::IgnoredUnknown => self.ignored_unknown += 1,
            AnswerOutcome::IgnoredMalformed => self.ignored_malformed += 1,
        }
    }

    pub fn ignored(&self) -> usize {
        self.ignored_unknown + self.ignored_malformed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vectorized {
    pub vector: TraitVector,
    pub tally: AnswerTally,
}

/// Normalized trait vector for `answers`. Zero stays zero when nothing contributed.
pub fn vectorize(answers: &AnswerSet, mapping: &QuestionMapping) -> Vectorized {
    let (mut vector, tally) = accumulate(answers, mapping);
    vector.normalize_in_place();
    Vectorized { vector, tally }
}

/// Raw accumulator before normalization.
pub fn accumulate(answers: &AnswerSet, mapping: &QuestionMapping) -> (TraitVector, AnswerTally) {
    let mut acc = TraitVector::zeros(mapping.schema().dim());
    let mut tally = AnswerTally::default();
    let weights = mapping.sjt_weights();

    for (question, value) in answers.iter() {
        let mut known = false;

        if let Some(table) = mapping.forced_choice().get(question) {
            known = true;
            tally.record(apply_forced_choice(&mut acc, table, value));
        }
        if let Some(item) = mapping.likert().get(question) {
            known = true;
            tally.record(apply_likert(&mut acc, *item, value));
        }
        if let Some(table) = mapping.situational().get(question) {
            known = true;
            match value {
                AnswerValue::Ranked(pick) => {
                    for outcome in apply_situational(&mut acc, table, pick, weights.best, weights.second) {
                        tally.record(outcome);
                    }
                }
                _ => tally.record(AnswerOutcome::IgnoredMalformed),
            }
        }

        if !known {
            tally.record(AnswerOutcome::IgnoredUnknown);
        }
    }

    (acc, tally)
}

fn apply_forced_choice(acc: &mut TraitVector, table: &OptionTable, value: &AnswerValue) -> AnswerOutcome {
    match value {
        AnswerValue::Choice(code) => match table.get(code.as_str()) {
            Some(&idx) => {
                acc.add(idx, FORCED_CHOICE_WEIGHT);
                AnswerOutcome::Applied
            }
            None => AnswerOutcome::IgnoredUnknown,
        },
        _ => AnswerOutcome::IgnoredMalformed,
    }
}

fn apply_likert(acc: &mut TraitVector, item: LikertItem, value: &AnswerValue) -> AnswerOutcome {
    let AnswerValue::Choice(raw) = value else {
        return AnswerOutcome::IgnoredMalformed;
    };
    match parse_likert(raw) {
        LikertParse::Score(score) => {
            acc.add(item.trait_index, item.polarity.sign() * score as f64);
            AnswerOutcome::Applied
        }
        LikertParse::Malformed => AnswerOutcome::IgnoredMalformed,
    }
}

/// Best adds `best_weight`; second adds `second_weight` unless it repeats best.
fn apply_situational(
    acc: &mut TraitVector,
    table: &OptionTable,
    pick: &RankedPick,
    best_weight: f64,
    second_weight: f64,
) -> Vec<AnswerOutcome> {
    let best = non_empty(pick.best.as_deref());
    let second = non_empty(pick.second.as_deref());
    let mut outcomes = Vec::with_capacity(2);

    if let Some(code) = best {
        outcomes.push(match table.get(code) {
            Some(&idx) => {
                acc.add(idx, best_weight);
                AnswerOutcome::Applied
            }
            None => AnswerOutcome::IgnoredUnknown,
        });
    }
    if let Some(code) = second {
        outcomes.push(if best == Some(code) {
            AnswerOutcome::IgnoredMalformed
        } else {
            match table.get(code) {
                Some(&idx) => {
                    acc.add(idx, second_weight);
                    AnswerOutcome::Applied
                }
                None => AnswerOutcome::IgnoredUnknown,
            }
        });
    }
    outcomes
}

/// Option codes match exactly; only an empty string counts as no pick.
fn non_empty(code: Option<&str>) -> Option<&str> {
    code.filter(|c| !c.is_empty())
}
