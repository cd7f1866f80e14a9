//! Answer sets as submitted by the questionnaire front end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Best / second-best pick for a situational question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPick {
    #[serde(default)]
    pub best: Option<String>,
    #[serde(default)]
    pub second: Option<String>,
}

/// One answer value. Anything that is neither a code string nor a ranked pick is kept as
/// `Unsupported` so the request still scores; the vectorizer counts it as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(String),
    Ranked(RankedPick),
    Unsupported(Value),
}

/// Question id -> answer. Unknown question ids are carried along and ignored at scoring time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_choice(&mut self, question: impl Into<String>, code: impl Into<String>) {
        self.0.insert(question.into(), AnswerValue::Choice(code.into()));
    }

    pub fn insert_ranked(
        &mut self,
        question: impl Into<String>,
        best: Option<String>,
        second: Option<String>,
    ) {
        self.0
            .insert(question.into(), AnswerValue::Ranked(RankedPick { best, second }));
    }

    pub fn get(&self, question: &str) -> Option<&AnswerValue> {
        self.0.get(question)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
