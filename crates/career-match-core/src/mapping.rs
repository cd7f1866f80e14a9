//! Question mapping: the fixed configuration that turns answer codes into trait contributions.
//!
//! The source document is the JSON `quiz_mappings` layout (`TRAITS`, `FC_MAP`, `LI_MAP`,
//! `SJT_MAP`, `SJT_WEIGHTS`). It is validated once at load; trait ids are resolved to schema
//! indices so scoring never has to look them up again.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::TraitSchema;

pub const KEY_TRAITS: &str = "TRAITS";
pub const KEY_FC_MAP: &str = "FC_MAP";
pub const KEY_LI_MAP: &str = "LI_MAP";
pub const KEY_SJT_MAP: &str = "SJT_MAP";
pub const KEY_SJT_WEIGHTS: &str = "SJT_WEIGHTS";

const REQUIRED_KEYS: [&str; 5] = [KEY_TRAITS, KEY_FC_MAP, KEY_LI_MAP, KEY_SJT_MAP, KEY_SJT_WEIGHTS];

/// Option code -> trait index, for one forced-choice or situational question.
pub type OptionTable = BTreeMap<String, usize>;

/// Direction a Likert item pushes its trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikertItem {
    pub trait_index: usize,
    pub polarity: Polarity,
}

/// Weights for the best and second-best pick of a situational question.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SjtWeights {
    pub best: f64,
    pub second: f64,
}

/// Validated, immutable question mapping.
#[derive(Debug, Clone)]
pub struct QuestionMapping {
    schema: TraitSchema,
    forced_choice: BTreeMap<String, OptionTable>,
    likert: BTreeMap<String, LikertItem>,
    situational: BTreeMap<String, OptionTable>,
    sjt_weights: SjtWeights,
}

impl QuestionMapping {
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mapping = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            traits = mapping.schema.dim(),
            forced_choice = mapping.forced_choice.len(),
            likert = mapping.likert.len(),
            situational = mapping.situational.len(),
            "question mapping loaded"
        );
        Ok(mapping)
    }

    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(value)
    }

    /// Validate a parsed mapping document.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        let Value::Object(mut doc) = value else {
            return Err(ConfigError::Parse("mapping document must be a JSON object".into()));
        };
        for key in REQUIRED_KEYS {
            if !doc.contains_key(key) {
                return Err(ConfigError::MissingKey(key));
            }
        }
        let mut take = |key: &str| doc.remove(key).unwrap_or(Value::Null);

        let traits: Vec<String> = serde_json::from_value(take(KEY_TRAITS))?;
        let schema = TraitSchema::new(traits)?;

        let fc_raw: BTreeMap<String, BTreeMap<String, String>> =
            serde_json::from_value(take(KEY_FC_MAP))?;
        let li_raw: BTreeMap<String, (String, f64)> = serde_json::from_value(take(KEY_LI_MAP))?;
        let sjt_raw: BTreeMap<String, BTreeMap<String, String>> =
            serde_json::from_value(take(KEY_SJT_MAP))?;
        let sjt_weights: SjtWeights = serde_json::from_value(take(KEY_SJT_WEIGHTS))?;

        let forced_choice = resolve_tables(&schema, KEY_FC_MAP, fc_raw)?;
        let situational = resolve_tables(&schema, KEY_SJT_MAP, sjt_raw)?;

        let mut likert = BTreeMap::new();
        for (question, (trait_id, polarity)) in li_raw {
            let trait_index = resolve_trait(&schema, KEY_LI_MAP, &question, &trait_id)?;
            let polarity = if polarity == 1.0 {
                Polarity::Positive
            } else if polarity == -1.0 {
                Polarity::Negative
            } else {
                return Err(ConfigError::InvalidPolarity { question, polarity });
            };
            likert.insert(question, LikertItem { trait_index, polarity });
        }

        check_weight("best", sjt_weights.best)?;
        check_weight("second", sjt_weights.second)?;

        Ok(Self {
            schema,
            forced_choice,
            likert,
            situational,
            sjt_weights,
        })
    }

    pub fn schema(&self) -> &TraitSchema {
        &self.schema
    }

    pub fn forced_choice(&self) -> &BTreeMap<String, OptionTable> {
        &self.forced_choice
    }

    pub fn likert(&self) -> &BTreeMap<String, LikertItem> {
        &self.likert
    }

    pub fn situational(&self) -> &BTreeMap<String, OptionTable> {
        &self.situational
    }

    pub fn sjt_weights(&self) -> SjtWeights {
        self.sjt_weights
    }

    /// True when any of the three tables knows `question`.
    pub fn knows_question(&self, question: &str) -> bool {
        self.forced_choice.contains_key(question)
            || self.likert.contains_key(question)
            || self.situational.contains_key(question)
    }
}

fn resolve_trait(
    schema: &TraitSchema,
    section: &'static str,
    question: &str,
    trait_id: &str,
) -> ConfigResult<usize> {
    schema
        .index_of(trait_id.trim())
        .ok_or_else(|| ConfigError::UnknownTrait {
            section,
            question: question.to_string(),
            trait_id: trait_id.to_string(),
        })
}

fn resolve_tables(
    schema: &TraitSchema,
    section: &'static str,
    raw: BTreeMap<String, BTreeMap<String, String>>,
) -> ConfigResult<BTreeMap<String, OptionTable>> {
    let mut out = BTreeMap::new();
    for (question, options) in raw {
        let mut table = OptionTable::new();
        for (code, trait_id) in options {
            let idx = resolve_trait(schema, section, &question, &trait_id)?;
            table.insert(code, idx);
        }
        out.insert(question, table);
    }
    Ok(out)
}

fn check_weight(which: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { which, value })
    }
}
