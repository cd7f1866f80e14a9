//! Trait schema: the ordered trait ids that fix vector width and output key order.

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Ordered, unique trait identifiers. Index `i` of every vector in the system is `traits[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitSchema {
    traits: Vec<String>,
    index: HashMap<String, usize>,
}

impl TraitSchema {
    /// Build a schema, trimming ids and rejecting empty lists, blank ids and duplicates.
    pub fn new<I, S>(traits: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for t in traits {
            let id = t.as_ref().trim();
            if id.is_empty() {
                return Err(ConfigError::BlankTrait);
            }
            if index.insert(id.to_string(), ordered.len()).is_some() {
                return Err(ConfigError::DuplicateTrait(id.to_string()));
            }
            ordered.push(id.to_string());
        }
        if ordered.is_empty() {
            return Err(ConfigError::EmptySchema);
        }
        Ok(Self {
            traits: ordered,
            index,
        })
    }

    /// Vector dimension `D`.
    pub fn dim(&self) -> usize {
        self.traits.len()
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    pub fn index_of(&self, trait_id: &str) -> Option<usize> {
        self.index.get(trait_id).copied()
    }

    pub fn contains(&self, trait_id: &str) -> bool {
        self.index.contains_key(trait_id)
    }
}
