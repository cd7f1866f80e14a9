//! Load-time errors. Everything here is fatal: the service refuses to start (or to swap in a
//! rebuilt corpus) rather than failing individual scoring requests.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for mapping and settings loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for corpus loading and building.
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Mapping document, trait schema or service settings are unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("mapping document is missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("trait schema is empty")]
    EmptySchema,

    #[error("trait `{0}` is listed more than once in TRAITS")]
    DuplicateTrait(String),

    #[error("TRAITS contains an empty trait id")]
    BlankTrait,

    #[error("{section}.{question} references unknown trait `{trait_id}`")]
    UnknownTrait {
        section: &'static str,
        question: String,
        trait_id: String,
    },

    #[error("LI_MAP.{question} has polarity {polarity}; expected 1 or -1")]
    InvalidPolarity { question: String, polarity: f64 },

    #[error("SJT_WEIGHTS.{which} must be a finite positive number, got {value}")]
    InvalidWeight { which: &'static str, value: f64 },

    #[error("mapping parse error: {0}")]
    Parse(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// The reference corpus source cannot be turned into trait vectors.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error(
        "corpus records match neither layout: no question columns and missing trait columns {missing_traits:?}"
    )]
    UnrecognizedShape { missing_traits: Vec<String> },

    #[error("row {row}: trait `{trait_id}` is not numeric ({value})")]
    NonNumericTrait {
        row: usize,
        trait_id: String,
        value: String,
    },

    #[error("row {row}: record is not a JSON object")]
    NotAnObject { row: usize },

    #[error("corpus parse error: {0}")]
    Parse(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for CorpusError {
    fn from(err: serde_json::Error) -> Self {
        CorpusError::Parse(err.to_string())
    }
}

/// Anything that stops a matcher from being assembled at startup or on reload.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}
