//! Service settings loaded from TOML and environment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::{DEFAULT_SUPPORT_SIZE, DEFAULT_TOP_K};
use crate::corpus::{CorpusOptions, DEFAULT_LABEL_FIELD};
use crate::error::ConfigResult;
use crate::scorer::MatcherOptions;

pub const CONFIG_PATH_ENV: &str = "CAREER_MATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/career-match.toml";
pub const ENV_PREFIX: &str = "CAREER_MATCH";

/// Front-end origins allowed by default (Vite and CRA dev servers).
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
];

/// Settings for the matcher and its HTTP shell.
///
/// | Key | Default | Env override |
/// |-----|---------|--------------|
/// | host | 127.0.0.1 | CAREER_MATCH__HOST |
/// | port | 8000 | CAREER_MATCH__PORT |
/// | mapping_path | data/quiz_mappings.json | CAREER_MATCH__MAPPING_PATH |
/// | corpus_path | data/expert_responses.json | CAREER_MATCH__CORPUS_PATH |
/// | label_field | role | CAREER_MATCH__LABEL_FIELD |
/// | default_top_k | 5 | CAREER_MATCH__DEFAULT_TOP_K |
/// | support_size | 3 | CAREER_MATCH__SUPPORT_SIZE |
/// | allowed_origins | local dev origins | CAREER_MATCH__ALLOWED_ORIGINS (comma separated) |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub host: String,
    pub port: u16,
    pub mapping_path: String,
    pub corpus_path: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_support_size")]
    pub support_size: usize,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_label_field() -> String {
    DEFAULT_LABEL_FIELD.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_support_size() -> usize {
    DEFAULT_SUPPORT_SIZE
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            mapping_path: "data/quiz_mappings.json".to_string(),
            corpus_path: "data/expert_responses.json".to_string(),
            label_field: default_label_field(),
            default_top_k: DEFAULT_TOP_K,
            support_size: DEFAULT_SUPPORT_SIZE,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MatchConfig {
    /// Load settings. Precedence: env `CAREER_MATCH_CONFIG` path > `config/career-match.toml` >
    /// defaults, then `CAREER_MATCH__*` environment overrides.
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load with an explicit settings file; a missing file falls back to defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("mapping_path", d.mapping_path)?
            .set_default("corpus_path", d.corpus_path)?
            .set_default("label_field", d.label_field)?
            .set_default("default_top_k", d.default_top_k as i64)?
            .set_default("support_size", d.support_size as i64)?
            .set_default("allowed_origins", d.allowed_origins)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()?;

        Ok(built.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn corpus_options(&self) -> CorpusOptions {
        CorpusOptions {
            label_field: self.label_field.clone(),
        }
    }

    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            default_top_k: self.default_top_k.max(1),
            support_size: self.support_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Loading reads the process environment; tests that load settings take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn file_values_override_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "port = 9100\nlabel_field = \"career\"\nsupport_size = 2\nallowed_origins = [\"https://quiz.example\"]"
        )
        .unwrap();
        let cfg = MatchConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.label_field, "career");
        assert_eq!(cfg.support_size, 2);
        assert_eq!(cfg.allowed_origins, vec!["https://quiz.example".to_string()]);
        assert_eq!(cfg.default_top_k, DEFAULT_TOP_K);
        assert_eq!(cfg.mapping_path, "data/quiz_mappings.json");
    }

    #[test]
    fn environment_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9100\ncorpus_path = \"from-file.json\"").unwrap();

        std::env::set_var("CAREER_MATCH__PORT", "9200");
        std::env::set_var(
            "CAREER_MATCH__ALLOWED_ORIGINS",
            "https://a.example,https://b.example",
        );
        let loaded = MatchConfig::load_from(file.path());
        std::env::remove_var("CAREER_MATCH__PORT");
        std::env::remove_var("CAREER_MATCH__ALLOWED_ORIGINS");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.port, 9200);
        assert_eq!(cfg.corpus_path, "from-file.json");
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn matcher_options_never_use_zero_top_k() {
        let cfg = MatchConfig {
            default_top_k: 0,
            ..MatchConfig::default()
        };
        assert_eq!(cfg.matcher_options().default_top_k, 1);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
    }
}
