//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_CHUNKING__CHUNK_SIZE=800` sets `chunking.chunk_size`). Typed settings
//! are extracted with defaults for every key, so an absent config file is fine.
//! Configured paths expand a leading `~` and `${VAR}` / `$VAR`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    /// Build from an explicit figment, bypassing files and environment.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_docs_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { raw_docs_dir: "../dev_data/rulebooks".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding the authoritative snapshot.
    pub primary_dir: String,
    /// Read-only directory consulted when the primary has nothing to offer.
    pub fallback_dir: Option<String>,
    /// Logical key (file name) of the snapshot.
    pub key: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            primary_dir: "../dev_data/indexes/vector_db".to_string(),
            fallback_dir: None,
            key: "rulebooks.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dimension: usize,
    pub timeout_ms: u64,
    /// Embedding calls in flight at once during a build.
    pub concurrency: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dimension: 768, timeout_ms: 10_000, concurrency: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: 5, max_limit: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        self.chunking
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be > 0".into()));
        }
        if self.embedding.concurrency == 0 {
            return Err(Error::InvalidConfig("embedding.concurrency must be > 0".into()));
        }
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(Error::InvalidConfig("search limits must be > 0".into()));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.index.key.trim().is_empty() {
            return Err(Error::InvalidConfig("index.key must not be empty".into()));
        }
        Ok(())
    }

    pub fn raw_docs_dir(&self) -> PathBuf {
        expand_path(&self.data.raw_docs_dir)
    }

    pub fn primary_index_dir(&self) -> PathBuf {
        expand_path(&self.index.primary_dir)
    }

    pub fn fallback_index_dir(&self) -> Option<PathBuf> {
        self.index.fallback_dir.as_deref().map(expand_path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.overlap, 200);
        assert_eq!(settings.index.key, "rulebooks.json");
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(
            "[chunking]\nchunk_size = 400\noverlap = 40\n[search]\ndefault_limit = 3\n",
        ));
        let settings = Config::from_figment(figment).settings().unwrap();
        assert_eq!(settings.chunking.chunk_size, 400);
        assert_eq!(settings.chunking.overlap, 40);
        assert_eq!(settings.chunking.min_passage_chars, 50);
        assert_eq!(settings.search.default_limit, 3);
        assert_eq!(settings.search.max_limit, 50);
    }

    #[test]
    fn rejects_overlap_not_below_chunk_size() {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string("[chunking]\nchunk_size = 100\noverlap = 100\n"));
        assert!(Config::from_figment(figment).settings().is_err());
    }

    #[test]
    fn rejects_default_limit_above_max() {
        let mut settings = Settings::default();
        settings.search.default_limit = 80;
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn paths_expand_environment_variables() {
        std::env::set_var("RAGDB_TEST_DATA_ROOT", "/srv/ragdb");
        let mut settings = Settings::default();
        settings.data.raw_docs_dir = "${RAGDB_TEST_DATA_ROOT}/rulebooks".into();
        settings.index.fallback_dir = Some("$RAGDB_TEST_DATA_ROOT/seed".into());
        assert_eq!(settings.raw_docs_dir(), PathBuf::from("/srv/ragdb/rulebooks"));
        assert_eq!(settings.fallback_index_dir(), Some(PathBuf::from("/srv/ragdb/seed")));
    }
}
