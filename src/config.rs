//! Configuration - `config.toml` plus environment overrides
//!
//! Lookup order for the file: explicit path, `$LECTERN_CONFIG`,
//! `<config_dir>/lectern/config.toml`. A missing file means defaults.
//! The generator API key only ever comes from `OPENAI_API_KEY`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "LECTERN_CONFIG";
/// Generator credentials
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Generator endpoint override
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Generator model override
pub const ENV_MODEL: &str = "LLM_MODEL";

// =============================================================================
// Config Types
// =============================================================================

/// All sections are optional with defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub chunking: ChunkingSection,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub embeddings: EmbeddingsSection,
    /// Read from the environment, never from or to the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// SQLite file; `~` and `$VARS` are expanded
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_store_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("lectern").join("knowledge.db"))
        .unwrap_or_else(|| PathBuf::from(".lectern").join("knowledge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_collection() -> String {
    "journalism_knowledge".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

impl StoreSection {
    /// Store path with `~` and environment variables expanded
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.path)
            .map_err(|e| Error::Configuration(format!("store.path: {}", e)))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSection {
    /// Window size in characters
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    crate::chunker::DEFAULT_WINDOW
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSection {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_fetch_multiplier")]
    pub fetch_multiplier: usize,
}

fn default_k() -> usize {
    crate::retrieval::DEFAULT_K
}

fn default_fetch_multiplier() -> usize {
    crate::retrieval::DEFAULT_FETCH_MULTIPLIER
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            k: default_k(),
            fetch_multiplier: default_fetch_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default = "default_generator_url")]
    pub base_url: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

fn default_generator_url() -> String {
    "https://api.deepseek.com".to_string()
}
fn default_generator_model() -> String {
    "deepseek-chat".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_generator_timeout() -> u64 {
    60
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            base_url: default_generator_url(),
            model: default_generator_model(),
            temperature: default_temperature(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsSection {
    #[serde(default = "default_embeddings_url")]
    pub base_url: String,
    #[serde(default = "default_embeddings_model")]
    pub model: String,
    #[serde(default = "default_embeddings_timeout")]
    pub timeout_secs: u64,
}

fn default_embeddings_url() -> String {
    "http://localhost:8080/v1".to_string()
}
fn default_embeddings_model() -> String {
    "shibing624/text2vec-base-chinese".to_string()
}
fn default_embeddings_timeout() -> u64 {
    30
}

impl Default for EmbeddingsSection {
    fn default() -> Self {
        Self {
            base_url: default_embeddings_url(),
            model: default_embeddings_model(),
            timeout_secs: default_embeddings_timeout(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Load from the first config file found, then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(ENV_CONFIG)
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) if explicit.is_some() => {
                return Err(Error::Configuration(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply overrides from an environment lookup (injectable for tests)
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.generator.base_url = url;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.generator.model = model;
        }
        self.api_key = non_empty(ENV_API_KEY);
    }

    /// API key or a `Configuration` error; generation cannot proceed without it
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Configuration(format!("{} is not set; text generation is unavailable", ENV_API_KEY))
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// `<config_dir>/lectern/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectern").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.collection, "journalism_knowledge");
        assert_eq!(config.chunking.window, 500);
        assert_eq!(config.retrieval.k, 3);
        assert_eq!(config.retrieval.fetch_multiplier, 3);
        assert_eq!(config.generator.model, "deepseek-chat");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [retrieval]
            k = 5

            [generator]
            timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval.k, 5);
        assert_eq!(config.retrieval.fetch_multiplier, 3);
        assert_eq!(config.generator.timeout_secs, 10);
        assert_eq!(config.generator.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-test"),
            (ENV_BASE_URL, "http://localhost:9000"),
            (ENV_MODEL, ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.generator.base_url, "http://localhost:9000");
        // Empty values do not override
        assert_eq!(config.generator.model, "deepseek-chat");
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::default().require_api_key().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[store]\ncollection = \"course\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store.collection, "course");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.api_key = Some("sk-secret".into());
        assert!(!config.to_toml().unwrap().contains("sk-secret"));
    }

    #[test]
    fn test_store_path_expansion() {
        let section = StoreSection {
            path: "/tmp/lectern/kb.db".into(),
            ..Default::default()
        };
        assert_eq!(section.resolved_path().unwrap(), PathBuf::from("/tmp/lectern/kb.db"));
    }
}
