//! File configuration.
//!
//! ```toml
//! [resolver]
//! k = 10
//! threshold = 0.7
//! lexical_bonus = 0.15
//! min_similarity = 0.3
//!
//! [index]
//! dimension = 512
//!
//! [batch]
//! workers = 4
//!
//! [normalizer.variants]
//! jwar = "jvara"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use setu_index::{DEFAULT_DIMENSION, EmbeddingIndex, HashingEmbedder};
use setu_model::ResolveOptions;
use setu_normalization::{Normalizer, VariantTable};
use tracing::debug;

/// Environment variable naming a default configuration file.
pub const CONFIG_ENV_VAR: &str = "SETU_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Vector dimension of the hashing embedder.
    pub dimension: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Dedicated worker threads; the global pool when unset.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub variants: VariantTable,
}

/// Complete configuration; every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetuConfig {
    pub resolver: ResolveOptions,
    pub index: IndexSettings,
    pub batch: BatchSettings,
    pub normalizer: NormalizerSettings,
}

impl SetuConfig {
    /// Parse TOML text; `path` is only used in error messages.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path`, else the file named by `SETU_CONFIG`, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(value) if !value.is_empty() => Self::load(Path::new(&value)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("[resolver] {err}")))?;
        if self.index.dimension == 0 {
            return Err(ConfigError::Invalid(
                "[index] dimension must be at least 1".to_string(),
            ));
        }
        if self.batch.workers == Some(0) {
            return Err(ConfigError::Invalid(
                "[batch] workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::with_variants(self.normalizer.variants.clone())
    }

    /// An empty index using the configured embedder and normalizer.
    pub fn build_index(&self) -> EmbeddingIndex {
        EmbeddingIndex::new(
            Arc::new(HashingEmbedder::new(self.index.dimension)),
            self.normalizer(),
        )
    }
}
