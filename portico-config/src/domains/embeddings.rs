//! Embedding provider configuration

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Dimension of all stored embeddings. Changing this is a re-embedding
/// migration, not a config toggle.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Provider REST endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Provider API key
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl Validatable for EmbeddingsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.api_url, "embeddings.api_url")?;
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
