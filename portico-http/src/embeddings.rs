//! Embedding provider client

use portico_config::EmbeddingsConfig;
use serde::Deserialize;
use serde_json::json;

use crate::errors::HttpError;

#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingsConfig,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(http: reqwest::Client, config: EmbeddingsConfig) -> Self {
        Self { http, config }
    }

    /// Embed one text. The provider returns fixed-dimension vectors; the
    /// dimension is part of the schema, not negotiated per call.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, HttpError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.model,
                "input": input,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| HttpError::Status {
                status: 200,
                body: "embedding response contained no data".to_string(),
            })
    }

    /// Canonical input for an MCP server embedding.
    pub fn server_embedding_input(
        name: &str,
        url: &str,
        description: &str,
        categories: &[String],
    ) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            name,
            url,
            description,
            categories.join(", ")
        )
    }

    /// Canonical input for a tool embedding.
    pub fn tool_embedding_input(name: &str, description: &str) -> String {
        format!("{}\n{}", name, description)
    }
}
