//! HTTP client for OpenAI-compatible embedding endpoints

use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EmbeddingEngine;
use crate::config::EmbeddingsSection;
use crate::error::{Error, Result, Service};

/// Embedder that posts to `{base_url}/embeddings`
pub struct HttpEmbedder {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl HttpEmbedder {
    /// Build an embedder from config; the API key is optional for local servers
    pub fn new(section: &EmbeddingsSection, api_key: Option<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| Error::http(Service::Embedding, "client setup", e))?;

        Ok(Self {
            endpoint: format!("{}/embeddings", section.base_url.trim_end_matches('/')),
            model: section.model.clone(),
            api_key,
            http,
        })
    }

    fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| Error::http(Service::Embedding, "request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Embedding {
                stage: "response",
                message: format!("{}: {}", status, body),
            });
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| Error::http(Service::Embedding, "decode", e))?;

        if parsed.data.len() != input.len() {
            return Err(Error::Embedding {
                stage: "decode",
                message: format!(
                    "expected {} embeddings, got {}",
                    input.len(),
                    parsed.data.len()
                ),
            });
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingEngine for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| Error::Embedding {
            stage: "decode",
            message: "empty embedding response".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
