//! OpenAI-compatible chat completions client (blocking)

use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, TextGenerator};
use crate::config::Config;
use crate::error::{Error, Result, Service};

/// Generator client
#[derive(Debug)]
pub struct OpenAiGenerator {
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
    http: HttpClient,
}

impl OpenAiGenerator {
    /// Build from config. Fails with `Configuration` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let section = &config.generator;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| Error::http(Service::Generator, "client setup", e))?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", section.base_url.trim_end_matches('/')),
            model: section.model.clone(),
            temperature: section.temperature,
            api_key,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for OpenAiGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        debug!(model = %self.model, messages = messages.len(), "requesting completion");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::http(Service::Generator, "request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Generator {
                stage: "response",
                message: format!("{}: {}", status, body),
            });
        }

        let completion: CompletionResponse = response
            .json()
            .map_err(|e| Error::http(Service::Generator, "decode", e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generator {
                stage: "decode",
                message: "completion has no message content".to_string(),
            })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
