//! Google Generative Language API provider.
//!
//! Calls `POST {url}/v1beta/models/{model}:generateContent`. Smart search
//! requests a JSON response constrained to an array of strings; chat sends
//! the transcript with the assistant persona as the system instruction.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use nexus_core::chat::Assistant;
use nexus_core::models::{ChatMessage, ChatRole, ItemSummary};
use nexus_core::resolver::{RemoteError, SemanticMatcher};
use serde_json::{json, Value};

use super::{api_key, build_match_prompt, http_client, parse_id_list, send_with_retry, LlmProvider};
use crate::config::LlmConfig;

const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    timeout: Duration,
    system_prompt: String,
}

impl GeminiProvider {
    /// Create a Gemini provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `llm.model` is unset or the API key environment
    /// variable (default `GEMINI_API_KEY`) is missing.
    pub fn new(config: &LlmConfig, system_prompt: String) -> Result<Self> {
        let model = config
            .model
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for Gemini provider"))?;
        let api_key = api_key(config, DEFAULT_KEY_ENV).ok_or_else(|| {
            anyhow::anyhow!(
                "{} environment variable not set",
                config.api_key_env.as_deref().unwrap_or(DEFAULT_KEY_ENV)
            )
        })?;
        let base = config.url.as_deref().unwrap_or(DEFAULT_URL).trim_end_matches('/');

        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{}/v1beta/models/{}:generateContent", base, model),
            api_key,
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
            system_prompt,
        })
    }

    async fn generate(&self, body: &Value) -> Result<String, RemoteError> {
        let json = send_with_retry("gemini", self.max_retries, self.timeout, || {
            self.client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(body)
        })
        .await?;
        extract_text(&json)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl SemanticMatcher for GeminiProvider {
    async fn match_ids(
        &self,
        query: &str,
        candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_match_prompt(query, candidates) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": { "type": "ARRAY", "items": { "type": "STRING" } }
            }
        });
        let text = self.generate(&body).await?;
        parse_id_list(&text)
    }
}

#[async_trait]
impl Assistant for GeminiProvider {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, RemoteError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": self.system_prompt }] },
            "contents": chat_contents(history, message),
        });
        self.generate(&body).await
    }
}

/// Map the transcript to Gemini `contents`.
///
/// Gemini conversations must open with a user turn, so leading assistant
/// entries (the greeting) are dropped.
fn chat_contents(history: &[ChatMessage], message: &str) -> Vec<Value> {
    history
        .iter()
        .skip_while(|m| m.role == ChatRole::Assistant)
        .map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .chain(std::iter::once(
            json!({ "role": "user", "parts": [{ "text": message }] }),
        ))
        .collect()
}

/// Concatenate the text parts of the first candidate.
fn extract_text(json: &Value) -> Result<String, RemoteError> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| RemoteError::Malformed("Gemini response without candidate parts".into()))?;

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}
