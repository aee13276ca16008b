//! OpenAI-compatible chat-completions provider.
//!
//! Calls `POST {url}/v1/chat/completions`. Works against OpenAI itself and
//! any compatible server (DeepSeek, Ollama, vLLM). The API key is optional
//! so that local servers can be used without one.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use nexus_core::chat::Assistant;
use nexus_core::models::{ChatMessage, ChatRole, ItemSummary};
use nexus_core::resolver::{RemoteError, SemanticMatcher};
use serde_json::{json, Value};

use super::{api_key, build_match_prompt, http_client, parse_id_list, send_with_retry, LlmProvider};
use crate::config::LlmConfig;

const DEFAULT_URL: &str = "https://api.openai.com";
const DEFAULT_KEY_ENV: &str = "OPENAI_API_KEY";

const MATCH_INSTRUCTION: &str = "You match search queries to tools in a directory. \
Answer with a JSON object of the form {\"ids\": [...]} and nothing else.";

pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
    timeout: Duration,
    system_prompt: String,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig, system_prompt: String) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for OpenAI provider"))?;
        let base = config.url.as_deref().unwrap_or(DEFAULT_URL).trim_end_matches('/');

        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{}/v1/chat/completions", base),
            model,
            api_key: api_key(config, DEFAULT_KEY_ENV),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
            system_prompt,
        })
    }

    async fn complete(&self, messages: Vec<Value>, json_mode: bool) -> Result<String, RemoteError> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let json = send_with_retry("openai", self.max_retries, self.timeout, || {
            let req = self.client.post(&self.endpoint).json(&body);
            match &self.api_key {
                Some(key) => req.header("Authorization", format!("Bearer {}", key)),
                None => req,
            }
        })
        .await?;

        extract_content(&json)
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl SemanticMatcher for OpenAiProvider {
    async fn match_ids(
        &self,
        query: &str,
        candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError> {
        let messages = vec![
            json!({ "role": "system", "content": MATCH_INSTRUCTION }),
            json!({ "role": "user", "content": build_match_prompt(query, candidates) }),
        ];
        let text = self.complete(messages, true).await?;
        parse_id_list(&text)
    }
}

#[async_trait]
impl Assistant for OpenAiProvider {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, RemoteError> {
        self.complete(chat_messages(&self.system_prompt, history, message), false)
            .await
    }
}

fn chat_messages(system_prompt: &str, history: &[ChatMessage], message: &str) -> Vec<Value> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(json!({ "role": "system", "content": system_prompt }));
    for m in history {
        let role = match m.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        messages.push(json!({ "role": role, "content": m.content }));
    }
    messages.push(json!({ "role": "user", "content": message }));
    messages
}

fn extract_content(json: &Value) -> Result<String, RemoteError> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| RemoteError::Malformed("completion without message content".into()))
}
