//! Language-model providers for smart search and the chat assistant.
//!
//! Each provider implements both collaborator traits from the core:
//! [`SemanticMatcher`] (query → matching tool ids) and [`Assistant`]
//! (transcript + message → reply).
//!
//! - **[`DisabledProvider`]**: always fails; smart search then always
//!   takes the local fallback and chat shows its fixed error reply.
//! - **[`GeminiProvider`]**: Google Generative Language `generateContent`
//!   with a JSON response schema.
//! - **[`OpenAiProvider`]**: any OpenAI-compatible `/v1/chat/completions`
//!   endpoint (OpenAI, DeepSeek, a local Ollama, ...).
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use river_nexus::config::LlmConfig;
//! # use river_nexus::llm::create_provider;
//! # use nexus_core::catalog::Catalog;
//! let config = LlmConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config, &Catalog::builtin()).unwrap();
//! assert_eq!(provider.name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, ... capped at 2^5)
//! - other HTTP 4xx → fail immediately
//! - network errors → retry; client timeouts → fail as [`RemoteError::Timeout`]

mod gemini;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use nexus_core::catalog::Catalog;
use nexus_core::chat::Assistant;
use nexus_core::models::{ChatMessage, ItemSummary};
use nexus_core::resolver::{RemoteError, SemanticMatcher};

use crate::config::LlmConfig;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// A provider usable for both smart search and chat.
pub trait LlmProvider: SemanticMatcher + Assistant {
    /// Short provider name (`"disabled"`, `"gemini"`, `"openai"`).
    fn name(&self) -> &str;
}

/// Instantiate the provider named by `config.provider`.
///
/// The catalog is used to build the default assistant persona, which lists
/// the available tools by name.
pub fn create_provider(config: &LlmConfig, catalog: &Catalog) -> Result<Arc<dyn LlmProvider>> {
    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| default_system_prompt(catalog));

    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config, system_prompt)?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config, system_prompt)?)),
        other => anyhow::bail!("Unknown llm provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A provider that refuses every request.
pub struct DisabledProvider;

impl LlmProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }
}

#[async_trait]
impl SemanticMatcher for DisabledProvider {
    async fn match_ids(
        &self,
        _query: &str,
        _candidates: &[ItemSummary],
    ) -> Result<Vec<String>, RemoteError> {
        Err(RemoteError::Disabled)
    }
}

#[async_trait]
impl Assistant for DisabledProvider {
    async fn reply(&self, _history: &[ChatMessage], _message: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Disabled)
    }
}

// ============ Shared plumbing ============

/// Build the HTTP client shared by a provider's requests.
fn http_client(config: &LlmConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Read the API key from the configured (or default) environment variable.
fn api_key(config: &LlmConfig, default_env: &str) -> Option<String> {
    let var = config.api_key_env.as_deref().unwrap_or(default_env);
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}

/// Send a JSON request with retry/backoff and return the parsed JSON body.
///
/// `build` is called once per attempt because a `RequestBuilder` is
/// consumed by `send`.
async fn send_with_retry<F>(
    label: &str,
    max_retries: u32,
    timeout: Duration,
    build: F,
) -> Result<serde_json::Value, RemoteError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json::<serde_json::Value>()
                        .await
                        .map_err(|e| RemoteError::Malformed(e.to_string()));
                }

                let body = response.text().await.unwrap_or_default();
                let err = RemoteError::Status {
                    status: status.as_u16(),
                    body,
                };

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    tracing::debug!(label, attempt, %status, "retryable provider error");
                    last_err = Some(err);
                    continue;
                }

                return Err(err);
            }
            Err(e) if e.is_timeout() => return Err(RemoteError::Timeout(timeout)),
            Err(e) => {
                tracing::debug!(label, attempt, error = %e, "provider transport error");
                last_err = Some(RemoteError::Transport(e.to_string()));
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| RemoteError::Transport(format!("{} request failed after retries", label))))
}

/// Prompt asking the model to pick relevant tool ids for `query`.
pub fn build_match_prompt(query: &str, candidates: &[ItemSummary]) -> String {
    let tools = serde_json::to_string(candidates).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Given the following list of tools: {}\n\n\
         Identify the ids of the tools most relevant to the user's intent: \"{}\".\n\
         Return only a JSON array of ids. If nothing matches, return an empty array [].",
        tools, query
    )
}

/// Default assistant persona.
pub fn default_system_prompt(catalog: &Catalog) -> String {
    let names: Vec<&str> = catalog.all().iter().map(|i| i.name.as_str()).collect();
    format!(
        "你是 River Core，由 Riverhub 开发的个人助理，负责管理名为 \"River Nexus\" 的数字流域。\
         现有工具包括：{}。回复应简洁且专业，语气顺滑，充满科技感与关怀。使用中文回答。",
        names.join(", ")
    )
}

/// Parse a model's text answer into a list of ids.
///
/// Accepts a bare JSON array or an object with an `ids` array, optionally
/// wrapped in a Markdown code fence. Non-string entries are skipped.
pub fn parse_id_list(text: &str) -> Result<Vec<String>, RemoteError> {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| RemoteError::Malformed(format!("expected JSON id list: {}", e)))?;

    let array = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map
            .get("ids")
            .and_then(|ids| ids.as_array())
            .ok_or_else(|| RemoteError::Malformed("object without an 'ids' array".into()))?,
        _ => return Err(RemoteError::Malformed("expected a JSON array".into())),
    };

    Ok(array
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        assert_eq!(
            parse_id_list(r#"["kimi-ai", "deepseek-chat"]"#).unwrap(),
            vec!["kimi-ai", "deepseek-chat"]
        );
    }

    #[test]
    fn test_parse_object_and_fence() {
        let text = "```json\n{\"ids\": [\"figma-design\", 3]}\n```";
        assert_eq!(parse_id_list(text).unwrap(), vec!["figma-design"]);
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_id_list("  ").unwrap().is_empty());
        assert!(parse_id_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_id_list("I think Kimi"),
            Err(RemoteError::Malformed(_))
        ));
        assert!(matches!(
            parse_id_list("{\"tools\": []}"),
            Err(RemoteError::Malformed(_))
        ));
    }

    #[test]
    fn test_match_prompt_contains_query_and_ids() {
        let catalog = Catalog::builtin();
        let summaries = nexus_core::catalog::summaries(&catalog.all()[..2]);
        let prompt = build_match_prompt("long documents", &summaries);
        assert!(prompt.contains("\"long documents\""));
        assert!(prompt.contains("kimi-ai"));
        assert!(prompt.contains("\"desc\""));
    }

    #[test]
    fn test_default_persona_lists_tools() {
        let prompt = default_system_prompt(&Catalog::builtin());
        assert!(prompt.contains("River Core"));
        assert!(prompt.contains("Obsidian"));
    }

    #[tokio::test]
    async fn test_disabled_provider_refuses() {
        let provider = create_provider(&LlmConfig::default(), &Catalog::builtin()).unwrap();
        assert_eq!(provider.name(), "disabled");
        assert!(matches!(
            provider.match_ids("anything", &[]).await,
            Err(RemoteError::Disabled)
        ));
        assert!(provider.reply(&[], "hi").await.is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "cohere".into(),
            ..LlmConfig::default()
        };
        assert!(create_provider(&config, &Catalog::builtin()).is_err());
    }
}
