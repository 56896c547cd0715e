use crate::api::ScriptProvider;
use crate::config::Config;
use crate::error::ScriptError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const BODY_SNIPPET_CHARS: usize = 800;

fn snippet(raw: &str) -> String {
    raw.chars().take(BODY_SNIPPET_CHARS).collect()
}

fn openai_extract_message_text(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    let choices = root.get("choices")?.as_array()?;
    for choice in choices {
        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str());
        if let Some(text) = content {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }

    None
}

fn openai_error_message(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;
    let err = root.get("error")?;

    if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
        debug!("OpenAI error type: {}", typ);
    }
    if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
        debug!("OpenAI error code: {}", code);
    }

    err.get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Maps a non-2xx response onto the error taxonomy.
pub fn classify_failure(status: StatusCode, raw: &str) -> ScriptError {
    let message = openai_error_message(raw).unwrap_or_else(|| {
        if raw.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            snippet(raw)
        }
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ScriptError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ScriptError::RateLimit(message),
        _ => ScriptError::provider(Some(status.as_u16()), message),
    }
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(cfg: &Config) -> Result<Self, ScriptError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScriptError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.openai_key.clone(),
            api_base: cfg.api_base.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn openai_chat_completion(&self, system: &str, user: &str) -> Result<String, ScriptError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let url = format!("{}/chat/completions", self.api_base);
        debug!("POST {} (model={}, prompt={} bytes)", url, self.model, user.len());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScriptError::provider(None, "request timed out")
                } else {
                    ScriptError::provider(None, e.to_string())
                }
            })?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("OpenAI HTTP {}", status.as_u16());
            if !raw.is_empty() {
                debug!("OpenAI raw body: {}", snippet(&raw));
            }
            return Err(classify_failure(status, &raw));
        }

        match openai_extract_message_text(&raw) {
            Some(text) => Ok(text),
            None => {
                warn!("OpenAI response parse failed");
                if !raw.is_empty() {
                    debug!("OpenAI raw body: {}", snippet(&raw));
                }
                Err(ScriptError::provider(None, "response contained no script text"))
            }
        }
    }
}

#[async_trait]
impl ScriptProvider for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptError> {
        self.openai_chat_completion(system, user).await
    }
}
