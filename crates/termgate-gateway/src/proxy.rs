//! Chat proxy collaborator.
//!
//! Outside the authorization core: the gateway composes a collaborator
//! behind `ask()` but never depends on its internals. The production
//! implementation forwards to an Anthropic-style messages endpoint.

use async_trait::async_trait;
use serde_json::json;

use termgate_core::config::ProxyConfig;

/// Reply from a chat collaborator.
#[derive(Debug, Clone)]
pub struct AskReply {
    pub error: bool,
    pub message: String,
}

impl AskReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }
}

/// Something that can answer a terminal user's question.
#[async_trait]
pub trait ChatCollaborator: Send + Sync {
    /// Ask a question. `credential` is the caller's bearer token, passed
    /// through for the upstream to validate.
    async fn ask(&self, question: &str, credential: &str) -> AskReply;
}

/// Forwards questions to a remote messages API.
pub struct HttpChatProxy {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl HttpChatProxy {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatCollaborator for HttpChatProxy {
    async fn ask(&self, question: &str, credential: &str) -> AskReply {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{"role": "user", "content": question}],
        });
        if !self.config.system_prompt.is_empty() {
            body["system"] = json!(self.config.system_prompt);
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", credential)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "chat proxy request failed");
                return AskReply::failed(format!("upstream request failed: {e}"));
            }
        };

        let status = response.status();
        let payload: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return AskReply::failed(format!("upstream returned invalid JSON: {e}")),
        };

        if !status.is_success() {
            let detail = payload["error"]["message"]
                .as_str()
                .unwrap_or("unknown upstream error");
            return AskReply::failed(format!("upstream error {status}: {detail}"));
        }

        match payload["content"][0]["text"].as_str() {
            Some(text) => AskReply::ok(text),
            None => AskReply::failed("upstream reply had no text content"),
        }
    }
}
