use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompleterError {
    #[error("text backend error: {0}")]
    Backend(String),

    #[error("text backend not configured")]
    NotConfigured,
}

/// Generative text backend, used only as a fallback when no chat rule
/// matches. Treated as opaque, possibly slow, possibly failing; callers
/// degrade to a canned reply on any error and never retry.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompleterError>;
}

/// Completer used when no backend is configured. Always errors, which
/// the chat service turns into its canned apology.
pub struct DisabledCompleter;

#[async_trait]
impl TextCompleter for DisabledCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String, CompleterError> {
        Err(CompleterError::NotConfigured)
    }
}

/// TextCompleter backed by a Gemini-style `generateContent` HTTP API.
pub struct HttpCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCompleter {
    /// `endpoint` is the full model URL, e.g.
    /// `https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent`.
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TextCompleter for HttpCompleter {
    async fn complete(&self, prompt: &str) -> Result<String, CompleterError> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CompleterError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CompleterError::Backend(format!("{}: {}", status, text)));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CompleterError::Backend(e.to_string()))?;

        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CompleterError::Backend("no candidates in response".into()))
    }
}
