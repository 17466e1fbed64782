use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Completer, LlmError};

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 200;

/// OpenRouter's OpenAI-compatible chat completions API.
pub struct OpenRouter {
    client: Client,
    api_base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouter {
    pub fn new(api_base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("building OpenRouter client")?;
        Ok(OpenRouter {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn request_body(&self, system: &str, user: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        })
    }
}

#[async_trait]
impl Completer for OpenRouter {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system, user))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let body: Value = response.json().await?;
        message_content(&body).ok_or(LlmError::NoContent)
    }
}

fn message_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
}
