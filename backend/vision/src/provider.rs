//! Vision provider client.

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use tracing::info;

use tabsplit_core::ReceiptReader;

/// OpenAI chat-completions vision client.
pub struct OpenAiVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiVision {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl ReceiptReader for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn read_receipt(&self, image: &[u8], mime: &str, prompt: &str) -> Result<String> {
        let b64 = STANDARD.encode(image);
        info!(model = %self.model, bytes = image.len(), "sending receipt to vision model");

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url",
                      "image_url": { "url": format!("data:{};base64,{}", mime, b64) } }
                ]
            }],
            "max_tokens": 1024
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "OpenAI vision error: {}",
                resp.text().await.unwrap_or_default()
            );
        }
        let json: serde_json::Value = resp.json().await?;
        Ok(json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }
}
