//! Icon generation client.

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use tabsplit_core::IconGenerator;

/// OpenAI images API client producing small food icons.
pub struct OpenAiImages {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ImagesReply {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: String,
}

impl OpenAiImages {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl IconGenerator for OpenAiImages {
    async fn generate(&self, normalized_name: &str) -> Result<String> {
        info!(name = normalized_name, "generating food icon");
        let body = serde_json::json!({
            "model": "dall-e-3",
            "prompt": format!(
                "A simple flat minimalist icon of {normalized_name}, single food item, \
                 centered on a plain white background, no text"
            ),
            "n": 1,
            "size": "1024x1024"
        });
        let resp = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "OpenAI images error: {}",
                resp.text().await.unwrap_or_default()
            );
        }
        let reply: ImagesReply = resp.json().await?;
        match reply.data.into_iter().next() {
            Some(datum) => Ok(datum.url),
            None => bail!("OpenAI images reply contained no image"),
        }
    }
}
