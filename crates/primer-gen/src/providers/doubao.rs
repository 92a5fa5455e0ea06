//! Doubao (Volcengine Ark) image generation provider
//!
//! Synchronous: one POST returns the image URL, which is then downloaded.

use super::{http_client, DOUBAO};
use crate::capability::{ImageGenerator, ImageRequest};
use crate::config::PrimerConfig;
use crate::http::{trim_base, HttpClient};
use primer_core::{Credential, PrimerError, Result};

const DEFAULT_DOUBAO_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";
const DEFAULT_IMAGE_MODEL: &str = "doubao-seedream-3-0-t2i-250415";

pub struct DoubaoProvider {
    client: HttpClient,
    api_url: String,
    model: String,
}

impl DoubaoProvider {
    pub fn from_config(config: &PrimerConfig) -> Result<Self> {
        let model = config
            .image_model(DOUBAO)
            .or_else(|| config.model(DOUBAO))
            .unwrap_or(DEFAULT_IMAGE_MODEL)
            .to_string();

        Ok(Self {
            client: http_client(DOUBAO, config)?,
            api_url: trim_base(config.api_url(DOUBAO).unwrap_or(DEFAULT_DOUBAO_URL)).to_string(),
            model,
        })
    }
}

impl ImageGenerator for DoubaoProvider {
    fn name(&self) -> &str {
        DOUBAO
    }

    fn generate_image(&self, credential: &Credential, request: &ImageRequest) -> Result<Vec<u8>> {
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "n": 1,
            "size": "1024x1024",
            "watermark": false
        });
        let url = format!("{}/images/generations", self.api_url);
        let response = self.client.post_json(&url, credential, &[], &payload)?;
        let image_url = parse_image_url(&response)?;
        self.client.get_bytes(&image_url, None)
    }
}

/// Extract `data[0].url`
pub fn parse_image_url(response: &serde_json::Value) -> Result<String> {
    if let Some(message) = response.pointer("/error/message").and_then(|m| m.as_str()) {
        return Err(PrimerError::GenerationFailure(format!(
            "Doubao rejected the request: {}",
            message
        )));
    }

    response
        .pointer("/data/0/url")
        .and_then(|u| u.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PrimerError::GenerationFailure(format!("unexpected Doubao response: {}", response))
        })
}
