//! ModelScope inference provider
//!
//! Text goes through the OpenAI-compatible chat completions endpoint. Images
//! use the asynchronous task API: submit with `X-ModelScope-Async-Mode`, then
//! poll `/v1/tasks/{id}` until the task reports `SUCCEED` or `FAILED`, and
//! download the first output image.

use super::{http_client, MODELSCOPE};
use crate::capability::{ImageGenerator, ImageRequest, TextGenerator, TextPrompt};
use crate::config::PrimerConfig;
use crate::http::{trim_base, HttpClient};
use crate::task::{PollPolicy, RemoteTask, TaskStatus};
use primer_core::{Credential, PrimerError, Result};
use std::time::Duration;

const DEFAULT_MODELSCOPE_URL: &str = "https://api-inference.modelscope.cn";
const DEFAULT_CHAT_MODEL: &str = "ZhipuAI/GLM-4.5";
const DEFAULT_IMAGE_MODEL: &str = "Qwen/Qwen-Image";
const IMAGE_SIZE: &str = "1024x1024";

/// ModelScope provider for chat text and asynchronous image generation
pub struct ModelScopeProvider {
    client: HttpClient,
    api_url: String,
    chat_model: String,
    image_model: String,
    poll: PollPolicy,
}

impl ModelScopeProvider {
    /// Create a new ModelScopeProvider from config
    pub fn from_config(config: &PrimerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(MODELSCOPE, config)?,
            api_url: trim_base(config.api_url(MODELSCOPE).unwrap_or(DEFAULT_MODELSCOPE_URL))
                .to_string(),
            chat_model: config
                .model(MODELSCOPE)
                .unwrap_or(DEFAULT_CHAT_MODEL)
                .to_string(),
            image_model: config
                .image_model(MODELSCOPE)
                .unwrap_or(DEFAULT_IMAGE_MODEL)
                .to_string(),
            poll: PollPolicy {
                interval: Duration::from_secs(config.generation.poll_interval_secs),
                max_attempts: config.generation.max_poll_attempts,
            },
        })
    }

    /// Submit an image task and return the task ID
    fn submit_image_task(&self, credential: &Credential, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": IMAGE_SIZE
        });
        let url = format!("{}/v1/images/generations", self.api_url);
        let response = self.client.post_json(
            &url,
            credential,
            &[("X-ModelScope-Async-Mode", "true")],
            &payload,
        )?;
        parse_submit(&response)
    }

    fn poll_image_task(&self, credential: &Credential, task_id: &str) -> Result<TaskStatus<String>> {
        let url = format!("{}/v1/tasks/{}", self.api_url, task_id);
        let response = self.client.get_json(
            &url,
            credential,
            &[("X-ModelScope-Task-Type", "image_generation")],
        )?;
        parse_poll(&response)
    }
}

impl TextGenerator for ModelScopeProvider {
    fn name(&self) -> &str {
        MODELSCOPE
    }

    fn complete(&self, credential: &Credential, prompt: &TextPrompt) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user }
            ],
            "stream": false
        });
        let url = format!("{}/v1/chat/completions", self.api_url);
        let response = self.client.post_json(&url, credential, &[], &payload)?;
        parse_chat_reply(&response)
    }
}

impl ImageGenerator for ModelScopeProvider {
    fn name(&self) -> &str {
        MODELSCOPE
    }

    fn generate_image(&self, credential: &Credential, request: &ImageRequest) -> Result<Vec<u8>> {
        let task_id = self.submit_image_task(credential, &request.prompt)?;
        let task = RemoteTask::new(MODELSCOPE, &request.entity_name, task_id);
        log::info!("  Submitted image task {} for '{}'", task.remote_id, request.entity_name);

        let image_url = task.wait(self.poll, |id| self.poll_image_task(credential, id))?;
        self.client.get_bytes(&image_url, None)
    }
}

/// Extract `choices[0].message.content`
pub fn parse_chat_reply(response: &serde_json::Value) -> Result<String> {
    response
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            PrimerError::GenerationFailure(format!(
                "unexpected ModelScope chat response: {}",
                response
            ))
        })
}

/// Extract `task_id` from a submit response
pub fn parse_submit(response: &serde_json::Value) -> Result<String> {
    response
        .get("task_id")
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PrimerError::GenerationFailure(format!(
                "unexpected ModelScope submit response: {}",
                response
            ))
        })
}

/// Map a task poll response onto a [`TaskStatus`] carrying the image URL
pub fn parse_poll(response: &serde_json::Value) -> Result<TaskStatus<String>> {
    let status = response
        .get("task_status")
        .and_then(|s| s.as_str())
        .unwrap_or("UNKNOWN");

    match status {
        "SUCCEED" => response
            .pointer("/output_images/0")
            .and_then(|u| u.as_str())
            .map(|u| TaskStatus::Succeeded(u.to_string()))
            .ok_or_else(|| {
                PrimerError::GenerationFailure(
                    "ModelScope task succeeded without an output image".to_string(),
                )
            }),
        "FAILED" => {
            let msg = response
                .get("errors")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string();
            Ok(TaskStatus::Failed(msg))
        }
        _ => Ok(TaskStatus::Pending),
    }
}
