//! Prompt templates and optional style enrichment
//!
//! Text prompts ask for one JSON object with fixed keys. Image prompts depend
//! on the category: vehicle-like categories get the "one vehicle, no people"
//! template, everything listed in `non_vehicle_categories` the generic one.
//! A [`PromptStyle`] adds a prefix and suffix to either.

use crate::capability::{ImageRequest, TextPrompt};
use primer_core::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SYSTEM_PROMPT: &str = "你是一个专业的儿童教育助手，专门为儿童提供简单易懂的各种事物知识，包括车辆、家具、动物、天气、食物和职业等。";

/// Prefix/suffix enrichment applied to generated prompts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptStyle {
    #[serde(default)]
    pub name: Option<String>,
    /// Prepended to every prompt
    #[serde(default)]
    pub prompt_prefix: Option<String>,
    /// Appended to every prompt
    #[serde(default)]
    pub prompt_suffix: Option<String>,
    /// Things to avoid, appended to image prompts
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

/// TOML file wrapper
#[derive(Debug, Deserialize)]
struct StyleFile {
    style: PromptStyle,
}

impl PromptStyle {
    /// Load a style from a TOML file with a `[style]` table
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: StyleFile = toml::from_str(&content).map_err(|e| {
            PrimerError::ConfigurationError(format!(
                "failed to parse style {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(file.style)
    }

    /// Find and load a style by name, searching standard locations
    pub fn find(name: &str) -> Result<Self> {
        let candidates = [
            format!("styles/{}.style.toml", name),
            format!(".primer/styles/{}.style.toml", name),
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(PrimerError::ConfigurationError(format!(
            "style '{}' not found (searched: {})",
            name,
            candidates.join(", ")
        )))
    }

    /// Wrap `base_prompt` with the style's prefix and suffix
    pub fn enrich_prompt(&self, base_prompt: &str) -> String {
        let mut parts = Vec::new();

        if let Some(prefix) = non_blank(&self.prompt_prefix) {
            parts.push(prefix);
        }
        parts.push(base_prompt);
        if let Some(suffix) = non_blank(&self.prompt_suffix) {
            parts.push(suffix);
        }

        parts.join("，")
    }

    pub fn negative(&self) -> Option<&str> {
        non_blank(&self.negative_prompt)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Builds text and image prompts for entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    non_vehicle_categories: Vec<String>,
    style: Option<PromptStyle>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            non_vehicle_categories: ["家具", "动物", "天气", "食物", "职业"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            style: None,
        }
    }
}

impl PromptBuilder {
    pub fn new(non_vehicle_categories: Vec<String>, style: Option<PromptStyle>) -> Self {
        Self {
            non_vehicle_categories,
            style,
        }
    }

    /// Replace the style, keeping the category split
    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn style(&self) -> Option<&PromptStyle> {
        self.style.as_ref()
    }

    pub fn is_vehicle_category(&self, category: &str) -> bool {
        !self.non_vehicle_categories.iter().any(|c| c == category)
    }

    /// Chat prompt requesting the entity's text fields as one JSON object
    pub fn text_prompt(&self, name: &str, category: &str) -> TextPrompt {
        let user = format!(
            r#"请为儿童认识事物生成以下信息，事物名称：{name}，事物类型：{category}

请生成：
1. translatedName: 英文事物名称
2. description: 事物描述（简单介绍，适合儿童理解，根据类型调整描述内容）
3. primaryPronunciation: 英式音标（使用国际音标IPA格式）
4. secondaryPronunciation: 美式音标（使用国际音标IPA格式）

请以JSON格式返回，格式如下：
{{
    "translatedName": "Item English Name",
    "description": "事物描述",
    "primaryPronunciation": "/ɪnˈglɪʃ prəˌnʌnsiˈeɪʃən/",
    "secondaryPronunciation": "/ˈæmərɪkən prəˌnʌnsiˈeɪʃən/"
}}"#
        );

        TextPrompt {
            entity_name: name.to_string(),
            category: category.to_string(),
            system: SYSTEM_PROMPT.to_string(),
            user: self.enrich(&user),
        }
    }

    /// Image request for an entity, with the category-appropriate template
    pub fn image_request(&self, name: &str, category: &str) -> ImageRequest {
        let base = if self.is_vehicle_category(category) {
            format!(
                "一辆{}，{}，卡通风格，儿童友好，明亮色彩，简洁背景，不要出现人物，不要出现人，不要有人脸，不要有人形，纯车辆展示",
                name, category
            )
        } else {
            format!(
                "一个{}，{}，卡通风格，儿童友好，明亮色彩，简单易懂",
                name, category
            )
        };

        let mut prompt = self.enrich(&base);
        if let Some(negative) = self.style.as_ref().and_then(|s| s.negative()) {
            prompt = format!("{}，避免：{}", prompt, negative);
        }

        ImageRequest {
            entity_name: name.to_string(),
            category: category.to_string(),
            prompt,
        }
    }

    fn enrich(&self, base: &str) -> String {
        match &self.style {
            Some(style) => style.enrich_prompt(base),
            None => base.to_string(),
        }
    }
}
