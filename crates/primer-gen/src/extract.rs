//! Structured-block extraction from free-form model replies
//!
//! Chat models wrap the requested JSON object in prose or code fences. The
//! extractor first tries the span from the first `{` to the last `}`, then
//! falls back to each balanced block, left to right.

use primer_catalog::TextFields;
use primer_core::{PrimerError, Result};
use serde::Deserialize;

/// Find the first JSON object embedded in `reply`
pub fn extract_json_block(reply: &str) -> Result<serde_json::Value> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(PrimerError::GenerationFailure(format!(
            "no structured block in reply: {}",
            preview(reply)
        )));
    };

    if start < end {
        if let Ok(value @ serde_json::Value::Object(_)) =
            serde_json::from_str::<serde_json::Value>(&reply[start..=end])
        {
            return Ok(value);
        }
    }

    for block in balanced_blocks(reply) {
        if let Ok(value @ serde_json::Value::Object(_)) =
            serde_json::from_str::<serde_json::Value>(block)
        {
            return Ok(value);
        }
    }

    Err(PrimerError::GenerationFailure(format!(
        "no parseable structured block in reply: {}",
        preview(reply)
    )))
}

/// Extract and decode the text fields of an entity
pub fn parse_text_fields(reply: &str) -> Result<TextFields> {
    let value = extract_json_block(reply)?;
    let raw: RawFields = serde_json::from_value(value)
        .map_err(|e| PrimerError::GenerationFailure(format!("malformed text fields: {}", e)))?;
    raw.into_fields()
}

/// Wire shape of the block, accepting the key spellings models actually return
#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(
        default,
        rename = "translatedName",
        alias = "translated_name",
        alias = "englishName",
        alias = "english-name",
        alias = "car-english-name"
    )]
    translated_name: Option<String>,
    #[serde(default, alias = "car-description")]
    description: Option<String>,
    #[serde(
        default,
        rename = "primaryPronunciation",
        alias = "primary_pronunciation",
        alias = "english-pronunciation",
        alias = "car-english-pronunciation"
    )]
    primary_pronunciation: Option<String>,
    #[serde(
        default,
        rename = "secondaryPronunciation",
        alias = "secondary_pronunciation",
        alias = "american-pronunciation",
        alias = "car-american-pronunciation"
    )]
    secondary_pronunciation: Option<String>,
}

impl RawFields {
    fn into_fields(self) -> Result<TextFields> {
        let translated_name = required(self.translated_name, "translatedName")?;
        let description = required(self.description, "description")?;
        Ok(TextFields {
            translated_name,
            description,
            primary_pronunciation: optional(self.primary_pronunciation),
            secondary_pronunciation: optional(self.secondary_pronunciation),
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    optional(value).ok_or_else(|| {
        PrimerError::GenerationFailure(format!("structured block is missing '{}'", key))
    })
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Balanced `{...}` spans in order of their opening brace, ignoring braces in strings
fn balanced_blocks(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();

    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &b) in bytes[start..].iter().enumerate() {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        blocks.push(&text[start..=start + offset]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    blocks
}

fn preview(reply: &str) -> String {
    const MAX: usize = 80;
    let trimmed = reply.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
