//! Mock provider for testing
//!
//! Answers text prompts with a canned JSON block wrapped in prose, generates
//! solid-color PNG images and silent WAV audio without any network calls.

use super::MOCK;
use crate::capability::{ImageGenerator, ImageRequest, Language, SpeechGenerator, TextGenerator, TextPrompt};
use primer_core::{Credential, PrimerError, Result};
use std::io::Cursor;

const IMAGE_SIZE: u32 = 64;
const SILENCE_SECS: f64 = 0.5;

/// A mock provider that generates placeholder content locally
#[derive(Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TextGenerator for MockProvider {
    fn name(&self) -> &str {
        MOCK
    }

    fn complete(&self, _credential: &Credential, prompt: &TextPrompt) -> Result<String> {
        let block = serde_json::json!({
            "translatedName": format!("Mock {}", prompt.entity_name),
            "description": format!("{}是一种{}。", prompt.entity_name, prompt.category),
            "primaryPronunciation": "/mɒk/",
            "secondaryPronunciation": "/mɑːk/"
        });
        Ok(format!(
            "好的，以下是“{}”的信息：\n```json\n{}\n```\n希望对你有帮助！",
            prompt.entity_name,
            serde_json::to_string_pretty(&block)?
        ))
    }
}

impl ImageGenerator for MockProvider {
    fn name(&self) -> &str {
        MOCK
    }

    fn generate_image(&self, _credential: &Credential, request: &ImageRequest) -> Result<Vec<u8>> {
        solid_png(&request.entity_name, IMAGE_SIZE, IMAGE_SIZE)
    }
}

impl SpeechGenerator for MockProvider {
    fn name(&self) -> &str {
        MOCK
    }

    fn generate_speech(
        &self,
        _credential: &Credential,
        _text: &str,
        _language: Language,
    ) -> Result<Vec<u8>> {
        Ok(silence_wav(SILENCE_SECS))
    }
}

/// Encode a solid-color PNG, the color derived from `seed`
fn solid_png(seed: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let hash_val = seed.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let r = ((hash_val >> 16) & 0xFF) as u8;
    let g = ((hash_val >> 8) & 0xFF) as u8;
    let b = (hash_val & 0xFF) as u8;

    let mut img_data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..(width * height) {
        img_data.extend_from_slice(&[r, g, b, 255]);
    }

    let img = image::RgbaImage::from_raw(width, height, img_data).ok_or_else(|| {
        PrimerError::GenerationFailure("failed to create image buffer".to_string())
    })?;

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| PrimerError::GenerationFailure(format!("failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

/// A mono 16-bit 44.1 kHz WAV of silence
fn silence_wav(duration_secs: f64) -> Vec<u8> {
    let sample_rate: u32 = 44100;
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let num_samples = (sample_rate as f64 * duration_secs) as u32;
    let data_size = num_samples * (bits_per_sample / 8) as u32 * num_channels as u32;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.resize(44 + data_size as usize, 0);
    wav
}
