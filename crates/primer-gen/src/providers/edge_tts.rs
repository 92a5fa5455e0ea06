//! Edge TTS speech provider
//!
//! Talks to a text-to-speech forwarder exposing
//! `GET /api/text-to-speech?voice=...&text=...` with a bearer token.
//! Speech generation is fast, so `generate_speech()` blocks synchronously.

use super::{http_client, EDGE_TTS};
use crate::capability::{Language, SpeechGenerator};
use crate::config::PrimerConfig;
use crate::http::{trim_base, HttpClient};
use primer_core::{Credential, PrimerError, Result};

const DEFAULT_EDGE_TTS_URL: &str = "https://ms-ra-forwarder-silk-ten.vercel.app";

pub struct EdgeTtsProvider {
    client: HttpClient,
    api_url: String,
    primary_voice: String,
    secondary_voice: String,
}

impl EdgeTtsProvider {
    pub fn from_config(config: &PrimerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(EDGE_TTS, config)?,
            api_url: trim_base(config.api_url(EDGE_TTS).unwrap_or(DEFAULT_EDGE_TTS_URL))
                .to_string(),
            primary_voice: config.speech.primary_voice.clone(),
            secondary_voice: config.speech.secondary_voice.clone(),
        })
    }

    fn voice(&self, language: Language) -> &str {
        match language {
            Language::Primary => &self.primary_voice,
            Language::Secondary => &self.secondary_voice,
        }
    }
}

impl SpeechGenerator for EdgeTtsProvider {
    fn name(&self) -> &str {
        EDGE_TTS
    }

    fn generate_speech(
        &self,
        credential: &Credential,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>> {
        let url = speech_url(&self.api_url, self.voice(language), text);
        log::debug!("Edge TTS request: {}", url);

        let bytes = self.client.get_bytes(&url, Some(credential))?;
        if bytes.is_empty() {
            return Err(PrimerError::GenerationFailure(format!(
                "Edge TTS returned no audio for '{}'",
                text
            )));
        }
        Ok(bytes)
    }
}

/// Build the request URL. Voice names use `+` for spaces; the text is percent-encoded.
pub fn speech_url(base: &str, voice: &str, text: &str) -> String {
    format!(
        "{}/api/text-to-speech?voice={}&volume=0&rate=0&pitch=0&text={}",
        base,
        voice.replace(' ', "+"),
        urlencoding::encode(text)
    )
}
