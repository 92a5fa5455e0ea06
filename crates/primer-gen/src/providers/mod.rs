//! Provider registry
//!
//! Maps provider names to concrete capability implementations.

pub mod doubao;
pub mod edge_tts;
pub mod mock;
pub mod modelscope;

use crate::capability::{Capability, ImageGenerator, SpeechGenerator, TextGenerator};
use crate::config::PrimerConfig;
use crate::http::HttpClient;
use primer_core::{PrimerError, Result};

pub const MOCK: &str = "mock";
pub const MODELSCOPE: &str = "modelscope";
pub const DOUBAO: &str = "doubao";
pub const EDGE_TTS: &str = "edge-tts";

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec![MOCK, MODELSCOPE, DOUBAO, EDGE_TTS]
}

/// Capabilities a provider implements
pub fn capabilities(name: &str) -> &'static [Capability] {
    match name {
        MOCK => &Capability::ALL,
        MODELSCOPE => &[Capability::Text, Capability::Image],
        DOUBAO => &[Capability::Image],
        EDGE_TTS => &[Capability::Speech],
        _ => &[],
    }
}

pub fn supports(name: &str, capability: Capability) -> bool {
    capabilities(name).contains(&capability)
}

/// Create the text generator selected in `config`
pub fn create_text_generator(config: &PrimerConfig) -> Result<Box<dyn TextGenerator>> {
    let name = config.provider_for(Capability::Text);
    match name {
        MOCK => Ok(Box::new(mock::MockProvider::new())),
        MODELSCOPE => Ok(Box::new(modelscope::ModelScopeProvider::from_config(config)?)),
        _ => Err(unsupported(name, Capability::Text)),
    }
}

/// Create the image generator selected in `config`
pub fn create_image_generator(config: &PrimerConfig) -> Result<Box<dyn ImageGenerator>> {
    let name = config.provider_for(Capability::Image);
    match name {
        MOCK => Ok(Box::new(mock::MockProvider::new())),
        MODELSCOPE => Ok(Box::new(modelscope::ModelScopeProvider::from_config(config)?)),
        DOUBAO => Ok(Box::new(doubao::DoubaoProvider::from_config(config)?)),
        _ => Err(unsupported(name, Capability::Image)),
    }
}

/// Create the speech generator selected in `config`
pub fn create_speech_generator(config: &PrimerConfig) -> Result<Box<dyn SpeechGenerator>> {
    let name = config.provider_for(Capability::Speech);
    match name {
        MOCK => Ok(Box::new(mock::MockProvider::new())),
        EDGE_TTS => Ok(Box::new(edge_tts::EdgeTtsProvider::from_config(config)?)),
        _ => Err(unsupported(name, Capability::Speech)),
    }
}

fn unsupported(name: &str, capability: Capability) -> PrimerError {
    PrimerError::ConfigurationError(format!(
        "provider '{}' cannot generate {}. Available: {}",
        name,
        capability,
        available_providers()
            .into_iter()
            .filter(|p| supports(p, capability))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn http_client(name: &str, config: &PrimerConfig) -> Result<HttpClient> {
    HttpClient::new(name, config.request_timeout(), config.proxy_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(text: &str, image: &str, speech: &str) -> PrimerConfig {
        let mut config = PrimerConfig::default();
        config.generation.text_provider = text.to_string();
        config.generation.image_provider = image.to_string();
        config.generation.speech_provider = speech.to_string();
        config
    }

    #[test]
    fn test_create_mock_generators() {
        let config = config(MOCK, MOCK, MOCK);
        assert_eq!(create_text_generator(&config).unwrap().name(), MOCK);
        assert_eq!(create_image_generator(&config).unwrap().name(), MOCK);
        assert_eq!(create_speech_generator(&config).unwrap().name(), MOCK);
    }

    #[test]
    fn test_create_network_generators() {
        let config = config(MODELSCOPE, DOUBAO, EDGE_TTS);
        assert_eq!(create_text_generator(&config).unwrap().name(), MODELSCOPE);
        assert_eq!(create_image_generator(&config).unwrap().name(), DOUBAO);
        assert_eq!(create_speech_generator(&config).unwrap().name(), EDGE_TTS);
    }

    #[test]
    fn test_capability_mismatch_rejected() {
        let config = config(DOUBAO, EDGE_TTS, MODELSCOPE);
        assert!(create_text_generator(&config).is_err());
        assert!(create_image_generator(&config).is_err());
        let err = create_speech_generator(&config).err().unwrap();
        assert!(err.to_string().contains("Available: mock, edge-tts"));
    }

    #[test]
    fn test_every_provider_has_a_capability() {
        for name in available_providers() {
            assert!(!capabilities(name).is_empty(), "{}", name);
        }
        assert!(capabilities("nope").is_empty());
    }
}
