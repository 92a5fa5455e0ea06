//! Generation capability traits and request types

use crate::extract::parse_text_fields;
use crate::prompt::PromptBuilder;
use primer_catalog::TextFields;
use primer_core::{Credential, Result};
use std::fmt;

/// The three external generation capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Text,
    Image,
    Speech,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Text, Capability::Image, Capability::Speech];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Text => write!(f, "text"),
            Capability::Image => write!(f, "image"),
            Capability::Speech => write!(f, "speech"),
        }
    }
}

/// A chat-style prompt for an entity's text fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPrompt {
    pub entity_name: String,
    pub category: String,
    pub system: String,
    pub user: String,
}

/// An image request: the entity plus the fully built prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub entity_name: String,
    pub category: String,
    pub prompt: String,
}

/// Which of the two catalog languages to speak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// The entity name's language
    Primary,
    /// The translated name's language
    Secondary,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Primary => write!(f, "primary"),
            Language::Secondary => write!(f, "secondary"),
        }
    }
}

/// Produces the descriptive text fields of an entity
pub trait TextGenerator: Send {
    fn name(&self) -> &str;

    /// Run one chat completion and return the raw reply
    fn complete(&self, credential: &Credential, prompt: &TextPrompt) -> Result<String>;

    /// Complete `prompt` and extract the structured block from the reply
    fn fields_from_prompt(&self, credential: &Credential, prompt: &TextPrompt) -> Result<TextFields> {
        let reply = self.complete(credential, prompt)?;
        log::debug!("{} reply for '{}': {}", self.name(), prompt.entity_name, reply);
        parse_text_fields(&reply)
    }

    /// Generate text fields with the default prompt template
    fn generate_fields(
        &self,
        credential: &Credential,
        name: &str,
        category: &str,
    ) -> Result<TextFields> {
        let prompt = PromptBuilder::default().text_prompt(name, category);
        self.fields_from_prompt(credential, &prompt)
    }
}

/// Produces image bytes for an entity
pub trait ImageGenerator: Send {
    fn name(&self) -> &str;

    fn generate_image(&self, credential: &Credential, request: &ImageRequest) -> Result<Vec<u8>>;
}

/// Produces spoken audio bytes for a piece of text
pub trait SpeechGenerator: Send {
    fn name(&self) -> &str;

    fn generate_speech(
        &self,
        credential: &Credential,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use primer_core::PrimerError;

    struct CannedText(&'static str);

    impl TextGenerator for CannedText {
        fn name(&self) -> &str {
            "canned"
        }

        fn complete(&self, _credential: &Credential, prompt: &TextPrompt) -> Result<String> {
            assert!(prompt.user.contains(&prompt.entity_name));
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_generate_fields_extracts_block() {
        let generator = CannedText(
            r#"好的，以下是信息：
{"translatedName": "Apple", "description": "红红的水果", "primaryPronunciation": "/ˈæp.əl/"}
希望对你有帮助！"#,
        );
        let fields = generator
            .generate_fields(&Credential::new("k"), "苹果", "食物")
            .unwrap();
        assert_eq!(fields.translated_name, "Apple");
        assert_eq!(fields.description, "红红的水果");
        assert_eq!(fields.primary_pronunciation.as_deref(), Some("/ˈæp.əl/"));
        assert_eq!(fields.secondary_pronunciation, None);
    }

    #[test]
    fn test_generate_fields_without_block_fails() {
        let generator = CannedText("抱歉，我无法回答。");
        let err = generator
            .generate_fields(&Credential::new("k"), "苹果", "食物")
            .unwrap_err();
        assert!(matches!(err, PrimerError::GenerationFailure(_)));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Capability::Speech.to_string(), "speech");
        assert_eq!(Language::Secondary.to_string(), "secondary");
    }
}
