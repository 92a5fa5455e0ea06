//! Entity record and field-group definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One catalog record.
///
/// Generated path fields use the empty string for "not yet generated" and
/// otherwise hold a `/`-separated path relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_pronunciation: Option<String>,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub primary_audio_path: String,
    #[serde(default)]
    pub secondary_audio_path: String,
}

/// Textual fields produced by a text generation provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    pub translated_name: String,
    pub description: String,
    #[serde(default)]
    pub primary_pronunciation: Option<String>,
    #[serde(default)]
    pub secondary_pronunciation: Option<String>,
}

/// A unit of generation that is produced and persisted independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldGroup {
    Text,
    Image,
    PrimaryAudio,
    SecondaryAudio,
}

impl FieldGroup {
    /// All groups in processing order
    pub const ALL: [FieldGroup; 4] = [
        FieldGroup::Text,
        FieldGroup::Image,
        FieldGroup::PrimaryAudio,
        FieldGroup::SecondaryAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Text => "text",
            FieldGroup::Image => "image",
            FieldGroup::PrimaryAudio => "primary-audio",
            FieldGroup::SecondaryAudio => "secondary-audio",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(FieldGroup::Text),
            "image" => Ok(FieldGroup::Image),
            "primary-audio" => Ok(FieldGroup::PrimaryAudio),
            "secondary-audio" => Ok(FieldGroup::SecondaryAudio),
            other => Err(format!(
                "unknown field group '{}'; valid values: text, image, primary-audio, secondary-audio",
                other
            )),
        }
    }
}

/// Generation progress of an entity, derived from its fields.
///
/// The state is the furthest stage whose predecessors are all complete, so an
/// entity holding only an image is still `Missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityState {
    Missing,
    TextGenerated,
    ImageGenerated,
    AudioComplete,
}

impl Entity {
    /// A freshly seeded entity with nothing generated yet
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            translated_name: None,
            description: None,
            primary_pronunciation: None,
            secondary_pronunciation: None,
            image_path: String::new(),
            primary_audio_path: String::new(),
            secondary_audio_path: String::new(),
        }
    }

    pub fn is_group_complete(&self, group: FieldGroup) -> bool {
        match group {
            FieldGroup::Text => {
                non_blank(self.translated_name.as_deref()) && non_blank(self.description.as_deref())
            }
            FieldGroup::Image => !self.image_path.is_empty(),
            FieldGroup::PrimaryAudio => !self.primary_audio_path.is_empty(),
            FieldGroup::SecondaryAudio => !self.secondary_audio_path.is_empty(),
        }
    }

    pub fn missing_groups(&self) -> Vec<FieldGroup> {
        FieldGroup::ALL
            .into_iter()
            .filter(|g| !self.is_group_complete(*g))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        FieldGroup::ALL.iter().all(|g| self.is_group_complete(*g))
    }

    pub fn state(&self) -> EntityState {
        if !self.is_group_complete(FieldGroup::Text) {
            EntityState::Missing
        } else if !self.is_group_complete(FieldGroup::Image) {
            EntityState::TextGenerated
        } else if !self.is_group_complete(FieldGroup::PrimaryAudio)
            || !self.is_group_complete(FieldGroup::SecondaryAudio)
        {
            EntityState::ImageGenerated
        } else {
            EntityState::AudioComplete
        }
    }

    /// The path stored for an asset-backed group (empty when not generated)
    pub fn asset_path(&self, group: FieldGroup) -> Option<&str> {
        match group {
            FieldGroup::Text => None,
            FieldGroup::Image => Some(&self.image_path),
            FieldGroup::PrimaryAudio => Some(&self.primary_audio_path),
            FieldGroup::SecondaryAudio => Some(&self.secondary_audio_path),
        }
    }

    pub fn set_asset_path(&mut self, group: FieldGroup, path: String) {
        match group {
            FieldGroup::Text => {}
            FieldGroup::Image => self.image_path = path,
            FieldGroup::PrimaryAudio => self.primary_audio_path = path,
            FieldGroup::SecondaryAudio => self.secondary_audio_path = path,
        }
    }

    /// All non-empty asset paths, in field order
    pub fn referenced_paths(&self) -> Vec<&str> {
        [
            self.image_path.as_str(),
            self.primary_audio_path.as_str(),
            self.secondary_audio_path.as_str(),
        ]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect()
    }

    pub fn apply_text(&mut self, fields: TextFields) {
        self.translated_name = Some(fields.translated_name);
        self.description = Some(fields.description);
        if fields.primary_pronunciation.is_some() {
            self.primary_pronunciation = fields.primary_pronunciation;
        }
        if fields.secondary_pronunciation.is_some() {
            self.secondary_pronunciation = fields.secondary_pronunciation;
        }
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_entity() -> Entity {
        Entity {
            name: "苹果".to_string(),
            category: "食物".to_string(),
            translated_name: Some("Apple".to_string()),
            description: Some("红红的，甜甜的水果".to_string()),
            primary_pronunciation: Some("/ˈæp.əl/".to_string()),
            secondary_pronunciation: None,
            image_path: "assets/images/苹果_食物.jpg".to_string(),
            primary_audio_path: "assets/audios/苹果_zh.mp3".to_string(),
            secondary_audio_path: "assets/audios/Apple_en.mp3".to_string(),
        }
    }

    #[test]
    fn test_entity_json_keys() {
        let json = serde_json::to_value(complete_entity()).unwrap();
        assert_eq!(json["translatedName"], "Apple");
        assert_eq!(json["imagePath"], "assets/images/苹果_食物.jpg");
        assert_eq!(json["secondaryAudioPath"], "assets/audios/Apple_en.mp3");
        assert!(json.get("secondaryPronunciation").is_none());
    }

    #[test]
    fn test_minimal_record_deserializes() {
        let entity: Entity = serde_json::from_str(r#"{"name":"飞机"}"#).unwrap();
        assert_eq!(entity, Entity::new("飞机", ""));
        assert_eq!(entity.state(), EntityState::Missing);
    }

    #[test]
    fn test_states_progress() {
        let mut entity = Entity::new("飞机", "航空器");
        assert_eq!(entity.state(), EntityState::Missing);
        assert_eq!(entity.missing_groups(), FieldGroup::ALL.to_vec());

        entity.apply_text(TextFields {
            translated_name: "Airplane".to_string(),
            description: "在天上飞".to_string(),
            primary_pronunciation: None,
            secondary_pronunciation: None,
        });
        assert_eq!(entity.state(), EntityState::TextGenerated);

        entity.set_asset_path(FieldGroup::Image, "assets/images/飞机_航空器.jpg".to_string());
        assert_eq!(entity.state(), EntityState::ImageGenerated);

        entity.set_asset_path(FieldGroup::PrimaryAudio, "a.mp3".to_string());
        entity.set_asset_path(FieldGroup::SecondaryAudio, "b.mp3".to_string());
        assert_eq!(entity.state(), EntityState::AudioComplete);
        assert!(entity.is_complete());
    }

    #[test]
    fn test_image_without_text_is_still_missing() {
        let mut entity = Entity::new("飞机", "航空器");
        entity.image_path = "assets/images/飞机_航空器.jpg".to_string();
        assert_eq!(entity.state(), EntityState::Missing);
        assert!(!entity.missing_groups().contains(&FieldGroup::Image));
    }

    #[test]
    fn test_blank_text_is_incomplete() {
        let mut entity = Entity::new("雨", "天气");
        entity.translated_name = Some("Rain".to_string());
        entity.description = Some("   ".to_string());
        assert!(!entity.is_group_complete(FieldGroup::Text));
    }

    #[test]
    fn test_referenced_paths_skip_empty() {
        let mut entity = complete_entity();
        entity.primary_audio_path.clear();
        assert_eq!(
            entity.referenced_paths(),
            vec!["assets/images/苹果_食物.jpg", "assets/audios/Apple_en.mp3"]
        );
    }

    #[test]
    fn test_field_group_parse() {
        assert_eq!("image".parse::<FieldGroup>().unwrap(), FieldGroup::Image);
        assert_eq!(
            " secondary-audio ".parse::<FieldGroup>().unwrap(),
            FieldGroup::SecondaryAudio
        );
        assert!("video".parse::<FieldGroup>().is_err());
        assert_eq!(FieldGroup::PrimaryAudio.to_string(), "primary-audio");
    }
}
