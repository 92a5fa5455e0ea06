//! Asset directory layout and deterministic file naming

use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where generated assets live and how their files are named.
///
/// Catalog paths are stored relative to `asset_root`, `/`-separated, e.g.
/// `assets/images/苹果_食物.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLayout {
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
    #[serde(default = "default_primary_tag")]
    pub primary_language_tag: String,
    #[serde(default = "default_secondary_tag")]
    pub secondary_language_tag: String,
}

fn default_asset_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_image_dir() -> String {
    "assets/images".to_string()
}
fn default_audio_dir() -> String {
    "assets/audios".to_string()
}
fn default_image_extension() -> String {
    "jpg".to_string()
}
fn default_audio_extension() -> String {
    "mp3".to_string()
}
fn default_primary_tag() -> String {
    "zh".to_string()
}
fn default_secondary_tag() -> String {
    "en".to_string()
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            image_dir: default_image_dir(),
            audio_dir: default_audio_dir(),
            image_extension: default_image_extension(),
            audio_extension: default_audio_extension(),
            primary_language_tag: default_primary_tag(),
            secondary_language_tag: default_secondary_tag(),
        }
    }
}

impl AssetLayout {
    /// Default layout rooted at `asset_root`
    pub fn rooted<P: AsRef<Path>>(asset_root: P) -> Self {
        Self {
            asset_root: asset_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// `<image_dir>/<name>_<category>.<ext>`
    pub fn image_path(&self, entity: &Entity) -> String {
        let stem = if entity.category.trim().is_empty() {
            sanitize_stem(&entity.name)
        } else {
            format!(
                "{}_{}",
                sanitize_stem(&entity.name),
                sanitize_stem(&entity.category)
            )
        };
        join_rel(&self.image_dir, &format!("{}.{}", stem, self.image_extension))
    }

    /// `<audio_dir>/<name>_<primary tag>.<ext>`
    pub fn primary_audio_path(&self, entity: &Entity) -> String {
        self.audio_path(&entity.name, &self.primary_language_tag)
    }

    /// `<audio_dir>/<translated name>_<secondary tag>.<ext>`, once the translation exists
    pub fn secondary_audio_path(&self, entity: &Entity) -> Option<String> {
        entity
            .translated_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| self.audio_path(t, &self.secondary_language_tag))
    }

    fn audio_path(&self, text: &str, tag: &str) -> String {
        join_rel(
            &self.audio_dir,
            &format!("{}_{}.{}", sanitize_stem(text), tag, self.audio_extension),
        )
    }

    /// Absolute (or root-relative) location of a catalog path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let normalized = normalize_rel(relative);
        let mut path = self.asset_root.clone();
        for part in normalized.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    /// The directories the reconciler scans, relative to the asset root
    pub fn asset_dirs(&self) -> Vec<&str> {
        let mut dirs = vec![self.image_dir.as_str()];
        if self.audio_dir != self.image_dir {
            dirs.push(self.audio_dir.as_str());
        }
        dirs
    }
}

/// Make a string safe to use as a file stem on common filesystems
pub fn sanitize_stem(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Normalize a stored path: `\` to `/`, drop `.`, `..` and empty segments.
///
/// Catalog paths never climb out of the asset root.
pub(crate) fn normalize_rel(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn join_rel(dir: &str, file: &str) -> String {
    let dir = normalize_rel(dir);
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}
