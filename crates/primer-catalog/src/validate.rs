//! Catalog validation with cascading asset deletion
//!
//! Entries matching any exclusion rule are removed from the catalog together
//! with the files they reference. Dry runs only report.

use crate::catalog::Catalog;
use crate::entity::Entity;
use crate::layout::{normalize_rel, AssetLayout};
use crate::reconcile::referenced_files;
use crate::store::{CatalogStorage, CatalogStore};
use primer_core::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single reason to exclude an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionRule {
    /// Entity category is in the excluded list
    Category(Vec<String>),
    /// Name shorter than `n` characters
    MinNameLength(usize),
    /// Name contains the given substring
    ForbiddenSubstring(String),
    /// Name is a single alphabetic character
    SingleCharacterName,
}

impl ExclusionRule {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            ExclusionRule::Category(categories) => categories.iter().any(|c| *c == entity.category),
            ExclusionRule::MinNameLength(min) => entity.name.chars().count() < *min,
            ExclusionRule::ForbiddenSubstring(needle) => {
                !needle.is_empty() && entity.name.contains(needle.as_str())
            }
            ExclusionRule::SingleCharacterName => {
                let mut chars = entity.name.chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
            }
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionRule::Category(categories) => {
                write!(f, "excluded category ({})", categories.join(", "))
            }
            ExclusionRule::MinNameLength(min) => write!(f, "name shorter than {} characters", min),
            ExclusionRule::ForbiddenSubstring(s) => write!(f, "name contains '{}'", s),
            ExclusionRule::SingleCharacterName => write!(f, "single-letter name"),
        }
    }
}

/// Rule settings as read from the `[validation]` config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: Vec<String>,
    #[serde(default = "default_min_name_length")]
    pub min_name_length: usize,
    #[serde(default = "default_forbidden_substrings")]
    pub forbidden_substrings: Vec<String>,
    #[serde(default = "default_true")]
    pub exclude_single_character: bool,
}

fn default_excluded_categories() -> Vec<String> {
    vec!["字母".to_string()]
}
fn default_min_name_length() -> usize {
    2
}
fn default_forbidden_substrings() -> Vec<String> {
    vec!["字母".to_string()]
}
fn default_true() -> bool {
    true
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            excluded_categories: default_excluded_categories(),
            min_name_length: default_min_name_length(),
            forbidden_substrings: default_forbidden_substrings(),
            exclude_single_character: true,
        }
    }
}

/// A conjunction of exclusion rules: any match excludes the entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
}

impl ExclusionRules {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self { rules }
    }

    pub fn from_settings(settings: &ValidationSettings) -> Self {
        let mut rules = Vec::new();
        if !settings.excluded_categories.is_empty() {
            rules.push(ExclusionRule::Category(settings.excluded_categories.clone()));
        }
        if settings.exclude_single_character {
            rules.push(ExclusionRule::SingleCharacterName);
        }
        for needle in &settings.forbidden_substrings {
            rules.push(ExclusionRule::ForbiddenSubstring(needle.clone()));
        }
        if settings.min_name_length > 0 {
            rules.push(ExclusionRule::MinNameLength(settings.min_name_length));
        }
        Self { rules }
    }

    /// The first rule that excludes `entity`, if any
    pub fn first_match(&self, entity: &Entity) -> Option<&ExclusionRule> {
        self.rules.iter().find(|r| r.matches(entity))
    }

    pub fn excludes(&self, entity: &Entity) -> bool {
        self.first_match(entity).is_some()
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }
}

/// An entity selected for removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedEntry {
    pub name: String,
    pub category: String,
    pub reason: String,
    /// Catalog-relative paths of the files it references
    pub files: Vec<String>,
}

/// Outcome of a validation pass
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub dry_run: bool,
    pub kept: usize,
    pub removed: Vec<RemovedEntry>,
    pub deleted_files: Vec<String>,
    /// Referenced by a removed entry but already absent
    pub missing_files: Vec<String>,
    /// Referenced by a removed entry and also by a kept one, left on disk
    pub shared_files: Vec<String>,
    pub failures: Vec<PrimerError>,
    pub backup_path: Option<PathBuf>,
}

impl ValidationReport {
    /// Whether the pass changed anything on disk
    pub fn wrote_catalog(&self) -> bool {
        self.backup_path.is_some()
    }
}

/// Applies exclusion rules to the stored catalog
pub struct Validator<'a> {
    store: &'a CatalogStore,
    layout: &'a AssetLayout,
    rules: ExclusionRules,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a CatalogStore, layout: &'a AssetLayout, rules: ExclusionRules) -> Self {
        Self {
            store,
            layout,
            rules,
        }
    }

    /// Split `catalog` into kept entities and removal records
    pub fn partition(&self, catalog: Catalog) -> (Catalog, Vec<RemovedEntry>) {
        let mut kept = Catalog::new();
        let mut removed = Vec::new();

        for entity in catalog.into_entities() {
            match self.rules.first_match(&entity) {
                Some(rule) => {
                    log::info!("Excluding '{}': {}", entity.name, rule);
                    removed.push(RemovedEntry {
                        reason: rule.to_string(),
                        files: entity.referenced_paths().iter().map(|p| p.to_string()).collect(),
                        name: entity.name,
                        category: entity.category,
                    });
                }
                None => {
                    kept.insert(entity);
                }
            }
        }

        (kept, removed)
    }

    /// Validate the stored catalog.
    ///
    /// With `dry_run` nothing is written or deleted. Otherwise the catalog is
    /// backed up to `<file>.bak` (replacing any previous backup), only kept
    /// entities are persisted, and then each removed entry's files are
    /// deleted unless a kept entity still references them.
    pub fn process(&self, dry_run: bool) -> Result<ValidationReport> {
        let catalog = self.store.load()?;
        let total = catalog.len();
        let (kept, removed) = self.partition(catalog);

        let mut report = ValidationReport {
            dry_run,
            kept: kept.len(),
            ..Default::default()
        };
        log::info!(
            "Validated {} entries: {} kept, {} to remove",
            total,
            report.kept,
            removed.len()
        );

        if dry_run || removed.is_empty() {
            report.removed = removed;
            return Ok(report);
        }

        let backup = self.store.backup()?;
        log::info!("Backed up catalog to {}", backup.display());
        self.store.save(&kept)?;

        let still_referenced = referenced_files(&kept);
        for entry in &removed {
            for file in &entry.files {
                if still_referenced.contains(&normalize_rel(file)) {
                    log::info!("Keeping {}: still referenced by a kept entry", file);
                    report.shared_files.push(file.clone());
                    continue;
                }
                let path = self.layout.resolve(file);
                if !path.exists() {
                    log::warn!("File for '{}' already missing: {}", entry.name, file);
                    report.missing_files.push(file.clone());
                    continue;
                }
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        log::info!("Deleted {}", file);
                        report.deleted_files.push(file.clone());
                    }
                    Err(e) => {
                        let err = PrimerError::file_system(&path, e);
                        log::warn!("{}", err);
                        report.failures.push(err);
                    }
                }
            }
        }

        report.backup_path = Some(backup);
        report.removed = removed;
        Ok(report)
    }
}
