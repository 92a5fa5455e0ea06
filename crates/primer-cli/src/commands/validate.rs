//! Catalog validation command

use anyhow::Result;
use primer_catalog::{CatalogStore, ExclusionRules, ValidationReport, Validator};
use primer_gen::PrimerConfig;

pub fn run(config: &PrimerConfig, apply: bool) -> Result<bool> {
    let rules = ExclusionRules::from_settings(&config.validation);
    if rules.rules().is_empty() {
        println!("No exclusion rules configured.");
        println!("Add a [validation] table to .primer/config.toml to enable validation.");
        return Ok(true);
    }

    let store = CatalogStore::new(config.catalog_path());
    let validator = Validator::new(&store, config.layout(), rules);
    let report = validator.process(!apply)?;
    print_report(&report);

    Ok(report.failures.is_empty())
}

fn print_report(report: &ValidationReport) {
    if report.dry_run {
        println!("Dry run: nothing will be deleted (pass --apply to remove).");
    }
    println!(
        "{} kept, {} to remove",
        report.kept,
        report.removed.len()
    );

    for entry in &report.removed {
        println!("  {} ({}): {}", entry.name, entry.category, entry.reason);
        for file in &entry.files {
            println!("    {}", file);
        }
    }

    if report.dry_run {
        return;
    }

    println!("\nDeleted {} file(s).", report.deleted_files.len());
    if !report.missing_files.is_empty() {
        println!("{} file(s) were already missing:", report.missing_files.len());
        for file in &report.missing_files {
            println!("  {}", file);
        }
    }
    if !report.shared_files.is_empty() {
        println!(
            "{} file(s) kept, still used by other entries:",
            report.shared_files.len()
        );
        for file in &report.shared_files {
            println!("  {}", file);
        }
    }
    for failure in &report.failures {
        println!("  FAILED: {}", failure);
    }
    if let Some(backup) = &report.backup_path {
        println!("Backup: {}", backup.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primer_catalog::{Catalog, CatalogStorage, Entity, ValidationSettings};

    #[test]
    fn test_apply_removes_excluded_entries() {
        let dir = std::env::temp_dir().join(format!("primer_cli_validate_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = PrimerConfig::default();
        config.catalog.layout.asset_root = dir.clone();
        config.validation.excluded_categories = vec!["天气".to_string()];

        let store = CatalogStore::new(config.catalog_path());
        let mut catalog = Catalog::new();
        catalog.insert(Entity::new("苹果", "食物"));
        catalog.insert(Entity::new("彩虹", "天气"));
        store.save(&catalog).unwrap();

        assert!(run(&config, false).unwrap());
        assert_eq!(store.load().unwrap().len(), 2);

        assert!(run(&config, true).unwrap());
        let kept = store.load().unwrap();
        assert_eq!(kept.len(), 1);
        assert!(kept.contains("苹果"));
        assert!(store.backup_path().exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_no_rules_is_noop() {
        let mut config = PrimerConfig::default();
        config.catalog.layout.asset_root = std::env::temp_dir().join("primer_cli_validate_unused");
        config.validation = ValidationSettings {
            excluded_categories: vec![],
            min_name_length: 0,
            forbidden_substrings: vec![],
            exclude_single_character: false,
        };
        assert!(run(&config, true).unwrap());
    }
}
