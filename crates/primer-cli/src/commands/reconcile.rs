//! Orphan and broken-reference reconciliation command

use super::{check_format, load_catalog};
use anyhow::Result;
use dialoguer::Confirm;
use primer_catalog::{ReconcileReport, Reconciler};
use primer_gen::PrimerConfig;

pub fn run(config: &PrimerConfig, delete: bool, yes: bool, format: &str) -> Result<bool> {
    let json = check_format(format)?;
    let (_store, catalog) = load_catalog(config)?;
    let reconciler = Reconciler::new(config.layout());
    let report = reconciler.report(&catalog)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_report(&report);
    }

    let mut success = report.is_clean();
    if !delete || report.orphans.is_empty() {
        return Ok(success);
    }

    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!("Delete {} orphaned file(s)?", report.orphans.len()))
            .default(false)
            .interact()?;
    if !confirmed {
        println!("Deletion cancelled.");
        return Ok(success);
    }

    let summary = reconciler.delete_orphans(&report);
    println!("Deleted {} orphaned file(s).", summary.deleted.len());
    for failure in &summary.failures {
        println!("  FAILED: {}", failure);
    }
    success &= summary.is_success();
    Ok(success)
}

fn print_report(report: &ReconcileReport) {
    println!(
        "{} referenced, {} on disk",
        report.referenced.len(),
        report.actual.len()
    );

    if report.orphans.is_empty() {
        println!("No orphaned files.");
    } else {
        println!("\n{} orphaned file(s):", report.orphans.len());
        for orphan in &report.orphans {
            println!("  {}", orphan);
        }
    }

    if report.broken.is_empty() {
        println!("No broken references.");
    } else {
        println!("\n{} broken reference(s):", report.broken.len());
        for broken in &report.broken {
            println!("  {}", broken);
        }
    }
}

fn report_json(report: &ReconcileReport) -> serde_json::Value {
    serde_json::json!({
        "referenced": report.referenced.len(),
        "actual": report.actual.len(),
        "orphans": report.orphans,
        "broken": report.broken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use primer_catalog::{Catalog, CatalogStorage, CatalogStore, Entity};
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_report_json_lists_paths() {
        let report = ReconcileReport::from_sets(
            set(&["assets/images/a.jpg", "assets/images/b.jpg"]),
            set(&["assets/images/a.jpg", "assets/images/c.jpg"]),
        );
        let value = report_json(&report);
        assert_eq!(value["referenced"], 2);
        assert_eq!(value["orphans"][0], "assets/images/c.jpg");
        assert_eq!(value["broken"][0], "assets/images/b.jpg");
    }

    #[test]
    fn test_delete_with_yes_removes_orphans() {
        let dir = std::env::temp_dir().join(format!("primer_cli_reconcile_{}", uuid::Uuid::new_v4()));
        let images = dir.join("assets/images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("stray.jpg"), b"x").unwrap();

        let mut config = PrimerConfig::default();
        config.catalog.layout.asset_root = dir.clone();

        let success = run(&config, true, true, "text").unwrap();
        assert!(success);
        assert!(!images.join("stray.jpg").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_broken_reference_fails_run() {
        let dir = std::env::temp_dir().join(format!("primer_cli_reconcile_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = PrimerConfig::default();
        config.catalog.layout.asset_root = dir.clone();
        let mut entity = Entity::new("苹果", "食物");
        entity.image_path = "assets/images/苹果_食物.jpg".to_string();
        let mut catalog = Catalog::new();
        catalog.insert(entity);
        CatalogStore::new(config.catalog_path()).save(&catalog).unwrap();

        assert!(!run(&config, false, false, "text").unwrap());
        assert!(!run(&config, true, true, "json").unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_format() {
        let config = PrimerConfig::default();
        assert!(run(&config, false, false, "yaml").is_err());
    }
}
