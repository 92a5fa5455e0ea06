//! Missing-file check command

use super::{check_format, load_catalog};
use anyhow::Result;
use primer_catalog::{AssetLayout, Catalog, CatalogStorage, EntityState};
use primer_gen::PrimerConfig;

/// An entity with at least one referenced file absent from disk
#[derive(Debug, PartialEq, Eq)]
struct MissingAssets {
    name: String,
    category: String,
    paths: Vec<String>,
}

fn find_missing(catalog: &Catalog, layout: &AssetLayout) -> Vec<MissingAssets> {
    catalog
        .iter()
        .filter_map(|entity| {
            let paths: Vec<String> = entity
                .referenced_paths()
                .into_iter()
                .filter(|p| !layout.resolve(p).exists())
                .map(str::to_string)
                .collect();
            (!paths.is_empty()).then(|| MissingAssets {
                name: entity.name.clone(),
                category: entity.category.clone(),
                paths,
            })
        })
        .collect()
}

pub fn run(config: &PrimerConfig, format: &str) -> Result<bool> {
    let json = check_format(format)?;
    let (store, catalog) = load_catalog(config)?;
    let missing = find_missing(&catalog, config.layout());

    if json {
        let items: Vec<serde_json::Value> = missing
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "category": m.category,
                    "missing": m.paths,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(missing.is_empty());
    }

    let complete = catalog
        .iter()
        .filter(|e| e.state() == EntityState::AudioComplete)
        .count();
    println!(
        "{}: {} entities, {} complete",
        store.path().display(),
        catalog.len(),
        complete
    );
    for (category, count) in catalog.categories() {
        println!("  {:<12} {}", category, count);
    }

    if missing.is_empty() {
        println!("\nAll referenced files are present.");
        return Ok(true);
    }

    let total: usize = missing.iter().map(|m| m.paths.len()).sum();
    println!(
        "\n{} missing file(s) across {} entities:",
        total,
        missing.len()
    );
    for entry in &missing {
        println!("  {} ({})", entry.name, entry.category);
        for path in &entry.paths {
            println!("    {}", path);
        }
    }
    Ok(false)
}
