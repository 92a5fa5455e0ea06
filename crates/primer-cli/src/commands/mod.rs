//! CLI command implementations

pub mod check;
pub mod generate;
pub mod providers;
pub mod reconcile;
pub mod validate;

use anyhow::{bail, Context, Result};
use primer_catalog::{Catalog, CatalogStorage, CatalogStore};
use primer_gen::PrimerConfig;
use std::path::Path;

/// Load the explicit config file, or the layered global + project config
pub fn load_config(path: Option<&Path>) -> Result<PrimerConfig> {
    match path {
        Some(path) => PrimerConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PrimerConfig::load()?),
    }
}

/// Open the configured catalog; a missing file loads as empty
pub fn load_catalog(config: &PrimerConfig) -> Result<(CatalogStore, Catalog)> {
    let store = CatalogStore::new(config.catalog_path());
    let catalog = store.load()?;
    log::debug!(
        "Loaded {} entities from {}",
        catalog.len(),
        store.path().display()
    );
    Ok((store, catalog))
}

pub fn check_format(format: &str) -> Result<bool> {
    match format {
        "text" => Ok(false),
        "json" => Ok(true),
        other => bail!("Unknown format '{}'. Use: text, json", other),
    }
}
