//! Catalog file persistence
//!
//! The catalog is one JSON array written as a whole on every save. Writes go
//! through a temp file and a rename so a crash mid-write leaves the previous
//! document intact.

use crate::catalog::{Catalog, NameIndex};
use crate::entity::Entity;
use primer_core::{write_atomic, PrimerError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable storage for the catalog document
pub trait CatalogStorage {
    /// Load the catalog. A missing document is an empty catalog.
    fn load(&self) -> Result<Catalog>;

    /// Overwrite the stored document with `catalog`
    fn save(&self, catalog: &Catalog) -> Result<()>;

    /// Location of the document, for messages
    fn path(&self) -> &Path;

    /// Names present in the stored catalog
    fn index_by_name(&self) -> Result<NameIndex> {
        Ok(self.load()?.index_by_name())
    }
}

/// File-backed catalog store
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Where [`CatalogStore::backup`] writes its copy
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }

    /// Copy the current document to `<file>.bak`, replacing any earlier backup
    pub fn backup(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|e| PrimerError::persistence(&backup, e))?;
        Ok(backup)
    }

    fn corrupt(&self, reason: impl ToString) -> PrimerError {
        PrimerError::CorruptCatalog {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl CatalogStorage for CatalogStore {
    fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            log::debug!("No catalog at {}, starting empty", self.path.display());
            return Ok(Catalog::new());
        }

        let bytes = fs::read(&self.path)?;
        let entities: Vec<Entity> =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e))?;
        let catalog = Catalog::from_entities(entities)
            .map_err(|name| self.corrupt(format!("duplicate entity name '{}'", name)))?;

        log::debug!(
            "Loaded {} entities from {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(catalog)
            .map_err(|e| PrimerError::persistence(&self.path, e))?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes).map_err(|e| PrimerError::persistence(&self.path, e))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
