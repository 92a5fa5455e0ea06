//! Catalog/file-system reconciliation
//!
//! Compares the set of paths the catalog references with the files actually
//! present in the asset directories. Orphans (on disk, unreferenced) are
//! candidates for deletion; broken references (referenced, not on disk) mean
//! the catalog and disk disagree and are reported separately.

use crate::catalog::Catalog;
use crate::layout::{normalize_rel, AssetLayout};
use primer_core::{PrimerError, Result};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Union of all non-empty asset paths in the catalog
pub fn referenced_files(catalog: &Catalog) -> BTreeSet<String> {
    catalog
        .iter()
        .flat_map(|e| e.referenced_paths())
        .map(normalize_rel)
        .collect()
}

/// Every file under each of `dirs`, relative to `asset_root`, `/`-separated.
///
/// Missing directories contribute nothing.
pub fn actual_files(asset_root: &Path, dirs: &[&str]) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();

    for dir in dirs {
        let base = asset_root.join(normalize_rel(dir));
        if !base.exists() {
            log::debug!("Asset directory {} does not exist", base.display());
            continue;
        }

        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| base.clone());
                PrimerError::file_system(path, e)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(asset_root)
                .map_err(|e| PrimerError::file_system(entry.path(), e))?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.insert(normalize_rel(&parts.join("/")));
        }
    }

    Ok(files)
}

/// Result of comparing catalog references with the asset directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub referenced: BTreeSet<String>,
    pub actual: BTreeSet<String>,
    /// On disk, not referenced by any entity
    pub orphans: BTreeSet<String>,
    /// Referenced by an entity, absent from disk
    pub broken: BTreeSet<String>,
}

impl ReconcileReport {
    pub fn from_sets(referenced: BTreeSet<String>, actual: BTreeSet<String>) -> Self {
        let orphans = actual.difference(&referenced).cloned().collect();
        let broken = referenced.difference(&actual).cloned().collect();
        Self {
            referenced,
            actual,
            orphans,
            broken,
        }
    }

    /// No broken references remain
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

/// Outcome of an explicit orphan deletion
#[derive(Debug, Default)]
pub struct DeleteSummary {
    pub deleted: Vec<String>,
    pub failures: Vec<PrimerError>,
}

impl DeleteSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reconciles a catalog against the asset directories of a layout
pub struct Reconciler<'a> {
    layout: &'a AssetLayout,
}

impl<'a> Reconciler<'a> {
    pub fn new(layout: &'a AssetLayout) -> Self {
        Self { layout }
    }

    /// Compute orphans and broken references. Never modifies the disk.
    pub fn report(&self, catalog: &Catalog) -> Result<ReconcileReport> {
        let referenced = referenced_files(catalog);
        let actual = actual_files(&self.layout.asset_root, &self.layout.asset_dirs())?;
        let report = ReconcileReport::from_sets(referenced, actual);
        log::info!(
            "Reconciled {} referenced / {} actual files: {} orphan(s), {} broken reference(s)",
            report.referenced.len(),
            report.actual.len(),
            report.orphans.len(),
            report.broken.len()
        );
        Ok(report)
    }

    /// Delete every orphan listed in `report`. Per-file failures are counted, not fatal.
    pub fn delete_orphans(&self, report: &ReconcileReport) -> DeleteSummary {
        let mut summary = DeleteSummary::default();
        for orphan in &report.orphans {
            let path = self.layout.resolve(orphan);
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("Deleted orphan {}", orphan);
                    summary.deleted.push(orphan.clone());
                }
                Err(e) => {
                    let err = PrimerError::file_system(&path, e);
                    log::warn!("{}", err);
                    summary.failures.push(err);
                }
            }
        }
        summary
    }
}
