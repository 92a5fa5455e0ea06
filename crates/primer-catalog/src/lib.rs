//! Primer Catalog - The entity catalog and its asset directories
//!
//! This crate owns the on-disk catalog document (an ordered JSON array of
//! entities), the deterministic asset naming scheme, the reconciler that
//! compares catalog references against the asset directories, and the
//! validator that removes invalid entries together with their files.

mod catalog;
mod entity;
mod layout;
mod reconcile;
mod store;
mod validate;

pub use catalog::{Catalog, NameIndex};
pub use entity::{Entity, EntityState, FieldGroup, TextFields};
pub use layout::{sanitize_stem, AssetLayout};
pub use reconcile::{actual_files, referenced_files, DeleteSummary, ReconcileReport, Reconciler};
pub use store::{CatalogStorage, CatalogStore};
pub use validate::{
    ExclusionRule, ExclusionRules, RemovedEntry, ValidationReport, ValidationSettings, Validator,
};
