//! In-memory catalog of entities

use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Ordered collection of entities with unique names.
///
/// Insertion order is preserved so saved output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entities: Vec<Entity>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an ordered list.
    ///
    /// Returns the first duplicated name on failure.
    pub fn from_entities(entities: Vec<Entity>) -> std::result::Result<Self, String> {
        let mut seen = HashSet::new();
        for entity in &entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(entity.name.clone());
            }
        }
        Ok(Self { entities })
    }

    /// Append an entity. Returns false (and drops nothing) if the name is taken.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(&entity.name) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    /// Keep only entities matching the predicate, preserving order
    pub fn retain<F: FnMut(&Entity) -> bool>(&mut self, f: F) {
        self.entities.retain(f);
    }

    /// Count entities per category, in first-seen order
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entity in &self.entities {
            let count = counts.entry(entity.category.as_str()).or_insert(0);
            if *count == 0 {
                order.push(entity.category.clone());
            }
            *count += 1;
        }
        order
            .into_iter()
            .map(|c| {
                let n = counts[c.as_str()];
                (c, n)
            })
            .collect()
    }

    /// Build the name index used to decide which seeds need work
    pub fn index_by_name(&self) -> NameIndex {
        NameIndex::build(self, Entity::is_complete)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Snapshot of which names exist, and which of those are fully generated.
///
/// Computed once at the start of a run; it is not refreshed as fields are
/// filled in.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashSet<String>,
    complete: HashSet<String>,
}

impl NameIndex {
    /// Index a catalog, using `is_complete` to decide completeness
    pub fn build<F>(catalog: &Catalog, mut is_complete: F) -> Self
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut index = Self::default();
        for entity in catalog.iter() {
            if is_complete(entity) {
                index.complete.insert(entity.name.clone());
            }
            index.names.insert(entity.name.clone());
        }
        index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_complete(&self, name: &str) -> bool {
        self.complete.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn complete_count(&self) -> usize {
        self.complete.len()
    }
}
