//! In-memory ontology.
//!
//! This is the reference implementation of [`Ontology`]. It keeps the axiom
//! set plus an entity → referencing-axioms index behind a single `RwLock`,
//! so one edit is atomic w.r.t. readers.
//!
//! ## Limitations
//!
//! - **No imports closure**: `imports()` is recorded but never followed.
//! - **No persistence**: this is a fixture, not a store.

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::*;
use crate::Result;
use super::Ontology;

// ============================================================================
// MemoryOntology
// ============================================================================

/// Indexed in-memory axiom set.
pub struct MemoryOntology {
    id: OntologyId,
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    axioms: HashSet<Axiom>,
    /// entity → axioms mentioning it
    references: HashMap<Entity, Vec<Axiom>>,
    imports: Vec<OntologyId>,
}

impl MemoryOntology {
    pub fn new(id: OntologyId) -> Self {
        Self { id, inner: RwLock::new(MemoryInner::default()) }
    }

    /// Build an ontology holding `axioms`. Each axiom is validated first.
    pub fn from_axioms(id: OntologyId, axioms: impl IntoIterator<Item = Axiom>) -> Result<Self> {
        let ont = Self::new(id);
        for axiom in axioms {
            ont.add_axiom(axiom)?;
        }
        Ok(ont)
    }

    /// Add an axiom. Returns false if it was already present.
    pub fn add_axiom(&self, axiom: Axiom) -> Result<bool> {
        axiom.validate()?;
        let mut inner = self.inner.write();
        if inner.axioms.contains(&axiom) {
            return Ok(false);
        }
        for entity in axiom.signature() {
            inner.references.entry(entity).or_default().push(axiom.clone());
        }
        inner.axioms.insert(axiom);
        Ok(true)
    }

    /// Remove an axiom. Returns false if it was absent.
    pub fn remove_axiom(&self, axiom: &Axiom) -> bool {
        let mut inner = self.inner.write();
        if !inner.axioms.remove(axiom) {
            return false;
        }
        for entity in axiom.signature() {
            if let Some(axs) = inner.references.get_mut(&entity) {
                axs.retain(|a| a != axiom);
                if axs.is_empty() {
                    inner.references.remove(&entity);
                }
            }
        }
        true
    }

    /// Record an import. Returns false if already present.
    pub fn add_import(&self, import: OntologyId) -> bool {
        let mut inner = self.inner.write();
        if inner.imports.contains(&import) {
            return false;
        }
        inner.imports.push(import);
        true
    }

    pub fn remove_import(&self, import: &OntologyId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.imports.len();
        inner.imports.retain(|i| i != import);
        inner.imports.len() != before
    }
}

// ============================================================================
// Ontology impl
// ============================================================================

impl Ontology for MemoryOntology {
    fn id(&self) -> OntologyId {
        self.id.clone()
    }

    fn referencing_axioms(&self, entity: &Entity) -> Vec<Axiom> {
        self.inner.read().references.get(entity).cloned().unwrap_or_default()
    }

    fn contains_entity_in_signature(&self, entity: &Entity) -> bool {
        self.inner.read().references.contains_key(entity)
    }

    fn signature(&self, kind: EntityKind) -> Vec<Entity> {
        let inner = self.inner.read();
        let mut entities: Vec<Entity> =
            inner.references.keys().filter(|e| e.kind() == kind).cloned().collect();
        entities.sort();
        entities
    }

    fn axioms(&self) -> Vec<Axiom> {
        self.inner.read().axioms.iter().cloned().collect()
    }

    fn contains_axiom(&self, axiom: &Axiom) -> bool {
        self.inner.read().axioms.contains(axiom)
    }

    fn axiom_count(&self) -> usize {
        self.inner.read().axioms.len()
    }

    fn imports(&self) -> Vec<OntologyId> {
        self.inner.read().imports.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
