//! # Ontology Source Contracts
//!
//! The narrow boundary between the hierarchy engines and whatever owns the
//! ontologies. Engines only ever read axioms through [`Ontology`] and learn
//! about edits through [`ChangeSource`].
//!
//! ## Implementations
//!
//! | Type | Module | Description |
//! |------|--------|-------------|
//! | `MemoryOntology` | `memory` | Indexed in-memory axiom set |
//! | `OntologyManager` | `manager` | Owns memory ontologies, applies and broadcasts change batches |

pub mod memory;
pub mod manager;

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::model::*;
use crate::Result;

pub use manager::OntologyManager;
pub use memory::MemoryOntology;

// ============================================================================
// Ontology
// ============================================================================

/// A queryable set of axioms.
pub trait Ontology: Send + Sync {
    fn id(&self) -> OntologyId;

    /// Every axiom whose signature contains `entity`.
    fn referencing_axioms(&self, entity: &Entity) -> Vec<Axiom>;

    /// True if any axiom mentions `entity`.
    fn contains_entity_in_signature(&self, entity: &Entity) -> bool;

    /// All referenced entities of one kind.
    fn signature(&self, kind: EntityKind) -> Vec<Entity>;

    fn axioms(&self) -> Vec<Axiom>;

    fn contains_axiom(&self, axiom: &Axiom) -> bool;

    fn axiom_count(&self) -> usize;

    fn imports(&self) -> Vec<OntologyId> {
        Vec::new()
    }
}

// ============================================================================
// Change subscription
// ============================================================================

/// Opaque subscription handle issued by a [`ChangeSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receives change batches, in delivery order.
///
/// The ontologies already reflect the whole batch when this is called. Only
/// changes that altered an ontology are delivered.
pub trait OntologyChangeListener: Send + Sync {
    fn ontologies_changed(&self, changes: &[OntologyChange]) -> Result<()>;
}

/// Something that announces ontology change batches.
///
/// Subscribers are held weakly; a dropped subscriber simply stops receiving.
pub trait ChangeSource: Send + Sync {
    fn subscribe(&self, listener: Weak<dyn OntologyChangeListener>) -> SubscriptionId;

    /// Returns true if the subscription existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// ============================================================================
// OntologySet
// ============================================================================

/// The set of ontologies one engine tracks, keyed by id.
#[derive(Clone, Default)]
pub struct OntologySet {
    by_id: BTreeMap<OntologyId, Arc<dyn Ontology>>,
}

impl std::fmt::Debug for OntologySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.by_id.keys()).finish()
    }
}

impl OntologySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set; a later ontology with the same id replaces an earlier one.
    pub fn from_ontologies(ontologies: impl IntoIterator<Item = Arc<dyn Ontology>>) -> Self {
        let by_id = ontologies.into_iter().map(|o| (o.id(), o)).collect();
        Self { by_id }
    }

    pub fn contains(&self, id: &OntologyId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &OntologyId> {
        self.by_id.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Ontology>> {
        self.by_id.values()
    }

    /// Same ids bound to the same ontology instances.
    pub fn same_members(&self, other: &OntologySet) -> bool {
        self.by_id.len() == other.by_id.len()
            && self
                .by_id
                .iter()
                .zip(other.by_id.iter())
                .all(|((a_id, a), (b_id, b))| a_id == b_id && Arc::ptr_eq(a, b))
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }
}
