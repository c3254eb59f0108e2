//! # Hierarchy Engines
//!
//! Asserted hierarchies derived from the axioms of a tracked ontology set.
//!
//! ## Layout
//!
//! | Module | Role |
//! |--------|------|
//! | `traversal` | Ancestors, descendants, equivalents, paths over a [`HierarchyView`] |
//! | `terminal` | Terminal-element (root-level) discovery |
//! | `edges` | Memoized asserted edges and reference counts |
//! | `listener` | Listener registry and the bulk-loading state machine |
//! | `lock` | Reader/writer guard around derived state |
//! | `engine` | [`AssertedHierarchy`], generic over a [`HierarchyKind`] |
//! | `class` | Class hierarchy (root owl:Thing) |
//! | `property` | Object and data property hierarchies |

pub mod traversal;
pub mod terminal;
pub mod edges;
pub mod listener;
pub mod lock;
pub mod engine;
pub mod class;
pub mod property;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::*;
use crate::source::Ontology;
use crate::Result;

pub use class::{ClassHierarchy, ClassKind};
pub use engine::AssertedHierarchy;
pub use listener::{HierarchyListener, ListenerError, ListenerId, NotificationMode};
pub use property::{DataPropertyHierarchy, DataPropertyKind, ObjectPropertyHierarchy, ObjectPropertyKind};
pub use traversal::{EntityPath, HierarchyView};

/// Child-visibility predicate. Returns true for children that should be shown.
pub type EntityFilter = Arc<dyn Fn(&Entity) -> bool + Send + Sync>;

/// Named `(sub, sup)` edges asserted by one axiom.
pub type Edges = SmallVec<[(Entity, Entity); 2]>;

// ============================================================================
// HierarchyKind
// ============================================================================

/// What distinguishes one hierarchy from another: the entity kind, the root,
/// and which axioms assert edges.
pub trait HierarchyKind: Send + Sync + 'static {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    fn entity_kind(&self) -> EntityKind;

    /// The distinguished root.
    fn root(&self) -> Entity;

    /// Named sub → super edges asserted by `axiom`. Anonymous sides assert nothing.
    fn edges(&self, axiom: &Axiom) -> Edges;

    /// Whether root-level (terminal) entities are reported by `roots()`
    /// alongside the distinguished root.
    fn roots_include_root_level(&self) -> bool;
}

// ============================================================================
// HierarchyProvider
// ============================================================================

/// The query and lifecycle contract every hierarchy engine exposes.
///
/// Every query fails with [`Error::KindMismatch`](crate::Error::KindMismatch)
/// for an entity of the wrong kind and with
/// [`Error::Disposed`](crate::Error::Disposed) after `dispose`.
pub trait HierarchyProvider: Send + Sync {
    fn root(&self) -> &Entity;

    /// Replace the tracked set and rebuild. Returns false (and fires nothing)
    /// when the set is unchanged.
    fn set_ontologies(&self, ontologies: Vec<Arc<dyn Ontology>>) -> Result<bool>;

    fn set_ontology(&self, ontology: Arc<dyn Ontology>) -> Result<bool> {
        self.set_ontologies(vec![ontology])
    }

    fn ontologies(&self) -> Result<Vec<OntologyId>>;

    fn roots(&self) -> Result<EntitySet>;

    /// Roots in a stable order.
    fn roots_iter(&self) -> Result<std::vec::IntoIter<Entity>> {
        let mut roots: Vec<Entity> = self.roots()?.into_iter().collect();
        roots.sort();
        Ok(roots.into_iter())
    }

    fn has_root(&self, entity: &Entity) -> Result<bool>;

    fn roots_count(&self) -> Result<usize> {
        Ok(self.roots()?.len())
    }

    fn parents(&self, entity: &Entity) -> Result<EntitySet>;

    /// Children that pass the installed filter.
    fn children(&self, entity: &Entity) -> Result<EntitySet>;

    /// Filtered children in a stable order.
    fn children_iter(&self, entity: &Entity) -> Result<std::vec::IntoIter<Entity>> {
        let mut children: Vec<Entity> = self.children(entity)?.into_iter().collect();
        children.sort();
        Ok(children.into_iter())
    }

    fn ancestors(&self, entity: &Entity) -> Result<EntitySet>;

    /// Closure over unfiltered children.
    fn descendants(&self, entity: &Entity) -> Result<EntitySet>;

    fn equivalents(&self, entity: &Entity) -> Result<EntitySet>;

    fn paths_to_root(&self, entity: &Entity) -> Result<Vec<EntityPath>>;

    /// True if any tracked ontology mentions `entity`, or it is the root.
    fn contains_reference(&self, entity: &Entity) -> Result<bool>;

    fn set_filter(&self, filter: EntityFilter) -> Result<()>;

    fn clear_filter(&self) -> Result<()>;

    fn filter(&self) -> Result<Option<EntityFilter>>;

    fn add_listener(&self, listener: Arc<dyn HierarchyListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Detach from the change source and drop listeners and caches. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
