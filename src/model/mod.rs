//! # Ontology Model
//!
//! Value types shared by the ontology collaborators and the hierarchy engines.
//! Pure data: no locks, no I/O.

pub mod entity;
pub mod axiom;
pub mod change;

pub use entity::{Entity, EntityKind, Iri};
pub use axiom::{Axiom, ClassExpression, ObjectPropertyExpression};
pub use change::{ChangeKind, OntologyChange, OntologyId};

/// Set of entities returned by hierarchy queries.
pub type EntitySet = hashbrown::HashSet<Entity>;
