//! # onto-hierarchy — Incremental Asserted Hierarchies
//!
//! Class and property hierarchies derived from the axioms of a mutable set of
//! ontologies, kept current as axioms come and go.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Ontology` and `ChangeSource` are the contract with whatever owns the ontologies
//! 2. **Derived, not stored**: edges are read from axioms; only root-level status is cached
//! 3. **Cycle-safe**: every traversal carries a visited set; sub-relationship cycles collapse to root level
//! 4. **Incremental**: a change batch re-evaluates only the entities it can affect
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use onto_hierarchy::{
//!     Axiom, ClassHierarchy, Entity, HierarchyConfig, HierarchyProvider,
//!     OntologyChange, OntologyId, OntologyManager,
//! };
//!
//! # fn example() -> onto_hierarchy::Result<()> {
//! let manager = Arc::new(OntologyManager::new());
//! let id = OntologyId::new("http://example.org/zoo")?;
//! manager.create_ontology(id.clone())?;
//!
//! let classes = ClassHierarchy::new(manager.clone(), HierarchyConfig::default())?;
//! classes.set_ontologies(manager.ontologies())?;
//!
//! let animal = Entity::class("http://example.org/zoo#Animal")?;
//! let dog = Entity::class("http://example.org/zoo#Dog")?;
//! manager.apply_changes(vec![OntologyChange::add_axiom(&id, Axiom::sub_class_of(dog.clone(), animal))])?;
//!
//! for path in classes.paths_to_root(&dog)? {
//!     println!("{path:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Hierarchies
//!
//! | Engine | Root | Roots reported |
//! |--------|------|----------------|
//! | `ClassHierarchy` | owl:Thing | owl:Thing only |
//! | `ObjectPropertyHierarchy` | owl:topObjectProperty | top + root-level properties |
//! | `DataPropertyHierarchy` | owl:topDataProperty | top + root-level properties |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod source;
pub mod hierarchy;
pub mod config;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Entity, EntityKind, EntitySet, Iri,
    Axiom, ClassExpression, ObjectPropertyExpression,
    OntologyChange, ChangeKind, OntologyId,
};

// ============================================================================
// Re-exports: Sources
// ============================================================================

pub use source::{
    Ontology, OntologySet, ChangeSource, OntologyChangeListener, SubscriptionId,
    MemoryOntology, OntologyManager,
};

// ============================================================================
// Re-exports: Hierarchies
// ============================================================================

pub use hierarchy::{
    HierarchyProvider, HierarchyKind, HierarchyView, EntityFilter, EntityPath,
    AssertedHierarchy, ClassHierarchy, ObjectPropertyHierarchy, DataPropertyHierarchy,
    ClassKind, ObjectPropertyKind, DataPropertyKind,
    HierarchyListener, ListenerError, ListenerId, NotificationMode,
};

pub use config::{HierarchyConfig, ListenerFailurePolicy};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Kind mismatch for {iri}: expected {expected}, got {got}")]
    KindMismatch { expected: EntityKind, got: EntityKind, iri: String },

    #[error("Unknown ontology: {0}")]
    UnknownOntology(String),

    #[error("Duplicate ontology: {0}")]
    DuplicateOntology(String),

    #[error("Hierarchy has been disposed")]
    Disposed,

    #[error("Change dispatch failed: {0}")]
    ChangeDispatch(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
