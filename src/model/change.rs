//! Ontology identities and change records.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Axiom;
use crate::{Error, Result};

/// Name of an ontology. The unit of tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OntologyId(Arc<str>);

impl OntologyId {
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.trim().is_empty() {
            return Err(Error::InvalidArgument("ontology id must not be empty".into()));
        }
        Ok(Self(Arc::from(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OntologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a change does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    AddAxiom(Axiom),
    RemoveAxiom(Axiom),
    AddImport(OntologyId),
    RemoveImport(OntologyId),
}

/// One change record: a single axiom (or import) added to or removed from one ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyChange {
    pub ontology: OntologyId,
    pub kind: ChangeKind,
}

impl OntologyChange {
    pub fn add_axiom(ontology: &OntologyId, axiom: Axiom) -> Self {
        Self { ontology: ontology.clone(), kind: ChangeKind::AddAxiom(axiom) }
    }

    pub fn remove_axiom(ontology: &OntologyId, axiom: Axiom) -> Self {
        Self { ontology: ontology.clone(), kind: ChangeKind::RemoveAxiom(axiom) }
    }

    pub fn add_import(ontology: &OntologyId, import: OntologyId) -> Self {
        Self { ontology: ontology.clone(), kind: ChangeKind::AddImport(import) }
    }

    /// True for axiom additions and removals; imports are not axiom changes.
    pub fn is_axiom_change(&self) -> bool {
        matches!(self.kind, ChangeKind::AddAxiom(_) | ChangeKind::RemoveAxiom(_))
    }

    pub fn is_addition(&self) -> bool {
        matches!(self.kind, ChangeKind::AddAxiom(_) | ChangeKind::AddImport(_))
    }

    pub fn axiom(&self) -> Option<&Axiom> {
        match &self.kind {
            ChangeKind::AddAxiom(ax) | ChangeKind::RemoveAxiom(ax) => Some(ax),
            _ => None,
        }
    }
}
