//! Asserted class hierarchy.
//!
//! Edges come from `SubClassOf` with a named subclass (every named conjunct of
//! the superclass is a parent) and from `EquivalentClasses`, where each named
//! operand gets the named conjuncts of every anonymous operand as parents.
//! Equivalence between two named classes is not an edge.
//!
//! owl:Thing is the only root; classes with no other asserted parent hang
//! directly below it.

use std::sync::Arc;

use crate::config::HierarchyConfig;
use crate::model::*;
use crate::source::ChangeSource;
use crate::Result;
use super::{AssertedHierarchy, Edges, HierarchyKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassKind;

impl HierarchyKind for ClassKind {
    fn name(&self) -> &'static str {
        "class"
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Class
    }

    fn root(&self) -> Entity {
        Entity::thing()
    }

    fn edges(&self, axiom: &Axiom) -> Edges {
        let mut edges = Edges::new();
        match axiom {
            Axiom::SubClassOf { sub, sup } => {
                if let Some(sub) = sub.as_class() {
                    for parent in sup.named_conjuncts() {
                        edges.push((sub.clone(), parent.clone()));
                    }
                }
            }
            Axiom::EquivalentClasses(operands) => {
                for named in operands.iter().filter_map(ClassExpression::as_class) {
                    for anonymous in operands.iter().filter(|op| op.is_anonymous()) {
                        for parent in anonymous.named_conjuncts() {
                            edges.push((named.clone(), parent.clone()));
                        }
                    }
                }
            }
            _ => {}
        }
        edges
    }

    fn roots_include_root_level(&self) -> bool {
        false
    }
}

pub type ClassHierarchy = AssertedHierarchy<ClassKind>;

impl AssertedHierarchy<ClassKind> {
    pub fn new(source: Arc<dyn ChangeSource>, config: HierarchyConfig) -> Result<Self> {
        Self::with_kind(ClassKind, source, config)
    }
}
