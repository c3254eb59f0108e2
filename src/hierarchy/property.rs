//! Asserted object and data property hierarchies.
//!
//! Both share one rule set on top of the generic engine: a property is a root
//! when it has no asserted super-property other than the top property and is
//! referenced (or is the top property itself), or when it is its own ancestor.
//! Root-level properties are reported by `roots()` next to the top property,
//! and `equivalents` yields the partners of a sub-property cycle.

use std::sync::Arc;

use crate::config::HierarchyConfig;
use crate::model::*;
use crate::source::ChangeSource;
use crate::Result;
use super::{AssertedHierarchy, Edges, HierarchyKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectPropertyKind;

impl HierarchyKind for ObjectPropertyKind {
    fn name(&self) -> &'static str {
        "object_property"
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::ObjectProperty
    }

    fn root(&self) -> Entity {
        Entity::top_object_property()
    }

    fn edges(&self, axiom: &Axiom) -> Edges {
        let mut edges = Edges::new();
        if let Axiom::SubObjectPropertyOf { sub, sup } = axiom {
            if let (Some(sub), Some(sup)) = (sub.as_named(), sup.as_named()) {
                edges.push((sub.clone(), sup.clone()));
            }
        }
        edges
    }

    fn roots_include_root_level(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataPropertyKind;

impl HierarchyKind for DataPropertyKind {
    fn name(&self) -> &'static str {
        "data_property"
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::DataProperty
    }

    fn root(&self) -> Entity {
        Entity::top_data_property()
    }

    fn edges(&self, axiom: &Axiom) -> Edges {
        let mut edges = Edges::new();
        if let Axiom::SubDataPropertyOf { sub, sup } = axiom {
            edges.push((sub.clone(), sup.clone()));
        }
        edges
    }

    fn roots_include_root_level(&self) -> bool {
        true
    }
}

pub type ObjectPropertyHierarchy = AssertedHierarchy<ObjectPropertyKind>;
pub type DataPropertyHierarchy = AssertedHierarchy<DataPropertyKind>;

impl AssertedHierarchy<ObjectPropertyKind> {
    pub fn new(source: Arc<dyn ChangeSource>, config: HierarchyConfig) -> Result<Self> {
        Self::with_kind(ObjectPropertyKind, source, config)
    }
}

impl AssertedHierarchy<DataPropertyKind> {
    pub fn new(source: Arc<dyn ChangeSource>, config: HierarchyConfig) -> Result<Self> {
        Self::with_kind(DataPropertyKind, source, config)
    }
}
