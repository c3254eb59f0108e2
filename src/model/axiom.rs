//! Axioms and the expressions they are built from.
//!
//! Only asserted structure is modelled here. An axiom never knows which
//! ontology it belongs to; that is carried by [`OntologyChange`](super::OntologyChange).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Entity, EntityKind};
use crate::{Error, Result};

/// A class expression. Only [`ClassExpression::Class`] is named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpression {
    Class(Entity),
    ObjectIntersectionOf(Vec<ClassExpression>),
    ObjectUnionOf(Vec<ClassExpression>),
    ObjectComplementOf(Box<ClassExpression>),
    ObjectSomeValuesFrom { property: ObjectPropertyExpression, filler: Box<ClassExpression> },
    ObjectAllValuesFrom { property: ObjectPropertyExpression, filler: Box<ClassExpression> },
}

impl ClassExpression {
    pub fn class(entity: Entity) -> Self {
        ClassExpression::Class(entity)
    }

    pub fn intersection(operands: impl IntoIterator<Item = ClassExpression>) -> Self {
        ClassExpression::ObjectIntersectionOf(operands.into_iter().collect())
    }

    pub fn some(property: Entity, filler: ClassExpression) -> Self {
        ClassExpression::ObjectSomeValuesFrom {
            property: ObjectPropertyExpression::ObjectProperty(property),
            filler: Box::new(filler),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        !matches!(self, ClassExpression::Class(_))
    }

    pub fn as_class(&self) -> Option<&Entity> {
        match self {
            ClassExpression::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Named classes this expression asserts as superclasses: the expression
    /// itself when named, otherwise the named operands of (nested) intersections.
    pub fn named_conjuncts(&self) -> SmallVec<[&Entity; 2]> {
        let mut out = SmallVec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut SmallVec<[&'a Entity; 2]>) {
        match self {
            ClassExpression::Class(c) => out.push(c),
            ClassExpression::ObjectIntersectionOf(ops) => {
                for op in ops {
                    op.collect_conjuncts(out);
                }
            }
            _ => {}
        }
    }

    fn collect_signature(&self, out: &mut Vec<Entity>) {
        match self {
            ClassExpression::Class(c) => out.push(c.clone()),
            ClassExpression::ObjectIntersectionOf(ops) | ClassExpression::ObjectUnionOf(ops) => {
                for op in ops {
                    op.collect_signature(out);
                }
            }
            ClassExpression::ObjectComplementOf(inner) => inner.collect_signature(out),
            ClassExpression::ObjectSomeValuesFrom { property, filler }
            | ClassExpression::ObjectAllValuesFrom { property, filler } => {
                out.push(property.entity().clone());
                filler.collect_signature(out);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ClassExpression::Class(c) => c.expect_kind(EntityKind::Class),
            ClassExpression::ObjectIntersectionOf(ops) | ClassExpression::ObjectUnionOf(ops) => {
                if ops.is_empty() {
                    return Err(Error::InvalidArgument("n-ary class expression without operands".into()));
                }
                ops.iter().try_for_each(ClassExpression::validate)
            }
            ClassExpression::ObjectComplementOf(inner) => inner.validate(),
            ClassExpression::ObjectSomeValuesFrom { property, filler }
            | ClassExpression::ObjectAllValuesFrom { property, filler } => {
                property.validate()?;
                filler.validate()
            }
        }
    }
}

/// An object property expression. Only [`ObjectPropertyExpression::ObjectProperty`] is named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectPropertyExpression {
    ObjectProperty(Entity),
    InverseOf(Entity),
}

impl ObjectPropertyExpression {
    pub fn as_named(&self) -> Option<&Entity> {
        match self {
            ObjectPropertyExpression::ObjectProperty(p) => Some(p),
            ObjectPropertyExpression::InverseOf(_) => None,
        }
    }

    pub fn entity(&self) -> &Entity {
        match self {
            ObjectPropertyExpression::ObjectProperty(p) | ObjectPropertyExpression::InverseOf(p) => p,
        }
    }

    fn validate(&self) -> Result<()> {
        self.entity().expect_kind(EntityKind::ObjectProperty)
    }
}

/// An asserted fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axiom {
    Declaration(Entity),
    SubClassOf { sub: ClassExpression, sup: ClassExpression },
    EquivalentClasses(Vec<ClassExpression>),
    DisjointClasses(Vec<ClassExpression>),
    SubObjectPropertyOf { sub: ObjectPropertyExpression, sup: ObjectPropertyExpression },
    EquivalentObjectProperties(Vec<ObjectPropertyExpression>),
    SubDataPropertyOf { sub: Entity, sup: Entity },
    EquivalentDataProperties(Vec<Entity>),
    ClassAssertion { class: ClassExpression, individual: Entity },
}

impl Axiom {
    pub fn declaration(entity: Entity) -> Self {
        Axiom::Declaration(entity)
    }

    /// `SubClassOf(sub, sup)` between two named classes.
    pub fn sub_class_of(sub: Entity, sup: Entity) -> Self {
        Axiom::SubClassOf { sub: ClassExpression::Class(sub), sup: ClassExpression::Class(sup) }
    }

    /// `SubObjectPropertyOf(sub, sup)` between two named object properties.
    pub fn sub_object_property_of(sub: Entity, sup: Entity) -> Self {
        Axiom::SubObjectPropertyOf {
            sub: ObjectPropertyExpression::ObjectProperty(sub),
            sup: ObjectPropertyExpression::ObjectProperty(sup),
        }
    }

    pub fn sub_data_property_of(sub: Entity, sup: Entity) -> Self {
        Axiom::SubDataPropertyOf { sub, sup }
    }

    /// Every entity the axiom mentions, deduplicated, in first-seen order.
    pub fn signature(&self) -> Vec<Entity> {
        let mut out = Vec::new();
        match self {
            Axiom::Declaration(e) => out.push(e.clone()),
            Axiom::SubClassOf { sub, sup } => {
                sub.collect_signature(&mut out);
                sup.collect_signature(&mut out);
            }
            Axiom::EquivalentClasses(ops) | Axiom::DisjointClasses(ops) => {
                for op in ops {
                    op.collect_signature(&mut out);
                }
            }
            Axiom::SubObjectPropertyOf { sub, sup } => {
                out.push(sub.entity().clone());
                out.push(sup.entity().clone());
            }
            Axiom::EquivalentObjectProperties(ops) => {
                out.extend(ops.iter().map(|p| p.entity().clone()));
            }
            Axiom::SubDataPropertyOf { sub, sup } => {
                out.push(sub.clone());
                out.push(sup.clone());
            }
            Axiom::EquivalentDataProperties(ops) => out.extend(ops.iter().cloned()),
            Axiom::ClassAssertion { class, individual } => {
                class.collect_signature(&mut out);
                out.push(individual.clone());
            }
        }
        let mut seen = hashbrown::HashSet::with_capacity(out.len());
        out.retain(|e| seen.insert(e.clone()));
        out
    }

    pub fn references(&self, entity: &Entity) -> bool {
        self.signature().iter().any(|e| e == entity)
    }

    /// Check that every slot holds an entity of the kind the axiom type requires.
    pub fn validate(&self) -> Result<()> {
        match self {
            Axiom::Declaration(_) => Ok(()),
            Axiom::SubClassOf { sub, sup } => {
                sub.validate()?;
                sup.validate()
            }
            Axiom::EquivalentClasses(ops) | Axiom::DisjointClasses(ops) => {
                if ops.len() < 2 {
                    return Err(Error::InvalidArgument(format!(
                        "n-ary class axiom needs at least two operands, got {}",
                        ops.len()
                    )));
                }
                ops.iter().try_for_each(ClassExpression::validate)
            }
            Axiom::SubObjectPropertyOf { sub, sup } => {
                sub.validate()?;
                sup.validate()
            }
            Axiom::EquivalentObjectProperties(ops) => {
                if ops.len() < 2 {
                    return Err(Error::InvalidArgument(
                        "EquivalentObjectProperties needs at least two operands".into(),
                    ));
                }
                ops.iter().try_for_each(ObjectPropertyExpression::validate)
            }
            Axiom::SubDataPropertyOf { sub, sup } => {
                sub.expect_kind(EntityKind::DataProperty)?;
                sup.expect_kind(EntityKind::DataProperty)
            }
            Axiom::EquivalentDataProperties(ops) => {
                if ops.len() < 2 {
                    return Err(Error::InvalidArgument(
                        "EquivalentDataProperties needs at least two operands".into(),
                    ));
                }
                ops.iter().try_for_each(|p| p.expect_kind(EntityKind::DataProperty))
            }
            Axiom::ClassAssertion { class, individual } => {
                class.validate()?;
                individual.expect_kind(EntityKind::NamedIndividual)
            }
        }
    }
}
