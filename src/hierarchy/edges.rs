//! Memoized asserted edges for one hierarchy kind.
//!
//! The index is built from the tracked ontologies on rebuild and afterwards
//! maintained from change records alone. Queries read it under the engine's
//! lock and never touch ontology contents, which may already reflect a batch
//! the engine has not processed yet.
//!
//! Each `(ontology, axiom)` pair is recorded at most once, so a change record
//! that repeats what the index already holds is a no-op.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::model::*;
use crate::source::OntologySet;
use super::traversal::Neighbours;
use super::{Edges, HierarchyKind};

/// Neighbour list with the number of axiom occurrences asserting each edge.
type Weighted = SmallVec<[(Entity, u32); 2]>;

#[derive(Debug, Default)]
struct Adjacency {
    map: HashMap<Entity, Weighted>,
}

impl Adjacency {
    fn add(&mut self, from: Entity, to: Entity) {
        let list = self.map.entry(from).or_default();
        match list.iter_mut().find(|(e, _)| *e == to) {
            Some((_, n)) => *n += 1,
            None => list.push((to, 1)),
        }
    }

    fn remove(&mut self, from: &Entity, to: &Entity) {
        let Some(list) = self.map.get_mut(from) else { return };
        if let Some(pos) = list.iter().position(|(e, _)| e == to) {
            list[pos].1 -= 1;
            if list[pos].1 == 0 {
                list.remove(pos);
            }
        }
        if list.is_empty() {
            self.map.remove(from);
        }
    }

    fn neighbours(&self, of: &Entity) -> Neighbours {
        self.map
            .get(of)
            .map(|list| list.iter().map(|(e, _)| e.clone()).collect())
            .unwrap_or_default()
    }
}

/// Sub → super and super → sub edges plus reference counts, restricted to
/// one entity kind.
#[derive(Debug, Default)]
pub struct AssertedEdges {
    axioms: HashMap<OntologyId, HashSet<Axiom>>,
    up: Adjacency,
    down: Adjacency,
    /// entity → number of recorded axioms mentioning it
    references: HashMap<Entity, u32>,
}

impl AssertedEdges {
    pub fn build<K: HierarchyKind>(kind: &K, root: &Entity, ontologies: &OntologySet) -> Self {
        let mut edges = Self::default();
        for ont in ontologies.iter() {
            let id = ont.id();
            for axiom in ont.axioms() {
                edges.insert(kind, root, &id, axiom);
            }
        }
        edges
    }

    /// Record `axiom` for `ontology`. Returns false if it was already recorded
    /// or mentions no entity of this kind.
    pub fn insert<K: HierarchyKind>(&mut self, kind: &K, root: &Entity, ontology: &OntologyId, axiom: Axiom) -> bool {
        let (refs, edges) = relevant_parts(kind, root, &axiom);
        if refs.is_empty() || !self.axioms.entry(ontology.clone()).or_default().insert(axiom) {
            return false;
        }
        for e in refs {
            *self.references.entry(e).or_insert(0) += 1;
        }
        for (sub, sup) in edges {
            self.up.add(sub.clone(), sup.clone());
            self.down.add(sup, sub);
        }
        true
    }

    /// Forget `axiom` for `ontology`. Returns false if it was not recorded.
    pub fn remove<K: HierarchyKind>(&mut self, kind: &K, root: &Entity, ontology: &OntologyId, axiom: &Axiom) -> bool {
        let Some(recorded) = self.axioms.get_mut(ontology) else { return false };
        if !recorded.remove(axiom) {
            return false;
        }
        if recorded.is_empty() {
            self.axioms.remove(ontology);
        }

        let (refs, edges) = relevant_parts(kind, root, axiom);
        for e in refs {
            if let Some(n) = self.references.get_mut(&e) {
                *n -= 1;
                if *n == 0 {
                    self.references.remove(&e);
                }
            }
        }
        for (sub, sup) in edges {
            self.up.remove(&sub, &sup);
            self.down.remove(&sup, &sub);
        }
        true
    }

    /// Asserted parents, excluding the root and the entity itself.
    pub fn parents(&self, entity: &Entity) -> Neighbours {
        self.up.neighbours(entity)
    }

    /// Exact inverse of [`parents`](Self::parents).
    pub fn children(&self, entity: &Entity) -> Neighbours {
        self.down.neighbours(entity)
    }

    pub fn contains_reference(&self, entity: &Entity) -> bool {
        self.references.contains_key(entity)
    }

    /// Every referenced entity of this kind other than the root.
    pub fn referenced(&self) -> impl Iterator<Item = &Entity> {
        self.references.keys()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Non-root entities of the kind, and the edges worth keeping: self loops and
/// edges touching the root say nothing the root rule does not already say.
fn relevant_parts<K: HierarchyKind>(kind: &K, root: &Entity, axiom: &Axiom) -> (Vec<Entity>, Edges) {
    let entity_kind = kind.entity_kind();
    let refs = axiom
        .signature()
        .into_iter()
        .filter(|e| e.kind() == entity_kind && e != root)
        .collect();
    let mut edges = kind.edges(axiom);
    edges.retain(|edge| edge.0 != edge.1 && edge.0 != *root && edge.1 != *root);
    (refs, edges)
}
