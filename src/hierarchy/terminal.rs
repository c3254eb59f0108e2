//! Terminal-element finder.
//!
//! A terminal element has no parent other than the root, or sits on a cycle
//! of parents leading back to itself. Terminal elements hang directly off the
//! root. The finder keeps the current terminal set and re-tests only what it
//! is told changed.

use hashbrown::HashMap;

use crate::model::{Entity, EntitySet};
use super::traversal::Neighbours;

/// Why an element is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// No parents other than the root.
    Parentless,
    /// Reaches itself through its parents.
    Cycle,
}

/// A terminal-status flip reported by [`TerminalElementFinder::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalChange {
    pub entity: Entity,
    /// `true` if the entity became terminal, `false` if it stopped being terminal.
    pub terminal: bool,
}

#[derive(Debug, Default)]
pub struct TerminalElementFinder {
    terminals: HashMap<Entity, Terminal>,
    pending: EntitySet,
}

impl TerminalElementFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the result set by testing every candidate.
    pub fn find_terminal_elements<P>(&mut self, candidates: impl IntoIterator<Item = Entity>, parents: P)
    where
        P: Fn(&Entity) -> Neighbours,
    {
        self.clear();
        self.append_terminal_elements(candidates);
        self.finish(parents);
    }

    /// Queue candidates for the next [`finish`](Self::finish). Duplicates are tested once.
    pub fn append_terminal_elements(&mut self, candidates: impl IntoIterator<Item = Entity>) {
        self.pending.extend(candidates);
    }

    /// Test every queued candidate and add the terminal ones.
    pub fn finish<P>(&mut self, parents: P)
    where
        P: Fn(&Entity) -> Neighbours,
    {
        let pending = std::mem::take(&mut self.pending);
        for entity in pending {
            if let Some(reason) = classify(&entity, &parents) {
                self.terminals.insert(entity, reason);
            }
        }
        tracing::trace!(terminals = self.terminals.len(), "terminal elements evaluated");
    }

    /// Re-test `changed` against the current state and report the flips.
    ///
    /// `is_candidate` decides whether an entity may be terminal at all (it
    /// must still be referenced); `parents` must exclude the root.
    pub fn update<C, P>(
        &mut self,
        changed: impl IntoIterator<Item = Entity>,
        is_candidate: C,
        parents: P,
    ) -> Vec<TerminalChange>
    where
        C: Fn(&Entity) -> bool,
        P: Fn(&Entity) -> Neighbours,
    {
        let mut flips = Vec::new();
        for entity in changed {
            let now = if is_candidate(&entity) { classify(&entity, &parents) } else { None };
            let was = self.terminals.contains_key(&entity);
            match now {
                Some(reason) => {
                    self.terminals.insert(entity.clone(), reason);
                    if !was {
                        flips.push(TerminalChange { entity, terminal: true });
                    }
                }
                None => {
                    if self.terminals.remove(&entity).is_some() {
                        flips.push(TerminalChange { entity, terminal: false });
                    }
                }
            }
        }
        flips
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.terminals.contains_key(entity)
    }

    pub fn reason(&self, entity: &Entity) -> Option<Terminal> {
        self.terminals.get(entity).copied()
    }

    pub fn terminal_elements(&self) -> impl Iterator<Item = &Entity> {
        self.terminals.keys()
    }

    /// Terminal elements that are terminal because of a cycle.
    pub fn cyclic_elements(&self) -> impl Iterator<Item = &Entity> {
        self.terminals.iter().filter(|(_, r)| **r == Terminal::Cycle).map(|(e, _)| e)
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn clear(&mut self) {
        self.terminals.clear();
        self.pending.clear();
    }
}

fn classify<P>(entity: &Entity, parents: &P) -> Option<Terminal>
where
    P: Fn(&Entity) -> Neighbours,
{
    let direct = parents(entity);
    if direct.is_empty() {
        return Some(Terminal::Parentless);
    }
    let mut visited = EntitySet::new();
    let mut work: Vec<Entity> = direct.into_iter().collect();
    while let Some(e) = work.pop() {
        if e == *entity {
            return Some(Terminal::Cycle);
        }
        if visited.insert(e.clone()) {
            work.extend(parents(&e));
        }
    }
    None
}
