//! Generic traversal over one consistent snapshot of a hierarchy.
//!
//! Every algorithm here is parameterized only by `parents` / `children`, and
//! every one is guarded by a visited (or on-path) set, so cyclic input
//! terminates without relying on stack depth.

use smallvec::SmallVec;

use crate::model::{Entity, EntitySet};

/// Short neighbour list; most entities have one or two direct parents.
pub type Neighbours = SmallVec<[Entity; 4]>;

/// A single path, ordered root first.
pub type EntityPath = Vec<Entity>;

/// Read-only view of a hierarchy, valid for as long as the caller holds it.
///
/// Implementors supply the edges; ancestors, descendants, equivalents and
/// paths are derived.
pub trait HierarchyView {
    /// True if `entity` is one of the hierarchy's roots.
    fn has_root(&self, entity: &Entity) -> bool;

    fn parents(&self, entity: &Entity) -> Neighbours;

    /// Unfiltered children.
    fn children(&self, entity: &Entity) -> Neighbours;

    fn ancestors(&self, entity: &Entity) -> EntitySet {
        closure(entity, |e| self.parents(e))
    }

    fn descendants(&self, entity: &Entity) -> EntitySet {
        closure(entity, |e| self.children(e))
    }

    /// Cycle partners: ancestors of `entity` that have `entity` as an ancestor.
    fn equivalents(&self, entity: &Entity) -> EntitySet {
        let ancestors = self.ancestors(entity);
        if !ancestors.contains(entity) {
            return EntitySet::new();
        }
        ancestors
            .into_iter()
            .filter(|x| x != entity && self.ancestors(x).contains(entity))
            .collect()
    }

    /// Every distinct parent chain from a root down to `entity`.
    fn paths_to_root(&self, entity: &Entity) -> Vec<EntityPath> {
        paths_to_root(entity, |e| self.has_root(e), |e| self.parents(e))
    }
}

/// Everything reachable from `start` through `next`, excluding `start` unless
/// it is reachable from itself.
pub fn closure<F, I>(start: &Entity, mut next: F) -> EntitySet
where
    F: FnMut(&Entity) -> I,
    I: IntoIterator<Item = Entity>,
{
    let mut visited = EntitySet::new();
    let mut work: Vec<Entity> = next(start).into_iter().collect();
    while let Some(e) = work.pop() {
        if visited.contains(&e) {
            continue;
        }
        work.extend(next(&e).into_iter().filter(|n| !visited.contains(n)));
        visited.insert(e);
    }
    visited
}

/// Union of [`closure`] over several starts.
pub fn closure_of_all<'a, F, I>(starts: impl IntoIterator<Item = &'a Entity>, mut next: F) -> EntitySet
where
    F: FnMut(&Entity) -> I,
    I: IntoIterator<Item = Entity>,
{
    let mut visited = EntitySet::new();
    let mut work: Vec<Entity> = Vec::new();
    for s in starts {
        work.extend(next(s));
    }
    while let Some(e) = work.pop() {
        if visited.contains(&e) {
            continue;
        }
        work.extend(next(&e).into_iter().filter(|n| !visited.contains(n)));
        visited.insert(e);
    }
    visited
}

/// Depth-first path enumeration with an on-path guard.
///
/// A root yields `[root]`. A non-root yields `path_to_parent ++ [entity]` for
/// each parent not already on the current branch.
pub fn paths_to_root<R, P, I>(entity: &Entity, is_root: R, mut parents: P) -> Vec<EntityPath>
where
    R: Fn(&Entity) -> bool,
    P: FnMut(&Entity) -> I,
    I: IntoIterator<Item = Entity>,
{
    if is_root(entity) {
        return vec![vec![entity.clone()]];
    }

    let mut out = Vec::new();
    // `branch` runs from `entity` upward; reversed when emitted.
    let mut branch: Vec<Entity> = vec![entity.clone()];
    let mut on_branch = EntitySet::new();
    on_branch.insert(entity.clone());
    let mut stack = vec![parents(entity).into_iter().collect::<Neighbours>().into_iter()];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.next(),
            None => break,
        };
        match next {
            Some(parent) => {
                if on_branch.contains(&parent) {
                    continue;
                }
                if is_root(&parent) {
                    let mut path = branch.clone();
                    path.push(parent);
                    path.reverse();
                    out.push(path);
                    continue;
                }
                stack.push(parents(&parent).into_iter().collect::<Neighbours>().into_iter());
                on_branch.insert(parent.clone());
                branch.push(parent);
            }
            None => {
                stack.pop();
                if let Some(done) = branch.pop() {
                    on_branch.remove(&done);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn e(name: &str) -> Entity {
        Entity::class(format!("http://example.org#{name}")).unwrap()
    }

    /// Plain adjacency fixture: child name → parent names.
    struct Fixture {
        root: Entity,
        up: HashMap<Entity, Vec<Entity>>,
    }

    impl Fixture {
        fn new(edges: &[(&str, &str)]) -> Self {
            let mut up: HashMap<Entity, Vec<Entity>> = HashMap::new();
            for (child, parent) in edges {
                up.entry(e(child)).or_default().push(e(parent));
            }
            Self { root: e("Root"), up }
        }
    }

    impl HierarchyView for Fixture {
        fn has_root(&self, entity: &Entity) -> bool {
            *entity == self.root
        }

        fn parents(&self, entity: &Entity) -> Neighbours {
            self.up.get(entity).map(|ps| ps.iter().cloned().collect()).unwrap_or_default()
        }

        fn children(&self, entity: &Entity) -> Neighbours {
            self.up
                .iter()
                .filter(|(_, ps)| ps.contains(entity))
                .map(|(c, _)| c.clone())
                .collect()
        }
    }

    fn set(names: &[&str]) -> EntitySet {
        names.iter().map(|n| e(n)).collect()
    }

    #[test]
    fn test_ancestors_of_chain() {
        let h = Fixture::new(&[("A", "Root"), ("B", "A"), ("C", "B")]);
        assert_eq!(h.ancestors(&e("C")), set(&["B", "A", "Root"]));
        assert_eq!(h.descendants(&e("A")), set(&["B", "C"]));
        assert_eq!(h.descendants(&e("C")), EntitySet::new());
    }

    #[test]
    fn test_cycle_terminates_and_includes_self() {
        let h = Fixture::new(&[("P", "Q"), ("Q", "P"), ("P", "Root")]);
        let anc = h.ancestors(&e("P"));
        assert_eq!(anc, set(&["P", "Q", "Root"]));
        assert_eq!(h.equivalents(&e("P")), set(&["Q"]));
        assert_eq!(h.equivalents(&e("Q")), set(&["P"]));
    }

    #[test]
    fn test_equivalents_empty_without_cycle() {
        let h = Fixture::new(&[("A", "Root"), ("B", "A")]);
        assert!(h.equivalents(&e("B")).is_empty());
    }

    #[test]
    fn test_paths_through_diamond() {
        let h = Fixture::new(&[("A", "Root"), ("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")]);
        let mut paths = h.paths_to_root(&e("D"));
        paths.sort();
        let mut expected = vec![
            vec![e("Root"), e("A"), e("B"), e("D")],
            vec![e("Root"), e("A"), e("C"), e("D")],
        ];
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_paths_with_cycle_are_finite() {
        let h = Fixture::new(&[("P", "Q"), ("Q", "P"), ("P", "Root"), ("Q", "Root")]);
        let mut paths = h.paths_to_root(&e("P"));
        paths.sort();
        let mut expected = vec![vec![e("Root"), e("P")], vec![e("Root"), e("Q"), e("P")]];
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_root_path_is_itself() {
        let h = Fixture::new(&[]);
        assert_eq!(h.paths_to_root(&e("Root")), vec![vec![e("Root")]]);
    }

    #[test]
    fn test_closure_of_all_unions() {
        let h = Fixture::new(&[("B", "A"), ("D", "C")]);
        let up = closure_of_all([&e("B"), &e("D")], |x| h.parents(x));
        assert_eq!(up, set(&["A", "C"]));
    }
}
