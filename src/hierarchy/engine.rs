//! Generic asserted hierarchy engine.
//!
//! [`AssertedHierarchy`] owns the tracked ontology set, the memoized asserted
//! edges and the terminal element cache behind one [`HierarchyLock`]. Queries
//! run against a [`Snapshot`] taken under the read lock and never read
//! ontology contents; rebuilds and batch updates hold the write lock for the
//! whole mutation. Notifications are dispatched after the write lock is
//! released but before the next writer may start.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::HierarchyConfig;
use crate::model::*;
use crate::source::{ChangeSource, Ontology, OntologyChangeListener, OntologySet, SubscriptionId};
use crate::{Error, Result};
use super::edges::AssertedEdges;
use super::listener::{HierarchyListener, ListenerId, ListenerRegistry, NotificationMode};
use super::lock::HierarchyLock;
use super::terminal::{Terminal, TerminalElementFinder};
use super::traversal::{self, EntityPath, HierarchyView, Neighbours};
use super::{EntityFilter, HierarchyKind, HierarchyProvider};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unbuilt,
    Built,
    Disposed,
}

struct HierarchyState {
    phase: Phase,
    ontologies: OntologySet,
    edges: AssertedEdges,
    finder: TerminalElementFinder,
    filter: Option<EntityFilter>,
}

impl HierarchyState {
    fn new() -> Self {
        Self {
            phase: Phase::Unbuilt,
            ontologies: OntologySet::new(),
            edges: AssertedEdges::default(),
            finder: TerminalElementFinder::new(),
            filter: None,
        }
    }
}

/// What one batch owes the listeners.
#[derive(Debug, Default)]
struct Dirty {
    nodes: Vec<Entity>,
    root_changed: bool,
}

// ============================================================================
// Snapshot
// ============================================================================

/// The hierarchy as seen under one read (or write) guard.
struct Snapshot<'a, K: HierarchyKind> {
    kind: &'a K,
    root: &'a Entity,
    state: &'a HierarchyState,
}

impl<K: HierarchyKind> Snapshot<'_, K> {
    fn filtered_children(&self, entity: &Entity) -> EntitySet {
        let filter = self.state.filter.as_ref();
        self.children(entity)
            .into_iter()
            .filter(|c| filter.is_none_or(|f| f(c)))
            .collect()
    }

    fn roots(&self) -> EntitySet {
        let mut roots = EntitySet::new();
        roots.insert(self.root.clone());
        if self.kind.roots_include_root_level() {
            roots.extend(self.state.finder.terminal_elements().cloned());
        }
        roots
    }

    fn is_cyclic(&self, entity: &Entity) -> bool {
        self.state.finder.reason(entity) == Some(Terminal::Cycle)
    }
}

impl<K: HierarchyKind> HierarchyView for Snapshot<'_, K> {
    fn has_root(&self, entity: &Entity) -> bool {
        entity == self.root
            || (self.kind.roots_include_root_level() && self.state.finder.contains(entity))
    }

    fn parents(&self, entity: &Entity) -> Neighbours {
        if entity == self.root {
            return Neighbours::new();
        }
        let mut parents = self.state.edges.parents(entity);
        if parents.is_empty() || self.state.finder.contains(entity) {
            parents.push(self.root.clone());
        }
        parents
    }

    fn children(&self, entity: &Entity) -> Neighbours {
        if entity == self.root {
            let mut children: Neighbours = self.state.finder.terminal_elements().cloned().collect();
            children.sort();
            return children;
        }
        let candidates = self.state.edges.children(entity);
        if candidates.is_empty() || !self.is_cyclic(entity) {
            return candidates;
        }
        // A subject that is also above `entity` closes a cycle; it is not a
        // child. Both ends of such an edge are on the cycle.
        let mut ancestors: Option<EntitySet> = None;
        candidates
            .into_iter()
            .filter(|c| !self.is_cyclic(c) || !ancestors.get_or_insert_with(|| self.ancestors(entity)).contains(c))
            .collect()
    }
}

// ============================================================================
// EngineInner
// ============================================================================

struct EngineInner<K: HierarchyKind> {
    kind: K,
    root: Entity,
    config: HierarchyConfig,
    state: HierarchyLock<HierarchyState>,
    listeners: ListenerRegistry,
    /// Serializes writers through dispatch so batches are announced in order.
    writer: Mutex<()>,
}

impl<K: HierarchyKind> EngineInner<K> {
    fn rebuild(&self, state: &mut HierarchyState, ontologies: OntologySet) {
        state.edges = AssertedEdges::build(&self.kind, &self.root, &ontologies);
        state.ontologies = ontologies;
        state.finder.clear();

        let edges = &state.edges;
        state.finder.append_terminal_elements(edges.referenced().cloned());
        state.finder.finish(|e| edges.parents(e));
        state.phase = Phase::Built;

        tracing::debug!(
            hierarchy = self.kind.name(),
            ontologies = state.ontologies.len(),
            root_level = state.finder.len(),
            "hierarchy rebuilt"
        );
    }

    fn update(&self, state: &mut HierarchyState, changes: &[OntologyChange]) -> Dirty {
        let (kind, root) = (&self.kind, &self.root);
        let entity_kind = kind.entity_kind();
        let mut signature = EntitySet::new();
        let mut endpoints = EntitySet::new();
        let mut subjects = EntitySet::new();
        let mut relevant = 0usize;

        for change in changes {
            if !state.ontologies.contains(&change.ontology) {
                tracing::trace!(hierarchy = kind.name(), ontology = %change.ontology, "change for untracked ontology ignored");
                continue;
            }
            let applied = match &change.kind {
                ChangeKind::AddAxiom(axiom) => state.edges.insert(kind, root, &change.ontology, axiom.clone()),
                ChangeKind::RemoveAxiom(axiom) => state.edges.remove(kind, root, &change.ontology, axiom),
                ChangeKind::AddImport(_) | ChangeKind::RemoveImport(_) => false,
            };
            let Some(axiom) = change.axiom().filter(|_| applied) else { continue };
            relevant += 1;
            signature.extend(
                axiom.signature().into_iter().filter(|e| e.kind() == entity_kind && e != root),
            );
            for (sub, sup) in kind.edges(axiom) {
                if sub == sup || sub == *root {
                    continue;
                }
                if sup != *root {
                    endpoints.insert(sup);
                }
                endpoints.insert(sub.clone());
                subjects.insert(sub);
            }
        }
        if relevant == 0 {
            return Dirty::default();
        }

        let edges = &state.edges;
        let raw_parents = |e: &Entity| edges.parents(e);
        let raw_children = |e: &Entity| edges.children(e);

        // Cycle status can only change for entities both above and below an
        // edited edge, or for entities that were on a cycle before.
        let below = traversal::closure_of_all(&endpoints, raw_children);
        let above = traversal::closure_of_all(&endpoints, raw_parents);
        let mut reeval = signature;
        reeval.extend(below.intersection(&above).cloned());
        reeval.extend(state.finder.cyclic_elements().cloned());

        let flips = state
            .finder
            .update(reeval, |e| edges.contains_reference(e), raw_parents);

        let root_changed = !flips.is_empty();
        let mut changed = subjects;
        changed.extend(flips.into_iter().map(|f| f.entity));

        let view = Snapshot { kind, root, state: &*state };
        let mut nodes = changed.clone();
        if self.config.notify_descendants {
            nodes.extend(traversal::closure_of_all(&changed, |e| view.children(e)));
        }
        nodes.remove(root);
        let mut nodes: Vec<Entity> = nodes.into_iter().collect();
        nodes.sort();

        tracing::debug!(
            hierarchy = kind.name(),
            relevant,
            nodes = nodes.len(),
            root_changed,
            "hierarchy updated incrementally"
        );
        Dirty { nodes, root_changed }
    }

    fn apply_changes(&self, changes: &[OntologyChange]) -> Result<()> {
        let _writer = self.writer.lock();
        let dirty = self.state.write(|state| {
            if state.phase != Phase::Built {
                return Dirty::default();
            }
            self.update(state, changes)
        });
        self.listeners.fire_nodes_changed(dirty.nodes.iter());
        if dirty.root_changed {
            self.listeners.fire_node_changed(&self.root);
        }
        Ok(())
    }
}

impl<K: HierarchyKind> OntologyChangeListener for EngineInner<K> {
    fn ontologies_changed(&self, changes: &[OntologyChange]) -> Result<()> {
        self.apply_changes(changes)
    }
}

// ============================================================================
// AssertedHierarchy
// ============================================================================

/// A hierarchy engine bound to a change source.
///
/// Dropping the engine disposes it.
pub struct AssertedHierarchy<K: HierarchyKind> {
    inner: Arc<EngineInner<K>>,
    source: Arc<dyn ChangeSource>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl<K: HierarchyKind> AssertedHierarchy<K> {
    /// Create an unbuilt engine for `kind` and subscribe it to `source`.
    pub fn with_kind(kind: K, source: Arc<dyn ChangeSource>, config: HierarchyConfig) -> Result<Self> {
        config.validate()?;
        let root = kind.root();
        let inner = Arc::new(EngineInner {
            listeners: ListenerRegistry::new(config.listener_policy),
            kind,
            root,
            config,
            state: HierarchyLock::new(HierarchyState::new()),
            writer: Mutex::new(()),
        });
        let weak: Weak<EngineInner<K>> = Arc::downgrade(&inner);
        let weak: Weak<dyn OntologyChangeListener> = weak;
        let subscription = source.subscribe(weak);
        tracing::debug!(hierarchy = inner.kind.name(), subscription = subscription.0, "hierarchy subscribed");

        Ok(Self { inner, source, subscription: Mutex::new(Some(subscription)) })
    }

    pub fn kind(&self) -> &K {
        &self.inner.kind
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.inner.config
    }

    pub fn notification_mode(&self) -> NotificationMode {
        self.inner.listeners.mode()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Feed a change batch directly, as the subscribed source does.
    pub fn apply_changes(&self, changes: &[OntologyChange]) -> Result<()> {
        self.inner.apply_changes(changes)
    }

    /// Run `f` against one consistent snapshot: every query made through the
    /// view sees the same state. The view's `children` are unfiltered.
    pub fn with_view<R>(&self, f: impl FnOnce(&dyn HierarchyView) -> R) -> Result<R> {
        self.query(None, |v| f(v))
    }

    fn query<R>(&self, entity: Option<&Entity>, f: impl FnOnce(&Snapshot<'_, K>) -> R) -> Result<R> {
        if let Some(entity) = entity {
            entity.expect_kind(self.inner.kind.entity_kind())?;
        }
        self.inner.state.read(|state| {
            if state.phase == Phase::Disposed {
                return Err(Error::Disposed);
            }
            Ok(f(&Snapshot { kind: &self.inner.kind, root: &self.inner.root, state }))
        })
    }

    fn replace_filter(&self, filter: Option<EntityFilter>) -> Result<()> {
        let _writer = self.inner.writer.lock();
        self.inner.state.write(|state| {
            if state.phase == Phase::Disposed {
                return Err(Error::Disposed);
            }
            state.filter = filter;
            Ok(())
        })?;
        self.inner.listeners.fire_hierarchy_changed();
        Ok(())
    }
}

impl<K: HierarchyKind> HierarchyProvider for AssertedHierarchy<K> {
    fn root(&self) -> &Entity {
        &self.inner.root
    }

    fn set_ontologies(&self, ontologies: Vec<Arc<dyn Ontology>>) -> Result<bool> {
        let next = OntologySet::from_ontologies(ontologies);
        let _writer = self.inner.writer.lock();

        let unchanged = self.inner.state.read(|state| match state.phase {
            Phase::Disposed => Err(Error::Disposed),
            Phase::Built => Ok(state.ontologies.same_members(&next)),
            Phase::Unbuilt => Ok(false),
        })?;
        if unchanged {
            tracing::trace!(hierarchy = self.inner.kind.name(), "ontology set unchanged, rebuild skipped");
            return Ok(false);
        }

        let _bulk = self.inner.listeners.bulk_load();
        self.inner.state.write(|state| self.inner.rebuild(state, next));
        Ok(true)
    }

    fn ontologies(&self) -> Result<Vec<OntologyId>> {
        self.query(None, |v| v.state.ontologies.ids().cloned().collect())
    }

    fn roots(&self) -> Result<EntitySet> {
        self.query(None, |v| v.roots())
    }

    fn has_root(&self, entity: &Entity) -> Result<bool> {
        self.query(Some(entity), |v| v.has_root(entity))
    }

    fn parents(&self, entity: &Entity) -> Result<EntitySet> {
        self.query(Some(entity), |v| v.parents(entity).into_iter().collect())
    }

    fn children(&self, entity: &Entity) -> Result<EntitySet> {
        self.query(Some(entity), |v| v.filtered_children(entity))
    }

    fn ancestors(&self, entity: &Entity) -> Result<EntitySet> {
        self.query(Some(entity), |v| v.ancestors(entity))
    }

    fn descendants(&self, entity: &Entity) -> Result<EntitySet> {
        self.query(Some(entity), |v| v.descendants(entity))
    }

    fn equivalents(&self, entity: &Entity) -> Result<EntitySet> {
        self.query(Some(entity), |v| v.equivalents(entity))
    }

    fn paths_to_root(&self, entity: &Entity) -> Result<Vec<EntityPath>> {
        self.query(Some(entity), |v| v.paths_to_root(entity))
    }

    fn contains_reference(&self, entity: &Entity) -> Result<bool> {
        self.query(Some(entity), |v| entity == v.root || v.state.edges.contains_reference(entity))
    }

    fn set_filter(&self, filter: EntityFilter) -> Result<()> {
        self.replace_filter(Some(filter))
    }

    fn clear_filter(&self) -> Result<()> {
        self.replace_filter(None)
    }

    fn filter(&self) -> Result<Option<EntityFilter>> {
        self.query(None, |v| v.state.filter.clone())
    }

    fn add_listener(&self, listener: Arc<dyn HierarchyListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    fn dispose(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.source.unsubscribe(id);
            tracing::debug!(hierarchy = self.inner.kind.name(), subscription = id.0, "hierarchy disposed");
        }
        let _writer = self.inner.writer.lock();
        self.inner.state.write(|state| {
            state.phase = Phase::Disposed;
            state.ontologies.clear();
            state.edges.clear();
            state.finder.clear();
            state.filter = None;
        });
        self.inner.listeners.clear();
    }

    fn is_disposed(&self) -> bool {
        self.inner.state.read(|state| state.phase == Phase::Disposed)
    }
}

impl<K: HierarchyKind> Drop for AssertedHierarchy<K> {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// Tests
// ============================================================================
