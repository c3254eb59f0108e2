//! Ontology manager: owns memory ontologies and broadcasts change batches.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::model::*;
use crate::{Error, Result};
use super::{ChangeSource, MemoryOntology, Ontology, OntologyChangeListener, SubscriptionId};

/// Owns a collection of [`MemoryOntology`]s and is the [`ChangeSource`] for them.
///
/// `apply_changes` validates the whole batch, applies it in order, and then
/// hands the effective changes (those that actually altered an ontology) to
/// every live subscriber.
pub struct OntologyManager {
    ontologies: RwLock<BTreeMap<OntologyId, Arc<MemoryOntology>>>,
    subscribers: RwLock<Vec<(SubscriptionId, Weak<dyn OntologyChangeListener>)>>,
    /// Serializes apply + broadcast so batches reach subscribers in order.
    apply_lock: Mutex<()>,
    next_subscription: AtomicU64,
}

impl Default for OntologyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OntologyManager {
    pub fn new() -> Self {
        Self {
            ontologies: RwLock::new(BTreeMap::new()),
            subscribers: RwLock::new(Vec::new()),
            apply_lock: Mutex::new(()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Create an empty ontology. Fails if the id is taken.
    pub fn create_ontology(&self, id: OntologyId) -> Result<Arc<MemoryOntology>> {
        let mut onts = self.ontologies.write();
        if onts.contains_key(&id) {
            return Err(Error::DuplicateOntology(id.to_string()));
        }
        let ont = Arc::new(MemoryOntology::new(id.clone()));
        onts.insert(id, ont.clone());
        Ok(ont)
    }

    pub fn ontology(&self, id: &OntologyId) -> Option<Arc<MemoryOntology>> {
        self.ontologies.read().get(id).cloned()
    }

    /// Every managed ontology, as trait objects ready for `set_ontologies`.
    pub fn ontologies(&self) -> Vec<Arc<dyn Ontology>> {
        self.ontologies
            .read()
            .values()
            .map(|o| o.clone() as Arc<dyn Ontology>)
            .collect()
    }

    /// Stop managing an ontology. Engines tracking it keep their handle until
    /// they are re-seeded.
    pub fn remove_ontology(&self, id: &OntologyId) -> Option<Arc<MemoryOntology>> {
        self.ontologies.write().remove(id)
    }

    /// Apply a batch in order, then broadcast the effective part of it.
    ///
    /// Every change is validated before any ontology is touched. Subscriber
    /// failures are logged; the first one is returned once all subscribers ran.
    pub fn apply_changes(&self, changes: Vec<OntologyChange>) -> Result<Vec<OntologyChange>> {
        let _serial = self.apply_lock.lock();

        let targets: Vec<Arc<MemoryOntology>> = {
            let onts = self.ontologies.read();
            changes
                .iter()
                .map(|change| {
                    if let Some(ax) = change.axiom() {
                        ax.validate()?;
                    }
                    onts.get(&change.ontology)
                        .cloned()
                        .ok_or_else(|| Error::UnknownOntology(change.ontology.to_string()))
                })
                .collect::<Result<_>>()?
        };

        let mut effective = Vec::with_capacity(changes.len());
        for (change, ont) in changes.into_iter().zip(targets) {
            let applied = match &change.kind {
                ChangeKind::AddAxiom(ax) => ont.add_axiom(ax.clone())?,
                ChangeKind::RemoveAxiom(ax) => ont.remove_axiom(ax),
                ChangeKind::AddImport(import) => ont.add_import(import.clone()),
                ChangeKind::RemoveImport(import) => ont.remove_import(import),
            };
            if applied {
                effective.push(change);
            }
        }

        tracing::debug!(effective = effective.len(), "applied ontology change batch");
        if !effective.is_empty() {
            self.broadcast(&effective)?;
        }
        Ok(effective)
    }

    fn broadcast(&self, changes: &[OntologyChange]) -> Result<()> {
        let snapshot: Vec<(SubscriptionId, Arc<dyn OntologyChangeListener>)> = {
            let mut subs = self.subscribers.write();
            subs.retain(|(_, weak)| weak.strong_count() > 0);
            subs.iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|l| (*id, l)))
                .collect()
        };

        let mut first_error = None;
        for (id, listener) in snapshot {
            if let Err(e) = listener.ontologies_changed(changes) {
                tracing::error!(subscription = id.0, error = %e, "change subscriber failed");
                first_error.get_or_insert(Error::ChangeDispatch(e.to_string()));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|(_, w)| w.strong_count() > 0).count()
    }
}

impl ChangeSource for OntologyManager {
    fn subscribe(&self, listener: Weak<dyn OntologyChangeListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }
}
