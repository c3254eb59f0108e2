//! Hierarchy listeners and their registry.
//!
//! Dispatch always iterates a snapshot of the registered listeners, so a
//! callback may add or remove listeners (itself included) without disturbing
//! the pass in progress. A listener removed mid-pass is flagged and skipped
//! for the rest of it.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::config::ListenerFailurePolicy;
use crate::model::Entity;

/// Error returned by a listener callback.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl From<&str> for ListenerError {
    fn from(msg: &str) -> Self {
        ListenerError(msg.to_string())
    }
}

impl From<String> for ListenerError {
    fn from(msg: String) -> Self {
        ListenerError(msg)
    }
}

/// Observer of hierarchy changes.
pub trait HierarchyListener: Send + Sync {
    /// The parents, children or root status of `entity` changed.
    fn node_changed(&self, entity: &Entity) -> Result<(), ListenerError>;

    /// The hierarchy was rebuilt or its view changed wholesale.
    fn hierarchy_changed(&self) -> Result<(), ListenerError>;
}

/// Handle returned by `add_listener`, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Notification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMode {
    Quiescent,
    /// Node and hierarchy events are suppressed; leaving this state fires
    /// exactly one `hierarchy_changed`.
    BulkLoading,
}

struct Registered {
    id: ListenerId,
    listener: Arc<dyn HierarchyListener>,
    consecutive_failures: AtomicU32,
    removed: AtomicBool,
}

pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<Registered>>>,
    mode: Mutex<NotificationMode>,
    policy: ListenerFailurePolicy,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("mode", &self.mode())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new(policy: ListenerFailurePolicy) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            mode: Mutex::new(NotificationMode::Quiescent),
            policy,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, listener: Arc<dyn HierarchyListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock();
        listeners.push(Arc::new(Registered {
            id,
            listener,
            consecutive_failures: AtomicU32::new(0),
            removed: AtomicBool::new(false),
        }));
        tracing::debug!(listener = id.0, total = listeners.len(), "registered hierarchy listener");
        id
    }

    /// Returns true if the listener was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|r| {
            if r.id != id {
                return true;
            }
            r.removed.store(true, Ordering::Release);
            false
        });
        listeners.len() != before
    }

    pub fn clear(&self) {
        let mut listeners = self.listeners.lock();
        for r in listeners.iter() {
            r.removed.store(true, Ordering::Release);
        }
        listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> NotificationMode {
        *self.mode.lock()
    }

    /// Enter [`NotificationMode::BulkLoading`] until the guard drops.
    pub fn bulk_load(&self) -> BulkLoadGuard<'_> {
        *self.mode.lock() = NotificationMode::BulkLoading;
        BulkLoadGuard { registry: self }
    }

    pub fn fire_node_changed(&self, entity: &Entity) {
        if self.mode() == NotificationMode::BulkLoading {
            return;
        }
        for reg in self.snapshot() {
            self.invoke(&reg, "node_changed", |l| l.node_changed(entity));
        }
    }

    /// One pass per listener over all of `entities`.
    pub fn fire_nodes_changed<'a>(&self, entities: impl IntoIterator<Item = &'a Entity> + Clone) {
        if self.mode() == NotificationMode::BulkLoading {
            return;
        }
        for reg in self.snapshot() {
            for entity in entities.clone() {
                self.invoke(&reg, "node_changed", |l| l.node_changed(entity));
            }
        }
    }

    pub fn fire_hierarchy_changed(&self) {
        if self.mode() == NotificationMode::BulkLoading {
            return;
        }
        self.dispatch_hierarchy_changed();
    }

    fn dispatch_hierarchy_changed(&self) {
        for reg in self.snapshot() {
            self.invoke(&reg, "hierarchy_changed", |l| l.hierarchy_changed());
        }
    }

    fn snapshot(&self) -> Vec<Arc<Registered>> {
        self.listeners.lock().clone()
    }

    fn invoke<F>(&self, reg: &Registered, notification: &'static str, f: F)
    where
        F: FnOnce(&dyn HierarchyListener) -> Result<(), ListenerError>,
    {
        if reg.removed.load(Ordering::Acquire) {
            return;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| f(reg.listener.as_ref())));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.0),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };
        let Some(message) = failure else {
            reg.consecutive_failures.store(0, Ordering::Relaxed);
            return;
        };

        let failures = reg.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(listener = reg.id.0, notification, failures, error = %message, "hierarchy listener failed");
        if let ListenerFailurePolicy::Strict { max_consecutive_failures } = self.policy {
            if failures >= max_consecutive_failures && self.remove(reg.id) {
                tracing::warn!(listener = reg.id.0, failures, "removed failing hierarchy listener");
            }
        }
    }
}

/// Returns the registry to [`NotificationMode::Quiescent`] on drop and fires
/// the single `hierarchy_changed` the bulk load owes its listeners.
pub struct BulkLoadGuard<'a> {
    registry: &'a ListenerRegistry,
}

impl Drop for BulkLoadGuard<'_> {
    fn drop(&mut self) {
        *self.registry.mode.lock() = NotificationMode::Quiescent;
        if !std::thread::panicking() {
            self.registry.dispatch_hierarchy_changed();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recorder {
        nodes: Mutex<Vec<Entity>>,
        rebuilds: AtomicUsize,
    }

    impl HierarchyListener for Recorder {
        fn node_changed(&self, entity: &Entity) -> Result<(), ListenerError> {
            self.nodes.lock().push(entity.clone());
            Ok(())
        }

        fn hierarchy_changed(&self) -> Result<(), ListenerError> {
            self.rebuilds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing {
        calls: AtomicUsize,
        panics: bool,
    }

    impl HierarchyListener for Failing {
        fn node_changed(&self, _entity: &Entity) -> Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("listener exploded");
            }
            Err("node failure".into())
        }

        fn hierarchy_changed(&self) -> Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("hierarchy failure".into())
        }
    }

    fn e(name: &str) -> Entity {
        Entity::class(format!("http://example.org#{name}")).unwrap()
    }

    #[test]
    fn test_failure_is_isolated() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::LogAndContinue);
        let failing = Arc::new(Failing { calls: AtomicUsize::new(0), panics: true });
        let recorder = Arc::new(Recorder::default());
        registry.add(failing.clone());
        registry.add(recorder.clone());

        registry.fire_node_changed(&e("A"));
        registry.fire_hierarchy_changed();

        assert_eq!(*recorder.nodes.lock(), vec![e("A")]);
        assert_eq!(recorder.rebuilds.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2, "log-and-continue keeps failing listeners");
    }

    #[test]
    fn test_strict_policy_removes_after_consecutive_failures() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::Strict { max_consecutive_failures: 2 });
        let failing = Arc::new(Failing { calls: AtomicUsize::new(0), panics: false });
        registry.add(failing.clone());

        registry.fire_hierarchy_changed();
        assert_eq!(registry.len(), 1);
        registry.fire_node_changed(&e("A"));
        assert_eq!(registry.len(), 0, "second consecutive failure of either kind removes it");

        registry.fire_node_changed(&e("B"));
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bulk_load_suppresses_and_fires_once() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::LogAndContinue);
        let recorder = Arc::new(Recorder::default());
        registry.add(recorder.clone());

        {
            let _bulk = registry.bulk_load();
            assert_eq!(registry.mode(), NotificationMode::BulkLoading);
            registry.fire_node_changed(&e("A"));
            registry.fire_hierarchy_changed();
            registry.fire_hierarchy_changed();
        }

        assert_eq!(registry.mode(), NotificationMode::Quiescent);
        assert!(recorder.nodes.lock().is_empty());
        assert_eq!(recorder.rebuilds.load(Ordering::SeqCst), 1);
    }

    struct SelfRemoving {
        registry: Arc<ListenerRegistry>,
        id: Mutex<Option<ListenerId>>,
        calls: AtomicUsize,
    }

    impl HierarchyListener for SelfRemoving {
        fn node_changed(&self, _entity: &Entity) -> Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = self.id.lock().take() {
                self.registry.remove(id);
            }
            Ok(())
        }

        fn hierarchy_changed(&self) -> Result<(), ListenerError> {
            Ok(())
        }
    }

    #[test]
    fn test_listener_may_remove_itself_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new(ListenerFailurePolicy::LogAndContinue));
        let me = Arc::new(SelfRemoving {
            registry: registry.clone(),
            id: Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        let recorder = Arc::new(Recorder::default());
        let id = registry.add(me.clone());
        *me.id.lock() = Some(id);
        registry.add(recorder.clone());

        registry.fire_nodes_changed([&e("A"), &e("B")]);

        assert_eq!(me.calls.load(Ordering::SeqCst), 1, "removed after the first event");
        assert_eq!(*recorder.nodes.lock(), vec![e("A"), e("B")]);
        assert_eq!(registry.len(), 1);
    }

    /// Removes another listener, then the whole registry, on its first event.
    struct Evictor {
        registry: Arc<ListenerRegistry>,
        victim: ListenerId,
        clear_on_second: bool,
        calls: AtomicUsize,
    }

    impl HierarchyListener for Evictor {
        fn node_changed(&self, _entity: &Entity) -> Result<(), ListenerError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.registry.remove(self.victim);
            } else if self.clear_on_second {
                self.registry.clear();
            }
            Ok(())
        }

        fn hierarchy_changed(&self) -> Result<(), ListenerError> {
            Ok(())
        }
    }

    #[test]
    fn test_listener_removed_by_another_gets_nothing_further() {
        let registry = Arc::new(ListenerRegistry::new(ListenerFailurePolicy::LogAndContinue));
        let victim = Arc::new(Recorder::default());
        let bystander = Arc::new(Recorder::default());
        let first = registry.add(bystander.clone());
        // Ids are sequential; the victim is registered last.
        let victim_id = ListenerId(first.0 + 2);
        let evictor = Arc::new(Evictor {
            registry: registry.clone(),
            victim: victim_id,
            clear_on_second: false,
            calls: AtomicUsize::new(0),
        });
        registry.add(evictor.clone());
        assert_eq!(registry.add(victim.clone()), victim_id);

        registry.fire_nodes_changed([&e("A"), &e("B")]);

        assert!(victim.nodes.lock().is_empty(), "removed before its turn in the pass");
        assert_eq!(*bystander.nodes.lock(), vec![e("A"), e("B")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_during_dispatch_stops_the_pass() {
        let registry = Arc::new(ListenerRegistry::new(ListenerFailurePolicy::LogAndContinue));
        let first = Arc::new(Recorder::default());
        registry.add(first.clone());
        let evictor = Arc::new(Evictor {
            registry: registry.clone(),
            victim: ListenerId(u64::MAX),
            clear_on_second: true,
            calls: AtomicUsize::new(0),
        });
        registry.add(evictor.clone());
        let last = Arc::new(Recorder::default());
        registry.add(last.clone());

        registry.fire_nodes_changed([&e("A"), &e("B"), &e("C")]);

        assert_eq!(evictor.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*first.nodes.lock(), vec![e("A"), e("B"), e("C")]);
        assert!(last.nodes.lock().is_empty());
        assert!(registry.is_empty());

        registry.fire_node_changed(&e("D"));
        assert_eq!(first.nodes.lock().len(), 3);
    }
}
