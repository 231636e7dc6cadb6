//! Process-wide watch context
//!
//! The first `watch()` in the process creates the context, every active
//! handle keeps it alive, and the last handle to stop releases it. It owns
//! the handle id allocator, the event id sequence and the registry of active
//! watch roots.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

static GLOBAL: ContextSlot = ContextSlot::new();

/// Shared state for all active watches in one slot
pub struct WatchContext {
    /// Next handle id
    next_handle: AtomicU64,
    /// Next event id
    next_event: AtomicU64,
    /// Active watches: handle id -> root
    active: DashMap<u64, PathBuf>,
}

impl WatchContext {
    fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            next_event: AtomicU64::new(1),
            active: DashMap::new(),
        }
    }

    /// Get the process-wide context, creating it if no watch is active
    pub(crate) fn acquire() -> Arc<Self> {
        GLOBAL.acquire()
    }

    /// Record a new active watch and return its handle id
    pub(crate) fn register(&self, root: &Path) -> u64 {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.active.insert(id, root.to_path_buf());
        id
    }

    pub(crate) fn unregister(&self, id: u64) {
        self.active.remove(&id);
    }

    /// Allocate the next event id
    pub(crate) fn next_event_id(&self) -> u64 {
        self.next_event.fetch_add(1, Ordering::Relaxed)
    }

    /// Active watches, ordered by handle id
    pub fn active(&self) -> Vec<(u64, PathBuf)> {
        let mut active: Vec<_> = self
            .active
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        active.sort_by_key(|(id, _)| *id);
        active
    }
}

impl Drop for WatchContext {
    fn drop(&mut self) {
        debug!("Watch context released");
    }
}

/// Lazily filled, non-owning slot for a context
pub(crate) struct ContextSlot {
    slot: Mutex<Weak<WatchContext>>,
}

impl ContextSlot {
    pub(crate) const fn new() -> Self {
        Self {
            slot: parking_lot::const_mutex(Weak::new()),
        }
    }

    /// Reuse the live context or create a fresh one
    pub(crate) fn acquire(&self) -> Arc<WatchContext> {
        let mut slot = self.slot.lock();
        if let Some(context) = slot.upgrade() {
            return context;
        }

        let context = Arc::new(WatchContext::new());
        *slot = Arc::downgrade(&context);
        debug!("Watch context initialized");
        context
    }

    /// The live context, if any handle holds it
    pub(crate) fn current(&self) -> Option<Arc<WatchContext>> {
        self.slot.lock().upgrade()
    }
}

/// Active watches in this process, as `(handle id, root)` pairs
pub fn active_watches() -> Vec<(u64, PathBuf)> {
    GLOBAL
        .current()
        .map(|context| context.active())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_acquire_initializes() {
        let slot = ContextSlot::new();
        assert!(slot.current().is_none());

        let context = slot.acquire();
        assert!(slot.current().is_some());
        assert!(Arc::ptr_eq(&context, &slot.acquire()));
    }

    #[test]
    fn test_last_release_tears_down() {
        let slot = ContextSlot::new();
        let first = slot.acquire();
        let second = slot.acquire();

        drop(first);
        assert!(slot.current().is_some());

        drop(second);
        assert!(slot.current().is_none());

        // A later acquire starts a fresh context
        let fresh = slot.acquire();
        assert_eq!(fresh.next_event_id(), 1);
    }

    #[test]
    fn test_registry_and_ids() {
        let slot = ContextSlot::new();
        let context = slot.acquire();

        let a = context.register(Path::new("/a"));
        let b = context.register(Path::new("/b"));
        assert!(b > a);
        assert_eq!(
            context.active(),
            vec![(a, PathBuf::from("/a")), (b, PathBuf::from("/b"))]
        );

        context.unregister(a);
        assert_eq!(context.active(), vec![(b, PathBuf::from("/b"))]);

        let first = context.next_event_id();
        assert!(context.next_event_id() > first);
    }
}
