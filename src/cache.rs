//! Per-lifecycle instance caches.
//!
//! One cache lives on the root provider (singletons), one on each scope
//! (scoped instances). Slot lookup is a short non-suspending critical
//! section; construction happens outside the map lock under per-key
//! discipline so concurrent resolves of one key build exactly one instance.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::AnyArc;

/// One cached service entry: an exactly-once publication cell plus a
/// construction lock for async builds.
pub(crate) struct InstanceSlot {
    value: OnceCell<AnyArc>,
    /// Per-key construction lock for async initializers. The winner holds
    /// it across construction; losers await it and then read the cell.
    /// Cancellation releases the lock without publishing.
    build_lock: tokio::sync::Mutex<()>,
    /// Set when the slot was created while test mode was active, so
    /// mock-derived instances can be evicted on `disable_test_mode`.
    test_entry: bool,
}

impl InstanceSlot {
    fn new(test_entry: bool) -> Self {
        Self {
            value: OnceCell::new(),
            build_lock: tokio::sync::Mutex::new(()),
            test_entry,
        }
    }

    /// The published instance, if construction has completed.
    pub(crate) fn get(&self) -> Option<AnyArc> {
        self.value.get().cloned()
    }

    /// Synchronous exactly-once construction. The winner runs `init`;
    /// concurrent losers block until publication. A failed `init` leaves
    /// the cell empty, so the key is not cached on error.
    pub(crate) fn get_or_try_init<F>(&self, init: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        self.value.get_or_try_init(init).cloned()
    }

    /// Acquires the async construction lock.
    pub(crate) async fn lock_for_build(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.build_lock.lock().await
    }

    /// Publishes a constructed instance and returns whatever ends up in the
    /// cell. A concurrent publication through the synchronous path wins the
    /// cell; returning the cell's value keeps singleton identity intact.
    pub(crate) fn publish(&self, value: AnyArc) -> AnyArc {
        self.value.get_or_init(|| value).clone()
    }
}

/// Key-addressed slot store shared by the singleton and scoped caches.
pub(crate) struct InstanceCache {
    slots: Mutex<HashMap<Key, std::sync::Arc<InstanceSlot>>>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The slot for `key`, creating it on first use. `test_entry` tags
    /// slots created while test mode is active.
    pub(crate) fn slot(&self, key: &Key, test_entry: bool) -> std::sync::Arc<InstanceSlot> {
        let mut slots = self.slots.lock().unwrap();
        slots
            .entry(key.clone())
            .or_insert_with(|| std::sync::Arc::new(InstanceSlot::new(test_entry)))
            .clone()
    }

    /// Drops every slot created while test mode was active.
    pub(crate) fn evict_test_entries(&self) {
        self.slots
            .lock()
            .unwrap()
            .retain(|_, slot| !slot.test_entry);
    }

    /// Drops all slots. Used on provider/scope closure.
    pub(crate) fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }
}
