use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::MxStatus;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct Item {
    status: MxStatus,
    expiration: Option<Instant>,
}

/// One per domain. The first caller fills it; concurrent callers for the
/// same domain block on the cell instead of issuing their own query.
#[derive(Default)]
struct Slot {
    cell: OnceLock<Item>,
}

/// Domain → [`MxStatus`] cache shared by every resolver handle.
///
/// By default entries never expire, so a domain found without mail routing
/// stays absent for the life of the cache. [`MxCache::with_ttl`] enables
/// expiry against an injectable [`Clock`].
pub struct MxCache {
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl Default for MxCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MxCache {
    pub fn new() -> Self {
        Self {
            ttl: None,
            clock: Arc::new(SystemClock),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Some(ttl),
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the cached status, if present, resolved and not expired.
    pub fn get(&self, domain: &str) -> Option<MxStatus> {
        let slots = self.slots.lock();
        let item = slots.get(domain)?.cell.get()?;
        if self.is_expired(item) {
            None
        } else {
            Some(item.status.clone())
        }
    }

    pub fn insert(&self, domain: impl Into<String>, status: MxStatus) {
        let slot = Slot::default();
        // a fresh cell cannot already be set
        let _ = slot.cell.set(self.item(status));
        self.slots.lock().insert(domain.into(), Arc::new(slot));
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> usize {
        let mut slots = self.slots.lock();
        let num_entries = slots.len();
        slots.clear();
        num_entries
    }

    /// Get the cached status for `domain`, or run `resolve` to produce it.
    /// `resolve` runs at most once per live entry, even under concurrent
    /// callers.
    pub(crate) fn get_or_resolve<F>(&self, domain: &str, resolve: F) -> MxStatus
    where
        F: FnOnce() -> MxStatus,
    {
        let slot = {
            let mut slots = self.slots.lock();
            match slots.get(domain) {
                Some(slot) if !self.slot_expired(slot) => slot.clone(),
                _ => {
                    let slot = Arc::new(Slot::default());
                    slots.insert(domain.to_string(), slot.clone());
                    slot
                }
            }
        };

        slot.cell
            .get_or_init(|| self.item(resolve()))
            .status
            .clone()
    }

    fn item(&self, status: MxStatus) -> Item {
        let expiration = self
            .ttl
            .and_then(|ttl| self.clock.now().checked_add(ttl));
        Item { status, expiration }
    }

    // a slot still being resolved is never expired
    fn slot_expired(&self, slot: &Slot) -> bool {
        slot.cell.get().is_some_and(|item| self.is_expired(item))
    }

    fn is_expired(&self, item: &Item) -> bool {
        item.expiration
            .is_some_and(|expiration| self.clock.now() >= expiration)
    }
}
