//! Capacity-bounded in-memory cache with least-recently-used eviction

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use tracing::{trace, warn};

/// Sweep interval used when an interval policy is configured with zero
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// When the cache trims itself back down to capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict synchronously on every insert
    #[default]
    OnInsert,
    /// Evict from a background sweep running at the given interval
    Interval(Duration),
}

impl EvictionPolicy {
    fn sweep_interval(&self) -> Option<Duration> {
        match self {
            EvictionPolicy::OnInsert => None,
            EvictionPolicy::Interval(interval) if interval.is_zero() => Some(DEFAULT_SWEEP_INTERVAL),
            EvictionPolicy::Interval(interval) => Some(*interval),
        }
    }
}

/// Bounded key/value cache.
///
/// `get` refreshes recency, eviction always removes the least recently used
/// entry. All methods take `&self` so one instance can be shared between tasks.
pub struct BoundedCache<K, V> {
    state: Arc<Mutex<LruState<K, V>>>,
    policy: EvictionPolicy,
    sweeper: Mutex<Option<Sweeper>>,
}

struct Sweeper {
    /// Dropping the sender stops the sweep thread
    _stop: mpsc::Sender<()>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, EvictionPolicy::OnInsert)
    }

    pub fn with_policy(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(LruState::new(capacity))),
            policy,
            sweeper: Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check for a key without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.lock().index.contains_key(key)
    }

    /// Get a value, marking it as most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key)
    }

    /// Insert or replace a value, marking it as most recently used
    pub fn set(&self, key: K, value: V) {
        self.ensure_sweeper();

        let mut state = self.lock();
        state.insert(key, value);
        if self.policy == EvictionPolicy::OnInsert {
            let evicted = state.evict_to_capacity();
            if evicted > 0 {
                trace!(evicted, "cache evicted on insert");
            }
        }
    }

    /// Remove every entry and stop any background sweep.
    ///
    /// The sweep restarts with the next `set`.
    pub fn clear(&self) {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.lock().clear();
    }

    /// True while a background sweep thread is attached
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run one eviction pass immediately, regardless of policy
    pub fn evict(&self) -> usize {
        self.lock().evict_to_capacity()
    }

    fn lock(&self) -> MutexGuard<'_, LruState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_sweeper(&self) {
        let Some(interval) = self.policy.sweep_interval() else {
            return;
        };

        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            return;
        }

        let (stop, stopped) = mpsc::channel::<()>();
        let state = Arc::downgrade(&self.state);
        let spawned = thread::Builder::new()
            .name("cache-sweep".into())
            .spawn(move || sweep_loop(state, stopped, interval));

        match spawned {
            Ok(_) => *sweeper = Some(Sweeper { _stop: stop }),
            Err(err) => warn!(error = %err, "failed to start cache sweep thread"),
        }
    }
}

fn sweep_loop<K, V>(state: Weak<Mutex<LruState<K, V>>>, stopped: mpsc::Receiver<()>, interval: Duration)
where
    K: Eq + Hash + Clone,
{
    loop {
        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }

        let Some(state) = state.upgrade() else {
            return;
        };
        let evicted = state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .evict_to_capacity();
        if evicted > 0 {
            trace!(evicted, "cache evicted on sweep");
        }
    }
}

/// Slab-backed doubly-linked recency list plus a hash index.
///
/// `head` is the least recently used entry, `tail` the most recent.
struct LruState<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

struct Slot<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> LruState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        self.slots[idx].as_ref().map(|slot| slot.value.clone())
    }

    fn insert(&mut self, key: K, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.touch(idx);
            return;
        }

        let slot = Slot {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_back(idx);
    }

    fn evict_to_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.len() > self.capacity {
            let Some(idx) = self.head else {
                break;
            };
            self.unlink(idx);
            if let Some(slot) = self.slots[idx].take() {
                self.index.remove(&slot.key);
            }
            self.free.push(idx);
            evicted += 1;
        }
        evicted
    }

    fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    fn touch(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_back(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = None;
            slot.next = None;
        }
    }

    fn push_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = old_tail;
            slot.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(slot) = self.slots[t].as_mut() {
                    slot.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let cache = BoundedCache::new(2);
        assert!(cache.get(&"a").is_none());

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BoundedCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get(&"a"), Some(1));
        cache.set("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = BoundedCache::new(3);
        for i in 0..100 {
            cache.set(i, i * 10);
            assert!(cache.len() <= 3);
            if i % 7 == 0 {
                let _ = cache.get(&(i / 2));
            }
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&99), Some(990));
    }

    #[test]
    fn test_set_existing_key_replaces_and_refreshes() {
        let cache = BoundedCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        cache.set("c", 3);

        assert_eq!(cache.get(&"a"), Some(10));
        assert!(!cache.contains(&"b"));
    }

    #[test]
    fn test_get_does_not_evict() {
        let cache = BoundedCache::with_policy(1, EvictionPolicy::Interval(Duration::from_secs(3600)));
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let cache = BoundedCache::new(0);
        cache.set("a", 1);
        assert!(cache.is_empty());
        assert!(cache.get(&"a").is_none());
    }

    #[test]
    fn test_slots_are_reused() {
        let cache = BoundedCache::new(1);
        for i in 0..10 {
            cache.set(i, i);
        }
        assert_eq!(cache.lock().slots.len(), 2);
        assert_eq!(cache.get(&9), Some(9));
    }

    #[test]
    fn test_interval_policy_sweeps_in_background() {
        let cache = BoundedCache::with_policy(2, EvictionPolicy::Interval(Duration::from_millis(10)));
        for i in 0..5 {
            cache.set(i, i);
        }
        assert!(cache.is_sweeping());

        let mut waited = Duration::ZERO;
        while cache.len() > 2 && waited < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(10));
            waited += Duration::from_millis(10);
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&3));
        assert!(cache.contains(&4));
    }

    #[test]
    fn test_clear_stops_and_set_resumes_sweep() {
        let cache = BoundedCache::with_policy(2, EvictionPolicy::Interval(Duration::from_secs(3600)));
        cache.set("a", 1);
        assert!(cache.is_sweeping());

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_sweeping());

        cache.set("b", 2);
        assert!(cache.is_sweeping());
    }

    #[test]
    fn test_manual_evict() {
        let cache = BoundedCache::with_policy(1, EvictionPolicy::Interval(Duration::from_secs(3600)));
        cache.set("a", 1);
        cache.set("b", 2);
        let _ = cache.get(&"a");

        assert_eq!(cache.evict(), 1);
        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
    }

    #[test]
    fn test_on_insert_never_sweeps() {
        let cache = BoundedCache::new(2);
        cache.set("a", 1);
        assert!(!cache.is_sweeping());
        assert_eq!(cache.policy(), EvictionPolicy::OnInsert);
    }
}
