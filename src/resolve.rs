//! Entity name resolution
//!
//! [`NameLookup`] turns court, judge and charge IDs into display names. The
//! database implements it; [`StaticNames`] is a fixed in-memory table.
//!
//! [`KeyedSlot`] holds the result of a lookup keyed by the request that asked
//! for it. Keys come from a [`RequestCounter`], so two requests for the same
//! entity are still distinct. When a newer request starts before an earlier
//! one returns, the late answer is dropped instead of overwriting the newer
//! state.
//!
//! ```
//! use courtlens::resolve::{KeyedSlot, RequestCounter};
//!
//! let mut requests = RequestCounter::new();
//! let mut slot = KeyedSlot::new();
//!
//! let first = requests.next(5);
//! slot.begin(first);
//! let second = requests.next(5);
//! slot.begin(second);
//!
//! assert!(!slot.fulfill(&first, "Theft (old)"));
//! assert!(slot.fulfill(&second, "Theft"));
//! ```

use std::collections::HashMap;

/// Resolves entity IDs to names. `None` means the ID is unknown.
pub trait NameLookup {
    fn court_name(&self, id: i32) -> Option<String>;
    fn judge_name(&self, id: i32) -> Option<String>;
    fn charge_name(&self, id: i32) -> Option<String>;
}

/// Fixed name tables
#[derive(Debug, Clone, Default)]
pub struct StaticNames {
    pub courts: HashMap<i32, String>,
    pub judges: HashMap<i32, String>,
    pub charges: HashMap<i32, String>,
}

impl StaticNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_court(mut self, id: i32, name: &str) -> Self {
        self.courts.insert(id, name.to_string());
        self
    }

    pub fn with_judge(mut self, id: i32, name: &str) -> Self {
        self.judges.insert(id, name.to_string());
        self
    }

    pub fn with_charge(mut self, id: i32, name: &str) -> Self {
        self.charges.insert(id, name.to_string());
        self
    }
}

impl NameLookup for StaticNames {
    fn court_name(&self, id: i32) -> Option<String> {
        self.courts.get(&id).cloned()
    }

    fn judge_name(&self, id: i32) -> Option<String> {
        self.judges.get(&id).cloned()
    }

    fn charge_name(&self, id: i32) -> Option<String> {
        self.charges.get(&id).cloned()
    }
}

/// Identity of one lookup request for `entity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey<K> {
    pub seq: u64,
    pub entity: K,
}

/// Hands out [`RequestKey`]s with increasing sequence numbers
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    last: u64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<K>(&mut self, entity: K) -> RequestKey<K> {
        self.last += 1;
        RequestKey { seq: self.last, entity }
    }
}

/// Result state for a lookup, keyed by the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState<V> {
    Idle,
    Pending,
    Ready(V),
    Failed(String),
}

/// Latest-request-wins container
#[derive(Debug, Clone)]
pub struct KeyedSlot<K, V> {
    current: Option<K>,
    state: SlotState<V>,
}

impl<K: PartialEq, V> Default for KeyedSlot<K, V> {
    fn default() -> Self {
        Self { current: None, state: SlotState::Idle }
    }
}

impl<K: PartialEq, V> KeyedSlot<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lookup for `key`, discarding whatever the previous key produced
    pub fn begin(&mut self, key: K) {
        self.current = Some(key);
        self.state = SlotState::Pending;
    }

    /// Apply a result. Returns false, leaving the slot untouched, if `key` is
    /// no longer the current request.
    pub fn fulfill(&mut self, key: &K, value: V) -> bool {
        if !self.is_current(key) {
            return false;
        }
        self.state = SlotState::Ready(value);
        true
    }

    /// Record a failure for `key`, with the same staleness rule as `fulfill`
    pub fn fail(&mut self, key: &K, error: impl Into<String>) -> bool {
        if !self.is_current(key) {
            return false;
        }
        self.state = SlotState::Failed(error.into());
        true
    }

    pub fn is_current(&self, key: &K) -> bool {
        self.current.as_ref() == Some(key)
    }

    pub fn current_key(&self) -> Option<&K> {
        self.current.as_ref()
    }

    pub fn state(&self) -> &SlotState<V> {
        &self.state
    }

    pub fn value(&self) -> Option<&V> {
        match &self.state {
            SlotState::Ready(v) => Some(v),
            _ => None,
        }
    }

    /// Resolve `key` synchronously through `lookup`
    pub fn resolve_with<F>(&mut self, key: K, lookup: F) -> Option<&V>
    where
        K: Clone,
        F: FnOnce(&K) -> Option<V>,
    {
        self.begin(key.clone());
        match lookup(&key) {
            Some(v) => {
                self.fulfill(&key, v);
            }
            None => {
                self.fail(&key, "not found");
            }
        }
        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_names() {
        let names = StaticNames::new().with_court(1, "Philadelphia").with_charge(5, "Theft");
        assert_eq!(names.court_name(1).as_deref(), Some("Philadelphia"));
        assert_eq!(names.charge_name(5).as_deref(), Some("Theft"));
        assert_eq!(names.judge_name(1), None);
    }

    // ==========================================================================
    // STALE RESPONSES
    // ==========================================================================
    //
    // A lookup for charge 1 is started, then the user switches to charge 2 and
    // back to charge 1. Only the newest request may land in the slot, even
    // when an older one asked about the same charge.
    // ==========================================================================

    #[test]
    fn test_late_response_is_dropped() {
        let mut requests = RequestCounter::new();
        let mut slot = KeyedSlot::new();
        let first = requests.next(1);
        slot.begin(first);
        let second = requests.next(2);
        slot.begin(second);

        assert!(slot.fulfill(&second, "Burglary".to_string()));
        assert!(!slot.fulfill(&first, "Theft".to_string()));
        assert_eq!(slot.value().map(String::as_str), Some("Burglary"));
    }

    #[test]
    fn test_same_entity_requested_again() {
        let mut requests = RequestCounter::new();
        let mut slot = KeyedSlot::new();
        let first = requests.next(1);
        slot.begin(first);
        slot.begin(requests.next(2));
        let again = requests.next(1);
        slot.begin(again);

        assert_eq!(first.entity, again.entity);
        assert!(!slot.fulfill(&first, "Theft (stale)".to_string()));
        assert_eq!(slot.state(), &SlotState::Pending);
        assert!(slot.fulfill(&again, "Theft".to_string()));
        assert_eq!(slot.value().map(String::as_str), Some("Theft"));
    }

    #[test]
    fn test_begin_clears_previous_value() {
        let mut requests = RequestCounter::new();
        let mut slot = KeyedSlot::new();
        let first = requests.next(1);
        slot.begin(first);
        slot.fulfill(&first, "Theft".to_string());
        let next = requests.next(3);
        slot.begin(next);
        assert_eq!(slot.value(), None);
        assert_eq!(slot.current_key(), Some(&next));
    }

    #[test]
    fn test_stale_failure_is_dropped() {
        let mut requests = RequestCounter::new();
        let mut slot: KeyedSlot<RequestKey<&str>, u32> = KeyedSlot::new();
        let a = requests.next("a");
        slot.begin(a);
        let b = requests.next("b");
        slot.begin(b);
        assert!(!slot.fail(&a, "timeout"));
        assert!(slot.fail(&b, "timeout"));
        assert_eq!(slot.state(), &SlotState::Failed("timeout".to_string()));
    }

    #[test]
    fn test_resolve_with_lookup() {
        let names = StaticNames::new().with_charge(5, "Theft");
        let mut requests = RequestCounter::new();
        let mut slot: KeyedSlot<RequestKey<i32>, String> = KeyedSlot::new();

        let found = slot.resolve_with(requests.next(5), |k| names.charge_name(k.entity));
        assert_eq!(found.map(String::as_str), Some("Theft"));
        assert_eq!(slot.resolve_with(requests.next(6), |k| names.charge_name(k.entity)), None);
        assert!(matches!(slot.state(), SlotState::Failed(_)));
    }
}
