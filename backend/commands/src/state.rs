use herald_core::Snowflake;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// A counter scoped to one guild.
#[derive(Debug, Default)]
pub struct State {
    value: AtomicI64,
}

impl State {
    /// Increment and return the new value.
    pub fn add_one(&self) -> i64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Zero the counter and return what it held.
    pub fn reset(&self) -> i64 {
        self.value.swap(0, Ordering::SeqCst)
    }
}

/// Guild id → [`State`], created on first access.
#[derive(Debug, Default)]
pub struct StateStore {
    states: Mutex<HashMap<Snowflake, Arc<State>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_container(&self, container_id: Snowflake) -> Arc<State> {
        Arc::clone(self.states.lock().entry(container_id).or_default())
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_operations() {
        let state = State::default();
        assert_eq!(state.value(), 0);
        assert_eq!(state.add_one(), 1);
        assert_eq!(state.add_one(), 2);
        assert_eq!(state.reset(), 2);
        assert_eq!(state.value(), 0);
    }

    #[test]
    fn store_shares_state_per_container() {
        let store = StateStore::new();
        store.for_container(Snowflake::new(1)).add_one();
        assert_eq!(store.for_container(Snowflake::new(1)).value(), 1);
        assert_eq!(store.for_container(Snowflake::new(2)).value(), 0);
        assert_eq!(store.len(), 2);
    }
}
