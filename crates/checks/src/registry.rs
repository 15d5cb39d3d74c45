use std::{collections::HashMap, hash::Hash};

use crate::{
    check::ReadyCheck,
    error::{CheckError, Result},
};

/// Live checks keyed by audience scope, at most one per scope.
///
/// Owned by whoever coordinates command handling; there is no process-wide
/// instance.
#[derive(Debug)]
pub struct CheckRegistry<K, U> {
    checks: HashMap<K, ReadyCheck<U>>,
}

impl<K, U> Default for CheckRegistry<K, U> {
    fn default() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, U> CheckRegistry<K, U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: &K) -> Option<&ReadyCheck<U>> {
        self.checks.get(scope)
    }

    pub fn get_mut(&mut self, scope: &K) -> Option<&mut ReadyCheck<U>> {
        self.checks.get_mut(scope)
    }

    pub fn contains(&self, scope: &K) -> bool {
        self.checks.contains_key(scope)
    }

    /// Register `check` for `scope`, refusing if the scope is taken.
    pub fn put(&mut self, scope: K, check: ReadyCheck<U>) -> Result<()> {
        if self.checks.contains_key(&scope) {
            return Err(CheckError::AlreadyActive);
        }
        self.checks.insert(scope, check);
        Ok(())
    }

    /// Retire the check for `scope`, if any.
    pub fn remove(&mut self, scope: &K) -> Option<ReadyCheck<U>> {
        self.checks.remove(scope)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
