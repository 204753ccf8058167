//! Per-scope task caches.
//!
//! The registry maps each [`Scope`] to one [`CacheEntry`]; the entry maps
//! canonical URLs to their [`LoadTask`]. Nothing is ever evicted, so memory
//! grows with the set of distinct scopes and URLs seen over the process
//! lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::scope::Scope;
use crate::types::LoadTask;

/// Canonical URL to task mapping for one scope.
#[derive(Debug, Default)]
pub struct CacheEntry {
    tasks: Mutex<HashMap<String, LoadTask>>,
}

impl CacheEntry {
    /// Cached task for `url`, if any.
    pub fn get(&self, url: &str) -> Option<LoadTask> {
        lock(&self.tasks).get(url).cloned()
    }

    /// Return the task for `url`, creating it with `create` if absent.
    ///
    /// Lookup and insert happen under one lock, so concurrent callers for the
    /// same URL always observe a single task. The flag is `true` when this
    /// call created it.
    pub fn get_or_insert_with(
        &self,
        url: &str,
        create: impl FnOnce() -> LoadTask,
    ) -> (LoadTask, bool) {
        let mut tasks = lock(&self.tasks);
        if let Some(task) = tasks.get(url) {
            return (task.clone(), false);
        }
        let task = create();
        tasks.insert(url.to_string(), task.clone());
        (task, true)
    }

    /// Canonical URLs with a task, in no particular order.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.tasks).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scope to cache-entry mapping, keyed by scope identity.
#[derive(Debug)]
pub struct ScopeRegistry {
    entries: Mutex<HashMap<Scope, Arc<CacheEntry>>>,
}

impl ScopeRegistry {
    /// Create a registry seeded with [`Scope::DOCUMENT`].
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(Scope::DOCUMENT, Arc::new(CacheEntry::default()));
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Entry for `scope`, allocating an empty one on first use.
    pub fn get_or_create(&self, scope: &Scope) -> Arc<CacheEntry> {
        let mut entries = lock(&self.entries);
        Arc::clone(entries.entry(*scope).or_default())
    }

    /// Entry for `scope` without creating one.
    pub fn get(&self, scope: &Scope) -> Option<Arc<CacheEntry>> {
        lock(&self.entries).get(scope).cloned()
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        lock(&self.entries).contains_key(scope)
    }

    /// Number of scopes with an entry, the default scope included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Critical sections never leave the maps half-updated, so a poisoned lock
// still guards consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventual::{self, Eventual};

    #[test]
    fn test_default_scope_preseeded() {
        let registry = ScopeRegistry::new();
        assert!(registry.contains(&Scope::DOCUMENT));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_is_lazy_and_stable() {
        let registry = ScopeRegistry::new();
        let scope = Scope::new();
        assert!(registry.get(&scope).is_none());

        let first = registry.get_or_create(&scope);
        let second = registry.get_or_create(&scope);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookalike_scopes_get_separate_entries() {
        let registry = ScopeRegistry::new();
        let a = registry.get_or_create(&Scope::named("frame"));
        let b = registry.get_or_create(&Scope::named("frame"));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_get_or_insert_with_creates_once() {
        let entry = CacheEntry::default();
        let (_completer, pending) = eventual::pending();

        let (first, created) = entry.get_or_insert_with("a.css", || pending.clone());
        assert!(created);

        let (second, created) =
            entry.get_or_insert_with("a.css", || panic!("must not create twice"));
        assert!(!created);
        assert!(first.same_as(&second));
        assert_eq!(entry.len(), 1);
    }

    #[test]
    fn test_settled_tasks_are_kept() {
        let entry = CacheEntry::default();
        entry.get_or_insert_with("x.css", || Eventual::ready(Err("x.css".to_string())));

        let cached = entry.get("x.css").expect("cached");
        assert_eq!(cached.peek(), Some(Err("x.css".to_string())));
        assert_eq!(entry.urls(), vec!["x.css".to_string()]);
    }
}
