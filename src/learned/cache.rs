//! Per-lesson memoization
//!
//! Entries are keyed by (module, lesson). Each key owns a `OnceLock`, so
//! concurrent first queries for the same lesson build it once while other
//! lessons proceed independently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

use crate::curriculum::LessonKey;

use super::LessonStates;

type Slot = Arc<OnceLock<Arc<LessonStates>>>;

/// Memo table of built lessons
#[derive(Debug)]
pub struct LearnedStateCache {
    memoize: bool,
    entries: Mutex<HashMap<LessonKey, Slot>>,
    builds: AtomicUsize,
}

impl Default for LearnedStateCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LearnedStateCache {
    /// `memoize = false` rebuilds on every request (diagnostics only)
    pub fn new(memoize: bool) -> Self {
        Self {
            memoize,
            entries: Mutex::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Fetch the lesson, running `build` only if no one has built it yet
    pub fn get_or_build<F>(&self, key: &LessonKey, build: F) -> Arc<LessonStates>
    where
        F: FnOnce() -> LessonStates,
    {
        if !self.memoize {
            self.builds.fetch_add(1, Ordering::Relaxed);
            return Arc::new(build());
        }

        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(key.clone()).or_default().clone()
        };

        slot.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            debug!("Building learned state for {}", key);
            Arc::new(build())
        })
        .clone()
    }

    pub fn get(&self, key: &LessonKey) -> Option<Arc<LessonStates>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of lessons built and kept
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total builds performed, including rebuilds when memoization is off
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{LessonId, ModuleId};
    use crate::learned::LearnedSnapshot;
    use std::thread;

    fn key(lesson: u32) -> LessonKey {
        LessonKey::new(
            ModuleId::parse("module1").unwrap(),
            LessonId::parse(&format!("lesson{lesson}")).unwrap(),
        )
    }

    fn states(key: &LessonKey, steps: usize) -> LessonStates {
        LessonStates {
            key: key.clone(),
            base: LearnedSnapshot::default(),
            snapshots: (0..steps).map(|_| Arc::new(LearnedSnapshot::default())).collect(),
        }
    }

    #[test]
    fn test_memoizes_per_key() {
        let cache = LearnedStateCache::default();
        let k1 = key(1);
        let k2 = key(2);

        let a = cache.get_or_build(&k1, || states(&k1, 3));
        let b = cache.get_or_build(&k1, || states(&k1, 99));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 3);

        cache.get_or_build(&k2, || states(&k2, 1));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.builds(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&k1).is_none());
    }

    #[test]
    fn test_without_memoization_rebuilds() {
        let cache = LearnedStateCache::new(false);
        let k = key(1);
        cache.get_or_build(&k, || states(&k, 1));
        cache.get_or_build(&k, || states(&k, 1));
        assert_eq!(cache.builds(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let cache = Arc::new(LearnedStateCache::default());
        let k = key(4);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let k = k.clone();
                thread::spawn(move || {
                    cache.get_or_build(&k, || {
                        thread::sleep(std::time::Duration::from_millis(20));
                        states(&k, 2)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().len(), 2);
        }
        assert_eq!(cache.builds(), 1);
    }
}
