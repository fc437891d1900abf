use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Key = (String, String);

#[derive(Default)]
struct Slot {
    mutex: Arc<Mutex<()>>,
    /// Holders plus waiters. Only changed under the map's shard lock.
    users: AtomicUsize,
}

/// Async mutexes keyed by (learner, course).
///
/// Mutating work for one pair runs one at a time; different pairs never
/// contend. Entries are dropped once nobody holds or waits on them, including
/// when a waiting future is cancelled before it gets the lock.
#[derive(Default)]
pub struct KeyLocks {
    locks: DashMap<Key, Slot>,
}

/// Counts one user of a slot for as long as it lives.
struct Registration<'a> {
    owner: &'a KeyLocks,
    key: Key,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        // remove_if runs the predicate under the shard write lock, the same
        // lock `entry` takes, so a new user cannot slip in between the
        // decrement and the removal.
        self.owner.locks.remove_if(&self.key, |_, slot| {
            slot.users.fetch_sub(1, Ordering::AcqRel) == 1
        });
    }
}

pub struct KeyGuard<'a> {
    // Field order matters: the mutex is released before the registration
    // is dropped.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, learner_id: &str, course_id: &str) -> KeyGuard<'_> {
        let key = (learner_id.to_string(), course_id.to_string());
        let mutex = {
            let slot = self.locks.entry(key.clone()).or_default();
            slot.users.fetch_add(1, Ordering::AcqRel);
            slot.mutex.clone()
        };
        let registration = Registration { owner: self, key };

        let guard = mutex.lock_owned().await;
        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}
