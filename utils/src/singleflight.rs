//! Keyed single-flight call deduplication.
//!
//! Concurrent calls to [`Group::work`] with the same key coalesce so that only one
//! invocation of the work function executes; every other caller awaits a clone of the
//! same result, success or failure.
//!
//! - The first caller becomes the "leader" and runs the work function without holding any lock.
//! - Followers wait on a oneshot channel for the leader's result.
//! - If the leader is cancelled or panics before finishing, followers receive
//!   [`SingleflightError::LeaderDropped`] rather than waiting forever.
//!
//! Once a call completes its key is released, so a later call starts a brand-new flight.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::SingleflightError;

type Waiters<T, E> = Vec<oneshot::Sender<Result<T, E>>>;

pub struct Group<K, T, E> {
    calls: Mutex<HashMap<K, Waiters<T, E>>>,
}

impl<K, T, E> Default for Group<K, T, E> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T, E> Group<K, T, E>
where
    K: Hash + Eq + Clone + Debug + Send,
    T: Clone + Send,
    E: Clone + Send,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `work` for `key` unless a call for that key is already in flight, in which
    /// case wait for the in-flight call's result instead.
    pub async fn work<F, Fut>(&self, key: &K, work: F) -> Result<T, SingleflightError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Attempt to become the leader or register as a follower.
        let follower_rx = {
            let mut calls = self.calls.lock();
            match calls.get_mut(key) {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                },
                None => {
                    calls.insert(key.clone(), Vec::new());
                    None
                },
            }
        };

        if let Some(rx) = follower_rx {
            debug!(?key, "singleflight: joining in-flight call");
            return match rx.await {
                Ok(result) => result.map_err(SingleflightError::InternalError),
                Err(_) => Err(SingleflightError::LeaderDropped),
            };
        }

        let guard = CallGuard {
            group: self,
            key: key.clone(),
            completed: false,
        };

        let result = work().await;

        for tx in guard.complete() {
            // Receivers may have been dropped; that is fine.
            let _ = tx.send(result.clone());
        }

        result.map_err(SingleflightError::InternalError)
    }

    /// Number of keys with a call currently in flight.
    pub fn num_in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Releases the leader's key when the leader finishes, is cancelled, or panics. Dropping the
/// waiters' senders wakes every follower.
struct CallGuard<'a, K: Hash + Eq, T, E> {
    group: &'a Group<K, T, E>,
    key: K,
    completed: bool,
}

impl<K: Hash + Eq, T, E> CallGuard<'_, K, T, E> {
    fn complete(mut self) -> Waiters<T, E> {
        self.completed = true;
        self.group.calls.lock().remove(&self.key).unwrap_or_default()
    }
}

impl<K: Hash + Eq, T, E> Drop for CallGuard<'_, K, T, E> {
    fn drop(&mut self) {
        if !self.completed {
            self.group.calls.lock().remove(&self.key);
        }
    }
}
