use crate::core::{Result, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::trace;

/// Serializes asynchronous actions that share a logical key.
///
/// Actions submitted under the same key run one at a time, in submission
/// order. Actions under distinct keys run fully concurrently. A failing
/// action surfaces its fault to its own submitter only; the next queued
/// action for that key still runs.
///
/// An action must not recursively submit another action under the key it
/// is currently executing under. The second action would wait for the
/// first to finish and the pair would deadlock. This obligation is not
/// enforced at runtime.
pub struct KeyedFifoExecutor<K> {
    inner: Arc<Mutex<ExecState<K>>>,
}

struct ExecState<K> {
    /// Completion handle of the most recently submitted action per key.
    tails: HashMap<K, Tail>,
    next_seq: u64,
    closed: bool,
}

struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

impl<K> KeyedFifoExecutor<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ExecState {
                tails: HashMap::new(),
                next_seq: 0,
                closed: false,
            })),
        }
    }

    /// Queues `action` behind every previously submitted action for
    /// `key` and returns a future resolving to the action's result.
    ///
    /// The queue position is claimed synchronously inside this call, so
    /// per-key execution order equals submission order no matter when or
    /// in what order the returned futures are first polled.
    pub fn submit<T, F>(
        &self,
        key: K,
        action: F,
    ) -> impl Future<Output = Result<T>> + Send + use<K, T, F>
    where
        T: Send,
        F: Future<Output = Result<T>> + Send,
    {
        let claim = {
            let mut state = self.lock();
            if state.closed {
                Err(StoreError::Closed)
            } else {
                state.next_seq += 1;
                let seq = state.next_seq;
                let (done_tx, done_rx) = oneshot::channel::<()>();
                let prev = state.tails.insert(
                    key.clone(),
                    Tail {
                        seq,
                        done: done_rx,
                    },
                );
                trace!(seq, "queued keyed action");
                Ok((prev.map(|tail| tail.done), seq, done_tx))
            }
        };

        let inner = Arc::clone(&self.inner);
        async move {
            let (prev_done, my_seq, done_tx) = claim?;

            if let Some(prev) = prev_done {
                // A dropped or failed predecessor still releases the
                // turn, so the Err arm is deliberately ignored.
                let _ = prev.await;
            }

            let closed = lock_state(&inner).closed;
            let result = if closed {
                // Disposed while queued: the action never starts.
                Err(StoreError::Closed)
            } else {
                action.await
            };

            let _ = done_tx.send(());

            let mut state = lock_state(&inner);
            if state.tails.get(&key).is_some_and(|tail| tail.seq == my_seq) {
                state.tails.remove(&key);
            }

            result
        }
    }

    /// Stops accepting submissions and discards queued actions that have
    /// not started yet; the currently running action per key finishes.
    /// Idempotent.
    pub fn dispose(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.tails.clear();
            trace!("keyed executor disposed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExecState<K>> {
        lock_state(&self.inner)
    }
}

fn lock_state<K>(inner: &Arc<Mutex<ExecState<K>>>) -> std::sync::MutexGuard<'_, ExecState<K>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K> Default for KeyedFifoExecutor<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for KeyedFifoExecutor<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
