use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Per-topic publish/subscribe fan-out.
///
/// One broadcast channel per topic, created on first subscribe and
/// released when the last subscription for that topic is dropped, so a
/// long-running store does not accumulate channels for keys nobody
/// watches anymore. Each channel buffers `capacity` events; a
/// subscriber falling further behind skips ahead to the oldest retained
/// event instead of failing.
pub(crate) struct TopicHub<K, T> {
    state: Arc<Mutex<HubState<K, T>>>,
    capacity: usize,
}

struct HubState<K, T> {
    channels: HashMap<K, broadcast::Sender<T>>,
    closed: bool,
}

impl<K, T> TopicHub<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                channels: HashMap::new(),
                closed: false,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Delivers `event` to current subscribers of `topic`. A topic with
    /// no live channel is skipped entirely; storage is never re-queried
    /// per subscriber.
    pub(crate) fn publish(&self, topic: &K, event: T) {
        let state = lock(&self.state);
        if let Some(tx) = state.channels.get(topic) {
            // Send only fails when every receiver is already gone.
            let _ = tx.send(event);
        }
    }

    /// Registers a subscription whose first delivered event is `seed`.
    pub(crate) fn subscribe(&self, topic: K, seed: T, dedupe: bool) -> Subscription<K, T> {
        let mut state = lock(&self.state);

        let rx = if state.closed {
            // Already torn down: the seed still arrives, then the
            // stream ends.
            broadcast::channel(1).0.subscribe()
        } else {
            state
                .channels
                .entry(topic.clone())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };

        Subscription {
            seed: Some(seed),
            last: None,
            dedupe,
            rx,
            _guard: SubscriptionGuard {
                topic,
                state: Arc::clone(&self.state),
            },
        }
    }

    /// Drops every channel, ending all live subscriptions. Idempotent.
    pub(crate) fn close(&self) {
        let mut state = lock(&self.state);
        if !state.closed {
            state.closed = true;
            state.channels.clear();
            debug!("notification hub closed");
        }
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        lock(&self.state).channels.len()
    }
}

impl<K, T> Clone for TopicHub<K, T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            capacity: self.capacity,
        }
    }
}

fn lock<K, T>(
    state: &Arc<Mutex<HubState<K, T>>>,
) -> std::sync::MutexGuard<'_, HubState<K, T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A live subscription to one topic.
///
/// The first call to [`next`](Self::next) yields the seed captured at
/// subscribe time; later calls yield subsequent events in mutation
/// order. With dedupe enabled an event structurally equal to the last
/// delivered one is skipped. The stream ends (`None`) when the store is
/// torn down. Dropping the subscription cancels it without affecting
/// other subscribers of the same topic.
pub struct Subscription<K, T>
where
    K: Eq + Hash + Clone,
{
    seed: Option<T>,
    last: Option<T>,
    dedupe: bool,
    // `rx` must drop before the guard so the guard observes an accurate
    // receiver count.
    rx: broadcast::Receiver<T>,
    _guard: SubscriptionGuard<K, T>,
}

impl<K, T> Subscription<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + PartialEq,
{
    /// Waits for the next distinct event, or `None` once the store is
    /// torn down.
    pub async fn next(&mut self) -> Option<T> {
        if let Some(seed) = self.seed.take() {
            self.last = Some(seed.clone());
            return Some(seed);
        }

        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.dedupe && self.last.as_ref() == Some(&event) {
                        continue;
                    }
                    self.last = Some(event.clone());
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // An overrun subscriber keeps its stream; it only
                    // misses intermediate snapshots.
                    warn!(skipped, "subscription lagged behind publisher");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Cancels the subscription. Equivalent to dropping it.
    pub fn cancel(self) {}
}

impl<K, T> std::fmt::Debug for Subscription<K, T>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

struct SubscriptionGuard<K, T>
where
    K: Eq + Hash + Clone,
{
    topic: K,
    state: Arc<Mutex<HubState<K, T>>>,
}

impl<K, T> Drop for SubscriptionGuard<K, T>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        let release = state
            .channels
            .get(&self.topic)
            .is_some_and(|tx| tx.receiver_count() == 0);
        if release {
            state.channels.remove(&self.topic);
        }
    }
}
