use crate::core::OperationKind;
use std::collections::HashSet;
use std::time::Duration;

/// Default event buffer per notification channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Store construction configuration, immutable for the store's lifetime.
///
/// Follows the builder convention: `StoreConfig::default()` gives a
/// well-behaved store; each method returns the modified config.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Uniform latency applied before any operation completes.
    pub latency: Option<Duration>,

    /// Every save fails with `SimulatedFailure`.
    pub fail_on_save: bool,

    /// Every delete fails with `SimulatedFailure`.
    pub fail_on_delete: bool,

    /// Every read fails with `SimulatedFailure`.
    pub fail_on_read: bool,

    /// Operations that fail exactly once, then behave normally.
    pub fail_once: HashSet<OperationKind>,

    /// Defensively deep-copy values at the store boundary. Ownership
    /// already guarantees snapshots alias nothing; disabling this only
    /// skips the extra copy on the write path.
    pub deep_copy: bool,

    /// Suppress notifications whose content equals the previously
    /// delivered snapshot.
    pub dedupe: bool,

    /// Deliver collection snapshots sorted by document id ascending;
    /// otherwise insertion order is kept.
    pub sorted_collections: bool,

    /// Events buffered per notification channel. A subscriber falling
    /// more than this many events behind skips ahead to the oldest
    /// retained snapshot; its stream is never terminated.
    pub channel_capacity: usize,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            latency: None,
            fail_on_save: false,
            fail_on_delete: false,
            fail_on_read: false,
            fail_once: HashSet::new(),
            deep_copy: true,
            dedupe: true,
            sorted_collections: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the uniform operation latency.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Force every save to fail.
    pub fn fail_on_save(mut self, fail: bool) -> Self {
        self.fail_on_save = fail;
        self
    }

    /// Force every delete to fail.
    pub fn fail_on_delete(mut self, fail: bool) -> Self {
        self.fail_on_delete = fail;
        self
    }

    /// Force every read to fail.
    pub fn fail_on_read(mut self, fail: bool) -> Self {
        self.fail_on_read = fail;
        self
    }

    /// Make the next operation of `kind` fail once, then auto-clear.
    pub fn fail_once_on(mut self, kind: OperationKind) -> Self {
        self.fail_once.insert(kind);
        self
    }

    /// Toggle defensive deep copies at the boundary.
    pub fn deep_copy(mut self, deep_copy: bool) -> Self {
        self.deep_copy = deep_copy;
        self
    }

    /// Toggle dedupe-by-content on notifications.
    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Toggle sorted collection snapshots.
    pub fn sorted_collections(mut self, sorted: bool) -> Self {
        self.sorted_collections = sorted;
        self
    }

    /// Set the per-channel notification buffer size (minimum 1).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
