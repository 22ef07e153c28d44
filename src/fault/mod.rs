use crate::core::{OperationKind, Result, StoreError};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Deterministic failure and delay simulation, configured once at store
/// construction.
///
/// Consulted at the head of every operation, before any stored state is
/// touched, so a failed call provably leaves the store unchanged.
pub struct FaultInjector {
    latency: Option<Duration>,
    fail_on_save: bool,
    fail_on_delete: bool,
    fail_on_read: bool,
    /// Triggers that fail exactly once, then clear themselves.
    one_shot: Mutex<HashSet<OperationKind>>,
}

impl FaultInjector {
    pub fn new(
        latency: Option<Duration>,
        fail_on_save: bool,
        fail_on_delete: bool,
        fail_on_read: bool,
        one_shot: HashSet<OperationKind>,
    ) -> Self {
        Self {
            latency,
            fail_on_save,
            fail_on_delete,
            fail_on_read,
            one_shot: Mutex::new(one_shot),
        }
    }

    /// Applies the configured latency, then raises the configured fault
    /// for `kind` if any.
    pub async fn inject(&self, kind: OperationKind) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.forced(kind) || self.take_one_shot(kind) {
            debug!(%kind, "raising simulated failure");
            return Err(StoreError::SimulatedFailure(kind));
        }

        Ok(())
    }

    fn forced(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Save => self.fail_on_save,
            OperationKind::Delete => self.fail_on_delete,
            OperationKind::Read => self.fail_on_read,
        }
    }

    fn take_one_shot(&self, kind: OperationKind) -> bool {
        self.one_shot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_faults_by_default() {
        let injector = FaultInjector::new(None, false, false, false, HashSet::new());
        assert!(injector.inject(OperationKind::Save).await.is_ok());
        assert!(injector.inject(OperationKind::Read).await.is_ok());
    }

    #[tokio::test]
    async fn test_forced_failure_is_persistent() {
        let injector = FaultInjector::new(None, true, false, false, HashSet::new());
        assert!(injector.inject(OperationKind::Save).await.is_err());
        assert!(injector.inject(OperationKind::Save).await.is_err());
        assert!(injector.inject(OperationKind::Delete).await.is_ok());
    }

    #[tokio::test]
    async fn test_one_shot_clears_after_firing() {
        let mut one_shot = HashSet::new();
        one_shot.insert(OperationKind::Read);
        let injector = FaultInjector::new(None, false, false, false, one_shot);

        assert!(injector.inject(OperationKind::Read).await.is_err());
        assert!(injector.inject(OperationKind::Read).await.is_ok());
    }

    #[tokio::test]
    async fn test_latency_delays_completion() {
        let injector = FaultInjector::new(
            Some(Duration::from_millis(20)),
            false,
            false,
            false,
            HashSet::new(),
        );

        let started = std::time::Instant::now();
        injector.inject(OperationKind::Save).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
