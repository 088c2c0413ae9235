use std::sync::Arc;

use terravet_driver::{DriverError, Provisioner};
use tracing::{error, info};

/// Scoped teardown obligation for one scenario's live infrastructure.
///
/// Armed immediately after a successful `init()`; [`release`] consumes
/// the guard and runs `destroy()`, so it can only ever fire once. The
/// runner releases on every exit path — success, assertion failure,
/// contained panic. A guard that is dropped without release (process
/// abort is the only path here) logs the scenario identity so the
/// orphaned resources can be traced.
///
/// [`release`]: CleanupGuard::release
pub struct CleanupGuard {
    provisioner: Arc<dyn Provisioner>,
    identity: String,
    released: bool,
}

impl CleanupGuard {
    pub fn arm(provisioner: Arc<dyn Provisioner>, identity: impl Into<String>) -> Self {
        Self { provisioner, identity: identity.into(), released: false }
    }

    /// Tear down whatever the scenario created. Consumes the guard.
    pub async fn release(mut self) -> Result<(), DriverError> {
        self.released = true;
        info!(identity = %self.identity, "destroying scenario resources");
        self.provisioner.destroy().await
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.released {
            error!(
                identity = %self.identity,
                "cleanup guard dropped without release — live resources may be orphaned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terravet_driver::LocalProvisioner;

    #[tokio::test]
    async fn release_destroys_exactly_once() {
        let p = Arc::new(LocalProvisioner::new());
        let guard = CleanupGuard::arm(p.clone(), "scenario=t suffix=s");
        guard.release().await.unwrap();
        assert_eq!(p.destroy_count(), 1);
    }

    #[tokio::test]
    async fn destroy_failure_is_returned_to_the_caller() {
        let p = Arc::new(LocalProvisioner::new().failing_destroy());
        let guard = CleanupGuard::arm(p.clone(), "scenario=t suffix=s");
        assert!(guard.release().await.is_err());
        assert_eq!(p.destroy_count(), 1);
    }

    #[tokio::test]
    async fn dropped_guard_does_not_destroy() {
        // Drop only logs; running destroy from a sync Drop would be unsound.
        let p = Arc::new(LocalProvisioner::new());
        drop(CleanupGuard::arm(p.clone(), "scenario=t suffix=s"));
        assert_eq!(p.destroy_count(), 0);
    }
}
