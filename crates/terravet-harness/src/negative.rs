use terravet_domain::Scenario;
use terravet_driver::{DriverError, Provisioner};
use tracing::info;

use crate::error::HarnessError;

/// Drive init + plan on a deliberately invalid scenario and require the
/// plan phase to reject it. The rejection is the success condition here:
/// the raw tool log is returned so callers can assert on its content.
///
/// `apply()` is never invoked and no cleanup guard is armed — nothing is
/// created.
pub async fn expect_plan_rejection(
    scenario: &Scenario,
    provisioner: &dyn Provisioner,
) -> Result<String, HarnessError> {
    let identity = scenario.identity();

    provisioner
        .init()
        .await
        .map_err(|e| HarnessError::driver(&identity, e))?;

    match provisioner.plan().await {
        Err(DriverError::CommandFailed { log, .. }) => {
            info!(%identity, "plan rejected the invalid input as required");
            Ok(log)
        }
        Err(e) => Err(HarnessError::driver(&identity, e)),
        Ok(()) => Err(HarnessError::PlanUnexpectedlySucceeded { identity }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::empty_address_space_scenario;
    use terravet_config::RunConfig;
    use terravet_driver::LocalProvisioner;

    fn scenario() -> terravet_domain::Scenario {
        empty_address_space_scenario(&RunConfig::for_module("modules/vnet"))
    }

    #[tokio::test]
    async fn plan_rejection_is_the_success_condition() {
        let s = scenario();
        let p = LocalProvisioner::new().failing_plan();

        let log = expect_plan_rejection(&s, &p).await.unwrap();
        assert!(log.contains("at least one CIDR"), "log: {log}");
        // Never applies, never destroys.
        assert_eq!(p.calls(), vec!["init", "plan"]);
    }

    #[tokio::test]
    async fn accepting_plan_is_the_failure() {
        let s = scenario();
        let p = LocalProvisioner::new();

        let err = expect_plan_rejection(&s, &p).await.unwrap_err();
        assert!(
            matches!(err, HarnessError::PlanUnexpectedlySucceeded { .. }),
            "got: {err}"
        );
    }
}
