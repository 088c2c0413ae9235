use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use terravet_azure::{NetworkClient, ServicePrincipalTokenProvider};
use terravet_config::{ArmCredentials, RunConfig};
use terravet_domain::Scenario;
use terravet_driver::{ProvisionOptions, Provisioner, RetryPolicy, Terraform};
use tracing::{error, info};

use crate::builder;
use crate::cleanup::CleanupGuard;
use crate::error::HarnessError;
use crate::verify;

// ── Report ────────────────────────────────────────────────────────────────────

/// What happened to one scenario, with enough identity to trace any
/// resources it may have left behind.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: String,
    pub suffix: String,
    pub resource_group: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Destroy failure, surfaced separately: it never masks the
    /// assertion outcome and never aborts the run.
    pub cleanup_error: Option<String>,
}

impl ScenarioReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

// ── Orchestration ─────────────────────────────────────────────────────────────

/// Drive one scenario through init → apply → verify → destroy.
///
/// The verify body runs in a spawned task so that a panic inside an
/// assertion is contained and cannot skip teardown. The cleanup guard is
/// armed as soon as `init()` succeeds and released on every exit path;
/// its failure lands in the report, not in the returned error.
pub async fn run_applied<F, Fut>(
    scenario: &Scenario,
    provisioner: Arc<dyn Provisioner>,
    verify_body: F,
) -> Result<ScenarioReport, HarnessError>
where
    F: FnOnce(Arc<dyn Provisioner>) -> Fut,
    Fut: Future<Output = Result<(), HarnessError>> + Send + 'static,
{
    let identity = scenario.identity();
    let started_at = Utc::now();
    info!(%identity, "starting scenario");

    provisioner
        .init()
        .await
        .map_err(|e| HarnessError::driver(&identity, e))?;

    let guard = CleanupGuard::arm(provisioner.clone(), &identity);

    let outcome = match provisioner.apply().await {
        Ok(()) => {
            let handle = tokio::spawn(verify_body(provisioner.clone()));
            match handle.await {
                Ok(result) => result,
                Err(join) => Err(HarnessError::VerifyPanicked {
                    identity: identity.clone(),
                    message: panic_message(join),
                }),
            }
        }
        Err(e) => Err(HarnessError::driver(&identity, e)),
    };

    let cleanup_error = match guard.release().await {
        Ok(()) => None,
        Err(e) => {
            error!(%identity, error = %e, "destroy failed; resources may need manual cleanup");
            Some(e.to_string())
        }
    };

    let report = ScenarioReport {
        scenario: scenario.name.clone(),
        suffix: scenario.suffix.clone(),
        resource_group: scenario.resource_group.clone(),
        started_at,
        finished_at: Utc::now(),
        cleanup_error,
    };

    match outcome {
        Ok(()) => {
            info!(%identity, "scenario passed");
            Ok(report)
        }
        Err(e) => Err(e),
    }
}

fn panic_message(join: tokio::task::JoinError) -> String {
    if !join.is_panic() {
        return "verification task was cancelled".into();
    }
    match join.into_panic().downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => (*s).to_string(),
            Err(_) => "opaque panic payload".into(),
        },
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// The full cross-source verification of the configured module: build
/// the standard scenario, apply it with the default retry policy, read
/// the declared outputs, fetch the live network through the independent
/// control-plane client, and require both views to agree.
pub async fn verify_vnet_module(
    cfg: &RunConfig,
    creds: &ArmCredentials,
) -> Result<ScenarioReport, HarnessError> {
    let scenario = builder::vnet_scenario(cfg).map_err(|e| HarnessError::Build {
        scenario: "vnet-standard".into(),
        source: e,
    })?;

    let mut opts = ProvisionOptions::new(&scenario.module_dir, workspace_for(&scenario));
    opts.binary = cfg.binary.clone();
    opts.vars = scenario.vars.clone();
    opts.env = creds.auth_env();
    opts.retry = RetryPolicy::default_retryable_errors();
    let provisioner: Arc<dyn Provisioner> = Arc::new(Terraform::new(opts));

    let token = ServicePrincipalTokenProvider::new(
        &creds.tenant_id,
        &creds.client_id,
        &creds.client_secret,
    );
    let client = NetworkClient::new(&creds.subscription_id, Box::new(token));

    let body_scenario = scenario.clone();
    run_applied(&scenario, provisioner, move |p| async move {
        let identity = body_scenario.identity();

        let outputs = p
            .outputs()
            .await
            .map_err(|e| HarnessError::driver(&identity, e))?;
        verify::check_outputs(&body_scenario, &outputs)?;

        let live = verify::fetch_live_network(
            &client,
            &body_scenario.resource_group,
            &body_scenario.vnet_name,
            verify::VISIBILITY_ATTEMPTS,
            verify::VISIBILITY_DELAY,
        )
        .await
        .map_err(|e| HarnessError::verify(&identity, e))?;
        verify::check_live_state(&body_scenario, &live)
    })
    .await
}

/// Per-scenario scratch directory. The suffix keeps parallel runs from
/// sharing terraform state.
pub fn workspace_for(scenario: &Scenario) -> PathBuf {
    std::env::temp_dir()
        .join("terravet")
        .join(format!("{}-{}", scenario.name, scenario.suffix))
}
