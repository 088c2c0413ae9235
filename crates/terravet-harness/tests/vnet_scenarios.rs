//! End-to-end scenarios against the `modules/vnet` fixture.
//!
//! The structural and negative scenarios need only the terraform binary;
//! they return early when it is absent. The full verification scenario
//! additionally needs the four ARM_* credential variables — their absence
//! is a precondition failure, which the test asserts is surfaced as such.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use terravet_config::{skip_provision_from_env, ArmCredentials, ConfigError, RunConfig};
use terravet_driver::{ProvisionOptions, Provisioner, Terraform};
use terravet_harness::{empty_address_space_scenario, expect_plan_rejection, verify_vnet_module};

fn module_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../modules/vnet")
}

fn terraform_available() -> bool {
    std::process::Command::new("terraform")
        .arg("-version")
        .output()
        .is_ok()
}

fn offline_options(workspace: &Path, scenario: &terravet_domain::Scenario) -> ProvisionOptions {
    let mut opts = ProvisionOptions::new(&scenario.module_dir, workspace);
    opts.vars = scenario.vars.clone();
    opts.no_backend = true;
    opts
}

#[tokio::test]
async fn module_passes_structural_validation() {
    if !terraform_available() {
        return;
    }

    let cfg = RunConfig::for_module(module_dir());
    let scenario = terravet_harness::vnet_scenario(&cfg).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let tf = Terraform::new(offline_options(tmp.path(), &scenario));

    tf.init().await.expect("init -backend=false should succeed");
    tf.validate().await.expect("module should be structurally valid");
}

#[tokio::test]
async fn empty_address_space_fails_at_plan() {
    if !terraform_available() {
        return;
    }

    let cfg = RunConfig::for_module(module_dir());
    let scenario = empty_address_space_scenario(&cfg);

    let tmp = tempfile::tempdir().unwrap();
    let tf = Terraform::new(offline_options(tmp.path(), &scenario));

    let log = expect_plan_rejection(&scenario, &tf)
        .await
        .expect("plan must reject an empty address space");
    assert!(
        log.to_lowercase().contains("address"),
        "rejection should mention the address space, got:\n{log}"
    );
}

#[tokio::test]
async fn full_apply_verify_destroy_round_trip() {
    if skip_provision_from_env() {
        return;
    }
    if !terraform_available() {
        return;
    }

    let creds = match ArmCredentials::from_env() {
        Ok(creds) => creds,
        Err(err) => {
            // No credentials is a precondition failure, not a silent pass:
            // it must surface as the specific missing variable.
            assert!(matches!(err, ConfigError::MissingEnv(_)), "got: {err}");
            return;
        }
    };

    let cfg = RunConfig::for_module(module_dir());
    let report = verify_vnet_module(&cfg, &creds)
        .await
        .expect("declared outputs and live state must agree");

    assert!(
        report.cleanup_error.is_none(),
        "destroy failed, trace resources via suffix {}: {:?}",
        report.suffix,
        report.cleanup_error
    );
}

#[tokio::test]
async fn destroy_without_apply_never_errors() {
    // The guard may fire after a failed apply; destroy has to be safe on
    // a workspace that never held state.
    let cfg = RunConfig::for_module(module_dir());
    let scenario = terravet_harness::vnet_scenario(&cfg).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let tf: Arc<dyn Provisioner> =
        Arc::new(Terraform::new(offline_options(tmp.path(), &scenario)));

    tf.destroy().await.expect("destroy before init must be a no-op");
}
