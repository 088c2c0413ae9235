use anyhow::{bail, Context, Result};
use terravet_config::{load_run_config, skip_provision_from_env, ArmCredentials, RunConfig};
use terravet_driver::{ProvisionOptions, Provisioner, Terraform};
use terravet_harness::runner::workspace_for;
use terravet_harness::{
    empty_address_space_scenario, expect_plan_rejection, verify_vnet_module, vnet_scenario,
};
use tracing::info;

use crate::cli::Cli;
use crate::output;

pub fn load_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = if cli.config.exists() {
        load_run_config(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else if let Some(dir) = &cli.module_dir {
        RunConfig::for_module(dir)
    } else {
        bail!(
            "config file {} not found and no --module-dir given",
            cli.config.display()
        );
    };

    if let Some(dir) = &cli.module_dir {
        cfg.module_dir = dir.clone();
    }
    Ok(cfg)
}

// ── Validate ──────────────────────────────────────────────────────────────────

/// Structural validation: no backend, no credentials, nothing provisioned.
pub async fn validate(cfg: RunConfig) -> Result<()> {
    let scenario = vnet_scenario(&cfg)?;

    let mut opts = ProvisionOptions::new(&scenario.module_dir, workspace_for(&scenario));
    opts.binary = cfg.binary.clone();
    opts.vars = scenario.vars.clone();
    opts.no_backend = true;

    let tf = Terraform::new(opts);
    tf.init().await?;
    tf.validate().await?;

    println!("module {} is structurally valid", cfg.module_dir.display());
    Ok(())
}

// ── Verify ────────────────────────────────────────────────────────────────────

pub async fn verify(cfg: RunConfig) -> Result<()> {
    if cfg.skip_provision || skip_provision_from_env() {
        println!("provisioning scenarios skipped by configuration");
        return Ok(());
    }

    let creds = ArmCredentials::from_env()?;
    info!(module = %cfg.module_dir.display(), location = %cfg.location, "verifying module");
    let report = verify_vnet_module(&cfg, &creds).await?;
    print!("{}", output::render_report(&report));

    if report.cleanup_error.is_some() {
        bail!(
            "verification passed but destroy failed — trace resources via suffix {}",
            report.suffix
        );
    }
    Ok(())
}

// ── Negative ──────────────────────────────────────────────────────────────────

pub async fn negative(cfg: RunConfig) -> Result<()> {
    let scenario = empty_address_space_scenario(&cfg);

    let mut opts = ProvisionOptions::new(&scenario.module_dir, workspace_for(&scenario));
    opts.binary = cfg.binary.clone();
    opts.vars = scenario.vars.clone();
    opts.no_backend = true;

    let tf = Terraform::new(opts);
    let log = expect_plan_rejection(&scenario, &tf).await?;

    println!("plan rejected the empty address space as required:");
    print!("{}", output::tail(&log, 8));
    Ok(())
}
