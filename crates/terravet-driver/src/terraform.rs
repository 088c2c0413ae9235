use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::DriverError;
use crate::provisioner::{ApplyOutputs, ProvisionOptions, Provisioner};

/// Where a scenario's lifecycle currently stands. Any verb failing moves
/// to `Failed`; `destroy()` remains legal from every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Planned,
    Applied,
    Destroyed,
    Failed,
}

// ── Terraform ─────────────────────────────────────────────────────────────────

/// Drives the `terraform` (or `tofu`) binary through one scenario's
/// lifecycle inside an isolated workspace.
///
/// Responsibilities:
/// - Create the per-scenario workspace and symlink the module's `.tf`
///   files into it
/// - Write the variable bindings as `terravet.auto.tfvars.json`
/// - Run the lifecycle verbs, capturing combined stdout+stderr
/// - Re-attempt `apply` per the configured retry policy
/// - Extract declared outputs from `output -json`
pub struct Terraform {
    opts: ProvisionOptions,
    phase: Mutex<Phase>,
}

impl Terraform {
    pub fn new(opts: ProvisionOptions) -> Self {
        Self { opts, phase: Mutex::new(Phase::Uninitialized) }
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.opts
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().expect("phase lock")
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock().expect("phase lock") = phase;
    }

    // ── Process execution ─────────────────────────────────────────────────────

    /// Run one subcommand, merging stdout and stderr into a single log.
    /// Each line is mirrored to tracing as it arrives. Returns
    /// (exit_code, combined_log).
    async fn run(&self, verb: &'static str, args: &[&str]) -> Result<(i32, String), DriverError> {
        info!(binary = %self.opts.binary, ?args, workspace = %self.opts.workspace.display(), "running lifecycle verb");

        let mut cmd = Command::new(&self.opts.binary);
        cmd.args(args)
            .current_dir(&self.opts.workspace)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Disable interactive prompts
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            // Cloud auth for the provider
            .envs(&self.opts.env);

        let mut child = cmd.spawn().map_err(|e| DriverError::Spawn {
            binary: self.opts.binary.clone(),
            source: e,
        })?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        let mut log = String::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

        let tx1 = tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx1.send(line);
            }
        });

        let tx2 = tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx2.send(line);
            }
        });

        drop(tx); // close our own sender so rx finishes when both tasks finish

        // Cloud provisioning is slow but not unbounded: past 30 minutes the
        // process is killed and a clear error returned.
        const TIMEOUT_SECS: u64 = 1800;
        let collect = async {
            while let Some(line) = rx.recv().await {
                debug!(target: "terravet::tf", "{}", line);
                log.push_str(&line);
                log.push('\n');
            }
        };
        let timed_out = tokio::time::timeout(Duration::from_secs(TIMEOUT_SECS), collect)
            .await
            .is_err();

        stdout_task.await.ok();
        stderr_task.await.ok();

        if timed_out {
            let _ = child.kill().await;
            self.set_phase(Phase::Failed);
            return Err(DriverError::Timeout { verb, minutes: TIMEOUT_SECS / 60 });
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DriverError::Internal(format!("wait {}: {}", self.opts.binary, e)))?;

        let code = status.code().unwrap_or(-1);
        if code != 0 {
            warn!(binary = %self.opts.binary, verb, code, "lifecycle verb exited non-zero");
        }
        Ok((code, log))
    }

    /// Run a verb and map a non-zero exit to `CommandFailed`.
    async fn run_checked(&self, verb: &'static str, args: &[&str]) -> Result<String, DriverError> {
        let mut args: Vec<&str> = args.to_vec();
        if self.opts.no_color {
            args.push("-no-color");
        }
        let (code, log) = self.run(verb, &args).await?;
        if code != 0 {
            self.set_phase(Phase::Failed);
            return Err(DriverError::CommandFailed { verb, code, log });
        }
        Ok(log)
    }
}

#[async_trait]
impl Provisioner for Terraform {
    fn name(&self) -> &'static str {
        "terraform"
    }

    async fn init(&self) -> Result<(), DriverError> {
        prepare_workspace(&self.opts)?;

        let mut args = vec!["init", "-input=false"];
        if self.opts.no_backend {
            args.push("-backend=false");
        }
        self.run_checked("init", &args).await?;
        self.set_phase(Phase::Initialized);
        Ok(())
    }

    async fn validate(&self) -> Result<(), DriverError> {
        self.run_checked("validate", &["validate"]).await?;
        Ok(())
    }

    async fn plan(&self) -> Result<(), DriverError> {
        self.run_checked("plan", &["plan", "-input=false"]).await?;
        self.set_phase(Phase::Planned);
        Ok(())
    }

    async fn apply(&self) -> Result<(), DriverError> {
        let args = ["apply", "-auto-approve", "-input=false"];
        let mut attempt: u32 = 1;

        loop {
            match self.run_checked("apply", &args).await {
                Ok(_) => {
                    self.set_phase(Phase::Applied);
                    return Ok(());
                }
                Err(DriverError::CommandFailed { verb, code, log }) => {
                    match self.opts.retry.next_delay(attempt, &log) {
                        Some(delay) => {
                            warn!(
                                attempt,
                                delay_secs = delay.as_secs(),
                                "apply hit a retryable backend error, re-attempting"
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        None if attempt > 1 => {
                            return Err(DriverError::RetriesExhausted {
                                attempts: attempt,
                                last: last_line(&log).to_string(),
                            });
                        }
                        None => {
                            return Err(DriverError::CommandFailed { verb, code, log });
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn destroy(&self) -> Result<(), DriverError> {
        if self.phase() == Phase::Uninitialized || !self.opts.workspace.exists() {
            debug!(workspace = %self.opts.workspace.display(), "no workspace; nothing to destroy");
            return Ok(());
        }

        self.run_checked("destroy", &["destroy", "-auto-approve", "-input=false"])
            .await?;
        self.set_phase(Phase::Destroyed);
        Ok(())
    }

    async fn outputs(&self) -> Result<ApplyOutputs, DriverError> {
        let log = self.run_checked("output", &["output", "-json"]).await?;
        ApplyOutputs::from_terraform_json(&log)
    }
}

// ── Workspace helpers ─────────────────────────────────────────────────────────

/// Create the isolated workspace: symlink the module's `.tf` files and
/// write the variable bindings. Re-runnable; stale links are replaced.
fn prepare_workspace(opts: &ProvisionOptions) -> Result<(), DriverError> {
    std::fs::create_dir_all(&opts.workspace)
        .map_err(|e| DriverError::Internal(format!("create workspace dir: {}", e)))?;

    link_module_files(&opts.module_dir, &opts.workspace)?;
    write_tfvars(opts)?;
    Ok(())
}

fn link_module_files(module_dir: &Path, workspace: &Path) -> Result<(), DriverError> {
    let entries = std::fs::read_dir(module_dir)
        .map_err(|e| DriverError::Internal(format!("read module dir {:?}: {}", module_dir, e)))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(".tf") {
            continue;
        }
        let link = workspace.join(&name);
        let target = std::fs::canonicalize(entry.path())
            .map_err(|e| DriverError::Internal(format!("canonicalize {:?}: {}", entry.path(), e)))?;

        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(&link)
                .map_err(|e| DriverError::Internal(format!("remove stale symlink: {}", e)))?;
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, &link)
            .map_err(|e| DriverError::Internal(format!("symlink {:?} → {:?}: {}", link, target, e)))?;

        #[cfg(not(unix))]
        std::fs::copy(&target, &link)
            .map_err(|e| DriverError::Internal(format!("copy {:?} → {:?}: {}", target, link, e)))?;
    }

    Ok(())
}

/// Write `terravet.auto.tfvars.json`. The `.auto` infix makes terraform
/// pick it up without extra flags.
fn write_tfvars(opts: &ProvisionOptions) -> Result<(), DriverError> {
    let json = serde_json::to_string_pretty(&opts.vars)
        .map_err(|e| DriverError::Internal(format!("serialize tfvars: {}", e)))?;
    std::fs::write(opts.workspace.join("terravet.auto.tfvars.json"), json)
        .map_err(|e| DriverError::Internal(format!("write tfvars: {}", e)))?;
    Ok(())
}

fn last_line(log: &str) -> &str {
    log.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("")
}
