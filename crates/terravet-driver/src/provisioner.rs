use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use terravet_domain::VarValue;

use crate::error::DriverError;
use crate::retry::RetryPolicy;

// ── Options ───────────────────────────────────────────────────────────────────

/// Everything the lifecycle driver needs for one scenario.
///
/// Owned by exactly one scenario; the isolated `workspace` is what lets
/// concurrent scenarios share a module directory without trampling each
/// other's state.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// IaC binary to invoke ("terraform" or "tofu").
    pub binary: String,
    /// Directory holding the module's `.tf` files (read-only; linked into
    /// the workspace).
    pub module_dir: PathBuf,
    /// Per-scenario working directory. Created on `init()`.
    pub workspace: PathBuf,
    /// Input variable bindings, written as `terravet.auto.tfvars.json`.
    pub vars: BTreeMap<String, VarValue>,
    /// Extra environment for the subprocess (cloud auth). Never persisted.
    pub env: HashMap<String, String>,
    /// Strip ANSI colour from tool output.
    pub no_color: bool,
    /// Run `init -backend=false` — structural validation without
    /// credentials or remote state.
    pub no_backend: bool,
    /// Transient-error policy applied to `apply()` only.
    pub retry: RetryPolicy,
}

impl ProvisionOptions {
    pub fn new(module_dir: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            binary: "terraform".into(),
            module_dir: module_dir.into(),
            workspace: workspace.into(),
            vars: BTreeMap::new(),
            env: HashMap::new(),
            no_color: true,
            no_backend: false,
            retry: RetryPolicy::none(),
        }
    }
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// One declared module output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    Scalar(String),
    Map(BTreeMap<String, String>),
}

/// The outputs of a successful apply, keyed by declared output name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutputs {
    values: BTreeMap<String, OutputValue>,
}

impl ApplyOutputs {
    /// Parse the JSON emitted by `output -json`: a mapping from output
    /// name to `{ "value": ..., "type": ... }`.
    pub fn from_terraform_json(raw: &str) -> Result<Self, DriverError> {
        let doc: Value = serde_json::from_str(raw.trim())
            .map_err(|e| DriverError::Internal(format!("parse output json: {}", e)))?;

        let obj = doc.as_object().ok_or_else(|| {
            DriverError::Internal("output json is not an object".into())
        })?;

        let mut values = BTreeMap::new();
        for (name, entry) in obj {
            let value = entry.get("value").unwrap_or(&Value::Null);
            values.insert(name.clone(), convert_output(name, value)?);
        }
        Ok(Self { values })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OutputValue) {
        self.values.insert(name.into(), value);
    }

    /// Scalar output by name. Missing or map-shaped is fatal for the
    /// calling assertion, never retried.
    pub fn scalar(&self, name: &str) -> Result<&str, DriverError> {
        match self.values.get(name) {
            Some(OutputValue::Scalar(s)) => Ok(s),
            Some(OutputValue::Map(_)) => Err(DriverError::OutputShape {
                name: name.into(),
                detail: "expected a scalar, found a map".into(),
            }),
            None => Err(DriverError::OutputNotFound(name.into())),
        }
    }

    /// String-map output by name (e.g. subnet-name → subnet-ID).
    pub fn map(&self, name: &str) -> Result<&BTreeMap<String, String>, DriverError> {
        match self.values.get(name) {
            Some(OutputValue::Map(m)) => Ok(m),
            Some(OutputValue::Scalar(_)) => Err(DriverError::OutputShape {
                name: name.into(),
                detail: "expected a map, found a scalar".into(),
            }),
            None => Err(DriverError::OutputNotFound(name.into())),
        }
    }
}

fn convert_output(name: &str, value: &Value) -> Result<OutputValue, DriverError> {
    match value {
        Value::String(s) => Ok(OutputValue::Scalar(s.clone())),
        Value::Bool(b) => Ok(OutputValue::Scalar(b.to_string())),
        Value::Number(n) => Ok(OutputValue::Scalar(n.to_string())),
        Value::Object(m) => {
            let mut out = BTreeMap::new();
            for (k, v) in m {
                let s = v.as_str().ok_or_else(|| DriverError::OutputShape {
                    name: name.into(),
                    detail: format!("map key '{}' holds a non-string value", k),
                })?;
                out.insert(k.clone(), s.to_string());
            }
            Ok(OutputValue::Map(out))
        }
        other => Err(DriverError::OutputShape {
            name: name.into(),
            detail: format!("unsupported value {}", other),
        }),
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Lifecycle seam over the provisioning backend.
///
/// `Terraform` is the real implementation; `LocalProvisioner` is a
/// scripted stub for exercising the harness without a binary or a cloud.
#[async_trait]
pub trait Provisioner: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Prepare the working directory. Must succeed before any other verb.
    async fn init(&self) -> Result<(), DriverError>;

    /// Structural check of the module; provisions nothing.
    async fn validate(&self) -> Result<(), DriverError>;

    /// Dry-run. A failure here carries the raw tool error — for the
    /// negative path that failure is the expected outcome.
    async fn plan(&self) -> Result<(), DriverError>;

    /// Provision real resources, re-attempting per the configured retry
    /// policy. All other verbs are single-attempt.
    async fn apply(&self) -> Result<(), DriverError>;

    /// Tear down whatever exists. Safe to call after a partial or failed
    /// apply; a no-op if `init()` never ran.
    async fn destroy(&self) -> Result<(), DriverError>;

    /// Read the declared outputs of a successful apply.
    async fn outputs(&self) -> Result<ApplyOutputs, DriverError>;
}
