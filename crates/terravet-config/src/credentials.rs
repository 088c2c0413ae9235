use std::collections::HashMap;

use crate::error::ConfigError;

/// Service-principal identity for one subscription, read from the four
/// `ARM_*` environment variables exactly once at scenario build time.
///
/// Absence of any variable is a fatal precondition failure — a scenario
/// that provisions or verifies must never start half-authenticated.
#[derive(Debug, Clone)]
pub struct ArmCredentials {
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl ArmCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            subscription_id: required("ARM_SUBSCRIPTION_ID")?,
            client_id: required("ARM_CLIENT_ID")?,
            client_secret: required("ARM_CLIENT_SECRET")?,
            tenant_id: required("ARM_TENANT_ID")?,
        })
    }

    /// Environment to set on the provisioning subprocess. The provider SDK
    /// reads these itself; they are never written to disk or tfvars.
    pub fn auth_env(&self) -> HashMap<String, String> {
        HashMap::from([
            ("ARM_SUBSCRIPTION_ID".into(), self.subscription_id.clone()),
            ("ARM_CLIENT_ID".into(), self.client_id.clone()),
            ("ARM_CLIENT_SECRET".into(), self.client_secret.clone()),
            ("ARM_TENANT_ID".into(), self.tenant_id.clone()),
        ])
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnv(key)),
    }
}

/// Whether provisioning-dependent scenarios should be skipped entirely
/// (environments without cloud access). Structural-validation and
/// negative-path scenarios ignore this — they need no credentials.
pub fn skip_provision_from_env() -> bool {
    std::env::var("TERRAVET_SKIP_PROVISION")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
