use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The resource the provisioning tool claims to have created does not
    /// exist on the control plane. Immediately after apply this can also
    /// be read-path lag; the harness decides whether to re-poll.
    #[error("virtual network '{name}' not found in resource group '{resource_group}'")]
    NotFound { resource_group: String, name: String },

    #[error("control-plane request timed out after {0}s")]
    Timeout(u64),

    #[error("ARM error {code}: {message}")]
    Api { code: String, message: String },

    #[error("token acquisition failed: {0}")]
    Auth(String),

    #[error("internal verifier error: {0}")]
    Internal(String),
}
