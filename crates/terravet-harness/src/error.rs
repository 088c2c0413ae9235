use terravet_azure::VerifyError;
use terravet_domain::DomainError;
use terravet_driver::DriverError;
use thiserror::Error;

/// Scenario-level failures. Every variant carries the scenario identity
/// (name, suffix, resource group) so that orphaned resources, should
/// cleanup ever fail too, can be traced back to the run that made them.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("[scenario={scenario}] build: {source}")]
    Build {
        scenario: String,
        #[source]
        source: DomainError,
    },

    #[error("[{identity}] {source}")]
    Driver {
        identity: String,
        #[source]
        source: DriverError,
    },

    #[error("[{identity}] live-state fetch: {source}")]
    Verify {
        identity: String,
        #[source]
        source: VerifyError,
    },

    /// The provisioning tool's outputs and the control plane disagree —
    /// the signal this whole system exists to catch.
    #[error("[{identity}] mismatch in {field}: declared '{declared}', live '{live}'")]
    Mismatch {
        identity: String,
        field: String,
        declared: String,
        live: String,
    },

    #[error("[{identity}] verification body panicked: {message}")]
    VerifyPanicked { identity: String, message: String },

    #[error("[{identity}] plan succeeded on input that must be rejected")]
    PlanUnexpectedlySucceeded { identity: String },
}

impl HarnessError {
    pub fn driver(identity: impl Into<String>, source: DriverError) -> Self {
        Self::Driver { identity: identity.into(), source }
    }

    pub fn verify(identity: impl Into<String>, source: VerifyError) -> Self {
        Self::Verify { identity: identity.into(), source }
    }
}
