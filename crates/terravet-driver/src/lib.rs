pub mod error;
pub mod local;
pub mod provisioner;
pub mod retry;
pub mod terraform;

pub use error::DriverError;
pub use local::LocalProvisioner;
pub use provisioner::{ApplyOutputs, OutputValue, ProvisionOptions, Provisioner};
pub use retry::{RetryPolicy, RetryRule};
pub use terraform::{Phase, Terraform};
