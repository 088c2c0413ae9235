mod credentials;
mod loader;
mod raw;
pub mod error;

pub use credentials::{skip_provision_from_env, ArmCredentials};
pub use error::ConfigError;
pub use loader::{load_run_config, RunConfig};
