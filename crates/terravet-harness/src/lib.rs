pub mod builder;
pub mod cleanup;
pub mod error;
pub mod negative;
pub mod runner;
pub mod verify;

pub use builder::{empty_address_space_scenario, vnet_scenario};
pub use cleanup::CleanupGuard;
pub use error::HarnessError;
pub use negative::expect_plan_rejection;
pub use runner::{run_applied, verify_vnet_module, ScenarioReport};
