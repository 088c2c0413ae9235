pub mod error;
pub mod id;
pub mod rules;
pub mod types;


pub use error::DomainError;
pub use id::unique_id;
pub use rules::{Access, Direction, Protocol, SecurityRule, MAX_RULE_PRIORITY, MIN_RULE_PRIORITY};
pub use types::{Expectation, Scenario, VarValue};
