use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("security rule '{name}': priority {priority} outside {min}..={max}")]
    RulePriorityOutOfRange {
        name: String,
        priority: u16,
        min: u16,
        max: u16,
    },

    #[error("security rule name must not be empty")]
    EmptyRuleName,
}
