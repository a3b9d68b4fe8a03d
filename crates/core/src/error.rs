#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input that fails domain rules.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored data that breaks a domain rule.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
