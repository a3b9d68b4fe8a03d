/// Failures surfaced by tenant resolution and connection management.
///
/// `NotFound` is definitive and should not be retried. `Unavailable` is
/// transient: the caller may retry with backoff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenancyError {
    /// No active tenant with this identifier.
    #[error("Tenant '{0}' not found")]
    NotFound(String),

    /// The registry or a tenant database could not be opened or queried.
    #[error("Database unavailable: {0}")]
    Unavailable(String),
}
