use thiserror::Error;

/// Error taxonomy for the analytics engine.
///
/// Precondition violations are the only failures the engine raises. Degenerate
/// market states (zero rent, zero infrastructure scores, full leverage) are
/// legitimate inputs and map to documented sentinel values instead.
#[derive(Debug, Error)]
pub enum RealtyAnalyticsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },
}

impl RealtyAnalyticsError {
    /// Shorthand for the common construction path.
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        RealtyAnalyticsError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
