use casting_core::error::CoreError;

/// Errors that stop a reconciliation call before it can start.
///
/// Failures of individual conversion steps are not errors: they are
/// reported as [`ConversionIssue`](casting_core::conversion::ConversionIssue)s
/// inside the result.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
