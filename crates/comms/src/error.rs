use dentiq_core::types::EntityId;

/// Error type for communication lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum CommsError {
    /// A referenced entity required for the operation does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted value could not be mapped back into the domain model.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for lifecycle operation results.
pub type CommsResult<T> = Result<T, CommsError>;
