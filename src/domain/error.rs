#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    /// Malformed or out-of-range input; the caller can correct and retry.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// State or uniqueness violation, including lost CAS updates.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated principal acting on a resource it does not own.
    #[error("Access denied: {0}")]
    Authorization(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unexpected persistence or logic failure. Logged with detail, the
    /// message itself stays safe to surface.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
