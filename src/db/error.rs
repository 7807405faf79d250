#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Unsupported connection URL scheme: {0}")]
    UnsupportedScheme(String),
}

impl DbError {
    /// True when the connection itself is gone and no further statements
    /// can succeed, as opposed to a single statement failing.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            DbError::SqlxError(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            DbError::UnsupportedScheme(_) => false,
        }
    }
}
