use thiserror::Error;

/// Failure of a whole fetch. No snapshots are returned alongside it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The listing call to the metrics source failed: connectivity,
    /// authorization or an unreadable response.
    #[error("metrics source unavailable: {0}")]
    SourceUnavailable(#[source] anyhow::Error),
}

impl FetchError {
    /// The error reported by the metrics source, for downcasting.
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            FetchError::SourceUnavailable(cause) => cause,
        }
    }
}
