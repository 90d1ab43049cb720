use thiserror::Error;

/// Failure of a single read or write against the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cancelled the statement (e.g. SQLSTATE 57014).
    #[error("store timeout: {0}")]
    Timeout(String),

    /// Lock contention, serialization conflicts, connection limits.
    #[error("store busy: {0}")]
    Busy(String),

    /// The store could not be reached or the connection dropped.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request; repeating it will not help.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// A row could not be decoded into the expected shape.
    #[error("malformed record: {0}")]
    Decode(String),

    /// Anything not classified above.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Whether the operation may succeed if repeated.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Busy(_) | Self::Unavailable(_) | Self::Other(_)
        )
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
