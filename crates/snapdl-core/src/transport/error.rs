//! Transport error type.

/// Failure of a single HTTP exchange: curl fault, non-2xx status, or a write
/// into the caller's sink.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body sink failed to store data (disk full, permission denied).
    #[error("storage: {0}")]
    Storage(std::io::Error),
}
