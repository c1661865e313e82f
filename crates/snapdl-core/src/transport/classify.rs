//! Classify HTTP status and curl errors into user-facing error kinds.

use super::TransportError;

/// Coarse category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Connection,
    Throttled,
    HttpStatus(u16),
    Storage,
    Other,
}

impl ErrorKind {
    /// Name printed next to a failed item.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Connection => "ConnectError",
            ErrorKind::Throttled => "ThrottledError",
            ErrorKind::HttpStatus(_) => "HttpStatusError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Other => "TransportError",
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        _ => ErrorKind::HttpStatus(u16::try_from(code).unwrap_or(u16::MAX)),
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

pub fn classify(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Curl(ce) => classify_curl_error(ce),
        TransportError::Http(code) => classify_http_status(*code),
        TransportError::Storage(_) => ErrorKind::Storage,
    }
}
