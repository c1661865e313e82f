//! Error taxonomy for the resolve-and-download pipeline.
//!
//! Validation errors (`InvalidUrl`, `UrlNotFound`) abort a run before any
//! network call. Everything else is scoped to one URL or one download.

use std::path::PathBuf;

use crate::transport::{classify, TransportError};

/// Failure while reversing a resolver payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("numeral base {0} outside 2..=64")]
    UnsupportedBase(u32),
    #[error("index alphabet of {alphabet_len} symbols has no terminator at position {base}")]
    MissingTerminator { base: u32, alphabet_len: usize },
    #[error("symbol {0:?} is not in the cipher alphabet")]
    UnknownSymbol(char),
    #[error("decoded value {0} is not a valid code point")]
    InvalidCodePoint(i128),
}

#[derive(Debug, thiserror::Error)]
pub enum SnapError {
    #[error("no valid TikTok URLs found")]
    InvalidUrl,
    #[error("no URLs found in file \"{}\"", .path.display())]
    UrlNotFound { path: PathBuf },
    #[error("resolver landing page carries no session token")]
    TokenNotFound,
    #[error("resolver response carries no control tuple")]
    ControlTupleNotFound,
    #[error("payload decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapError {
    /// Short error kind shown in per-item failure lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SnapError::InvalidUrl => "InvalidUrl",
            SnapError::UrlNotFound { .. } => "UrlNotFound",
            SnapError::TokenNotFound => "TokenNotFound",
            SnapError::ControlTupleNotFound => "ControlTupleNotFound",
            SnapError::Decode(_) => "DecodeError",
            SnapError::Transport(e) => classify(e).name(),
            SnapError::Io(_) => "IoError",
        }
    }
}
