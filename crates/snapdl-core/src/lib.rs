//! Resolve short-form video pages into direct media links and download them.
//!
//! The pipeline is [`batch::run_batch`]: URL validation, a concurrent
//! extraction phase ([`extractor`]), then a concurrent download phase
//! ([`downloader`]).

pub mod batch;
pub mod config;
pub mod decoder;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod numeral;
pub mod patterns;
pub mod scheduler;
pub mod transport;
pub mod url_model;

pub use error::{DecodeError, SnapError};
