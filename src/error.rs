// File: error.rs
// Location: /src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::ContentKind;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("{kind} field '{field}' must be a number, got '{value}'")]
    InvalidNumber {
        kind: ContentKind,
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("{kind} field '{field}' must be a finite number, got '{value}'")]
    NonFiniteNumber {
        kind: ContentKind,
        field: &'static str,
        value: String,
    },
}

/// Rejected content fields, raised while assembling a payload.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("missing required argument '{0}'")]
    Missing(&'static str),
    #[error("argument '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("cannot encode data: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("Micro QR codes do not support error level {0}")]
    UnsupportedMicroLevel(&'static str),
    #[error("data too large for a Micro QR code")]
    MicroOverflow,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
    #[error("cannot write file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid configuration file: expected software '{expected}', found '{found}'")]
    InvalidIdentity { expected: &'static str, found: String },
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("Invalid configuration file: {field} {value} is out of range")]
    OutOfRange { field: &'static str, value: u32 },
    #[error("Cannot read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
