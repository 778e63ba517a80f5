//! Structured error types for go-stack-profile
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported binary format (expected ELF or Mach-O): {0}")]
    UnsupportedFormat(String),

    #[error("Could not find {section} section")]
    MissingSection { section: &'static str },

    #[error("Malformed gopclntab: {0}")]
    BadPclntab(String),
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decompress profile: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Failed to decode profile: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Invalid profile: {0}")]
    Invalid(String),

    #[error("Failed to write profile: {0}")]
    Write(#[source] std::io::Error),
}
