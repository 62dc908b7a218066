//! Error types for arkio
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ArkError
pub type Result<T> = std::result::Result<T, ArkError>;

/// Unified error type for arkio operations
#[derive(Debug, Error)]
pub enum ArkError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Specifier Errors
    // -------------------------------------------------------------------------
    #[error("invalid specifier: {0}")]
    InvalidSpecifier(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("duplicate key in index: {0}")]
    DuplicateKey(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    // -------------------------------------------------------------------------
    // Ordering Errors
    // -------------------------------------------------------------------------
    #[error("ordering violation: {0}")]
    OrderingViolation(String),
}
