// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Error taxonomy for the registry core.
//!
//! Every handler in the dispatcher returns a `RegResult<T>`; nothing
//! in this crate panics or unwinds across the dispatch boundary.

use thiserror::Error;

/// Standard Result type for all registry operations.
pub type RegResult<T> = Result<T, RegError>;

/// Error kinds raised by the tree, codec, and dispatch layers.
#[derive(Debug, Clone, Error)]
pub enum RegError {
    /// A path token was absent during open/delete, or a value name was
    /// absent during get/delete.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Enumeration index out of range.
    #[error("no more items")]
    NoMoreItems,

    /// Operation attempted against a key whose DELETED flag is set.
    #[error("key deleted: {0}")]
    KeyDeleted(String),

    /// Delete targeting a root key, or a key that still has subkeys.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A non-volatile child was requested under a volatile parent.
    #[error("child must be volatile")]
    ChildMustBeVolatile,

    /// Allocation failure, request-buffer overflow, or line-buffer
    /// exhaustion during load.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Load file is missing the expected v2 header.
    #[error("not a registry file")]
    NotRegistryFile,

    /// I/O failure while reading or writing a text-codec stream.
    #[error("I/O error during '{operation}' on '{path}': {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },
}

impl From<std::io::Error> for RegError {
    fn from(err: std::io::Error) -> Self {
        RegError::Io {
            operation: "io".to_string(),
            path: "<stream>".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Creates a `FileNotFound` error with context.
pub fn not_found(resource: impl Into<String>) -> RegError {
    RegError::FileNotFound(resource.into())
}

/// Creates an `Io` error with full context.
pub fn io_error(
    operation: impl Into<String>,
    path: impl Into<String>,
    reason: impl Into<String>,
) -> RegError {
    RegError::Io {
        operation: operation.into(),
        path: path.into(),
        reason: reason.into(),
    }
}
