// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! In-memory hierarchical configuration registry.
//!
//! - array: growable-array storage with the explicit capacity policy subkeys/values share
//! - key: the key tree, its arena, flags, and values
//! - tree: path-based open/create/delete/enumerate/query operations
//! - value: value-array operations within a single key
//! - roots: the fixed table of top-level pseudo-keys
//! - strutil: wide-character string and path utilities
//! - clock: swappable time source for modification timestamps
//! - handle: handle resolution and the external-collaborator seams
//! - codec: the v2 and v1 text-file formats
//! - dispatch: RPC opcode handlers
//! - config: server-wide configuration
//! - diag: leveled diagnostics and load-time error collection
//! - error: the shared error taxonomy

pub mod array;
pub mod clock;
pub mod codec;
pub mod config;
pub mod diag;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod key;
pub mod roots;
pub mod strutil;
pub mod testutil;
pub mod tree;
pub mod value;

#[cfg(test)]
mod array_test;
#[cfg(test)]
mod config_test;
#[cfg(test)]
mod diag_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod roots_test;
#[cfg(test)]
mod strutil_test;
