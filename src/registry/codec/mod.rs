// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Text-file import/export codecs.

pub mod escape;
pub mod v1;
pub mod v2;

#[cfg(test)]
mod v1_test;
#[cfg(test)]
mod v2_test;
