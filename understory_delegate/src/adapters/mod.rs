// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host implementations of the [`types`](crate::types) capabilities.
//!
//! Enabled via feature flags to keep the core small and `no_std` by default.

#[cfg(feature = "memory_adapter")]
pub mod memory;
