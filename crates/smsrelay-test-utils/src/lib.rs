// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for smsrelay integration tests.
//!
//! - [`MemoryMessageStore`] - in-memory store with failure injection
//! - [`fixtures`] - sample inputs and subscriber helpers

pub mod fixtures;
pub mod memory_store;

pub use memory_store::MemoryMessageStore;
