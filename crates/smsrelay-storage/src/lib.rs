// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for smsrelay.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer connection via
//! `tokio-rusqlite`, and the [`SqliteMessageStore`] implementation of
//! [`smsrelay_core::MessageStore`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteMessageStore;
pub use database::Database;
