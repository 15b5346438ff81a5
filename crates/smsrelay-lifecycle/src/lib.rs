// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message lifecycle and listing.
//!
//! [`MessageLifecycle`] creates messages and overwrites their status, and
//! broadcasts each successful write. [`QueryEngine`] serves paginated,
//! filtered, newest-first listings.

pub mod lifecycle;
pub mod query;

pub use lifecycle::MessageLifecycle;
pub use query::QueryEngine;
