// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation identification.
//!
//! A chat is not stored anywhere: it is the set of messages sharing a
//! `chatId`, which is a truncated SHA-256 of the normalized `(phone, app)`
//! pair. Truncation to 64 bits makes collisions possible but improbable.

use sha2::{Digest, Sha256};

use crate::types::ChatId;

/// Number of hex characters kept from the digest.
pub const CHAT_ID_LEN: usize = 16;

const SEPARATOR: char = ':';

/// Keep only the ASCII digits of a phone number.
///
/// `"+591 781-11111"` and `"59178111111"` normalize to the same value.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Trim surrounding whitespace and lowercase.
pub fn normalize_app(app: &str) -> String {
    app.trim().to_lowercase()
}

/// Derive the conversation key for `(phone, app)`.
pub fn derive_chat_id(phone: &str, app: &str) -> ChatId {
    let mut hasher = Sha256::new();
    hasher.update(normalize_phone(phone).as_bytes());
    hasher.update(SEPARATOR.to_string().as_bytes());
    hasher.update(normalize_app(app).as_bytes());
    let digest = hex::encode(hasher.finalize());
    ChatId(digest[..CHAT_ID_LEN].to_string())
}
