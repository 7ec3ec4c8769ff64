// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session token helpers.
//!
//! Tokens are handed to the client once and only their SHA-256 hash is
//! stored, so a leaked database does not leak live sessions.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a session token (hex-encoded to 64 chars).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a fresh opaque session token.
pub fn generate_session_token() -> String {
	let mut bytes = [0u8; SESSION_TOKEN_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

/// Hash a token for storage and lookup.
pub fn hash_token(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

/// Compute the expiry of a session created at `now`.
pub fn session_expiry(now: DateTime<Utc>, ttl_hours: u32) -> DateTime<Utc> {
	now + Duration::hours(i64::from(ttl_hours))
}
