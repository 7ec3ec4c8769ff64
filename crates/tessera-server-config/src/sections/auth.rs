// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session configuration.

use serde::Deserialize;

pub const DEFAULT_SESSION_TTL_HOURS: u32 = 24 * 7;
pub const DEFAULT_SESSION_COOKIE: &str = "tessera_session";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
	pub session_ttl_hours: u32,
	pub session_cookie: String,
	/// How often expired sessions are purged.
	pub session_cleanup_interval_secs: u64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		AuthConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub session_ttl_hours: Option<u32>,
	#[serde(default)]
	pub session_cookie: Option<String>,
	#[serde(default)]
	pub session_cleanup_interval_secs: Option<u64>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.session_ttl_hours.is_some() {
			self.session_ttl_hours = other.session_ttl_hours;
		}
		if other.session_cookie.is_some() {
			self.session_cookie = other.session_cookie;
		}
		if other.session_cleanup_interval_secs.is_some() {
			self.session_cleanup_interval_secs = other.session_cleanup_interval_secs;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			session_ttl_hours: self.session_ttl_hours.unwrap_or(DEFAULT_SESSION_TTL_HOURS),
			session_cookie: self
				.session_cookie
				.unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
			session_cleanup_interval_secs: self
				.session_cleanup_interval_secs
				.unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS),
		}
	}
}
