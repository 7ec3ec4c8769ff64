// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Field validation helpers used by entity payloads and the identity
//! repositories.

use regex::Regex;
use std::sync::LazyLock;

static SLUG_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").unwrap());

static EMAIL_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 50;

/// Validate a tenant slug.
///
/// Slugs must:
/// - Be between 3 and 50 characters
/// - Start and end with alphanumeric characters
/// - Contain only lowercase letters, numbers, and hyphens
pub fn validate_slug(slug: &str) -> bool {
	slug.len() >= SLUG_MIN_LEN && slug.len() <= SLUG_MAX_LEN && SLUG_REGEX.is_match(slug)
}

/// Sanitize an email address by trimming whitespace and lowercasing.
pub fn sanitize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
	EMAIL_REGEX.is_match(email)
}

/// Require a non-blank text field.
pub fn require_text(field: &str, value: &str) -> Result<(), String> {
	if value.trim().is_empty() {
		return Err(format!("{field} is required"));
	}
	Ok(())
}

/// Require an integer within an inclusive range.
pub fn require_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), String> {
	if value < min || value > max {
		return Err(format!("{field} must be between {min} and {max}"));
	}
	Ok(())
}

/// Require an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn require_date(field: &str, value: &str) -> Result<(), String> {
	chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
		.map(|_| ())
		.map_err(|_| format!("{field} must be a date in YYYY-MM-DD form"))
}
