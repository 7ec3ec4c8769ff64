// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column decoding helpers shared by the repositories.
//!
//! Ids are stored as UUID TEXT and timestamps as RFC 3339 TEXT.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;

/// Format a timestamp for storage. Fixed precision keeps TEXT comparison in
/// SQL consistent with chronological order.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, DbError> {
	let value: String = row.try_get(column)?;
	Uuid::parse_str(&value).map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn get_opt_uuid(row: &SqliteRow, column: &str) -> Result<Option<Uuid>, DbError> {
	let value: Option<String> = row.try_get(column)?;
	value
		.map(|v| Uuid::parse_str(&v))
		.transpose()
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn get_ts(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, DbError> {
	let value: String = row.try_get(column)?;
	parse_ts(&value, column)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formatted_timestamps_sort_chronologically() {
		let earlier = Utc::now();
		let later = earlier + chrono::Duration::milliseconds(1500);
		assert!(format_ts(earlier) < format_ts(later));
	}

	#[test]
	fn formatted_timestamp_parses_back() {
		let now = Utc::now();
		let parsed = parse_ts(&format_ts(now), "created_at").unwrap();
		assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
	}

	#[test]
	fn garbage_timestamp_is_internal_error() {
		assert!(matches!(
			parse_ts("yesterday", "created_at"),
			Err(DbError::Internal(_))
		));
	}
}
