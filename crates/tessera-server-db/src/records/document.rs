// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The document registry and the training sessions held on its documents.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use tessera_server_auth::RecordId;

use crate::entity::{
	Column, ColumnType, EntityRef, FieldValue, ForeignRef, KeyScope, NaturalKey, Referrer,
	ScopeLevel, ScopedEntity,
};
use crate::error::DbError;
use crate::row::get_opt_uuid;
use crate::validation::{require_date, require_range, require_text};

/// A controlled document (procedure, plan, register) shared across the tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	/// Tenant-wide unique code, e.g. `ESMS-PR-04`.
	pub code: String,
	pub title: String,
	pub revision: i64,
	pub owner: Option<String>,
}

impl ScopedEntity for Document {
	const KIND: &'static str = "document";
	const TABLE: &'static str = "documents";
	const PATH: &'static str = "documents";
	const SCOPE: ScopeLevel = ScopeLevel::Tenant;
	const COLUMNS: &'static [Column] = &[
		Column::new("code", ColumnType::Text),
		Column::new("title", ColumnType::Text),
		Column::new("revision", ColumnType::Integer),
		Column::new("owner", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "code ASC, id ASC";
	const NATURAL_KEY: Option<NaturalKey> = Some(NaturalKey {
		column: "code",
		within: KeyScope::Tenant,
	});
	const REFERRERS: &'static [Referrer] = &[Referrer {
		kind: TrainingLog::KIND,
		table: TrainingLog::TABLE,
		column: "document_id",
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Text(Some(self.code.trim().to_string())),
			FieldValue::Text(Some(self.title.clone())),
			FieldValue::Integer(Some(self.revision)),
			FieldValue::Text(self.owner.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			code: row.try_get("code")?,
			title: row.try_get("title")?,
			revision: row.try_get("revision")?,
			owner: row.try_get("owner")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("code", &self.code)?;
		require_text("title", &self.title)?;
		require_range("revision", self.revision, 0, i64::from(u32::MAX))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
	/// The document the training covered, if any.
	pub document_id: Option<RecordId>,
	pub topic: String,
	/// `YYYY-MM-DD`
	pub held_on: String,
	pub attendees: i64,
	pub hours: Option<f64>,
}

impl ScopedEntity for TrainingLog {
	const KIND: &'static str = "training_log";
	const TABLE: &'static str = "training_logs";
	const PATH: &'static str = "training-logs";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("document_id", ColumnType::Id),
		Column::new("topic", ColumnType::Text),
		Column::new("held_on", ColumnType::Text),
		Column::new("attendees", ColumnType::Integer),
		Column::new("hours", ColumnType::Real),
	];
	const ORDER_BY: &'static str = "held_on DESC, id ASC";
	const REFERENCES: &'static [ForeignRef] = &[ForeignRef {
		column: "document_id",
		target: EntityRef {
			kind: Document::KIND,
			table: Document::TABLE,
			scope: Document::SCOPE,
		},
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Id(self.document_id),
			FieldValue::Text(Some(self.topic.clone())),
			FieldValue::Text(Some(self.held_on.clone())),
			FieldValue::Integer(Some(self.attendees)),
			FieldValue::Real(self.hours),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			document_id: get_opt_uuid(row, "document_id")?.map(RecordId::new),
			topic: row.try_get("topic")?,
			held_on: row.try_get("held_on")?,
			attendees: row.try_get("attendees")?,
			hours: row.try_get("hours")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("topic", &self.topic)?;
		require_date("held_on", &self.held_on)?;
		require_range("attendees", self.attendees, 0, 100_000)?;
		match self.hours {
			Some(h) if !h.is_finite() || h < 0.0 => Err("hours must be a non-negative number".to_string()),
			_ => Ok(()),
		}
	}
}
