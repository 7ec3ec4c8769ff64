// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use crate::entity::{Column, ColumnType, FieldValue, ScopeLevel, ScopedEntity};
use crate::error::DbError;
use crate::validation::{require_date, require_text};

pub const INCIDENT_SEVERITIES: &[&str] = &["minor", "moderate", "major", "critical"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
	pub title: String,
	/// `YYYY-MM-DD`
	pub occurred_on: String,
	pub severity: String,
	pub description: Option<String>,
	pub corrective_action: Option<String>,
}

impl ScopedEntity for IncidentReport {
	const KIND: &'static str = "incident_report";
	const TABLE: &'static str = "incident_reports";
	const PATH: &'static str = "incident-reports";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("title", ColumnType::Text),
		Column::new("occurred_on", ColumnType::Text),
		Column::new("severity", ColumnType::Text),
		Column::new("description", ColumnType::Text),
		Column::new("corrective_action", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "occurred_on DESC, id ASC";

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Text(Some(self.title.clone())),
			FieldValue::Text(Some(self.occurred_on.clone())),
			FieldValue::Text(Some(self.severity.to_lowercase())),
			FieldValue::Text(self.description.clone()),
			FieldValue::Text(self.corrective_action.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			title: row.try_get("title")?,
			occurred_on: row.try_get("occurred_on")?,
			severity: row.try_get("severity")?,
			description: row.try_get("description")?,
			corrective_action: row.try_get("corrective_action")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("title", &self.title)?;
		require_date("occurred_on", &self.occurred_on)?;
		if !INCIDENT_SEVERITIES.contains(&self.severity.to_lowercase().as_str()) {
			return Err(format!(
				"severity must be one of {}",
				INCIDENT_SEVERITIES.join(", ")
			));
		}
		Ok(())
	}
}
