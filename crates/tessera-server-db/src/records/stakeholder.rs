// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use crate::entity::{Column, ColumnType, FieldValue, KeyScope, NaturalKey, ScopeLevel, ScopedEntity};
use crate::error::DbError;
use crate::validation::{is_valid_email, require_range, require_text};

/// An entry in a project's stakeholder matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
	pub name: String,
	pub organization: Option<String>,
	pub email: Option<String>,
	/// 1 to 5
	pub influence: i64,
	/// 1 to 5
	pub interest: i64,
}

impl ScopedEntity for Stakeholder {
	const KIND: &'static str = "stakeholder";
	const TABLE: &'static str = "stakeholders";
	const PATH: &'static str = "stakeholders";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("name", ColumnType::Text),
		Column::new("organization", ColumnType::Text),
		Column::new("email", ColumnType::Text),
		Column::new("influence", ColumnType::Integer),
		Column::new("interest", ColumnType::Integer),
	];
	const ORDER_BY: &'static str = "name ASC, id ASC";
	const NATURAL_KEY: Option<NaturalKey> = Some(NaturalKey {
		column: "name",
		within: KeyScope::Project,
	});

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Text(Some(self.name.trim().to_string())),
			FieldValue::Text(self.organization.clone()),
			FieldValue::Text(self.email.as_deref().map(|e| e.trim().to_lowercase())),
			FieldValue::Integer(Some(self.influence)),
			FieldValue::Integer(Some(self.interest)),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			name: row.try_get("name")?,
			organization: row.try_get("organization")?,
			email: row.try_get("email")?,
			influence: row.try_get("influence")?,
			interest: row.try_get("interest")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("name", &self.name)?;
		if let Some(email) = &self.email {
			if !is_valid_email(email.trim()) {
				return Err("email is not a valid address".to_string());
			}
		}
		require_range("influence", self.influence, 1, 5)?;
		require_range("interest", self.interest, 1, 5)
	}
}
