// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subprojects and their environmental/social risk screenings.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use tessera_server_auth::RecordId;

use crate::entity::{
	Column, ColumnType, EntityRef, FieldValue, ForeignRef, KeyScope, NaturalKey, Referrer,
	ScopeLevel, ScopedEntity,
};
use crate::error::DbError;
use crate::row::get_uuid;
use crate::validation::require_text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subproject {
	pub name: String,
	pub location: Option<String>,
	pub description: Option<String>,
}

impl ScopedEntity for Subproject {
	const KIND: &'static str = "subproject";
	const TABLE: &'static str = "subprojects";
	const PATH: &'static str = "subprojects";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("name", ColumnType::Text),
		Column::new("location", ColumnType::Text),
		Column::new("description", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "name ASC, id ASC";
	const NATURAL_KEY: Option<NaturalKey> = Some(NaturalKey {
		column: "name",
		within: KeyScope::Project,
	});
	const REFERRERS: &'static [Referrer] = &[Referrer {
		kind: RiskScreening::KIND,
		table: RiskScreening::TABLE,
		column: "subproject_id",
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Text(Some(self.name.trim().to_string())),
			FieldValue::Text(self.location.clone()),
			FieldValue::Text(self.description.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			name: row.try_get("name")?,
			location: row.try_get("location")?,
			description: row.try_get("description")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("name", &self.name)
	}
}

/// Screening of one risk category for a subproject. Each category is
/// screened at most once per subproject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScreening {
	pub subproject_id: RecordId,
	pub risk_category: String,
	pub applicable: bool,
	pub notes: Option<String>,
}

impl ScopedEntity for RiskScreening {
	const KIND: &'static str = "risk_screening";
	const TABLE: &'static str = "risk_screenings";
	const PATH: &'static str = "risk-screenings";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("subproject_id", ColumnType::Id),
		Column::new("risk_category", ColumnType::Text),
		Column::new("applicable", ColumnType::Bool),
		Column::new("notes", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "risk_category ASC, id ASC";
	const NATURAL_KEY: Option<NaturalKey> = Some(NaturalKey {
		column: "risk_category",
		within: KeyScope::Column("subproject_id"),
	});
	const REFERENCES: &'static [ForeignRef] = &[ForeignRef {
		column: "subproject_id",
		target: EntityRef {
			kind: Subproject::KIND,
			table: Subproject::TABLE,
			scope: Subproject::SCOPE,
		},
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Id(Some(self.subproject_id)),
			FieldValue::Text(Some(self.risk_category.trim().to_string())),
			FieldValue::Bool(Some(self.applicable)),
			FieldValue::Text(self.notes.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			subproject_id: RecordId::new(get_uuid(row, "subproject_id")?),
			risk_category: row.try_get("risk_category")?,
			applicable: row.try_get("applicable")?,
			notes: row.try_get("notes")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("risk_category", &self.risk_category)
	}
}
