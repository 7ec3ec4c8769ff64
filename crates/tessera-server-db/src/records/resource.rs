// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Biodiversity resources and the risks identified against them.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use tessera_server_auth::RecordId;

use crate::entity::{
	Column, ColumnType, EntityRef, FieldValue, ForeignRef, KeyScope, NaturalKey, Referrer,
	ScopeLevel, ScopedEntity,
};
use crate::error::DbError;
use crate::row::get_uuid;
use crate::validation::{require_range, require_text};

/// A protected habitat, species or ecosystem service the tenant tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiodiversityResource {
	/// Tenant-wide unique reference, e.g. `R-001`.
	pub reference: String,
	pub name: String,
	pub category: Option<String>,
	pub description: Option<String>,
}

impl ScopedEntity for BiodiversityResource {
	const KIND: &'static str = "biodiversity_resource";
	const TABLE: &'static str = "biodiversity_resources";
	const PATH: &'static str = "biodiversity-resources";
	const SCOPE: ScopeLevel = ScopeLevel::Tenant;
	const COLUMNS: &'static [Column] = &[
		Column::new("reference", ColumnType::Text),
		Column::new("name", ColumnType::Text),
		Column::new("category", ColumnType::Text),
		Column::new("description", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "reference ASC, id ASC";
	const NATURAL_KEY: Option<NaturalKey> = Some(NaturalKey {
		column: "reference",
		within: KeyScope::Tenant,
	});
	const REFERRERS: &'static [Referrer] = &[Referrer {
		kind: RiskIdentification::KIND,
		table: RiskIdentification::TABLE,
		column: "resource_id",
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Text(Some(self.reference.trim().to_string())),
			FieldValue::Text(Some(self.name.clone())),
			FieldValue::Text(self.category.clone()),
			FieldValue::Text(self.description.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			reference: row.try_get("reference")?,
			name: row.try_get("name")?,
			category: row.try_get("category")?,
			description: row.try_get("description")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("reference", &self.reference)?;
		require_text("name", &self.name)
	}
}

/// A risk to a biodiversity resource identified within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskIdentification {
	pub resource_id: RecordId,
	pub description: String,
	/// 1 (rare) to 5 (almost certain).
	pub likelihood: i64,
	/// 1 (negligible) to 5 (severe).
	pub severity: i64,
	pub mitigation: Option<String>,
}

impl ScopedEntity for RiskIdentification {
	const KIND: &'static str = "risk_identification";
	const TABLE: &'static str = "risk_identifications";
	const PATH: &'static str = "risk-identifications";
	const SCOPE: ScopeLevel = ScopeLevel::Project;
	const COLUMNS: &'static [Column] = &[
		Column::new("resource_id", ColumnType::Id),
		Column::new("description", ColumnType::Text),
		Column::new("likelihood", ColumnType::Integer),
		Column::new("severity", ColumnType::Integer),
		Column::new("mitigation", ColumnType::Text),
	];
	const ORDER_BY: &'static str = "updated_at DESC, id ASC";
	const REFERENCES: &'static [ForeignRef] = &[ForeignRef {
		column: "resource_id",
		target: EntityRef {
			kind: BiodiversityResource::KIND,
			table: BiodiversityResource::TABLE,
			scope: BiodiversityResource::SCOPE,
		},
	}];

	fn values(&self) -> Vec<FieldValue> {
		vec![
			FieldValue::Id(Some(self.resource_id)),
			FieldValue::Text(Some(self.description.clone())),
			FieldValue::Integer(Some(self.likelihood)),
			FieldValue::Integer(Some(self.severity)),
			FieldValue::Text(self.mitigation.clone()),
		]
	}

	fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			resource_id: RecordId::new(get_uuid(row, "resource_id")?),
			description: row.try_get("description")?,
			likelihood: row.try_get("likelihood")?,
			severity: row.try_get("severity")?,
			mitigation: row.try_get("mitigation")?,
		})
	}

	fn validate(&self) -> Result<(), String> {
		require_text("description", &self.description)?;
		require_range("likelihood", self.likelihood, 1, 5)?;
		require_range("severity", self.severity, 1, 5)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_is_trimmed_before_storage() {
		let r = BiodiversityResource {
			reference: " R-001 ".into(),
			name: "Mangrove".into(),
			category: None,
			description: None,
		};
		assert_eq!(r.field("reference"), Some(FieldValue::Text(Some("R-001".into()))));
	}

	#[test]
	fn risk_scores_are_bounded() {
		let mut risk = RiskIdentification {
			resource_id: RecordId::generate(),
			description: "Runoff".into(),
			likelihood: 3,
			severity: 5,
			mitigation: None,
		};
		assert!(risk.validate().is_ok());
		risk.severity = 6;
		assert!(risk.validate().is_err());
		risk.severity = 0;
		assert!(risk.validate().is_err());
	}
}
