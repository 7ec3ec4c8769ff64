// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative description of a compliance record type.
//!
//! Each record type implements [`ScopedEntity`] once. The declaration carries
//! everything the scoped repository needs to build queries for it: table,
//! scope level, payload columns, default order, natural key, outgoing
//! references and incoming referrers. Queries are assembled only from these
//! static declarations; caller-supplied values are always bound.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{query::Query, Sqlite};
use tessera_server_auth::{ProjectId, RecordId, TenantId};

use crate::error::DbError;
use crate::row::{get_opt_uuid, get_ts, get_uuid};

/// Whether records live directly under a tenant or inside one of its projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
	Tenant,
	Project,
}

/// Storage type of a payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
	Text,
	Integer,
	Real,
	Bool,
	Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
	pub name: &'static str,
	pub ty: ColumnType,
}

impl Column {
	pub const fn new(name: &'static str, ty: ColumnType) -> Self {
		Self { name, ty }
	}
}

/// The scope a natural key must be unique within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
	/// Unique across the tenant.
	Tenant,
	/// Unique within the tenant and project.
	Project,
	/// Unique within the tenant and the value of another payload column.
	Column(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalKey {
	pub column: &'static str,
	pub within: KeyScope,
}

/// Identifies another record table, for reference checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
	pub kind: &'static str,
	pub table: &'static str,
	pub scope: ScopeLevel,
}

/// A payload column holding the id of another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignRef {
	pub column: &'static str,
	pub target: EntityRef,
}

/// A table/column that may hold the id of this record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Referrer {
	pub kind: &'static str,
	pub table: &'static str,
	pub column: &'static str,
}

/// A typed payload value, bound positionally into queries.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
	Text(Option<String>),
	Integer(Option<i64>),
	Real(Option<f64>),
	Bool(Option<bool>),
	Id(Option<RecordId>),
}

impl FieldValue {
	pub fn is_null(&self) -> bool {
		match self {
			FieldValue::Text(v) => v.is_none(),
			FieldValue::Integer(v) => v.is_none(),
			FieldValue::Real(v) => v.is_none(),
			FieldValue::Bool(v) => v.is_none(),
			FieldValue::Id(v) => v.is_none(),
		}
	}

	/// Parse a filter value supplied as text into the column's type.
	pub fn parse(ty: ColumnType, raw: &str) -> Result<Self, String> {
		let raw = raw.trim();
		match ty {
			ColumnType::Text => Ok(FieldValue::Text(Some(raw.to_string()))),
			ColumnType::Integer => raw
				.parse()
				.map(|v| FieldValue::Integer(Some(v)))
				.map_err(|_| format!("'{raw}' is not an integer")),
			ColumnType::Real => raw
				.parse()
				.map(|v| FieldValue::Real(Some(v)))
				.map_err(|_| format!("'{raw}' is not a number")),
			ColumnType::Bool => raw
				.parse()
				.map(|v| FieldValue::Bool(Some(v)))
				.map_err(|_| format!("'{raw}' is not a boolean")),
			ColumnType::Id => RecordId::parse(raw)
				.map(|v| FieldValue::Id(Some(v)))
				.map_err(|_| format!("'{raw}' is not a valid id")),
		}
	}

	pub(crate) fn bind<'q>(
		&self,
		query: Query<'q, Sqlite, SqliteArguments<'q>>,
	) -> Query<'q, Sqlite, SqliteArguments<'q>> {
		match self {
			FieldValue::Text(v) => query.bind(v.clone()),
			FieldValue::Integer(v) => query.bind(*v),
			FieldValue::Real(v) => query.bind(*v),
			FieldValue::Bool(v) => query.bind(*v),
			FieldValue::Id(v) => query.bind(v.map(|id| id.to_string())),
		}
	}
}

/// A compliance record type stored under tenant (and project) scope.
pub trait ScopedEntity:
	Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + Unpin + 'static
{
	/// Singular name used in errors and logs.
	const KIND: &'static str;
	const TABLE: &'static str;
	/// URL path segment under `/api`.
	const PATH: &'static str;
	const SCOPE: ScopeLevel;
	/// Payload columns, excluding id, scope and timestamp columns.
	const COLUMNS: &'static [Column];
	/// Default `ORDER BY` clause; must end with a unique tiebreak.
	const ORDER_BY: &'static str;
	const NATURAL_KEY: Option<NaturalKey> = None;
	const REFERENCES: &'static [ForeignRef] = &[];
	const REFERRERS: &'static [Referrer] = &[];

	/// Payload values, aligned with [`ScopedEntity::COLUMNS`].
	fn values(&self) -> Vec<FieldValue>;

	fn from_row(row: &SqliteRow) -> Result<Self, DbError>;

	/// Field-level checks on the payload alone.
	fn validate(&self) -> Result<(), String> {
		Ok(())
	}

	fn entity_ref() -> EntityRef {
		EntityRef {
			kind: Self::KIND,
			table: Self::TABLE,
			scope: Self::SCOPE,
		}
	}

	fn column(name: &str) -> Option<Column> {
		Self::COLUMNS.iter().copied().find(|c| c.name == name)
	}

	/// The value of a single payload column.
	fn field(&self, name: &str) -> Option<FieldValue> {
		let index = Self::COLUMNS.iter().position(|c| c.name == name)?;
		self.values().into_iter().nth(index)
	}
}

/// Columns every scoped record carries besides its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
	pub id: RecordId,
	pub tenant_id: TenantId,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub project_id: Option<ProjectId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
	pub(crate) fn from_row(row: &SqliteRow, scope: ScopeLevel) -> Result<Self, DbError> {
		let project_id = match scope {
			ScopeLevel::Tenant => None,
			ScopeLevel::Project => get_opt_uuid(row, "project_id")?.map(ProjectId::new),
		};
		Ok(Self {
			id: RecordId::new(get_uuid(row, "id")?),
			tenant_id: TenantId::new(get_uuid(row, "tenant_id")?),
			project_id,
			created_at: get_ts(row, "created_at")?,
			updated_at: get_ts(row, "updated_at")?,
		})
	}
}

/// A stored record: scope metadata plus the entity payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<E> {
	#[serde(flatten)]
	pub meta: RecordMeta,
	#[serde(flatten)]
	pub data: E,
}

impl<E: ScopedEntity> Record<E> {
	pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, DbError> {
		Ok(Self {
			meta: RecordMeta::from_row(row, E::SCOPE)?,
			data: E::from_row(row)?,
		})
	}

	pub fn id(&self) -> RecordId {
		self.meta.id
	}
}

/// `SELECT` column list for an entity: id, scope columns, payload, timestamps.
pub(crate) fn select_columns<E: ScopedEntity>() -> String {
	let mut columns = vec!["id", "tenant_id"];
	if E::SCOPE == ScopeLevel::Project {
		columns.push("project_id");
	}
	columns.extend(E::COLUMNS.iter().map(|c| c.name));
	columns.extend(["created_at", "updated_at"]);
	columns.join(", ")
}
