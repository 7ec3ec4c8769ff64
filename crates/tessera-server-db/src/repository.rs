// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The scoped repository: list/get/create/update/delete for any
//! [`ScopedEntity`], with scope injected into every statement.
//!
//! Operation pipelines:
//!
//! ```text
//! list/get  authorize(read) ─► scoped SELECT
//! create    authorize(create) ─► validate ─► [tx: unique ─► refs ─► INSERT]
//! update    [tx: scoped fetch ─► authorize(update) ─► validate ─► unique* ─► refs ─► UPDATE]
//! delete    [tx: scoped fetch ─► authorize(delete) ─► referrers ─► DELETE]
//!                                        * only when the natural key changed
//! ```
//!
//! Bracketed steps run in one `BEGIN IMMEDIATE` transaction, so guard checks
//! and the write see the same database and a failed guard leaves nothing
//! behind. The tenant and project written are always taken from the
//! [`RequestScope`], never from the payload.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use std::marker::PhantomData;
use tessera_server_auth::{Action, ProjectId, RecordId, Target, TenantId};

use crate::entity::{select_columns, FieldValue, Record, ScopeLevel, ScopedEntity};
use crate::error::{is_foreign_key_violation, is_unique_violation, DbError, ScopeError};
use crate::referential::{ensure_targets_exist, ensure_unreferenced};
use crate::row::format_ts;
use crate::scope::RequestScope;
use crate::uniqueness::{ensure_unique, key_changed};

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 500;

/// Equality filters and paging for [`ScopedRepository::list`].
///
/// Filters may only name declared payload columns; scope columns are not
/// filterable.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
	pub equals: Vec<(String, String)>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

impl ListFilter {
	pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
		self.equals.push((column.into(), value.into()));
		self
	}

	pub fn effective_limit(&self) -> u32 {
		self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
	}
}

/// Resolved scope for one entity type.
struct EntityScope {
	tenant_id: TenantId,
	project_id: Option<ProjectId>,
	target: Target,
}

impl EntityScope {
	fn for_entity<E: ScopedEntity>(scope: &RequestScope) -> Result<Self, ScopeError> {
		let tenant_id = scope.tenant_id();
		match E::SCOPE {
			ScopeLevel::Tenant => Ok(Self {
				tenant_id,
				project_id: None,
				target: Target::tenant_record(tenant_id),
			}),
			ScopeLevel::Project => {
				let project_id = scope.context().require_project(E::KIND)?;
				Ok(Self {
					tenant_id,
					project_id: Some(project_id),
					target: Target::project_record(tenant_id, project_id),
				})
			}
		}
	}

	/// `tenant_id = ? [AND project_id = ?]` with its bind values.
	fn predicate(&self) -> (String, Vec<FieldValue>) {
		let mut sql = String::from("tenant_id = ?");
		let mut binds = vec![FieldValue::Text(Some(self.tenant_id.to_string()))];
		if let Some(project_id) = self.project_id {
			sql.push_str(" AND project_id = ?");
			binds.push(FieldValue::Text(Some(project_id.to_string())));
		}
		(sql, binds)
	}
}

/// Scoped CRUD for one compliance record type.
pub struct ScopedRepository<E> {
	pool: SqlitePool,
	_entity: PhantomData<fn() -> E>,
}

impl<E> Clone for ScopedRepository<E> {
	fn clone(&self) -> Self {
		Self {
			pool: self.pool.clone(),
			_entity: PhantomData,
		}
	}
}

impl<E: ScopedEntity> ScopedRepository<E> {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			_entity: PhantomData,
		}
	}

	/// List records in scope, in the entity's default order.
	///
	/// # Errors
	/// - `MissingProjectContext` for project-scoped types without a project.
	/// - `Forbidden` if the caller may not read in this scope.
	/// - `Validation` for an unknown filter column or malformed filter value.
	#[tracing::instrument(
		skip(self, scope, filter),
		fields(entity = E::KIND, tenant_id = %scope.tenant_id(), project_id = ?scope.project_id())
	)]
	pub async fn list(
		&self,
		scope: &RequestScope,
		filter: &ListFilter,
	) -> Result<Vec<Record<E>>, ScopeError> {
		let es = EntityScope::for_entity::<E>(scope)?;
		scope.authorize(Action::Read, &es.target)?;

		let (predicate, mut binds) = es.predicate();
		let mut sql = format!(
			"SELECT {} FROM {} WHERE {}",
			select_columns::<E>(),
			E::TABLE,
			predicate
		);

		for (name, raw) in &filter.equals {
			let column = E::column(name).ok_or_else(|| {
				ScopeError::validation(format!("unknown filter field '{name}' for {}", E::KIND))
			})?;
			let value = FieldValue::parse(column.ty, raw)
				.map_err(|e| ScopeError::validation(format!("{name}: {e}")))?;
			sql.push_str(&format!(" AND {} = ?", column.name));
			binds.push(value);
		}

		sql.push_str(&format!(" ORDER BY {} LIMIT ? OFFSET ?", E::ORDER_BY));
		binds.push(FieldValue::Integer(Some(i64::from(filter.effective_limit()))));
		binds.push(FieldValue::Integer(Some(i64::from(filter.offset.unwrap_or(0)))));

		let mut query = sqlx::query(&sql);
		for value in &binds {
			query = value.bind(query);
		}
		let rows = query.fetch_all(&self.pool).await?;

		let records = rows
			.iter()
			.map(Record::<E>::from_row)
			.collect::<Result<Vec<_>, DbError>>()?;
		tracing::debug!(count = records.len(), "listed records");
		Ok(records)
	}

	/// Fetch one record in scope.
	///
	/// `NotFound` is returned both for ids that do not exist and for ids that
	/// exist outside the caller's scope.
	#[tracing::instrument(
		skip(self, scope),
		fields(entity = E::KIND, tenant_id = %scope.tenant_id(), project_id = ?scope.project_id(), id = %id)
	)]
	pub async fn get(&self, scope: &RequestScope, id: RecordId) -> Result<Record<E>, ScopeError> {
		let es = EntityScope::for_entity::<E>(scope)?;
		scope.authorize(Action::Read, &es.target)?;

		let mut conn = self.pool.acquire().await?;
		fetch_in_scope::<E>(&mut conn, &es, id)
			.await?
			.ok_or(ScopeError::NotFound { entity: E::KIND })
	}

	/// Create a record in the caller's scope.
	///
	/// # Errors
	/// - `Forbidden` if the caller may not create in this scope.
	/// - `Validation` for an invalid payload or a reference outside scope.
	/// - `DuplicateKey` if the natural key is taken within its scope.
	#[tracing::instrument(
		skip(self, scope, payload),
		fields(entity = E::KIND, tenant_id = %scope.tenant_id(), project_id = ?scope.project_id())
	)]
	pub async fn create(&self, scope: &RequestScope, payload: E) -> Result<Record<E>, ScopeError> {
		let es = EntityScope::for_entity::<E>(scope)?;
		scope.authorize(Action::Create, &es.target)?;
		payload.validate().map_err(ScopeError::Validation)?;

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		ensure_unique(&mut tx, es.tenant_id, es.project_id, &payload, None).await?;
		ensure_targets_exist(&mut tx, es.tenant_id, es.project_id, &payload).await?;

		let id = RecordId::generate();
		let now = format_ts(Utc::now());

		let mut columns = vec!["id", "tenant_id"];
		let mut binds = vec![
			FieldValue::Id(Some(id)),
			FieldValue::Text(Some(es.tenant_id.to_string())),
		];
		if let Some(project_id) = es.project_id {
			columns.push("project_id");
			binds.push(FieldValue::Text(Some(project_id.to_string())));
		}
		columns.extend(E::COLUMNS.iter().map(|c| c.name));
		binds.extend(payload.values());
		columns.extend(["created_at", "updated_at"]);
		binds.push(FieldValue::Text(Some(now.clone())));
		binds.push(FieldValue::Text(Some(now)));

		let sql = format!(
			"INSERT INTO {} ({}) VALUES ({})",
			E::TABLE,
			columns.join(", "),
			vec!["?"; columns.len()].join(", ")
		);
		let mut query = sqlx::query(&sql);
		for value in &binds {
			query = value.bind(query);
		}
		query
			.execute(&mut *tx)
			.await
			.map_err(write_error::<E>)?;

		let record = fetch_in_scope::<E>(&mut tx, &es, id)
			.await?
			.ok_or_else(|| DbError::Internal(format!("{} vanished after insert", E::KIND)))?;
		tx.commit().await?;

		tracing::debug!(id = %id, "record created");
		Ok(record)
	}

	/// Replace the payload of a record in scope.
	#[tracing::instrument(
		skip(self, scope, payload),
		fields(entity = E::KIND, tenant_id = %scope.tenant_id(), project_id = ?scope.project_id(), id = %id)
	)]
	pub async fn update(
		&self,
		scope: &RequestScope,
		id: RecordId,
		payload: E,
	) -> Result<Record<E>, ScopeError> {
		let es = EntityScope::for_entity::<E>(scope)?;

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		let existing = fetch_in_scope::<E>(&mut tx, &es, id)
			.await?
			.ok_or(ScopeError::NotFound { entity: E::KIND })?;
		scope.authorize(Action::Update, &es.target)?;
		payload.validate().map_err(ScopeError::Validation)?;

		if key_changed(&existing.data, &payload) {
			ensure_unique(&mut tx, es.tenant_id, es.project_id, &payload, Some(id)).await?;
		}
		ensure_targets_exist(&mut tx, es.tenant_id, es.project_id, &payload).await?;

		let assignments = E::COLUMNS
			.iter()
			.map(|c| format!("{} = ?", c.name))
			.collect::<Vec<_>>()
			.join(", ");
		let (predicate, scope_binds) = es.predicate();
		let sql = format!(
			"UPDATE {} SET {}, updated_at = ? WHERE id = ? AND {}",
			E::TABLE,
			assignments,
			predicate
		);

		let mut binds = payload.values();
		binds.push(FieldValue::Text(Some(format_ts(Utc::now()))));
		binds.push(FieldValue::Id(Some(id)));
		binds.extend(scope_binds);

		let mut query = sqlx::query(&sql);
		for value in &binds {
			query = value.bind(query);
		}
		query
			.execute(&mut *tx)
			.await
			.map_err(write_error::<E>)?;

		let record = fetch_in_scope::<E>(&mut tx, &es, id)
			.await?
			.ok_or(ScopeError::NotFound { entity: E::KIND })?;
		tx.commit().await?;

		tracing::debug!("record updated");
		Ok(record)
	}

	/// Delete a record in scope, unless other records still reference it.
	#[tracing::instrument(
		skip(self, scope),
		fields(entity = E::KIND, tenant_id = %scope.tenant_id(), project_id = ?scope.project_id(), id = %id)
	)]
	pub async fn delete(&self, scope: &RequestScope, id: RecordId) -> Result<(), ScopeError> {
		let es = EntityScope::for_entity::<E>(scope)?;

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		fetch_in_scope::<E>(&mut tx, &es, id)
			.await?
			.ok_or(ScopeError::NotFound { entity: E::KIND })?;
		scope.authorize(Action::Delete, &es.target)?;

		let id_str = id.to_string();
		ensure_unreferenced(&mut tx, es.tenant_id, E::KIND, &id_str, E::REFERRERS).await?;

		let (predicate, scope_binds) = es.predicate();
		let sql = format!("DELETE FROM {} WHERE id = ? AND {}", E::TABLE, predicate);
		let mut query = sqlx::query(&sql).bind(id_str);
		for value in &scope_binds {
			query = value.bind(query);
		}
		query.execute(&mut *tx).await.map_err(|e| {
			if is_foreign_key_violation(&e) {
				ScopeError::ReferencedByOtherRecords {
					entity: E::KIND,
					referrer: "other",
				}
			} else {
				e.into()
			}
		})?;
		tx.commit().await?;

		tracing::debug!("record deleted");
		Ok(())
	}
}

async fn fetch_in_scope<E: ScopedEntity>(
	conn: &mut SqliteConnection,
	es: &EntityScope,
	id: RecordId,
) -> Result<Option<Record<E>>, ScopeError> {
	let (predicate, binds) = es.predicate();
	let sql = format!(
		"SELECT {} FROM {} WHERE id = ? AND {}",
		select_columns::<E>(),
		E::TABLE,
		predicate
	);
	let mut query = sqlx::query(&sql).bind(id.to_string());
	for value in &binds {
		query = value.bind(query);
	}
	let row = query.fetch_optional(&mut *conn).await?;
	Ok(row.as_ref().map(Record::<E>::from_row).transpose()?)
}

/// Constraint violations on insert/update come from a concurrent writer that
/// got past the checks first.
fn write_error<E: ScopedEntity>(e: sqlx::Error) -> ScopeError {
	if is_unique_violation(&e) {
		ScopeError::DuplicateKey {
			entity: E::KIND,
			field: E::NATURAL_KEY.map(|k| k.column).unwrap_or("id"),
		}
	} else if is_foreign_key_violation(&e) {
		ScopeError::validation(format!("{} references a record that no longer exists", E::KIND))
	} else {
		e.into()
	}
}
