// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Natural-key uniqueness checks.
//!
//! A key is only ever unique within its declared [`KeyScope`]; the lookup is
//! always bounded by tenant.

use sqlx::SqliteConnection;
use tessera_server_auth::{ProjectId, RecordId, TenantId};

use crate::entity::{FieldValue, KeyScope, ScopedEntity};
use crate::error::ScopeError;

/// Fail with `DuplicateKey` if another record in scope already holds the
/// payload's natural key.
///
/// `exclude` is the id of the record being updated, if any. A null key never
/// collides.
#[tracing::instrument(skip(conn, payload), fields(entity = E::KIND, tenant_id = %tenant_id))]
pub async fn ensure_unique<E: ScopedEntity>(
	conn: &mut SqliteConnection,
	tenant_id: TenantId,
	project_id: Option<ProjectId>,
	payload: &E,
	exclude: Option<RecordId>,
) -> Result<(), ScopeError> {
	let Some(key) = E::NATURAL_KEY else {
		return Ok(());
	};
	let Some(value) = payload.field(key.column).filter(|v| !v.is_null()) else {
		return Ok(());
	};

	let mut sql = format!(
		"SELECT id FROM {} WHERE tenant_id = ? AND {} = ?",
		E::TABLE,
		key.column
	);
	let mut binds = vec![FieldValue::Text(Some(tenant_id.to_string())), value];

	match key.within {
		KeyScope::Tenant => {}
		KeyScope::Project => {
			let project_id = project_id.ok_or(ScopeError::MissingProjectContext { entity: E::KIND })?;
			sql.push_str(" AND project_id = ?");
			binds.push(FieldValue::Text(Some(project_id.to_string())));
		}
		KeyScope::Column(column) => {
			sql.push_str(&format!(" AND {column} IS ?"));
			binds.push(payload.field(column).unwrap_or(FieldValue::Text(None)));
		}
	}

	if let Some(id) = exclude {
		sql.push_str(" AND id != ?");
		binds.push(FieldValue::Id(Some(id)));
	}
	sql.push_str(" LIMIT 1");

	let mut query = sqlx::query(&sql);
	for value in &binds {
		query = value.bind(query);
	}

	if query.fetch_optional(&mut *conn).await?.is_some() {
		tracing::debug!(field = key.column, "natural key already taken in scope");
		return Err(ScopeError::DuplicateKey {
			entity: E::KIND,
			field: key.column,
		});
	}
	Ok(())
}

/// Whether an update moves the record to a different natural key: either the
/// key itself or the column that scopes it changed.
pub fn key_changed<E: ScopedEntity>(before: &E, after: &E) -> bool {
	let Some(key) = E::NATURAL_KEY else {
		return false;
	};
	if before.field(key.column) != after.field(key.column) {
		return true;
	}
	match key.within {
		KeyScope::Column(column) => before.field(column) != after.field(column),
		KeyScope::Tenant | KeyScope::Project => false,
	}
}
