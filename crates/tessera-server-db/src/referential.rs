// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reference checks in both directions.
//!
//! - [`ensure_unreferenced`] runs before a delete: one bounded existence probe
//!   per registered referrer, stopping at the first hit.
//! - [`ensure_targets_exist`] runs before a create or update: every non-null
//!   foreign id must point at a record inside the caller's scope.

use sqlx::SqliteConnection;
use tessera_server_auth::{ProjectId, TenantId};

use crate::entity::{FieldValue, Referrer, ScopeLevel, ScopedEntity};
use crate::error::ScopeError;

/// Fail with `ReferencedByOtherRecords` if any referrer holds `id`.
///
/// An empty referrer list makes this a no-op.
#[tracing::instrument(skip(conn, referrers), fields(entity = entity, tenant_id = %tenant_id, id = %id))]
pub async fn ensure_unreferenced(
	conn: &mut SqliteConnection,
	tenant_id: TenantId,
	entity: &'static str,
	id: &str,
	referrers: &[Referrer],
) -> Result<(), ScopeError> {
	for referrer in referrers {
		let sql = format!(
			"SELECT 1 FROM {} WHERE {} = ? AND tenant_id = ? LIMIT 1",
			referrer.table, referrer.column
		);
		let hit: Option<i64> = sqlx::query_scalar(&sql)
			.bind(id)
			.bind(tenant_id.to_string())
			.fetch_optional(&mut *conn)
			.await?;

		if hit.is_some() {
			tracing::debug!(referrer = referrer.kind, "delete blocked by referrer");
			return Err(ScopeError::ReferencedByOtherRecords {
				entity,
				referrer: referrer.kind,
			});
		}
	}
	Ok(())
}

/// Fail with `Validation` if a foreign id in the payload does not resolve
/// within the tenant (and project, for project-scoped targets).
///
/// The message is the same whether the target is absent or belongs elsewhere.
#[tracing::instrument(skip(conn, payload), fields(entity = E::KIND, tenant_id = %tenant_id))]
pub async fn ensure_targets_exist<E: ScopedEntity>(
	conn: &mut SqliteConnection,
	tenant_id: TenantId,
	project_id: Option<ProjectId>,
	payload: &E,
) -> Result<(), ScopeError> {
	for reference in E::REFERENCES {
		let Some(FieldValue::Id(Some(target_id))) = payload.field(reference.column) else {
			continue;
		};

		let mut sql = format!(
			"SELECT 1 FROM {} WHERE id = ? AND tenant_id = ?",
			reference.target.table
		);
		if reference.target.scope == ScopeLevel::Project {
			sql.push_str(" AND project_id IS ?");
		}

		let mut query = sqlx::query_scalar::<_, i64>(&sql)
			.bind(target_id.to_string())
			.bind(tenant_id.to_string());
		if reference.target.scope == ScopeLevel::Project {
			query = query.bind(project_id.map(|p| p.to_string()));
		}

		if query.fetch_optional(&mut *conn).await?.is_none() {
			tracing::debug!(column = reference.column, "reference target not in scope");
			return Err(ScopeError::validation(format!(
				"{} does not reference an existing {}",
				reference.column, reference.target.kind
			)));
		}
	}
	Ok(())
}
