// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolves an authenticated principal to its membership in a tenant.

use sqlx::{sqlite::SqlitePool, Row};
use tessera_server_auth::{
	DenyReason, Identity, Principal, ProjectId, Role, SubjectAttrs, TenantId,
};

use crate::error::ScopeError;
use crate::row::get_uuid;

/// Looks up `(user, role, tenant)` for a principal. Holds no state beyond the
/// pool; every call reads storage afresh.
#[derive(Clone)]
pub struct IdentityResolver {
	pool: SqlitePool,
}

impl IdentityResolver {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Resolve the principal's membership in `tenant_id`.
	///
	/// # Errors
	/// - `NotAMember` if no live user row matches the principal in that tenant.
	/// - `Forbidden(UnrecognizedRole)` if the stored role is not a known role.
	#[tracing::instrument(skip(self), fields(user_id = %principal.user_id, tenant_id = %tenant_id))]
	pub async fn resolve(
		&self,
		principal: &Principal,
		tenant_id: TenantId,
	) -> Result<Identity, ScopeError> {
		let row = sqlx::query(
			r#"
			SELECT role
			FROM users
			WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(principal.user_id.to_string())
		.bind(tenant_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			tracing::debug!("principal is not a member of tenant");
			return Err(ScopeError::NotAMember);
		};

		let role_str: String = row.get("role");
		let role = role_str.parse::<Role>().map_err(|e| {
			tracing::warn!(error = %e, "stored role is unrecognized, denying");
			ScopeError::Forbidden(DenyReason::UnrecognizedRole)
		})?;

		Ok(Identity {
			user_id: principal.user_id,
			role,
			tenant_id,
		})
	}

	/// Projects the identity is explicitly assigned to within its tenant.
	#[tracing::instrument(skip(self), fields(user_id = %identity.user_id, tenant_id = %identity.tenant_id))]
	pub async fn assigned_projects(&self, identity: &Identity) -> Result<Vec<ProjectId>, ScopeError> {
		let rows = sqlx::query(
			r#"
			SELECT project_id
			FROM user_projects
			WHERE user_id = ? AND tenant_id = ?
			ORDER BY project_id
			"#,
		)
		.bind(identity.user_id.to_string())
		.bind(identity.tenant_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows
			.iter()
			.map(|r| Ok(ProjectId::new(get_uuid(r, "project_id")?)))
			.collect()
	}

	/// Resolve the principal into full policy attributes.
	pub async fn subject(
		&self,
		principal: &Principal,
		tenant_id: TenantId,
	) -> Result<SubjectAttrs, ScopeError> {
		let identity = self.resolve(principal, tenant_id).await?;
		let projects = self.assigned_projects(&identity).await?;
		Ok(SubjectAttrs::new(identity).with_assignments(projects))
	}
}
