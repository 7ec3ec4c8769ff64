// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request scope construction.
//!
//! A [`RequestScope`] is the only way into the scoped repositories, and the
//! only way to get one is [`ScopeResolver::resolve`]. Holding a scope
//! therefore proves that:
//!
//! - a tenant was supplied and the caller is a live member of it,
//! - the caller's role is recognized,
//! - any supplied project belongs to that tenant.
//!
//! Scopes live for one request. Role and assignments are re-read every time.

use serde::Deserialize;
use sqlx::sqlite::SqlitePool;
use tessera_server_auth::{
	authorize, Action, Principal, ProjectId, Role, SubjectAttrs, Target, TenantId, UserId,
};

use crate::error::ScopeError;
use crate::identity::IdentityResolver;

/// The validated `(tenant, project?)` pair gating every data operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
	tenant_id: TenantId,
	project_id: Option<ProjectId>,
}

impl TenantContext {
	pub fn tenant_id(&self) -> TenantId {
		self.tenant_id
	}

	pub fn project_id(&self) -> Option<ProjectId> {
		self.project_id
	}

	/// The project, or `MissingProjectContext` naming the entity that needed it.
	pub fn require_project(&self, entity: &'static str) -> Result<ProjectId, ScopeError> {
		self.project_id
			.ok_or(ScopeError::MissingProjectContext { entity })
	}
}

/// Raw scope parameters as they arrive on a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeParams {
	#[serde(rename = "tenantId")]
	pub tenant_id: Option<String>,
	#[serde(rename = "projectId")]
	pub project_id: Option<String>,
}

impl ScopeParams {
	pub fn new(tenant_id: Option<TenantId>, project_id: Option<ProjectId>) -> Self {
		Self {
			tenant_id: tenant_id.map(|t| t.to_string()),
			project_id: project_id.map(|p| p.to_string()),
		}
	}
}

/// A validated tenant context bound to the caller's policy attributes.
#[derive(Debug, Clone)]
pub struct RequestScope {
	ctx: TenantContext,
	subject: SubjectAttrs,
}

impl RequestScope {
	pub fn context(&self) -> &TenantContext {
		&self.ctx
	}

	pub fn subject(&self) -> &SubjectAttrs {
		&self.subject
	}

	pub fn tenant_id(&self) -> TenantId {
		self.ctx.tenant_id
	}

	pub fn project_id(&self) -> Option<ProjectId> {
		self.ctx.project_id
	}

	pub fn user_id(&self) -> UserId {
		self.subject.user_id
	}

	pub fn role(&self) -> Role {
		self.subject.role
	}

	/// Run the policy and turn a deny into `Forbidden`.
	pub fn authorize(&self, action: Action, target: &Target) -> Result<(), ScopeError> {
		authorize(&self.subject, action, target)
			.into_result()
			.map_err(ScopeError::Forbidden)
	}
}

/// Builds [`RequestScope`]s from a principal and raw request parameters.
#[derive(Clone)]
pub struct ScopeResolver {
	pool: SqlitePool,
	identities: IdentityResolver,
}

impl ScopeResolver {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			identities: IdentityResolver::new(pool.clone()),
			pool,
		}
	}

	/// Validate the parameters and resolve the caller's scope.
	///
	/// Checks run in this order, each failing closed:
	/// 1. tenant present, else `MissingTenantContext`
	/// 2. ids well-formed, else `Validation`
	/// 3. caller is a member of the tenant, else `NotAMember`
	/// 4. project (if any) belongs to the tenant, else `ProjectNotInTenant`
	#[tracing::instrument(skip(self, params), fields(user_id = %principal.user_id))]
	pub async fn resolve(
		&self,
		principal: &Principal,
		params: &ScopeParams,
	) -> Result<RequestScope, ScopeError> {
		let tenant_raw = params
			.tenant_id
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.ok_or(ScopeError::MissingTenantContext)?;
		let tenant_id = TenantId::parse(tenant_raw)
			.map_err(|_| ScopeError::validation("tenantId is not a valid id"))?;

		let project_id = params
			.project_id
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(|raw| {
				ProjectId::parse(raw).map_err(|_| ScopeError::validation("projectId is not a valid id"))
			})
			.transpose()?;

		let subject = self.identities.subject(principal, tenant_id).await?;

		if let Some(project_id) = project_id {
			if !self.project_in_tenant(tenant_id, project_id).await? {
				tracing::debug!(%tenant_id, %project_id, "project not in tenant");
				return Err(ScopeError::ProjectNotInTenant);
			}
		}

		tracing::debug!(%tenant_id, project_id = ?project_id, role = %subject.role, "scope resolved");
		Ok(RequestScope {
			ctx: TenantContext {
				tenant_id,
				project_id,
			},
			subject,
		})
	}

	async fn project_in_tenant(
		&self,
		tenant_id: TenantId,
		project_id: ProjectId,
	) -> Result<bool, ScopeError> {
		let found: Option<i64> =
			sqlx::query_scalar("SELECT 1 FROM projects WHERE id = ? AND tenant_id = ?")
				.bind(project_id.to_string())
				.bind(tenant_id.to_string())
				.fetch_optional(&self.pool)
				.await?;
		Ok(found.is_some())
	}
}
