// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Projects and project assignments.
//!
//! Every method takes a [`RequestScope`]; queries are always bounded by the
//! scope's tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row, SqliteConnection};
use tessera_server_auth::{Action, ProjectId, Target, TenantId, UserId};

use crate::error::{is_foreign_key_violation, is_unique_violation, DbError, ScopeError};
use crate::member::{rows_to_members, Member};
use crate::records::PROJECT_REFERRERS;
use crate::referential::ensure_unreferenced;
use crate::row::{format_ts, get_ts, get_uuid};
use crate::scope::RequestScope;
use crate::validation::require_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
	pub id: ProjectId,
	pub tenant_id: TenantId,
	pub name: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
	pub name: String,
	pub description: Option<String>,
}

impl ProjectInput {
	fn validate(&self) -> Result<(), ScopeError> {
		require_text("name", &self.name).map_err(ScopeError::Validation)
	}
}

const PROJECT_COLUMNS: &str = "id, tenant_id, name, description, created_at, updated_at";

#[derive(Clone)]
pub struct ProjectRepository {
	pool: SqlitePool,
}

impl ProjectRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Projects visible to the caller, by name.
	///
	/// ADMIN and MANAGER see every project of the tenant, USER only its
	/// assigned projects.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), role = %scope.role()))]
	pub async fn list(&self, scope: &RequestScope) -> Result<Vec<Project>, ScopeError> {
		let rows = if scope.role().sees_all_projects() {
			sqlx::query(&format!(
				"SELECT {PROJECT_COLUMNS} FROM projects WHERE tenant_id = ? ORDER BY name, id"
			))
			.bind(scope.tenant_id().to_string())
			.fetch_all(&self.pool)
			.await?
		} else {
			sqlx::query(
				r#"
				SELECT p.id, p.tenant_id, p.name, p.description, p.created_at, p.updated_at
				FROM projects p
				JOIN user_projects up ON up.project_id = p.id
				WHERE p.tenant_id = ? AND up.user_id = ?
				ORDER BY p.name, p.id
				"#,
			)
			.bind(scope.tenant_id().to_string())
			.bind(scope.user_id().to_string())
			.fetch_all(&self.pool)
			.await?
		};

		Ok(rows
			.iter()
			.map(|r| self.row_to_project(r))
			.collect::<Result<Vec<_>, DbError>>()?)
	}

	/// # Errors
	/// - `NotFound` if the project is not in the scope's tenant.
	/// - `Forbidden` for a USER not assigned to it.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), project_id = %id))]
	pub async fn get(&self, scope: &RequestScope, id: ProjectId) -> Result<Project, ScopeError> {
		let mut conn = self.pool.acquire().await?;
		let project = self.fetch(&mut conn, scope.tenant_id(), id).await?;
		scope.authorize(Action::Read, &Target::project(scope.tenant_id(), Some(id)))?;
		Ok(project)
	}

	/// Create a project and assign its creator to it.
	#[tracing::instrument(skip(self, scope, input), fields(tenant_id = %scope.tenant_id()))]
	pub async fn create(
		&self,
		scope: &RequestScope,
		input: ProjectInput,
	) -> Result<Project, ScopeError> {
		scope.authorize(Action::Create, &Target::project(scope.tenant_id(), None))?;
		input.validate()?;

		let now = Utc::now();
		let project = Project {
			id: ProjectId::generate(),
			tenant_id: scope.tenant_id(),
			name: input.name.trim().to_string(),
			description: input.description,
			created_at: now,
			updated_at: now,
		};

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		self.ensure_name_free(&mut tx, project.tenant_id, &project.name, None)
			.await?;

		sqlx::query(
			r#"
			INSERT INTO projects (id, tenant_id, name, description, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(project.id.to_string())
		.bind(project.tenant_id.to_string())
		.bind(&project.name)
		.bind(&project.description)
		.bind(format_ts(now))
		.bind(format_ts(now))
		.execute(&mut *tx)
		.await
		.map_err(name_conflict)?;

		sqlx::query(
			"INSERT INTO user_projects (user_id, project_id, tenant_id, created_at) VALUES (?, ?, ?, ?)",
		)
		.bind(scope.user_id().to_string())
		.bind(project.id.to_string())
		.bind(project.tenant_id.to_string())
		.bind(format_ts(now))
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::debug!(project_id = %project.id, "project created");
		Ok(project)
	}

	#[tracing::instrument(skip(self, scope, input), fields(tenant_id = %scope.tenant_id(), project_id = %id))]
	pub async fn update(
		&self,
		scope: &RequestScope,
		id: ProjectId,
		input: ProjectInput,
	) -> Result<Project, ScopeError> {
		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		let existing = self.fetch(&mut tx, scope.tenant_id(), id).await?;
		scope.authorize(Action::Update, &Target::project(scope.tenant_id(), Some(id)))?;
		input.validate()?;

		let name = input.name.trim().to_string();
		if name != existing.name {
			self.ensure_name_free(&mut tx, scope.tenant_id(), &name, Some(id))
				.await?;
		}

		let now = Utc::now();
		sqlx::query(
			"UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ? AND tenant_id = ?",
		)
		.bind(&name)
		.bind(&input.description)
		.bind(format_ts(now))
		.bind(id.to_string())
		.bind(scope.tenant_id().to_string())
		.execute(&mut *tx)
		.await
		.map_err(name_conflict)?;
		tx.commit().await?;

		Ok(Project {
			name,
			description: input.description,
			updated_at: now,
			..existing
		})
	}

	/// Delete a project that no record references. Its assignments go with it.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), project_id = %id))]
	pub async fn delete(&self, scope: &RequestScope, id: ProjectId) -> Result<(), ScopeError> {
		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		self.fetch(&mut tx, scope.tenant_id(), id).await?;
		scope.authorize(Action::Delete, &Target::project(scope.tenant_id(), Some(id)))?;

		let id_str = id.to_string();
		ensure_unreferenced(&mut tx, scope.tenant_id(), "project", &id_str, PROJECT_REFERRERS).await?;

		sqlx::query("DELETE FROM user_projects WHERE project_id = ? AND tenant_id = ?")
			.bind(&id_str)
			.bind(scope.tenant_id().to_string())
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM projects WHERE id = ? AND tenant_id = ?")
			.bind(&id_str)
			.bind(scope.tenant_id().to_string())
			.execute(&mut *tx)
			.await
			.map_err(|e| {
				if is_foreign_key_violation(&e) {
					ScopeError::ReferencedByOtherRecords {
						entity: "project",
						referrer: "other",
					}
				} else {
					e.into()
				}
			})?;
		tx.commit().await?;

		tracing::debug!("project deleted");
		Ok(())
	}

	/// Assign a tenant member to a project. Assigning twice is a no-op.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), project_id = %project_id, user_id = %user_id))]
	pub async fn assign_member(
		&self,
		scope: &RequestScope,
		project_id: ProjectId,
		user_id: UserId,
	) -> Result<(), ScopeError> {
		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		self.fetch(&mut tx, scope.tenant_id(), project_id).await?;
		scope.authorize(
			Action::ManageMembers,
			&Target::membership(scope.tenant_id(), Some(project_id), None),
		)?;

		let member: Option<i64> = sqlx::query_scalar(
			"SELECT 1 FROM users WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL",
		)
		.bind(user_id.to_string())
		.bind(scope.tenant_id().to_string())
		.fetch_optional(&mut *tx)
		.await?;
		if member.is_none() {
			return Err(ScopeError::NotFound { entity: "user" });
		}

		sqlx::query(
			r#"
			INSERT OR IGNORE INTO user_projects (user_id, project_id, tenant_id, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(user_id.to_string())
		.bind(project_id.to_string())
		.bind(scope.tenant_id().to_string())
		.bind(format_ts(Utc::now()))
		.execute(&mut *tx)
		.await?;
		tx.commit().await?;

		tracing::debug!("member assigned");
		Ok(())
	}

	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), project_id = %project_id, user_id = %user_id))]
	pub async fn unassign_member(
		&self,
		scope: &RequestScope,
		project_id: ProjectId,
		user_id: UserId,
	) -> Result<(), ScopeError> {
		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		self.fetch(&mut tx, scope.tenant_id(), project_id).await?;
		scope.authorize(
			Action::ManageMembers,
			&Target::membership(scope.tenant_id(), Some(project_id), None),
		)?;

		let result = sqlx::query(
			"DELETE FROM user_projects WHERE user_id = ? AND project_id = ? AND tenant_id = ?",
		)
		.bind(user_id.to_string())
		.bind(project_id.to_string())
		.bind(scope.tenant_id().to_string())
		.execute(&mut *tx)
		.await?;
		if result.rows_affected() == 0 {
			return Err(ScopeError::NotFound {
				entity: "project_member",
			});
		}
		tx.commit().await?;

		tracing::debug!("member unassigned");
		Ok(())
	}

	/// Members assigned to a project, by email.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id(), project_id = %project_id))]
	pub async fn list_members(
		&self,
		scope: &RequestScope,
		project_id: ProjectId,
	) -> Result<Vec<Member>, ScopeError> {
		let mut conn = self.pool.acquire().await?;
		self.fetch(&mut conn, scope.tenant_id(), project_id).await?;
		scope.authorize(
			Action::Read,
			&Target::membership(scope.tenant_id(), Some(project_id), None),
		)?;

		let rows = sqlx::query(
			r#"
			SELECT u.id, u.tenant_id, u.email, u.display_name, u.role, u.created_at
			FROM users u
			JOIN user_projects up ON up.user_id = u.id
			WHERE up.project_id = ? AND up.tenant_id = ? AND u.deleted_at IS NULL
			ORDER BY u.email, u.id
			"#,
		)
		.bind(project_id.to_string())
		.bind(scope.tenant_id().to_string())
		.fetch_all(&mut *conn)
		.await?;

		Ok(rows_to_members(&rows)?)
	}

	async fn fetch(
		&self,
		conn: &mut SqliteConnection,
		tenant_id: TenantId,
		id: ProjectId,
	) -> Result<Project, ScopeError> {
		let row = sqlx::query(&format!(
			"SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND tenant_id = ?"
		))
		.bind(id.to_string())
		.bind(tenant_id.to_string())
		.fetch_optional(&mut *conn)
		.await?;

		match row {
			Some(r) => Ok(self.row_to_project(&r)?),
			None => Err(ScopeError::NotFound { entity: "project" }),
		}
	}

	async fn ensure_name_free(
		&self,
		conn: &mut SqliteConnection,
		tenant_id: TenantId,
		name: &str,
		exclude: Option<ProjectId>,
	) -> Result<(), ScopeError> {
		let taken: Option<i64> = sqlx::query_scalar(
			"SELECT 1 FROM projects WHERE tenant_id = ? AND name = ? AND id IS NOT ? LIMIT 1",
		)
		.bind(tenant_id.to_string())
		.bind(name)
		.bind(exclude.map(|p| p.to_string()))
		.fetch_optional(&mut *conn)
		.await?;

		if taken.is_some() {
			return Err(ScopeError::DuplicateKey {
				entity: "project",
				field: "name",
			});
		}
		Ok(())
	}

	fn row_to_project(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Project, DbError> {
		Ok(Project {
			id: ProjectId::new(get_uuid(row, "id")?),
			tenant_id: TenantId::new(get_uuid(row, "tenant_id")?),
			name: row.get("name"),
			description: row.get("description"),
			created_at: get_ts(row, "created_at")?,
			updated_at: get_ts(row, "updated_at")?,
		})
	}
}

fn name_conflict(e: sqlx::Error) -> ScopeError {
	if is_unique_violation(&e) {
		ScopeError::DuplicateKey {
			entity: "project",
			field: "name",
		}
	} else {
		e.into()
	}
}
