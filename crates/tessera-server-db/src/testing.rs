// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test support: in-memory databases and a standard tenant fixture.

use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tessera_server_auth::{Principal, ProjectId, Role, TenantId, UserId};

use crate::row::format_ts;
use crate::schema::run_migrations;
use crate::scope::{RequestScope, ScopeParams, ScopeResolver};

/// An in-memory pool. A single never-recycled connection keeps the
/// database alive for the lifetime of the pool.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await
		.unwrap()
}

pub struct TestDb {
	pub pool: SqlitePool,
}

impl TestDb {
	/// A migrated in-memory database.
	pub async fn new() -> Self {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		Self { pool }
	}
}

pub async fn insert_tenant(pool: &SqlitePool, name: &str) -> TenantId {
	let id = TenantId::generate();
	let now = format_ts(Utc::now());
	sqlx::query("INSERT INTO tenants (id, name, slug, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
		.bind(id.to_string())
		.bind(name)
		.bind(format!("t-{}", id.into_inner().simple()))
		.bind(&now)
		.bind(&now)
		.execute(pool)
		.await
		.unwrap();
	id
}

pub async fn insert_user(pool: &SqlitePool, tenant_id: TenantId, role: Role) -> UserId {
	let id = UserId::generate();
	let now = format_ts(Utc::now());
	sqlx::query(
		r#"
		INSERT INTO users (id, tenant_id, email, display_name, role, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id.to_string())
	.bind(tenant_id.to_string())
	.bind(format!("{}@example.org", id.into_inner().simple()))
	.bind(format!("Test {role}"))
	.bind(role.as_str())
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();
	id
}

pub async fn insert_project(pool: &SqlitePool, tenant_id: TenantId, name: &str) -> ProjectId {
	let id = ProjectId::generate();
	let now = format_ts(Utc::now());
	sqlx::query(
		"INSERT INTO projects (id, tenant_id, name, description, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, ?)",
	)
	.bind(id.to_string())
	.bind(tenant_id.to_string())
	.bind(name)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();
	id
}

pub async fn assign(pool: &SqlitePool, tenant_id: TenantId, user_id: UserId, project_id: ProjectId) {
	sqlx::query(
		"INSERT INTO user_projects (user_id, project_id, tenant_id, created_at) VALUES (?, ?, ?, ?)",
	)
	.bind(user_id.to_string())
	.bind(project_id.to_string())
	.bind(tenant_id.to_string())
	.bind(format_ts(Utc::now()))
	.execute(pool)
	.await
	.unwrap();
}

/// Overwrite a user's stored role, bypassing the role CHECK constraint.
/// Relies on the single connection of [`create_test_pool`].
pub async fn force_stored_role(pool: &SqlitePool, user_id: UserId, role: &str) {
	sqlx::query("PRAGMA ignore_check_constraints = ON")
		.execute(pool)
		.await
		.unwrap();
	sqlx::query("UPDATE users SET role = ? WHERE id = ?")
		.bind(role)
		.bind(user_id.to_string())
		.execute(pool)
		.await
		.unwrap();
	sqlx::query("PRAGMA ignore_check_constraints = OFF")
		.execute(pool)
		.await
		.unwrap();
}

/// One tenant with an ADMIN, a MANAGER and a USER, two projects, and the USER
/// assigned to `project_a` only.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
	pub tenant: TenantId,
	pub admin: UserId,
	pub manager: UserId,
	pub user: UserId,
	pub project_a: ProjectId,
	pub project_b: ProjectId,
}

impl Fixture {
	pub async fn new(db: &TestDb) -> Self {
		let pool = &db.pool;
		let tenant = insert_tenant(pool, "Fixture Tenant").await;
		let admin = insert_user(pool, tenant, Role::Admin).await;
		let manager = insert_user(pool, tenant, Role::Manager).await;
		let user = insert_user(pool, tenant, Role::User).await;
		let project_a = insert_project(pool, tenant, "Project A").await;
		let project_b = insert_project(pool, tenant, "Project B").await;
		assign(pool, tenant, user, project_a).await;
		Self {
			tenant,
			admin,
			manager,
			user,
			project_a,
			project_b,
		}
	}

	/// Resolve a scope for `user_id` in this tenant.
	pub async fn scope(&self, db: &TestDb, user_id: UserId, project: Option<ProjectId>) -> RequestScope {
		ScopeResolver::new(db.pool.clone())
			.resolve(
				&Principal::new(user_id),
				&ScopeParams::new(Some(self.tenant), project),
			)
			.await
			.unwrap()
	}
}
