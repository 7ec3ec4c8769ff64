// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema migrations.
//!
//! Migrations are applied in order, each inside its own transaction, and
//! recorded in `_migrations`. The UNIQUE indexes and FOREIGN KEY clauses
//! mirror the natural keys and references declared on each entity so that
//! storage rejects anything a concurrent writer slipped past the checks.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

struct Migration {
	version: i64,
	name: &'static str,
	statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
	Migration {
		version: 1,
		name: "identity",
		statements: &[
			r#"
			CREATE TABLE tenants (
				id TEXT PRIMARY KEY NOT NULL,
				name TEXT NOT NULL,
				slug TEXT NOT NULL UNIQUE,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			r#"
			CREATE TABLE projects (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				name TEXT NOT NULL,
				description TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, name)
			)
			"#,
			r#"
			CREATE TABLE users (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				email TEXT NOT NULL UNIQUE,
				display_name TEXT NOT NULL,
				role TEXT NOT NULL CHECK (role IN ('admin', 'manager', 'user')),
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				deleted_at TEXT
			)
			"#,
			"CREATE INDEX idx_users_tenant ON users(tenant_id)",
			r#"
			CREATE TABLE user_projects (
				user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
				project_id TEXT NOT NULL REFERENCES projects(id),
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				created_at TEXT NOT NULL,
				PRIMARY KEY (user_id, project_id)
			)
			"#,
			"CREATE INDEX idx_user_projects_project ON user_projects(project_id)",
			r#"
			CREATE TABLE sessions (
				id TEXT PRIMARY KEY NOT NULL,
				user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
				token_hash TEXT NOT NULL UNIQUE,
				created_at TEXT NOT NULL,
				expires_at TEXT NOT NULL
			)
			"#,
		],
	},
	Migration {
		version: 2,
		name: "compliance_records",
		statements: &[
			r#"
			CREATE TABLE biodiversity_resources (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				reference TEXT NOT NULL,
				name TEXT NOT NULL,
				category TEXT,
				description TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, reference)
			)
			"#,
			r#"
			CREATE TABLE risk_identifications (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				resource_id TEXT NOT NULL REFERENCES biodiversity_resources(id),
				description TEXT NOT NULL,
				likelihood INTEGER NOT NULL,
				severity INTEGER NOT NULL,
				mitigation TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			"CREATE INDEX idx_risk_identifications_scope ON risk_identifications(tenant_id, project_id)",
			"CREATE INDEX idx_risk_identifications_resource ON risk_identifications(resource_id)",
			r#"
			CREATE TABLE subprojects (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				name TEXT NOT NULL,
				location TEXT,
				description TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, project_id, name)
			)
			"#,
			r#"
			CREATE TABLE risk_screenings (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				subproject_id TEXT NOT NULL REFERENCES subprojects(id),
				risk_category TEXT NOT NULL,
				applicable INTEGER NOT NULL,
				notes TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, subproject_id, risk_category)
			)
			"#,
			"CREATE INDEX idx_risk_screenings_scope ON risk_screenings(tenant_id, project_id)",
			r#"
			CREATE TABLE incident_reports (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				title TEXT NOT NULL,
				occurred_on TEXT NOT NULL,
				severity TEXT NOT NULL,
				description TEXT,
				corrective_action TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			"CREATE INDEX idx_incident_reports_scope ON incident_reports(tenant_id, project_id)",
			r#"
			CREATE TABLE stakeholders (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				name TEXT NOT NULL,
				organization TEXT,
				email TEXT,
				influence INTEGER NOT NULL,
				interest INTEGER NOT NULL,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, project_id, name)
			)
			"#,
			r#"
			CREATE TABLE documents (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				code TEXT NOT NULL,
				title TEXT NOT NULL,
				revision INTEGER NOT NULL,
				owner TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL,
				UNIQUE (tenant_id, code)
			)
			"#,
			r#"
			CREATE TABLE training_logs (
				id TEXT PRIMARY KEY NOT NULL,
				tenant_id TEXT NOT NULL REFERENCES tenants(id),
				project_id TEXT NOT NULL REFERENCES projects(id),
				document_id TEXT REFERENCES documents(id),
				topic TEXT NOT NULL,
				held_on TEXT NOT NULL,
				attendees INTEGER NOT NULL,
				hours REAL,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			"CREATE INDEX idx_training_logs_scope ON training_logs(tenant_id, project_id)",
			"CREATE INDEX idx_training_logs_document ON training_logs(document_id)",
		],
	},
];

/// Apply every migration not yet recorded in `_migrations`.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS _migrations (
			version INTEGER PRIMARY KEY NOT NULL,
			name TEXT NOT NULL,
			applied_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	let applied: Vec<i64> = sqlx::query_scalar("SELECT version FROM _migrations")
		.fetch_all(pool)
		.await?;

	for migration in MIGRATIONS {
		if applied.contains(&migration.version) {
			continue;
		}

		let mut tx = pool.begin().await?;
		for statement in migration.statements {
			sqlx::query(statement).execute(&mut *tx).await?;
		}
		sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
			.bind(migration.version)
			.bind(migration.name)
			.bind(Utc::now().to_rfc3339())
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		tracing::info!(
			version = migration.version,
			name = migration.name,
			"applied migration"
		);
	}

	Ok(())
}
