// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant members (users).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row, SqliteConnection,
};
use tessera_server_auth::{Action, Role, Target, TenantId, UserId};

use crate::error::{is_unique_violation, DbError, ScopeError};
use crate::row::{format_ts, get_ts, get_uuid};
use crate::scope::RequestScope;
use crate::validation::{is_valid_email, require_text, sanitize_email};

/// A user of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
	pub id: UserId,
	pub tenant_id: TenantId,
	pub email: String,
	pub display_name: String,
	pub role: Role,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
	pub email: String,
	pub display_name: String,
	pub role: Role,
}

impl NewMember {
	pub(crate) fn validate(&self) -> Result<(), ScopeError> {
		if !is_valid_email(&sanitize_email(&self.email)) {
			return Err(ScopeError::validation("email is not a valid address"));
		}
		require_text("display_name", &self.display_name).map_err(ScopeError::Validation)
	}
}

pub(crate) const MEMBER_COLUMNS: &str = "id, tenant_id, email, display_name, role, created_at";

fn row_to_member(row: &SqliteRow, role: Role) -> Result<Member, DbError> {
	Ok(Member {
		id: UserId::new(get_uuid(row, "id")?),
		tenant_id: TenantId::new(get_uuid(row, "tenant_id")?),
		email: row.try_get("email")?,
		display_name: row.try_get("display_name")?,
		role,
		created_at: get_ts(row, "created_at")?,
	})
}

/// Map member rows. Rows whose stored role is unrecognized are skipped and
/// logged; those users are denied on their own requests.
pub(crate) fn rows_to_members(rows: &[SqliteRow]) -> Result<Vec<Member>, DbError> {
	let mut members = Vec::with_capacity(rows.len());
	for row in rows {
		let role_str: String = row.try_get("role")?;
		match role_str.parse::<Role>() {
			Ok(role) => members.push(row_to_member(row, role)?),
			Err(e) => {
				let user_id: String = row.try_get("id")?;
				tracing::warn!(%user_id, error = %e, "skipping member with unrecognized role");
			}
		}
	}
	Ok(members)
}

/// Insert a user row. Email must be globally unique.
pub(crate) async fn insert_member(
	conn: &mut SqliteConnection,
	tenant_id: TenantId,
	input: &NewMember,
) -> Result<Member, ScopeError> {
	let email = sanitize_email(&input.email);
	let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE email = ?")
		.bind(&email)
		.fetch_optional(&mut *conn)
		.await?;
	if taken.is_some() {
		return Err(ScopeError::DuplicateKey {
			entity: "user",
			field: "email",
		});
	}

	let member = Member {
		id: UserId::generate(),
		tenant_id,
		email,
		display_name: input.display_name.trim().to_string(),
		role: input.role,
		created_at: Utc::now(),
	};
	let now = format_ts(member.created_at);
	sqlx::query(
		r#"
		INSERT INTO users (id, tenant_id, email, display_name, role, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(member.id.to_string())
	.bind(tenant_id.to_string())
	.bind(&member.email)
	.bind(&member.display_name)
	.bind(member.role.as_str())
	.bind(&now)
	.bind(&now)
	.execute(&mut *conn)
	.await
	.map_err(|e| {
		if is_unique_violation(&e) {
			ScopeError::DuplicateKey {
				entity: "user",
				field: "email",
			}
		} else {
			e.into()
		}
	})?;

	Ok(member)
}

#[derive(Clone)]
pub struct MemberRepository {
	pool: SqlitePool,
}

impl MemberRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Live members of the scope's tenant, ordered by email.
	#[tracing::instrument(skip(self, scope), fields(tenant_id = %scope.tenant_id()))]
	pub async fn list(&self, scope: &RequestScope) -> Result<Vec<Member>, ScopeError> {
		scope.authorize(
			Action::Read,
			&Target::membership(scope.tenant_id(), None, None),
		)?;

		let rows = sqlx::query(&format!(
			"SELECT {MEMBER_COLUMNS} FROM users WHERE tenant_id = ? AND deleted_at IS NULL ORDER BY email, id"
		))
		.bind(scope.tenant_id().to_string())
		.fetch_all(&self.pool)
		.await?;

		Ok(rows_to_members(&rows)?)
	}

	/// Add a user to the scope's tenant with the given role.
	///
	/// # Errors
	/// - `Forbidden` if the caller may not grant that role.
	/// - `DuplicateKey` if the email is already registered anywhere.
	#[tracing::instrument(skip(self, scope, input), fields(tenant_id = %scope.tenant_id(), role = %input.role))]
	pub async fn invite(&self, scope: &RequestScope, input: NewMember) -> Result<Member, ScopeError> {
		scope.authorize(
			Action::ManageMembers,
			&Target::membership(scope.tenant_id(), None, Some(input.role)),
		)?;
		input.validate()?;

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		let member = insert_member(&mut tx, scope.tenant_id(), &input).await?;
		tx.commit().await?;

		tracing::debug!(user_id = %member.id, "member invited");
		Ok(member)
	}
}
