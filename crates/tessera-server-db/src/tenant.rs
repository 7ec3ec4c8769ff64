// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenants and onboarding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};
use tessera_server_auth::{Role, TenantId};

use crate::error::{is_unique_violation, DbError, ScopeError};
use crate::member::{insert_member, Member, NewMember};
use crate::row::{format_ts, get_ts, get_uuid};
use crate::validation::{require_text, validate_slug, SLUG_MAX_LEN, SLUG_MIN_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
	pub id: TenantId,
	pub name: String,
	pub slug: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Input for [`TenantRepository::onboard`].
#[derive(Debug, Clone, Deserialize)]
pub struct Onboarding {
	pub name: String,
	pub slug: String,
	pub admin_email: String,
	pub admin_display_name: String,
}

#[derive(Clone)]
pub struct TenantRepository {
	pool: SqlitePool,
}

impl TenantRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a tenant and its first ADMIN in one transaction.
	///
	/// # Errors
	/// - `Validation` for a bad name, slug or email.
	/// - `DuplicateKey` if the slug or the admin email is taken.
	#[tracing::instrument(skip(self, input), fields(slug = %input.slug))]
	pub async fn onboard(&self, input: Onboarding) -> Result<(Tenant, Member), ScopeError> {
		require_text("name", &input.name).map_err(ScopeError::Validation)?;
		let slug = input.slug.trim().to_string();
		if !validate_slug(&slug) {
			return Err(ScopeError::validation(format!(
				"slug must be {SLUG_MIN_LEN}-{SLUG_MAX_LEN} lowercase letters, digits or hyphens, starting and ending with a letter or digit"
			)));
		}
		let admin = NewMember {
			email: input.admin_email,
			display_name: input.admin_display_name,
			role: Role::Admin,
		};
		admin.validate()?;

		let now = Utc::now();
		let tenant = Tenant {
			id: TenantId::generate(),
			name: input.name.trim().to_string(),
			slug,
			created_at: now,
			updated_at: now,
		};

		let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
		sqlx::query(
			r#"
			INSERT INTO tenants (id, name, slug, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(tenant.id.to_string())
		.bind(&tenant.name)
		.bind(&tenant.slug)
		.bind(format_ts(now))
		.bind(format_ts(now))
		.execute(&mut *tx)
		.await
		.map_err(|e| {
			if is_unique_violation(&e) {
				ScopeError::DuplicateKey {
					entity: "tenant",
					field: "slug",
				}
			} else {
				e.into()
			}
		})?;

		let member = insert_member(&mut tx, tenant.id, &admin).await?;
		tx.commit().await?;

		tracing::info!(tenant_id = %tenant.id, admin_id = %member.id, "tenant onboarded");
		Ok((tenant, member))
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn get_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError> {
		let row = sqlx::query(
			"SELECT id, name, slug, created_at, updated_at FROM tenants WHERE id = ?",
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_tenant(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, DbError> {
		let row = sqlx::query(
			"SELECT id, name, slug, created_at, updated_at FROM tenants WHERE slug = ?",
		)
		.bind(slug)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_tenant(&r)).transpose()
	}

	fn row_to_tenant(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Tenant, DbError> {
		Ok(Tenant {
			id: TenantId::new(get_uuid(row, "id")?),
			name: row.get("name"),
			slug: row.get("slug"),
			created_at: get_ts(row, "created_at")?,
			updated_at: get_ts(row, "updated_at")?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::identity::IdentityResolver;
	use crate::testing::TestDb;
	use tessera_server_auth::Principal;

	fn onboarding(slug: &str, email: &str) -> Onboarding {
		Onboarding {
			name: "Acme Mining".into(),
			slug: slug.into(),
			admin_email: email.into(),
			admin_display_name: "Ana Admin".into(),
		}
	}

	#[tokio::test]
	async fn onboarding_creates_tenant_and_admin() {
		let db = TestDb::new().await;
		let repo = TenantRepository::new(db.pool.clone());

		let (tenant, admin) = repo
			.onboard(onboarding("acme", "ana@acme.example"))
			.await
			.unwrap();
		assert_eq!(admin.role, Role::Admin);
		assert_eq!(admin.tenant_id, tenant.id);

		let by_slug = repo.get_by_slug("acme").await.unwrap().unwrap();
		assert_eq!(by_slug.id, tenant.id);
		assert_eq!(repo.get_by_id(&tenant.id).await.unwrap(), Some(by_slug));

		let identity = IdentityResolver::new(db.pool.clone())
			.resolve(&Principal::new(admin.id), tenant.id)
			.await
			.unwrap();
		assert_eq!(identity.role, Role::Admin);
	}

	#[tokio::test]
	async fn duplicate_slug_is_rejected() {
		let db = TestDb::new().await;
		let repo = TenantRepository::new(db.pool.clone());

		repo.onboard(onboarding("acme", "a@acme.example")).await.unwrap();
		assert!(matches!(
			repo.onboard(onboarding("acme", "b@acme.example")).await,
			Err(ScopeError::DuplicateKey { field: "slug", .. })
		));
	}

	#[tokio::test]
	async fn taken_admin_email_rolls_back_the_tenant() {
		let db = TestDb::new().await;
		let repo = TenantRepository::new(db.pool.clone());

		repo.onboard(onboarding("first", "ana@acme.example")).await.unwrap();
		assert!(matches!(
			repo.onboard(onboarding("second", "ana@acme.example")).await,
			Err(ScopeError::DuplicateKey { field: "email", .. })
		));
		assert_eq!(repo.get_by_slug("second").await.unwrap(), None);
	}

	#[tokio::test]
	async fn invalid_slug_is_rejected() {
		let db = TestDb::new().await;
		let repo = TenantRepository::new(db.pool.clone());

		for slug in ["ab", "Acme", "-acme", "acme_co"] {
			assert!(
				matches!(
					repo.onboard(onboarding(slug, "x@acme.example")).await,
					Err(ScopeError::Validation(_))
				),
				"{slug}"
			);
		}
	}
}
