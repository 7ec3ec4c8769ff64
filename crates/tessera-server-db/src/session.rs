// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session storage.
//!
//! Raw tokens are returned once at creation and never stored; lookups go
//! through the SHA-256 hash.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use tessera_server_auth::{
	generate_session_token, hash_token, session_expiry, Principal, SessionId, UserId,
};

use crate::error::DbError;
use crate::row::{format_ts, get_ts, get_uuid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
	pub id: SessionId,
	pub user_id: UserId,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
	async fn create_session(
		&self,
		user_id: &UserId,
		ttl_hours: u32,
	) -> Result<(Session, String), DbError>;
	async fn resolve_principal(&self, token: &str) -> Result<Option<Principal>, DbError>;
	async fn revoke(&self, token: &str) -> Result<bool, DbError>;
	async fn delete_expired(&self) -> Result<u64, DbError>;
}

#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a session and return it with its raw token.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn create_session(
		&self,
		user_id: &UserId,
		ttl_hours: u32,
	) -> Result<(Session, String), DbError> {
		let token = generate_session_token();
		let now = Utc::now();
		let session = Session {
			id: SessionId::generate(),
			user_id: *user_id,
			created_at: now,
			expires_at: session_expiry(now, ttl_hours),
		};

		sqlx::query(
			r#"
			INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(session.id.to_string())
		.bind(user_id.to_string())
		.bind(hash_token(&token))
		.bind(format_ts(session.created_at))
		.bind(format_ts(session.expires_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(session_id = %session.id, "session created");
		Ok((session, token))
	}

	/// Resolve a raw token to the principal it authenticates.
	///
	/// # Returns
	/// `None` for unknown or expired tokens and for deleted users.
	#[tracing::instrument(skip(self, token))]
	pub async fn resolve_principal(&self, token: &str) -> Result<Option<Principal>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT s.user_id, s.expires_at
			FROM sessions s
			JOIN users u ON u.id = s.user_id
			WHERE s.token_hash = ? AND u.deleted_at IS NULL
			"#,
		)
		.bind(hash_token(token))
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		if get_ts(&row, "expires_at")? <= Utc::now() {
			tracing::debug!("session expired");
			return Ok(None);
		}

		Ok(Some(Principal::new(UserId::new(get_uuid(&row, "user_id")?))))
	}

	/// Revoke the session for a raw token. Returns whether one existed.
	#[tracing::instrument(skip(self, token))]
	pub async fn revoke(&self, token: &str) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
			.bind(hash_token(token))
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
			.bind(format_ts(Utc::now()))
			.execute(&self.pool)
			.await?;
		let removed = result.rows_affected();
		if removed > 0 {
			tracing::info!(removed, "expired sessions removed");
		}
		Ok(removed)
	}

	/// Sessions for a user, newest first.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Session>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, user_id, created_at, expires_at
			FROM sessions
			WHERE user_id = ?
			ORDER BY created_at DESC
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(|r| self.row_to_session(r)).collect()
	}

	fn row_to_session(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Session, DbError> {
		Ok(Session {
			id: SessionId::new(get_uuid(row, "id")?),
			user_id: UserId::new(get_uuid(row, "user_id")?),
			created_at: get_ts(row, "created_at")?,
			expires_at: get_ts(row, "expires_at")?,
		})
	}
}

#[async_trait]
impl SessionStore for SessionRepository {
	async fn create_session(
		&self,
		user_id: &UserId,
		ttl_hours: u32,
	) -> Result<(Session, String), DbError> {
		self.create_session(user_id, ttl_hours).await
	}

	async fn resolve_principal(&self, token: &str) -> Result<Option<Principal>, DbError> {
		self.resolve_principal(token).await
	}

	async fn revoke(&self, token: &str) -> Result<bool, DbError> {
		self.revoke(token).await
	}

	async fn delete_expired(&self) -> Result<u64, DbError> {
		self.delete_expired().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{Fixture, TestDb};

	#[tokio::test]
	async fn token_resolves_to_principal() {
		let db = TestDb::new().await;
		let f = Fixture::new(&db).await;
		let repo = SessionRepository::new(db.pool.clone());

		let (session, token) = repo.create_session(&f.user, 24).await.unwrap();
		assert_eq!(session.user_id, f.user);
		assert_eq!(token.len(), 64);

		let principal = repo.resolve_principal(&token).await.unwrap();
		assert_eq!(principal, Some(Principal::new(f.user)));
	}

	#[tokio::test]
	async fn raw_token_is_not_stored() {
		let db = TestDb::new().await;
		let f = Fixture::new(&db).await;
		let repo = SessionRepository::new(db.pool.clone());

		let (_, token) = repo.create_session(&f.user, 24).await.unwrap();
		let stored: String = sqlx::query_scalar("SELECT token_hash FROM sessions")
			.fetch_one(&db.pool)
			.await
			.unwrap();
		assert_ne!(stored, token);
		assert_eq!(stored, hash_token(&token));
	}

	#[tokio::test]
	async fn unknown_and_revoked_tokens_resolve_to_none() {
		let db = TestDb::new().await;
		let f = Fixture::new(&db).await;
		let repo = SessionRepository::new(db.pool.clone());

		assert_eq!(repo.resolve_principal("nope").await.unwrap(), None);

		let (_, token) = repo.create_session(&f.admin, 1).await.unwrap();
		assert!(repo.revoke(&token).await.unwrap());
		assert!(!repo.revoke(&token).await.unwrap());
		assert_eq!(repo.resolve_principal(&token).await.unwrap(), None);
	}

	#[tokio::test]
	async fn expired_sessions_are_ignored_and_purged() {
		let db = TestDb::new().await;
		let f = Fixture::new(&db).await;
		let repo = SessionRepository::new(db.pool.clone());

		let (session, token) = repo.create_session(&f.admin, 1).await.unwrap();
		sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
			.bind(format_ts(Utc::now() - chrono::Duration::minutes(1)))
			.bind(session.id.to_string())
			.execute(&db.pool)
			.await
			.unwrap();

		assert_eq!(repo.resolve_principal(&token).await.unwrap(), None);
		assert_eq!(repo.delete_expired().await.unwrap(), 1);
		assert!(repo.list_for_user(&f.admin).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn deleted_user_sessions_do_not_resolve() {
		let db = TestDb::new().await;
		let f = Fixture::new(&db).await;
		let repo = SessionRepository::new(db.pool.clone());

		let (_, token) = repo.create_session(&f.manager, 24).await.unwrap();
		sqlx::query("UPDATE users SET deleted_at = created_at WHERE id = ?")
			.bind(f.manager.to_string())
			.execute(&db.pool)
			.await
			.unwrap();
		assert_eq!(repo.resolve_principal(&token).await.unwrap(), None);
	}
}
