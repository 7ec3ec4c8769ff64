// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tessera_server_auth::DenyReason;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Outcome of a scoped operation that did not succeed.
///
/// Every variant except [`ScopeError::Storage`] is an expected, user-facing
/// result. None of them carry data from outside the caller's tenant.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
	#[error("tenant context is required")]
	MissingTenantContext,

	#[error("project context is required for {entity}")]
	MissingProjectContext { entity: &'static str },

	#[error("project does not belong to tenant")]
	ProjectNotInTenant,

	#[error("authentication required")]
	Unauthenticated,

	#[error("not a member of this tenant")]
	NotAMember,

	#[error("forbidden: {0}")]
	Forbidden(DenyReason),

	#[error("{entity} not found")]
	NotFound { entity: &'static str },

	#[error("{entity} with this {field} already exists")]
	DuplicateKey {
		entity: &'static str,
		field: &'static str,
	},

	#[error("{entity} is referenced by {referrer} records")]
	ReferencedByOtherRecords {
		entity: &'static str,
		referrer: &'static str,
	},

	#[error("validation failed: {0}")]
	Validation(String),

	#[error(transparent)]
	Storage(#[from] DbError),
}

impl ScopeError {
	/// Stable machine-readable code for the error.
	pub fn code(&self) -> &'static str {
		match self {
			ScopeError::MissingTenantContext => "missing_tenant_context",
			ScopeError::MissingProjectContext { .. } => "missing_project_context",
			ScopeError::ProjectNotInTenant => "project_not_in_tenant",
			ScopeError::Unauthenticated => "unauthenticated",
			ScopeError::NotAMember => "not_a_member",
			ScopeError::Forbidden(_) => "forbidden",
			ScopeError::NotFound { .. } => "not_found",
			ScopeError::DuplicateKey { .. } => "duplicate_key",
			ScopeError::ReferencedByOtherRecords { .. } => "referenced_by_other_records",
			ScopeError::Validation(_) => "validation_error",
			ScopeError::Storage(_) => "storage_error",
		}
	}

	pub fn validation(message: impl Into<String>) -> Self {
		ScopeError::Validation(message.into())
	}
}

impl From<sqlx::Error> for ScopeError {
	fn from(e: sqlx::Error) -> Self {
		ScopeError::Storage(DbError::Sqlx(e))
	}
}

impl From<DenyReason> for ScopeError {
	fn from(reason: DenyReason) -> Self {
		ScopeError::Forbidden(reason)
	}
}

/// Returns true if the error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
	matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Returns true if the error is a FOREIGN KEY constraint violation.
pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
	matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
