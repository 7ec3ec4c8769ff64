// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP error mapping.
//!
//! | Error | Status |
//! |---|---|
//! | missing tenant/project context, project not in tenant, validation, duplicate key, referenced | 400 |
//! | unauthenticated | 401 |
//! | not a member, forbidden | 403 |
//! | not found | 404 |
//! | storage | 500 |

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tessera_server_db::{DbError, ScopeError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Scope(#[from] ScopeError),
}

impl From<DbError> for ServerError {
	fn from(e: DbError) -> Self {
		ServerError::Scope(ScopeError::Storage(e))
	}
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
	pub error: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

pub(crate) fn status_for(e: &ScopeError) -> StatusCode {
	match e {
		ScopeError::MissingTenantContext
		| ScopeError::MissingProjectContext { .. }
		| ScopeError::ProjectNotInTenant
		| ScopeError::Validation(_)
		| ScopeError::DuplicateKey { .. }
		| ScopeError::ReferencedByOtherRecords { .. } => StatusCode::BAD_REQUEST,
		ScopeError::Unauthenticated => StatusCode::UNAUTHORIZED,
		ScopeError::NotAMember | ScopeError::Forbidden(_) => StatusCode::FORBIDDEN,
		ScopeError::NotFound { .. } => StatusCode::NOT_FOUND,
		ScopeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

/// Caller-safe details. Deny reasons and storage errors stay in the logs.
fn details_for(e: &ScopeError) -> Option<Value> {
	match e {
		ScopeError::MissingProjectContext { entity } | ScopeError::NotFound { entity } => {
			Some(json!({ "entity": entity }))
		}
		ScopeError::DuplicateKey { entity, field } => {
			Some(json!({ "entity": entity, "field": field }))
		}
		ScopeError::ReferencedByOtherRecords { entity, referrer } => {
			Some(json!({ "entity": entity, "referrer": referrer }))
		}
		ScopeError::Validation(message) => Some(json!({ "message": message })),
		_ => None,
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let ServerError::Scope(e) = self;
		let status = status_for(&e);

		if let ScopeError::Storage(ref inner) = e {
			tracing::error!(error = %inner, "storage failure");
		} else {
			tracing::debug!(code = e.code(), status = status.as_u16(), "request rejected");
		}

		let body = ErrorBody {
			error: e.code(),
			details: details_for(&e),
		};
		(status, Json(body)).into_response()
	}
}
