// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request authentication and scope extraction.
//!
//! [`RequireAuth`] resolves the session token (bearer header first, then the
//! session cookie) to a [`Principal`]. [`RequireScope`] additionally resolves
//! the `tenantId`/`projectId` query parameters into a [`RequestScope`].
//! Tokens are never logged.

use axum::{
	extract::{FromRequestParts, Query},
	http::{
		header::{AUTHORIZATION, COOKIE},
		request::Parts,
		HeaderMap,
	},
};
use tessera_server_auth::Principal;
use tessera_server_db::{RequestScope, ScopeError, ScopeParams};
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

/// Extract the value of `cookie_name` from the Cookie header.
pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get(COOKIE)?
		.to_str()
		.ok()?
		.split(';')
		.find_map(|cookie| {
			let (name, value) = cookie.trim().split_once('=')?;
			(name == cookie_name).then(|| value.to_string())
		})
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	headers
		.get(AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
		.map(|token| token.trim().to_string())
		.filter(|token| !token.is_empty())
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ServerError;

	#[instrument(level = "trace", skip_all)]
	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let token = extract_bearer_token(&parts.headers).or_else(|| {
			extract_session_cookie_with_name(&parts.headers, &state.config.auth.session_cookie)
		});
		let Some(token) = token else {
			return Err(ScopeError::Unauthenticated.into());
		};

		match state.sessions.resolve_principal(&token).await? {
			Some(principal) => Ok(RequireAuth(principal)),
			None => {
				tracing::debug!("session token did not resolve");
				Err(ScopeError::Unauthenticated.into())
			}
		}
	}
}

/// An authenticated caller with a validated tenant (and optional project)
/// scope.
#[derive(Debug, Clone)]
pub struct RequireScope(pub RequestScope);

impl FromRequestParts<AppState> for RequireScope {
	type Rejection = ServerError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;
		let Query(params) = Query::<ScopeParams>::from_request_parts(parts, state)
			.await
			.map_err(|e| ScopeError::validation(e.body_text()))?;

		let scope = state.scopes.resolve(&principal, &params).await?;
		Ok(RequireScope(scope))
	}
}
