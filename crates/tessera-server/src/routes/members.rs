// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant membership routes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tessera_server_db::{Member, NewMember};

use crate::{
	api::AppState, auth_middleware::RequireScope, error::ServerError, validation::JsonBody,
};

pub fn router() -> Router<AppState> {
	Router::new().route("/api/members", get(list_members).post(invite_member))
}

#[tracing::instrument(skip_all)]
pub async fn list_members(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
) -> Result<Json<Vec<Member>>, ServerError> {
	Ok(Json(state.members.list(&scope).await?))
}

#[tracing::instrument(skip_all)]
pub async fn invite_member(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	JsonBody(input): JsonBody<NewMember>,
) -> Result<impl IntoResponse, ServerError> {
	let member = state.members.invite(&scope, input).await?;
	Ok((StatusCode::CREATED, Json(member)))
}
