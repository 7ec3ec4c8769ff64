// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project and project-assignment routes.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	routing::{delete, get},
	Json, Router,
};
use serde::Deserialize;
use tessera_server_db::{Member, Project, ProjectInput};

use crate::{
	api::AppState,
	auth_middleware::RequireScope,
	error::ServerError,
	validation::{parse_project_id, parse_user_id, JsonBody},
};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/api/projects", get(list_projects).post(create_project))
		.route(
			"/api/projects/{id}",
			get(get_project).put(update_project).delete(delete_project),
		)
		.route(
			"/api/projects/{id}/members",
			get(list_project_members).post(assign_member),
		)
		.route(
			"/api/projects/{id}/members/{user_id}",
			delete(unassign_member),
		)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
	pub user_id: String,
}

#[tracing::instrument(skip_all)]
pub async fn list_projects(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, ServerError> {
	Ok(Json(state.projects.list(&scope).await?))
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_project(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Project>, ServerError> {
	let id = parse_project_id(&id)?;
	Ok(Json(state.projects.get(&scope, id).await?))
}

#[tracing::instrument(skip_all)]
pub async fn create_project(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	JsonBody(input): JsonBody<ProjectInput>,
) -> Result<impl IntoResponse, ServerError> {
	let project = state.projects.create(&scope, input).await?;
	Ok((StatusCode::CREATED, Json(project)))
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_project(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
	JsonBody(input): JsonBody<ProjectInput>,
) -> Result<Json<Project>, ServerError> {
	let id = parse_project_id(&id)?;
	Ok(Json(state.projects.update(&scope, id, input).await?))
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_project(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
	let id = parse_project_id(&id)?;
	state.projects.delete(&scope, id).await?;
	Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn list_project_members(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Vec<Member>>, ServerError> {
	let id = parse_project_id(&id)?;
	Ok(Json(state.projects.list_members(&scope, id).await?))
}

#[tracing::instrument(skip_all, fields(%id))]
pub async fn assign_member(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
	JsonBody(body): JsonBody<AssignRequest>,
) -> Result<StatusCode, ServerError> {
	let project_id = parse_project_id(&id)?;
	let user_id = parse_user_id(&body.user_id)?;
	state
		.projects
		.assign_member(&scope, project_id, user_id)
		.await?;
	Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(%id, %user_id))]
pub async fn unassign_member(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
	let project_id = parse_project_id(&id)?;
	let user_id = parse_user_id(&user_id)?;
	state
		.projects
		.unassign_member(&scope, project_id, user_id)
		.await?;
	Ok(StatusCode::NO_CONTENT)
}
