// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compliance record routes.
//!
//! One generic handler set is mounted per record type at
//! `/api/{E::PATH}` and `/api/{E::PATH}/{id}`. Scope comes from the
//! `tenantId`/`projectId` query parameters; remaining query parameters on
//! list are equality filters.

use std::collections::HashMap;

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::IntoResponse,
	routing::get,
	Json, Router,
};
use tessera_server_db::{
	BiodiversityResource, Document, IncidentReport, Record, RiskIdentification, RiskScreening,
	ScopedEntity, ScopedRepository, Stakeholder, Subproject, TrainingLog,
};

use crate::{
	api::AppState,
	auth_middleware::RequireScope,
	error::ServerError,
	validation::{list_filter, parse_record_id, JsonBody},
};

pub fn router() -> Router<AppState> {
	Router::new()
		.merge(record_routes::<BiodiversityResource>())
		.merge(record_routes::<RiskIdentification>())
		.merge(record_routes::<Subproject>())
		.merge(record_routes::<RiskScreening>())
		.merge(record_routes::<IncidentReport>())
		.merge(record_routes::<Stakeholder>())
		.merge(record_routes::<Document>())
		.merge(record_routes::<TrainingLog>())
}

/// Routes for one record type.
pub fn record_routes<E: ScopedEntity>() -> Router<AppState> {
	let collection = format!("/api/{}", E::PATH);
	let item = format!("/api/{}/{{id}}", E::PATH);
	Router::new()
		.route(&collection, get(list_records::<E>).post(create_record::<E>))
		.route(
			&item,
			get(get_record::<E>)
				.put(update_record::<E>)
				.delete(delete_record::<E>),
		)
}

fn repo<E: ScopedEntity>(state: &AppState) -> ScopedRepository<E> {
	ScopedRepository::new(state.pool.clone())
}

#[tracing::instrument(skip_all, fields(entity = E::KIND))]
async fn list_records<E: ScopedEntity>(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Record<E>>>, ServerError> {
	let filter = list_filter(&params)?;
	let records = repo::<E>(&state).list(&scope, &filter).await?;
	Ok(Json(records))
}

#[tracing::instrument(skip_all, fields(entity = E::KIND, %id))]
async fn get_record<E: ScopedEntity>(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Record<E>>, ServerError> {
	let id = parse_record_id(&id)?;
	Ok(Json(repo::<E>(&state).get(&scope, id).await?))
}

#[tracing::instrument(skip_all, fields(entity = E::KIND))]
async fn create_record<E: ScopedEntity>(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	JsonBody(payload): JsonBody<E>,
) -> Result<impl IntoResponse, ServerError> {
	let record = repo::<E>(&state).create(&scope, payload).await?;
	Ok((StatusCode::CREATED, Json(record)))
}

#[tracing::instrument(skip_all, fields(entity = E::KIND, %id))]
async fn update_record<E: ScopedEntity>(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
	JsonBody(payload): JsonBody<E>,
) -> Result<Json<Record<E>>, ServerError> {
	let id = parse_record_id(&id)?;
	Ok(Json(repo::<E>(&state).update(&scope, id, payload).await?))
}

#[tracing::instrument(skip_all, fields(entity = E::KIND, %id))]
async fn delete_record<E: ScopedEntity>(
	RequireScope(scope): RequireScope,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
	let id = parse_record_id(&id)?;
	repo::<E>(&state).delete(&scope, id).await?;
	Ok(StatusCode::NO_CONTENT)
}
