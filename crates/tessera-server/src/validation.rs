// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request input parsing shared by handlers.

use std::collections::HashMap;

use axum::{
	extract::{FromRequest, Request},
	Json,
};
use serde::de::DeserializeOwned;
use tessera_server_auth::{ProjectId, RecordId, UserId};
use tessera_server_db::{ListFilter, ScopeError};

use crate::error::ServerError;

fn parse_path_id<T>(
	raw: &str,
	field: &str,
	parse: impl FnOnce(&str) -> Result<T, uuid::Error>,
) -> Result<T, ScopeError> {
	parse(raw.trim()).map_err(|_| ScopeError::validation(format!("{field} is not a valid id")))
}

pub fn parse_record_id(raw: &str) -> Result<RecordId, ScopeError> {
	parse_path_id(raw, "id", RecordId::parse)
}

pub fn parse_project_id(raw: &str) -> Result<ProjectId, ScopeError> {
	parse_path_id(raw, "project id", ProjectId::parse)
}

pub fn parse_user_id(raw: &str) -> Result<UserId, ScopeError> {
	parse_path_id(raw, "user id", UserId::parse)
}

/// Query parameters that are not payload filters.
const RESERVED_PARAMS: &[&str] = &["tenantId", "projectId", "limit", "offset"];

fn parse_paging(params: &HashMap<String, String>, name: &str) -> Result<Option<u32>, ScopeError> {
	params
		.get(name)
		.map(|v| {
			v.parse::<u32>()
				.map_err(|_| ScopeError::validation(format!("{name} must be a non-negative integer")))
		})
		.transpose()
}

/// Build a [`ListFilter`] from the raw query string. Every non-reserved
/// parameter becomes an equality filter; the repository rejects unknown
/// columns.
pub fn list_filter(params: &HashMap<String, String>) -> Result<ListFilter, ScopeError> {
	let mut equals: Vec<(String, String)> = params
		.iter()
		.filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
		.map(|(k, v)| (k.clone(), v.clone()))
		.collect();
	equals.sort();

	Ok(ListFilter {
		equals,
		limit: parse_paging(params, "limit")?,
		offset: parse_paging(params, "offset")?,
	})
}

/// JSON body whose rejection is reported as a validation error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = ServerError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state)
			.await
			.map_err(|e| ScopeError::validation(e.body_text()))?;
		Ok(JsonBody(value))
	}
}
