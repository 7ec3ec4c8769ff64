// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Liveness endpoint.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub database: HealthStatus,
	pub duration_ms: u64,
	pub version: &'static str,
}

/// GET /health - process liveness plus a database ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let start = Instant::now();

	let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
		.fetch_one(&state.pool)
		.await
	{
		Ok(_) => HealthStatus::Healthy,
		Err(e) => {
			tracing::error!(error = %e, "database health check failed");
			HealthStatus::Unhealthy
		}
	};

	let (status, http_status) = match database {
		HealthStatus::Healthy => (HealthStatus::Healthy, StatusCode::OK),
		HealthStatus::Unhealthy => (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE),
	};

	let response = HealthResponse {
		status,
		database,
		duration_ms: start.elapsed().as_millis() as u64,
		version: env!("CARGO_PKG_VERSION"),
	};

	(http_status, Json(response))
}
