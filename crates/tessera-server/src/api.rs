// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePool;
use tessera_server_config::ServerConfig;
use tessera_server_db::{
	MemberRepository, ProjectRepository, ScopeResolver, SessionRepository, SessionStore,
};
use tower_http::trace::TraceLayer;

use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub scopes: ScopeResolver,
	pub sessions: Arc<dyn SessionStore>,
	pub projects: Arc<ProjectRepository>,
	pub members: Arc<MemberRepository>,
	pub config: Arc<ServerConfig>,
}

pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	AppState {
		scopes: ScopeResolver::new(pool.clone()),
		sessions: Arc::new(SessionRepository::new(pool.clone())),
		projects: Arc::new(ProjectRepository::new(pool.clone())),
		members: Arc::new(MemberRepository::new(pool.clone())),
		config: Arc::new(config.clone()),
		pool,
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.merge(routes::records::router())
		.merge(routes::projects::router())
		.merge(routes::members::router())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
