// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface for tenant-scoped compliance records.

pub mod api;
pub mod auth_middleware;
pub mod error;
pub mod routes;
pub mod validation;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use tessera_server_config::ServerConfig;
