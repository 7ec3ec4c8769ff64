// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a resolved form and a mergeable layer.

mod auth;
mod database;
mod http;
mod logging;

pub use auth::{AuthConfig, AuthConfigLayer, DEFAULT_SESSION_COOKIE, DEFAULT_SESSION_TTL_HOURS};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
