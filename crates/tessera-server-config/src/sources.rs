// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and environment
//! variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/tessera/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults. Every section falls back to its own defaults at
/// finalize time, so this contributes an empty layer.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `TESSERA_SERVER_<FIELD>`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_vars(|name| std::env::var(name).ok())
	}
}

struct Vars<F> {
	lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
	fn string(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.string(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parsed<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.string(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

fn layer_from_vars(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfigLayer, ConfigError> {
	let vars = Vars { lookup };
	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: vars.string("TESSERA_SERVER_HOST"),
			port: vars.parsed("TESSERA_SERVER_PORT", "u16")?,
		}),
		database: Some(DatabaseConfigLayer {
			url: vars.string("TESSERA_SERVER_DATABASE_URL"),
			max_connections: vars.parsed("TESSERA_SERVER_DATABASE_MAX_CONNECTIONS", "u32")?,
		}),
		auth: Some(AuthConfigLayer {
			session_ttl_hours: vars.parsed("TESSERA_SERVER_SESSION_TTL_HOURS", "u32")?,
			session_cookie: vars.string("TESSERA_SERVER_SESSION_COOKIE"),
			session_cleanup_interval_secs: vars
				.parsed("TESSERA_SERVER_SESSION_CLEANUP_INTERVAL_SECS", "u64")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: vars.string("TESSERA_SERVER_LOG_LEVEL"),
			json: vars.bool("TESSERA_SERVER_LOG_JSON"),
		}),
	})
}
