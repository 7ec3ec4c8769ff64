// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Tessera server.
//!
//! Sources are layered (highest wins):
//! 1. Environment variables (`TESSERA_SERVER_*`)
//! 2. Config file (`/etc/tessera/server.toml`)
//! 3. Built-in defaults

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		session_ttl_hours = config.auth.session_ttl_hours,
		"Server configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.http.port == 0 {
		return Err(ConfigError::Validation("http.port must not be 0".to_string()));
	}
	if config.auth.session_ttl_hours < 1 {
		return Err(ConfigError::Validation(
			"auth.session_ttl_hours must be at least 1".to_string(),
		));
	}
	if config.auth.session_cookie.trim().is_empty() {
		return Err(ConfigError::Validation(
			"auth.session_cookie must not be empty".to_string(),
		));
	}
	if config.database.url.trim().is_empty() {
		return Err(ConfigError::Validation("database.url must not be empty".to_string()));
	}
	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be at least 1".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	struct Fixed(Precedence, ServerConfigLayer);

	impl ConfigSource for Fixed {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn port_layer(port: u16) -> ServerConfigLayer {
		ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(port),
			}),
			..Default::default()
		}
	}

	#[test]
	fn higher_precedence_wins_regardless_of_order() {
		let config = load_from(vec![
			Box::new(Fixed(Precedence::Environment, port_layer(9300))),
			Box::new(Fixed(Precedence::ConfigFile, port_layer(9200))),
		])
		.unwrap();
		assert_eq!(config.http.port, 9300);
	}

	#[test]
	fn defaults_are_valid() {
		let config = finalize(ServerConfigLayer::default()).unwrap();
		assert_eq!(config.auth.session_cookie, "tessera_session");
		assert_eq!(config.auth.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS);
		assert!(!config.logging.json);
	}

	#[test]
	fn zero_port_is_rejected() {
		let err = finalize(port_layer(0)).unwrap_err();
		assert!(err.to_string().contains("http.port"));
	}

	#[test]
	fn zero_ttl_is_rejected() {
		let layer = ServerConfigLayer {
			auth: Some(AuthConfigLayer {
				session_ttl_hours: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn blank_database_url_is_rejected() {
		let layer = ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("   ".into()),
				max_connections: None,
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "0.0.0.0".to_string(),
				port: 9000,
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "0.0.0.0:9000");
	}

	proptest! {
		#[test]
		fn any_nonzero_port_and_ttl_validate(port in 1u16.., ttl in 1u32..10_000) {
			let layer = ServerConfigLayer {
				http: Some(HttpConfigLayer { host: None, port: Some(port) }),
				auth: Some(AuthConfigLayer {
					session_ttl_hours: Some(ttl),
					..Default::default()
				}),
				..Default::default()
			};
			let config = finalize(layer).unwrap();
			prop_assert_eq!(config.http.port, port);
			prop_assert_eq!(config.auth.session_ttl_hours, ttl);
		}
	}
}
