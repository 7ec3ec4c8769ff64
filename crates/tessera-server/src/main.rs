// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tessera server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tessera_server::{create_app_state, create_router};
use tessera_server_config::ServerConfig;
use tessera_server_db::{
	create_pool, run_migrations, Onboarding, SessionRepository, SessionStore, TenantRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Tessera server - tenant-scoped compliance records over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tessera-server", about = "Tenant-scoped compliance records server", version)]
struct Args {
	/// Config file (defaults to /etc/tessera/server.toml)
	#[arg(long, global = true, env = "TESSERA_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version and build information
	Version,
	/// Create a tenant with its first admin and print an admin session token
	Onboard {
		#[arg(long)]
		name: String,
		#[arg(long)]
		slug: String,
		#[arg(long)]
		admin_email: String,
		#[arg(long, default_value = "Administrator")]
		admin_name: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => tessera_server_config::load_config_with_file(path)?,
		None => tessera_server_config::load_config()?,
	};

	init_tracing(&config);

	let pool = create_pool(&config.database.url, config.database.max_connections).await?;
	run_migrations(&pool).await?;

	match args.command {
		Some(Command::Onboard {
			name,
			slug,
			admin_email,
			admin_name,
		}) => {
			let (tenant, admin) = TenantRepository::new(pool.clone())
				.onboard(Onboarding {
					name,
					slug,
					admin_email,
					admin_display_name: admin_name,
				})
				.await?;
			let (_, token) = SessionRepository::new(pool)
				.create_session(&admin.id, config.auth.session_ttl_hours)
				.await?;
			println!("tenant id:     {}", tenant.id);
			println!("admin user id: {}", admin.id);
			println!("session token: {token}");
			Ok(())
		}
		_ => serve(pool, config).await,
	}
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());

	if config.logging.json {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init();
	}
}

async fn serve(
	pool: sqlx::SqlitePool,
	config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting tessera-server"
	);

	let state = create_app_state(pool, &config);
	let cleanup = spawn_session_cleanup(
		state.sessions.clone(),
		Duration::from_secs(config.auth.session_cleanup_interval_secs.max(1)),
	);
	let app = create_router(state);

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!("listening on {}", addr);

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	cleanup.abort();
	tracing::info!("Server shutdown complete");
	Ok(())
}

fn spawn_session_cleanup(
	sessions: Arc<dyn SessionStore>,
	every: Duration,
) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(every);
		loop {
			interval.tick().await;
			if let Err(e) = sessions.delete_expired().await {
				tracing::warn!(error = %e, "session cleanup failed");
			}
		}
	})
}
