//! newsdesk-server - newsroom content-management service
//!
//! Configuration priority: command line, then environment (including a
//! `.env` file), then the TOML config file, then compiled defaults.

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use newsdesk_ai::AgentService;
use newsdesk_common::config::{load_toml, ConfigOverrides, ServerConfig};
use newsdesk_server::{build_router, AppState, AuthSettings};

/// Command-line arguments for newsdesk-server
#[derive(Parser, Debug)]
#[command(name = "newsdesk-server")]
#[command(about = "Newsroom content-management API")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "NEWSDESK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "NEWSDESK_DATABASE")]
    database: Option<PathBuf>,

    /// Directory served under /uploads
    #[arg(long, env = "NEWSDESK_UPLOADS")]
    uploads: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "NEWSDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Token lifetime, e.g. `7d` or `12h`
    #[arg(long, env = "JWT_EXPIRE")]
    jwt_expire: Option<String>,

    /// Browser origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    unsplash_access_key: Option<String>,
}

impl Args {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host,
            port: self.port,
            database_path: self.database,
            uploads_dir: self.uploads,
            jwt_secret: self.jwt_secret,
            jwt_expire: self.jwt_expire,
            frontend_url: self.frontend_url,
            openai_api_key: self.openai_api_key,
            groq_api_key: self.groq_api_key,
            unsplash_access_key: self.unsplash_access_key,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must load before clap reads the environment
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting newsdesk-server v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();
    let toml = load_toml(args.config.as_deref())?;
    let config = ServerConfig::resolve(args.overrides(), toml)?;

    info!("Database: {}", config.database_path.display());
    let pool = newsdesk_common::db::init_database(&config.database_path).await?;

    log_providers(&config);
    let agents = AgentService::from_keys(
        config.openai_api_key.clone(),
        config.groq_api_key.clone(),
        config.unsplash_access_key.clone(),
    )
    .context("Failed to initialize AI agents")?;

    std::fs::create_dir_all(&config.uploads_dir).with_context(|| {
        format!("Failed to create uploads directory {}", config.uploads_dir.display())
    })?;

    let state = AppState::new(
        pool,
        agents,
        AuthSettings::new(config.jwt_secret.clone(), config.jwt_lifetime),
    );

    let hub = state.hub.clone();
    let app = build_router(state)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .layer(cors_layer(&config.frontend_url)?)
        .layer(TraceLayer::new_for_http());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open article streams never finish on their own
            hub.close_all();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Allow the configured browser origin, with credentials
fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .with_context(|| format!("Invalid FRONTEND_URL: {}", frontend_url))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

fn log_providers(config: &ServerConfig) {
    let status = |key: &Option<String>| if key.is_some() { "configured" } else { "not configured" };
    info!("OpenAI: {}", status(&config.openai_api_key));
    info!("Groq: {}", status(&config.groq_api_key));
    info!("Unsplash: {}", status(&config.unsplash_access_key));

    if config.openai_api_key.is_none() && config.groq_api_key.is_none() {
        warn!("No LLM provider configured; text agents will report errors");
    }
}

/// Resolves on Ctrl+C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
