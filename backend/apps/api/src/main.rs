//! Demo API Server Entry Point
//!
//! Wires the authem core against PostgreSQL and a signed-cookie host
//! environment. Subject records come from a hardcoded demo directory;
//! real applications bring their own subject storage and credential
//! checks and hand the authenticated record to the session core.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use authem::presentation::http_env::HttpEnvConfig;
use authem::{
    AuthemConfig, PgSessionRepository, RequestEnv, RoleOptions, RoleRegistry, SessionRepository,
};
use axum::http::{Method, header};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,authem=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = PgSessionRepository::new(pool);

    // Startup housekeeping: lookups already exclude expired rows, purging
    // them is best-effort and must not prevent startup
    match repo.cleanup_expired().await {
        Ok(deleted) => tracing::info!(sessions_deleted = deleted, "Session cleanup completed"),
        Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
    }

    let state = handlers::AppState {
        registry: Arc::new(build_registry()),
        repo: Arc::new(repo),
        env_config: Arc::new(HttpEnvConfig {
            secret: load_secret()?,
            ..HttpEnvConfig::default()
        }),
    };

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    tracing::info!(%addr, "Listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_registry() -> RoleRegistry {
    let mut registry = RoleRegistry::with_config(AuthemConfig {
        verify_client_auth_token: env::var("AUTHEM_VERIFY_CLIENT_TOKEN").is_ok(),
    });

    registry
        .register(
            "user",
            "User",
            RoleOptions {
                ttl: chrono::Duration::days(1),
                ..RoleOptions::default()
            },
        )
        .expect("fresh registry");

    registry
        .register(
            "admin",
            "AdminUser",
            RoleOptions {
                ttl: chrono::Duration::hours(2),
                verify_client_auth_token: true,
                ..RoleOptions::default()
            },
        )
        .expect("fresh registry");

    registry
        .set_deny_access(
            "user",
            Arc::new(|env: &mut dyn RequestEnv| env.redirect_to("/sign-in")),
        )
        .expect("role registered above");

    registry
}

fn load_secret() -> anyhow::Result<[u8; 32]> {
    match env::var("AUTHEM_SECRET") {
        Ok(encoded) => {
            let bytes = general_purpose::STANDARD
                .decode(encoded.trim())
                .context("AUTHEM_SECRET must be base64")?;
            let secret: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .ok()
                .context("AUTHEM_SECRET must decode to 32 bytes")?;
            Ok(secret)
        }
        Err(_) => {
            tracing::warn!("AUTHEM_SECRET not set; using a random secret, sessions will not survive restarts");
            let mut secret = [0u8; 32];
            secret.copy_from_slice(&platform::crypto::random_bytes(32));
            Ok(secret)
        }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(AllowMethods::list([Method::GET, Method::POST]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("client-auth-token"),
        ]))
}
