//! Atlas auth service binary.
//!
//! Wires the Postgres-backed store, the credential service, and the
//! admission controller into the HTTP router and serves it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use atlas_api::config::ApiConfig;
use atlas_core::auth::service::AuthService;
use atlas_core::clock::{Clock, SystemClock};
use atlas_core::ratelimit::RateLimiter;
use atlas_core::store::postgres::PgUserStore;

/// CLI arguments; everything else comes from the environment via
/// [`ApiConfig`].
#[derive(Parser, Debug)]
#[command(name = "atlas_auth_server", about = "Atlas authentication service")]
struct Args {
    /// Address to bind, overriding BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,atlas_api=debug,atlas_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    // Refuses to start on a short secret or an out-of-range bcrypt cost.
    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    info!(bind_addr = %config.bind_addr, "starting atlas_auth_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(config.store_timeout)
        .connect(&config.database_url)
        .await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(PgUserStore::with_timeout(pool, config.store_timeout));
    let auth = Arc::new(AuthService::new(
        store,
        clock.clone(),
        config.jwt_secret.clone(),
        config.bcrypt_cost,
        config.access_token_ttl,
        config.refresh_token_ttl,
    ));

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_per_minute,
        Duration::from_secs(60),
        clock.clone(),
    ));
    limiter.spawn_sweeper();

    let state = atlas_api::AppState {
        auth,
        limiter,
        clock: clock.clone(),
        started_at: clock.now(),
    };

    let app = atlas_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "auth API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
