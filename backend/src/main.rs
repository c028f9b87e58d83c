//! Backend entry-point: loads settings, prepares storage and serves the
//! REST adapter.

mod server;

use std::sync::Arc;

use actix_web::cookie::SameSite;
use actix_web::web;
use mockable::{Clock, DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use addon_backend::inbound::http::health::HealthState;
use addon_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use addon_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use addon_backend::settings::GameSettings;
use server::{ServerConfig, create_server};

fn io_other(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GameSettings::load().map_err(io_other)?;
    let session =
        session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(io_other)?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        SameSite::Lax,
        settings.bind_addr(),
    );
    if let Some(database_url) = settings.database_url.as_deref() {
        run_pending_migrations(database_url)
            .await
            .map_err(io_other)?;
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(io_other)?;
        config = config.with_db_pool(pool);
        info!("using PostgreSQL persistence");
    } else {
        warn!("ADDON_DATABASE_URL not set; state is kept in memory and lost on restart");
    }
    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(server::make_metrics()?));
    }

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config, &settings, &clock)?;
    server.await
}
