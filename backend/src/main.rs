//! Backend entry-point: loads configuration, runs migrations and starts the
//! HTTP server.

mod server;

use std::ffi::OsString;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use codetok::AppSettings;
use codetok::inbound::http::health::HealthState;
use codetok::inbound::http::session_config::{BuildMode, session_settings_from_env};
use codetok::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{ServerConfig, create_server};

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

    let settings = AppSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| std::io::Error::other(format!("configuration: {err}")))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    let database_url = settings.database_url().map(str::to_owned);
    let pool_size = settings.db_pool_size();
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        settings,
    );
    if let Some(url) = database_url {
        run_migrations(&url)
            .await
            .map_err(|err| std::io::Error::other(format!("migrations: {err}")))?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(pool_size))
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    info!(addr = %config.bind_addr(), "starting server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
