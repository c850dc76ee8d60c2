//! Backend entry-point: loads settings, wires adapters, and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use portal_backend::config::AppSettings;
use portal_backend::domain::ports::{NotificationSink, UserDirectory};
use portal_backend::inbound::http::health::HealthState;
use portal_backend::outbound::email::{HttpEmailSink, HttpEmailSinkConfig, LogNotificationSink};
use portal_backend::outbound::identity::JwtIdentityResolver;
use portal_backend::outbound::persistence::{
    DbPool, DieselUserDirectory, PoolConfig, run_pending_migrations,
};
use portal_backend::outbound::razorpay::{RazorpayCredentials, RazorpayHttpGateway};
use server::{Persistence, ServerConfig, create_server};

fn startup_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

fn build_notification_sink(settings: &AppSettings) -> std::io::Result<Arc<dyn NotificationSink>> {
    let endpoint = settings
        .email_api_url()
        .map_err(|err| startup_error("invalid email settings", err))?;
    let Some(endpoint) = endpoint else {
        warn!("email API not configured; notifications will only be logged");
        return Ok(Arc::new(LogNotificationSink));
    };
    let api_key = settings
        .email_api_key()
        .map_err(|err| startup_error("invalid email settings", err))?;
    let sink = HttpEmailSink::new(HttpEmailSinkConfig {
        endpoint,
        api_key,
        from: settings.email_from().to_owned(),
        timeout: settings.razorpay_timeout(),
    })
    .map_err(|err| startup_error("failed to build email client", err))?;
    Ok(Arc::new(sink))
}

async fn build_persistence(
    settings: &AppSettings,
    database_url: &str,
) -> std::io::Result<Persistence> {
    run_pending_migrations(database_url)
        .await
        .map_err(|err| startup_error("migrations failed", err))?;
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(|err| startup_error("failed to build database pool", err))?;

    let credentials = RazorpayCredentials {
        key_id: settings
            .razorpay_key_id()
            .map_err(|err| startup_error("invalid gateway settings", err))?
            .to_owned(),
        key_secret: settings
            .razorpay_key_secret()
            .map_err(|err| startup_error("invalid gateway settings", err))?,
    };
    let base_url = settings
        .razorpay_base_url()
        .map_err(|err| startup_error("invalid gateway settings", err))?;
    let gateway = RazorpayHttpGateway::new(&base_url, credentials, settings.razorpay_timeout())
        .map_err(|err| startup_error("failed to build gateway client", err))?;

    let jwt_secret = settings
        .jwt_secret()
        .map_err(|err| startup_error("invalid token settings", err))?;
    let directory: Arc<dyn UserDirectory> = Arc::new(DieselUserDirectory::new(pool.clone()));
    let identity = JwtIdentityResolver::new(&jwt_secret, directory);

    Ok(Persistence::new(pool, Arc::new(gateway), Arc::new(identity)))
}

async fn build_server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let config = ServerConfig::new(settings.bind_addr(), build_notification_sink(settings)?);
    let Some(database_url) = settings.database_url() else {
        warn!("no database configured; serving in-memory fixtures");
        return Ok(config);
    };
    let persistence = build_persistence(settings, database_url).await?;
    let key_id = settings
        .razorpay_key_id()
        .map_err(|err| startup_error("invalid gateway settings", err))?
        .to_owned();
    let secret = settings
        .razorpay_key_secret()
        .map_err(|err| startup_error("invalid gateway settings", err))?;
    Ok(config
        .with_persistence(persistence)
        .with_razorpay_keys(key_id, secret))
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

    let settings =
        AppSettings::load().map_err(|err| startup_error("failed to load settings", err))?;
    let config = build_server_config(&settings).await?;
    let bind_addr = settings.bind_addr();

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "portal backend listening");
    let outcome = server.await;
    health_state.start_draining();
    outcome
}
