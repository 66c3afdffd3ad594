use anyhow::Context;
use pulse_session::config::AppConfig;
use pulse_session::error::AppError;
use pulse_session::resolver::SessionPolicy;
use pulse_session::routes::create_router;
use pulse_session::state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    if config.runtime_mode.is_production() && config.uses_dev_cookie_secret() {
        warn!("COOKIE_SECRET is not set, sealed sessions use the development key");
    }
    info!(
        "runtime mode {}, demo sessions {}",
        config.runtime_mode,
        if SessionPolicy::from(&config).demo_sessions_enabled() {
            "on"
        } else {
            "off"
        }
    );

    let state = AppState::new(config.clone());
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service())
        .await
        .context("server terminated")?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,pulse_session=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
