use std::time::Duration;

mod api;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod recipes;
mod sessions;
mod state;
#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;
    let sweep_every = config.session.sweep_interval_secs;

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let state = AppState::from_pool(pool, config);
    let sweeper = (sweep_every > 0)
        .then(|| sessions::spawn_sweeper(state.sessions.clone(), Duration::from_secs(sweep_every)));

    let app = app::build_app(state)?;
    let served = app::serve(app, addr).await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    served
}
