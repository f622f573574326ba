mod app;
mod auth;
mod cache;
mod config;
mod db;
mod error;
mod pokemon;
mod state;
mod validator;

#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pokemon_store=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(!config.is_development());

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    if config.basic_auth.hashed_password.is_none() {
        tracing::warn!("BASIC_AUTH_HASHED_PASSWORD not set; basic-auth routes will reject everyone");
    }

    let db = db::connect(&config).await?;
    db::migrate(&db).await?;

    let state = AppState::init(config, db)?;
    tracing::info!(env = ?state.config.env, base_url = %state.config.base_url, "starting");

    app::serve(app::build_app(state)).await
}
