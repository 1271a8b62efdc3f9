//! Academy - course marketplace backend
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for the HTTP API with rate limiting
//! - Plugin runtime for the server and background jobs
//! - Tokio for async runtime

mod auth;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, cron, server},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "academy=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting Academy v{}", env!("CARGO_PKG_VERSION"));

  let config = Config::from_env()?;
  let app = Arc::new(AppState::new(config).await?);

  App::new()
    .register(server::Plugin)
    .register(cron::Reconcile)
    .run(app)
    .await
}
