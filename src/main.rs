#[macro_use]
extern crate lazy_static;

#[macro_use]
mod macros;

mod api;
mod cli;
mod cookies;
mod db;
mod email;
mod env;
mod error;
mod html;
mod media;
mod routes;
mod templates;
mod traits;
mod util;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use clap::Parser;
use eyre::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use error::{AppError, AppResult};
pub use templates::render_html_template;
pub use traits::RequestBody;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<env::SiteConfig>,
}

impl AppState {
    #[cfg(test)]
    pub fn for_tests(pool: SqlitePool) -> Self {
        Self {
            pool,
            config: Arc::new(env::SiteConfig::for_tests()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&*env::RUST_LOG))
        .init();

    let args = cli::Args::parse();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&env::DATABASE_URL)
        .await
        .wrap_err("can't connect to database")?;

    let state = AppState {
        pool,
        config: Arc::new(env::SiteConfig::from_env()?),
    };

    match args.command.unwrap_or_default() {
        cli::Command::Run => {
            state.migrate().await?;
            if state.config.admin_token.is_empty() {
                tracing::warn!("ADMIN_TOKEN is not set; admin pages are disabled");
            }
            if state.config.smtp.is_none() {
                tracing::info!("SMTP is not configured; email notifications are disabled");
            }

            let app = routes::router()
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
                .with_state(state);

            let listener = tokio::net::TcpListener::bind(&*env::BIND_ADDRESS)
                .await
                .wrap_err_with(|| format!("can't bind to {}", *env::BIND_ADDRESS))?;
            tracing::info!("listening on {}", *env::BIND_ADDRESS);
            axum::serve(listener, app).await?;
        }
        cli::Command::Migrate => {
            state.migrate().await?;
            tracing::info!("database migrated");
        }
        cli::Command::Reset => state.reset().await?,
        cli::Command::InitPages => {
            state.migrate().await?;
            state.init_pages().await?;
            tracing::info!("pages initialized");
        }
    }

    Ok(())
}
