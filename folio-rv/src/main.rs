//! folio-rv - submission review service
//!
//! HTTP service for onboarding intake, staff review, and payment webhooks.
//! Shares the SQLite database with folio-dp, which consumes the deployment
//! queue this service feeds.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use folio_common::config::Config;
use folio_common::db::init_database_pool;
use folio_rv::services::email::mailer_from_config;
use folio_rv::services::payment::HttpPaymentProvider;
use folio_rv::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "folio-rv", about = "Portfolio submission review service")]
struct Args {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:5731 (overrides config)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Folio Review (folio-rv) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(db) = args.database {
        config.database.path = db;
    }
    if let Some(bind) = args.bind {
        config.review.bind = bind;
    }
    config.ensure_data_dir()?;

    info!("Database path: {}", config.database.path.display());
    let pool = init_database_pool(&config.database.path).await?;
    info!("✓ Database ready");

    if config.review.admin_token.is_empty() {
        info!("Admin authentication disabled (no admin token configured)");
    }
    if config.payment.webhook_secret.is_empty() {
        info!("Webhook processing disabled (no webhook secret configured)");
    }

    let payments = Arc::new(HttpPaymentProvider::new(
        config.payment.base_url.clone(),
        config.payment.secret_key.clone(),
    ));
    let mailer = mailer_from_config(&config.email);

    let state = AppState::new(
        pool,
        payments,
        mailer,
        config.review.admin_token.clone(),
        config.payment.webhook_secret.clone(),
        config.hosting.apex_domain.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.review.bind).await?;
    info!("folio-rv listening on {}", config.review.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
