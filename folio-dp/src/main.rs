//! folio-dp - deployment pipeline service
//!
//! Shares the SQLite database with folio-rv and turns approved submissions
//! into live static sites.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use folio_common::config::Config;
use folio_common::db::init_database_pool;
use folio_common::email::mailer_from_config;
use folio_dp::services::hosting::HttpHostingProvider;
use folio_dp::services::worker::{poll_loop, DeployWorker};
use folio_dp::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "folio-dp", about = "Portfolio deployment pipeline service")]
struct Args {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:5732 (overrides config)
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
        "Starting Folio Deploy (folio-dp) v{} [{}] built {} ({})",
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
        config.deploy.bind = bind;
    }
    config.ensure_data_dir()?;

    info!("Database path: {}", config.database.path.display());
    let pool = init_database_pool(&config.database.path).await?;
    info!("✓ Database ready");

    let hosting = Arc::new(HttpHostingProvider::new(&config.hosting));
    let mailer = mailer_from_config(&config.email);

    let worker = Arc::new(DeployWorker::new(
        pool.clone(),
        hosting,
        mailer,
        config.hosting.apex_domain.clone(),
        config.hosting.project_prefix.clone(),
        config.deploy.batch_size,
        config.deploy.max_retries,
    ));

    if config.deploy.poll_interval_secs > 0 {
        info!(
            "Built-in poll loop enabled ({}s interval)",
            config.deploy.poll_interval_secs
        );
        tokio::spawn(poll_loop(
            worker.clone(),
            config.deploy.poll_interval_secs,
        ));
    } else {
        info!("External trigger mode (POST /deploy)");
    }

    let state = AppState {
        db: pool,
        worker,
        cron_secret: config.deploy.cron_secret.clone(),
        admin_token: config.review.admin_token.clone(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.deploy.bind).await?;
    info!("folio-dp listening on {}", config.deploy.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
