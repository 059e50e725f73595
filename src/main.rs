use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use r_plus::config::Config;
use r_plus::github::OctocrabClient;
use r_plus::server::{AppState, build_router, load_acceptor, serve_tls};
use r_plus::tracker::ReviewTracker;

/// Gates pull requests on a number of r+ approvals.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "r_plus=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let reporter = OctocrabClient::from_token(
        config.access_token.clone(),
        config.repo_id().clone(),
        config.api_base.as_deref(),
    )
    .context("failed to build GitHub client")?
    .with_status_context(config.status_context.clone())
    .with_timeout(config.status_timeout);

    let tracker = ReviewTracker::new(reporter, config.approval_policy());
    let server = &config.webhook_server;
    let state = AppState::new(
        tracker,
        config.approval_pattern().clone(),
        server.secret.as_bytes(),
    );
    let router = build_router(state, &server.pr_path, &server.comment_path);

    let acceptor = server
        .tls
        .as_ref()
        .map(|tls| load_acceptor(&tls.certificate, &tls.key))
        .transpose()
        .context("failed to load TLS certificate")?;

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .with_context(|| format!("failed to bind {}", server.addr))?;

    info!(
        repo = %config.repo_id(),
        addr = %server.addr,
        pr_path = %server.pr_path,
        comment_path = %server.comment_path,
        required_reviews = config.required_reviews,
        tls = acceptor.is_some(),
        "Listening"
    );

    match acceptor {
        Some(acceptor) => serve_tls(listener, acceptor, router).await?,
        None => axum::serve(listener, router).await?,
    }

    Ok(())
}
