use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediathekarr_core::{
    load_config, validate_config, CachedEpisodeLookup, EpisodeLookup, HttpEpisodeLookup,
    HttpRulesetSource, ItemSource, MediathekClient, RefreshTrigger, RulesetSource, RulesetStore,
    SearchService,
};
use mediathekarr_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = VERSION, "Starting mediathekarr");

    // Determine config path
    let config_path = std::env::var("MEDIATHEKARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Content search API: {}", config.mediathek.url);
    info!("Ruleset metadata API: {}", config.rulesets.url);
    info!("Episode lookup API: {}", config.episodes.url);
    if config.server.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        info!("Newznab API key required");
    }

    // Content search
    let items: Arc<dyn ItemSource> = Arc::new(
        MediathekClient::new(config.mediathek.clone())
            .context("Failed to create content search client")?,
    );

    // Rulesets
    let ruleset_source: Arc<dyn RulesetSource> = Arc::new(
        HttpRulesetSource::new(&config.rulesets)
            .context("Failed to create ruleset metadata client")?,
    );
    let rulesets = Arc::new(RulesetStore::new(
        ruleset_source,
        config.rulesets.max_pages,
    ));

    // Episode lookup, cached
    let episode_client: Arc<dyn EpisodeLookup> = Arc::new(
        HttpEpisodeLookup::new(&config.episodes)
            .context("Failed to create episode lookup client")?,
    );
    let episodes: Arc<dyn EpisodeLookup> = Arc::new(CachedEpisodeLookup::new(
        episode_client,
        Duration::from_secs(config.episodes.cache_ttl_secs),
    ));

    let search = SearchService::new(
        items,
        rulesets.clone(),
        episodes,
        &config.server.public_url,
        Duration::from_secs(config.cache.ttl_secs),
    )
    .with_refresh_on_search(config.rulesets.refresh_on_search);

    // Initial ruleset load runs in the background so the server answers
    // immediately; searches before it completes see an empty index.
    {
        let rulesets = rulesets.clone();
        tokio::spawn(async move {
            match rulesets.refresh(RefreshTrigger::Startup).await {
                Ok(count) => info!(rulesets = count, "Initial ruleset load complete"),
                Err(e) => warn!(error = %e, "Initial ruleset load failed"),
            }
        });
    }

    // Periodic refresh
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let refresh_handle = if config.rulesets.refresh_interval_secs > 0 {
        Some(rulesets.clone().spawn_refresh_loop(
            Duration::from_secs(config.rulesets.refresh_interval_secs),
            shutdown_rx,
        ))
    } else {
        info!("Periodic ruleset refresh disabled");
        None
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, Arc::new(search)));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Stop the refresh loop
    let _ = shutdown_tx.send(());
    if let Some(handle) = refresh_handle {
        let _ = handle.await;
        info!("Ruleset refresh loop stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
