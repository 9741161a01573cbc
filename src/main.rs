//! Pi-hole Gateway
//!
//! Serves the multi-Pi-hole tool API. Deletions always take two calls:
//! a preview that returns a confirmation token, then a confirm with it.
//!
//! # Usage
//! ```bash
//! PIHOLE_URL=http://10.0.0.2 PIHOLE_PASSWORD=... pihole-gateway --bind 0.0.0.0:8383
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pihole_gateway::config::{backends_from_env, dotenv_problem, Cli};
use pihole_gateway::server::router;
use pihole_gateway::{Backends, DnsBackend, Gateway, PiholeClient, TokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);
    if cli.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("🚀 Pi-hole Gateway starting...");
    if let Some(e) = dotenv_problem(dotenv) {
        warn!("Ignoring unreadable .env file: {}", e);
    }

    let configs = backends_from_env()?;
    let mut clients = Vec::with_capacity(configs.len());
    for config in &configs {
        let client = PiholeClient::new(&config.url, &config.password, cli.timeout())
            .with_context(|| format!("Failed to create client for Pi-hole '{}'", config.name))?;
        info!("📡 Pi-hole '{}' at {}", config.name, config.url);
        clients.push((config.name.clone(), Arc::new(client)));
    }

    let backends = Backends::new(
        clients
            .iter()
            .map(|(name, client)| (name.clone(), Arc::clone(client) as Arc<dyn DnsBackend>))
            .collect(),
    )?;

    let tokens = Arc::new(TokenStore::new(cli.token_ttl()));
    info!(
        "Deletion tokens expire after {}s",
        tokens.ttl().as_secs()
    );

    let gateway = Arc::new(Gateway::new(backends, tokens));
    let app = router(gateway);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("✅ Gateway listening on {}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, releasing Pi-hole sessions");
    for (name, client) in &clients {
        if let Err(e) = client.logout().await {
            warn!("Failed to release session for '{}': {:#}", name, e);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
