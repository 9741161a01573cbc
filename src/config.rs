//! Runtime configuration
//!
//! Service settings come from CLI flags (with env fallbacks). Pi-holes are
//! read from numbered environment variables, optionally loaded from `.env`:
//!
//! ```text
//! PIHOLE_URL=http://10.0.0.2      PIHOLE_PASSWORD=...   PIHOLE_NAME=primary
//! PIHOLE2_URL=http://10.0.0.3     PIHOLE2_PASSWORD=...  PIHOLE2_NAME=secondary
//! ```
//!
//! Scanning stops at the first missing `*_URL`.

use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{GatewayError, Result};

#[derive(Parser, Debug, Clone)]
#[command(name = "pihole-gateway")]
#[command(about = "Multi-Pi-hole DNS management gateway", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address the tool API listens on
    #[arg(long, env = "GATEWAY_BIND", default_value = "127.0.0.1:8383")]
    pub bind: SocketAddr,

    /// Lifetime of deletion confirmation tokens, in seconds
    #[arg(long, env = "DELETE_TOKEN_TTL_SECS", default_value_t = 600)]
    pub token_ttl_secs: u64,

    /// Timeout for each Pi-hole API call, in seconds
    #[arg(long, env = "PIHOLE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection settings for one Pi-hole.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,
    pub password: String,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn env_prefix(index: usize) -> String {
    if index == 1 {
        "PIHOLE".to_string()
    } else {
        format!("PIHOLE{}", index)
    }
}

/// Keep a `.env` load error only if the file exists but could not be read or
/// parsed. A missing file is normal.
pub fn dotenv_problem<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

/// Read Pi-hole definitions from the process environment.
pub fn backends_from_env() -> Result<Vec<BackendConfig>> {
    backends_from(|key| std::env::var(key).ok())
}

/// Read Pi-hole definitions through `lookup`.
pub fn backends_from<F>(lookup: F) -> Result<Vec<BackendConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut configs = Vec::new();

    for index in 1.. {
        let prefix = env_prefix(index);
        let Some(url) = lookup(&format!("{}_URL", prefix)).filter(|u| !u.trim().is_empty())
        else {
            break;
        };

        configs.push(BackendConfig {
            name: lookup(&format!("{}_NAME", prefix))
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("pihole{}", index)),
            url: url.trim().to_string(),
            password: lookup(&format!("{}_PASSWORD", prefix)).unwrap_or_default(),
        });
    }

    if configs.is_empty() {
        return Err(GatewayError::Config(
            "PIHOLE_URL must be set (add PIHOLE2_URL, PIHOLE3_URL, ... for more Pi-holes)"
                .to_string(),
        ));
    }
    Ok(configs)
}
