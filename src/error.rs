//! Gateway error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// An explicitly named backend is not configured.
    #[error("Pi-hole '{0}' not found")]
    UnknownTarget(String),

    /// Transport or auth failure while talking to one backend.
    #[error("Error processing Pi-hole '{backend}': {source:#}")]
    Remote {
        backend: String,
        #[source]
        source: anyhow::Error,
    },

    /// Confirmation token is unknown, expired, already used, or issued for
    /// another host. Callers never learn which.
    #[error("invalid or expired confirmation token")]
    InvalidToken,

    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn remote(backend: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Remote {
            backend: backend.into(),
            source,
        }
    }
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
