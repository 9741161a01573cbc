//! Gateway Tools
//!
//! Operations exposed to calling agents. Every tool fans out over the
//! configured Pi-holes; agents never hold appliance credentials.
//!
//! - Read tools take an optional `piholes` list and skip unknown names.
//! - Write tools take an optional single `pihole` and reject unknown names.

pub mod discovery;
pub mod dns;
pub mod metrics;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::backend::{Backends, DnsBackend, QueryFilter};
use crate::deletion::DeletionOrchestrator;
use crate::resolver::resolve_many;
use crate::tokens::TokenStore;

pub use discovery::{ToolCategory, ToolInfo};
pub use dns::{AddResponse, AddStatus, RecordRef};

/// Per-backend result of a read tool: `{pihole, data}` or `{pihole, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendResult {
    pub pihole: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendResult {
    fn from_result(pihole: &str, result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                pihole: pihole.to_string(),
                data: Some(data),
                error: None,
            },
            Err(e) => {
                warn!("Read from {} failed: {:#}", pihole, e);
                Self {
                    pihole: pihole.to_string(),
                    data: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    }
}

/// Read-only remote calls that fan out tolerantly.
#[derive(Debug, Clone)]
pub(crate) enum ReadOp {
    LocalDns,
    Queries(QueryFilter),
    QuerySuggestions,
    QueryHistory,
}

impl ReadOp {
    async fn run(&self, backend: &dyn DnsBackend) -> anyhow::Result<Value> {
        match self {
            ReadOp::LocalDns => backend.get_config_section("dns").await,
            ReadOp::Queries(filter) => backend.get_queries(filter).await,
            ReadOp::QuerySuggestions => backend.get_query_suggestions().await,
            ReadOp::QueryHistory => backend.get_history().await,
        }
    }
}

/// Entry point for all tool operations.
pub struct Gateway {
    backends: Backends,
    deletions: DeletionOrchestrator,
}

impl Gateway {
    pub fn new(backends: Backends, tokens: Arc<TokenStore>) -> Self {
        Self {
            deletions: DeletionOrchestrator::new(backends.clone(), tokens),
            backends,
        }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn deletions(&self) -> &DeletionOrchestrator {
        &self.deletions
    }

    /// Run `op` against each resolved backend in turn. A failing backend
    /// yields an error entry; the others still report.
    pub(crate) async fn fan_out(
        &self,
        piholes: Option<&[String]>,
        op: ReadOp,
    ) -> Vec<BackendResult> {
        let mut results = Vec::new();
        for name in resolve_many(&self.backends, piholes) {
            let Some(backend) = self.backends.get(&name) else {
                continue;
            };
            let result = op.run(backend.as_ref()).await;
            results.push(BackendResult::from_result(&name, result));
        }
        results
    }
}
