//! Backend abstraction
//!
//! A backend is one configured DNS-filtering appliance. The gateway only
//! talks to it through [`DnsBackend`], so the orchestration code can be driven
//! by the real HTTP client or by an in-memory fake in tests.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::GatewayError;

/// Filters accepted by the query log endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Number of queries to return
    pub length: Option<u32>,
    /// Unix timestamp lower bound
    pub from_ts: Option<i64>,
    /// Unix timestamp upper bound
    pub until_ts: Option<i64>,
    /// "cache", "blocklist", "permitted" or an upstream address
    pub upstream: Option<String>,
    /// Domain filter, `*` wildcards allowed
    pub domain: Option<String>,
    /// Client filter, `*` wildcards allowed
    pub client: Option<String>,
    /// Pagination cursor from a previous response
    pub cursor: Option<String>,
}

impl QueryFilter {
    /// Non-empty filters as `(name, value)` query parameters.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(length) = self.length {
            params.push(("length", length.to_string()));
        }
        if let Some(from) = self.from_ts {
            params.push(("from", from.to_string()));
        }
        if let Some(until) = self.until_ts {
            params.push(("until", until.to_string()));
        }
        if let Some(upstream) = &self.upstream {
            params.push(("upstream", upstream.clone()));
        }
        if let Some(domain) = &self.domain {
            params.push(("domain", domain.clone()));
        }
        if let Some(client) = &self.client {
            params.push(("client", client.clone()));
        }
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.clone()));
        }
        params
    }
}

/// Remote operations the gateway needs from one appliance.
///
/// Every call may fail independently with a transport or auth error.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    fn base_url(&self) -> &str;

    /// Fetch a config section such as `dns`, `dns/hosts` or `dns/cnameRecords`.
    async fn get_config_section(&self, section: &str) -> Result<Value>;

    async fn add_a_record(&self, host: &str, ip: &str) -> Result<()>;

    async fn remove_a_record(&self, host: &str, ip: &str) -> Result<()>;

    async fn add_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()>;

    async fn remove_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()>;

    async fn get_queries(&self, filter: &QueryFilter) -> Result<Value>;

    async fn get_query_suggestions(&self) -> Result<Value>;

    async fn get_history(&self) -> Result<Value>;
}

/// Immutable name → backend mapping, built once at startup.
///
/// Iteration follows configuration order so previews are reproducible.
#[derive(Clone)]
pub struct Backends {
    entries: Vec<(String, Arc<dyn DnsBackend>)>,
}

impl Backends {
    pub fn new(entries: Vec<(String, Arc<dyn DnsBackend>)>) -> Result<Self, GatewayError> {
        if entries.is_empty() {
            return Err(GatewayError::Config(
                "at least one Pi-hole must be configured".to_string(),
            ));
        }
        for (i, (name, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(other, _)| other == name) {
                return Err(GatewayError::Config(format!(
                    "duplicate Pi-hole name '{}'",
                    name
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DnsBackend>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, backend)| backend)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DnsBackend>)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(n, b)| (n, b.base_url())))
            .finish()
    }
}
