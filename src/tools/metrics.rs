//! Query log and activity metrics tools.

use super::{BackendResult, Gateway, ReadOp};
use crate::backend::QueryFilter;

/// Queries returned when the caller does not ask for a length.
pub const DEFAULT_QUERY_LENGTH: u32 = 10;

impl Gateway {
    /// Recent query log entries from each Pi-hole.
    ///
    /// `domain` and `client` filters accept `*` wildcards at any position, e.g.
    /// `*google*`, `*.com` or `192.168.1.*`.
    pub async fn list_queries(
        &self,
        piholes: Option<&[String]>,
        mut filter: QueryFilter,
    ) -> Vec<BackendResult> {
        filter.length.get_or_insert(DEFAULT_QUERY_LENGTH);
        self.fan_out(piholes, ReadOp::Queries(filter)).await
    }

    /// Filter suggestions (domains, clients, upstreams, types, statuses…).
    pub async fn list_query_suggestions(&self, piholes: Option<&[String]>) -> Vec<BackendResult> {
        self.fan_out(piholes, ReadOp::QuerySuggestions).await
    }

    /// Activity graph data: query counts over time.
    pub async fn list_query_history(&self, piholes: Option<&[String]>) -> Vec<BackendResult> {
        self.fan_out(piholes, ReadOp::QueryHistory).await
    }
}
