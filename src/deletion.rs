//! Deletion Orchestrator
//!
//! Drives the two-phase delete for A and CNAME records:
//!
//! 1. **Preview** (no token): resolve targets, fetch each backend's records,
//!    match the host, store the plan and hand back a confirmation token.
//! 2. **Confirm** (token): redeem the token and replay the stored plan against
//!    the backends. Remote failures are collected per entry, never retried.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::Backends;
use crate::error::{GatewayError, Result};
use crate::records::{find_matches, PlannedDeletion, RecordDetails, RecordKind};
use crate::resolver::resolve_one;
use crate::tokens::TokenStore;

/// A planned entry whose remote removal returned an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDeletion {
    #[serde(flatten)]
    pub entry: PlannedDeletion,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    /// No matching record on any selected backend.
    NotFound,
    /// Preview result; nothing was deleted yet.
    PendingDeletion {
        planned: Vec<PlannedDeletion>,
        token: String,
    },
    /// Confirm result. The token is spent whatever `failed` holds.
    Deleted {
        deleted: Vec<PlannedDeletion>,
        failed: Vec<FailedDeletion>,
    },
    InvalidToken,
}

pub struct DeletionOrchestrator {
    backends: Backends,
    tokens: Arc<TokenStore>,
}

impl DeletionOrchestrator {
    pub fn new(backends: Backends, tokens: Arc<TokenStore>) -> Self {
        Self { backends, tokens }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn delete_a_record(
        &self,
        host: &str,
        confirm: Option<&str>,
        pihole: Option<&str>,
    ) -> Result<DeletionOutcome> {
        self.request_deletion(RecordKind::A, host, confirm, pihole)
            .await
    }

    pub async fn delete_cname_record(
        &self,
        host: &str,
        confirm: Option<&str>,
        pihole: Option<&str>,
    ) -> Result<DeletionOutcome> {
        self.request_deletion(RecordKind::Cname, host, confirm, pihole)
            .await
    }

    /// Preview when `confirm` is `None`, otherwise redeem the token.
    ///
    /// `pihole` only narrows the preview; a confirm replays whatever the
    /// token's plan recorded, and only for the kind and host it was issued for.
    pub async fn request_deletion(
        &self,
        kind: RecordKind,
        host: &str,
        confirm: Option<&str>,
        pihole: Option<&str>,
    ) -> Result<DeletionOutcome> {
        self.tokens.reap();

        match confirm {
            Some(token) => match self.tokens.consume(token, kind, host) {
                Ok(entries) => Ok(self.execute(kind, host, entries).await),
                Err(GatewayError::InvalidToken) => {
                    warn!("Rejected {} deletion confirm for '{}'", kind, host);
                    Ok(DeletionOutcome::InvalidToken)
                }
                Err(e) => Err(e),
            },
            None => self.preview(kind, host, pihole).await,
        }
    }

    async fn preview(
        &self,
        kind: RecordKind,
        host: &str,
        pihole: Option<&str>,
    ) -> Result<DeletionOutcome> {
        let targets = resolve_one(&self.backends, pihole)?;

        let mut planned = Vec::new();
        for name in &targets {
            let backend = self
                .backends
                .get(name)
                .ok_or_else(|| GatewayError::UnknownTarget(name.clone()))?;

            let section = backend
                .get_config_section(kind.section())
                .await
                .map_err(|e| GatewayError::remote(name.as_str(), e))?;

            planned.extend(find_matches(kind, name, &kind.raw_records(&section), host));
        }

        if planned.is_empty() {
            info!("No {} records for '{}' on {} Pi-hole(s)", kind, host, targets.len());
            return Ok(DeletionOutcome::NotFound);
        }

        let token = self.tokens.create(kind, host, planned.clone());
        info!(
            "Planned deletion of {} {} record(s) for '{}'",
            planned.len(),
            kind,
            host
        );
        Ok(DeletionOutcome::PendingDeletion { planned, token })
    }

    async fn execute(
        &self,
        kind: RecordKind,
        host: &str,
        entries: Vec<PlannedDeletion>,
    ) -> DeletionOutcome {
        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for entry in entries {
            let result = match self.backends.get(&entry.pihole) {
                None => Err(anyhow::anyhow!("Pi-hole '{}' is no longer configured", entry.pihole)),
                Some(backend) => match &entry.details {
                    RecordDetails::A(r) => backend.remove_a_record(&r.host, &r.ip).await,
                    RecordDetails::Cname(r) => {
                        backend
                            .remove_cname_record(&r.host, &r.target, r.ttl)
                            .await
                    }
                },
            };

            match result {
                Ok(()) => {
                    warn!("🗑️  Deleted '{}' from {}", entry.record, entry.pihole);
                    deleted.push(entry);
                }
                Err(e) => {
                    warn!(
                        "Failed to delete '{}' from {}: {:#}",
                        entry.record, entry.pihole, e
                    );
                    failed.push(FailedDeletion {
                        entry,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            "{} deletion for '{}' finished: {} deleted, {} failed",
            kind,
            host,
            deleted.len(),
            failed.len()
        );
        DeletionOutcome::Deleted { deleted, failed }
    }
}

// ============================================================
// Tool Response
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    NotFound,
    PendingDeletion,
    Deleted,
    InvalidToken,
    Error,
}

/// JSON shape returned by the `remove_local_*_record` tools.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionResponse {
    pub status: DeletionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<Vec<PlannedDeletion>>,
    #[serde(rename = "confirmationToken", skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<PlannedDeletion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<FailedDeletion>>,
    pub message: String,
}

impl DeletionResponse {
    pub fn new(kind: RecordKind, host: &str, result: Result<DeletionOutcome>) -> Self {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => return Self::bare(DeletionStatus::Error, e.to_string()),
        };

        match outcome {
            DeletionOutcome::NotFound => {
                let message = match kind {
                    RecordKind::A => format!(
                        "No A records for '{}' exist in any selected Pi-hole; nothing to delete",
                        host
                    ),
                    RecordKind::Cname => format!(
                        "No CNAME records for '{}' exist in any selected Pi-hole",
                        host
                    ),
                };
                Self::bare(DeletionStatus::NotFound, message)
            }
            DeletionOutcome::PendingDeletion { planned, token } => {
                let message = format!(
                    "To confirm deletion of {} record(s) from {} Pi-hole(s), call again with confirm='{}'",
                    planned.len(),
                    pihole_count(&planned),
                    token
                );
                Self {
                    planned: Some(planned),
                    confirmation_token: Some(token),
                    ..Self::bare(DeletionStatus::PendingDeletion, message)
                }
            }
            DeletionOutcome::Deleted { deleted, failed } => {
                let noun = match kind {
                    RecordKind::A => "record(s)",
                    RecordKind::Cname => "CNAME record(s)",
                };
                let mut message = format!(
                    "Removed {} {} from {} Pi-hole(s)",
                    deleted.len(),
                    noun,
                    pihole_count(&deleted)
                );
                if !failed.is_empty() {
                    message.push_str(&format!(
                        "; {} removal(s) failed, run the deletion again to retry",
                        failed.len()
                    ));
                }
                Self {
                    deleted: Some(deleted),
                    failed: (!failed.is_empty()).then_some(failed),
                    ..Self::bare(DeletionStatus::Deleted, message)
                }
            }
            DeletionOutcome::InvalidToken => Self::bare(
                DeletionStatus::InvalidToken,
                "Invalid or expired confirmation token. Call again without confirm to get a new token"
                    .to_string(),
            ),
        }
    }

    fn bare(status: DeletionStatus, message: String) -> Self {
        Self {
            status,
            planned: None,
            confirmation_token: None,
            deleted: None,
            failed: None,
            message,
        }
    }
}

fn pihole_count(entries: &[PlannedDeletion]) -> usize {
    entries
        .iter()
        .map(|e| e.pihole.as_str())
        .collect::<HashSet<_>>()
        .len()
}
