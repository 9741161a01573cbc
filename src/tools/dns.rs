//! Local DNS record tools: list, add, and token-confirmed removal.

use serde::Serialize;
use tracing::info;

use super::{BackendResult, Gateway, ReadOp};
use crate::deletion::DeletionResponse;
use crate::error::{GatewayError, Result};
use crate::records::{ARecord, CnameRecord, RecordDetails, RecordKind};
use crate::resolver::resolve_one;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddStatus {
    Added,
    Exists,
    Partial,
    Error,
}

/// A canonical record string on one Pi-hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub pihole: String,
    pub record: String,
}

/// JSON shape returned by the `add_local_*_record` tools.
#[derive(Debug, Clone, Serialize)]
pub struct AddResponse {
    pub status: AddStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<Vec<RecordRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<Vec<RecordRef>>,
    pub message: String,
}

impl AddResponse {
    fn error(err: GatewayError) -> Self {
        Self {
            status: AddStatus::Error,
            added: None,
            existing: None,
            message: err.to_string(),
        }
    }

    fn summarize(record: &RecordDetails, added: Vec<RecordRef>, existing: Vec<RecordRef>) -> Self {
        let noun = match record.kind() {
            RecordKind::A => "Record",
            RecordKind::Cname => "CNAME record",
        };

        let (status, message) = match (added.is_empty(), existing.is_empty()) {
            (true, false) => (
                AddStatus::Exists,
                format!(
                    "{} '{}' already exists in {} Pi-hole(s)",
                    noun,
                    record,
                    existing.len()
                ),
            ),
            (false, true) => (
                AddStatus::Added,
                format!("{} added to {} Pi-hole(s)", noun, added.len()),
            ),
            _ => (
                AddStatus::Partial,
                format!(
                    "{} added to {} Pi-hole(s), already existed in {} Pi-hole(s)",
                    noun,
                    added.len(),
                    existing.len()
                ),
            ),
        };

        Self {
            status,
            added: (!added.is_empty()).then_some(added),
            existing: (!existing.is_empty()).then_some(existing),
            message,
        }
    }
}

impl Gateway {
    /// List the full `dns` config section (hosts and CNAMEs) of each Pi-hole.
    pub async fn list_local_dns(&self, piholes: Option<&[String]>) -> Vec<BackendResult> {
        self.fan_out(piholes, ReadOp::LocalDns).await
    }

    pub async fn add_a_record(&self, host: &str, ip: &str, pihole: Option<&str>) -> AddResponse {
        self.add_record(RecordDetails::A(ARecord::new(host, ip)), pihole)
            .await
    }

    pub async fn add_cname_record(
        &self,
        host: &str,
        target: &str,
        ttl: u32,
        pihole: Option<&str>,
    ) -> AddResponse {
        self.add_record(
            RecordDetails::Cname(CnameRecord::new(host, target, ttl)),
            pihole,
        )
        .await
    }

    pub async fn remove_a_record(
        &self,
        host: &str,
        confirm: Option<&str>,
        pihole: Option<&str>,
    ) -> DeletionResponse {
        let result = self.deletions().delete_a_record(host, confirm, pihole).await;
        DeletionResponse::new(RecordKind::A, host, result)
    }

    pub async fn remove_cname_record(
        &self,
        host: &str,
        confirm: Option<&str>,
        pihole: Option<&str>,
    ) -> DeletionResponse {
        let result = self
            .deletions()
            .delete_cname_record(host, confirm, pihole)
            .await;
        DeletionResponse::new(RecordKind::Cname, host, result)
    }

    async fn add_record(&self, record: RecordDetails, pihole: Option<&str>) -> AddResponse {
        match self.try_add_record(&record, pihole).await {
            Ok((added, existing)) => AddResponse::summarize(&record, added, existing),
            Err(e) => AddResponse::error(e),
        }
    }

    /// Add `record` to every target that lacks it. Stops at the first failing
    /// Pi-hole; earlier additions stay in place.
    async fn try_add_record(
        &self,
        record: &RecordDetails,
        pihole: Option<&str>,
    ) -> Result<(Vec<RecordRef>, Vec<RecordRef>)> {
        let kind = record.kind();
        let canonical = record.to_string();
        let mut added = Vec::new();
        let mut existing = Vec::new();

        for name in resolve_one(self.backends(), pihole)? {
            let backend = self
                .backends()
                .get(&name)
                .ok_or_else(|| GatewayError::UnknownTarget(name.clone()))?;

            let section = backend
                .get_config_section(kind.section())
                .await
                .map_err(|e| GatewayError::remote(name.as_str(), e))?;

            let entry = RecordRef {
                pihole: name.clone(),
                record: canonical.clone(),
            };
            if kind.raw_records(&section).contains(&canonical) {
                existing.push(entry);
                continue;
            }

            let result = match record {
                RecordDetails::A(r) => backend.add_a_record(&r.host, &r.ip).await,
                RecordDetails::Cname(r) => {
                    backend.add_cname_record(&r.host, &r.target, r.ttl).await
                }
            };
            result.map_err(|e| GatewayError::remote(name.as_str(), e))?;

            info!("➕ Added '{}' to {}", canonical, name);
            added.push(entry);
        }

        Ok((added, existing))
    }
}
