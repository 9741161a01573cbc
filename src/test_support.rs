//! In-memory backend used by unit tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{Backends, DnsBackend, QueryFilter};

#[derive(Default)]
pub struct FakeBackend {
    hosts: Mutex<Vec<String>>,
    cnames: Mutex<Vec<String>>,
    fail_fetch: AtomicBool,
    fail_removal_of: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    fetches: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts(self, records: &[&str]) -> Self {
        *self.hosts.lock().unwrap() = records.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_cnames(self, records: &[&str]) -> Self {
        *self.cnames.lock().unwrap() = records.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn failing_fetch(self) -> Self {
        self.fail_fetch.store(true, Ordering::SeqCst);
        self
    }

    /// Make removal of the given canonical record string fail.
    pub fn failing_removal_of(self, record: &str) -> Self {
        self.fail_removal_of.lock().unwrap().push(record.to_string());
        self
    }

    pub fn push_host(&self, record: &str) {
        self.hosts.lock().unwrap().push(record.to_string());
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }

    pub fn cnames(&self) -> Vec<String> {
        self.cnames.lock().unwrap().clone()
    }

    /// Canonical strings of every successful removal, in call order.
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn remove(&self, list: &Mutex<Vec<String>>, record: String) -> Result<()> {
        if self.fail_removal_of.lock().unwrap().contains(&record) {
            bail!("HTTP 500 while removing {}", record);
        }
        list.lock().unwrap().retain(|r| r != &record);
        self.removed.lock().unwrap().push(record);
        Ok(())
    }
}

#[async_trait]
impl DnsBackend for FakeBackend {
    fn base_url(&self) -> &str {
        "http://fake.invalid"
    }

    async fn get_config_section(&self, section: &str) -> Result<Value> {
        self.fetches.lock().unwrap().push(section.to_string());
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        let dns = match section {
            "dns/hosts" => json!({ "hosts": self.hosts() }),
            "dns/cnameRecords" => json!({ "cnameRecords": self.cnames() }),
            _ => json!({ "hosts": self.hosts(), "cnameRecords": self.cnames() }),
        };
        Ok(json!({ "config": { "dns": dns } }))
    }

    async fn add_a_record(&self, host: &str, ip: &str) -> Result<()> {
        self.hosts.lock().unwrap().push(format!("{} {}", ip, host));
        Ok(())
    }

    async fn remove_a_record(&self, host: &str, ip: &str) -> Result<()> {
        self.remove(&self.hosts, format!("{} {}", ip, host))
    }

    async fn add_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()> {
        self.cnames
            .lock()
            .unwrap()
            .push(format!("{},{},{}", host, target, ttl));
        Ok(())
    }

    async fn remove_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()> {
        self.remove(&self.cnames, format!("{},{},{}", host, target, ttl))
    }

    async fn get_queries(&self, filter: &QueryFilter) -> Result<Value> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        Ok(json!({ "queries": [], "filter": filter }))
    }

    async fn get_query_suggestions(&self) -> Result<Value> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        Ok(json!({ "suggestions": { "domain": [] } }))
    }

    async fn get_history(&self) -> Result<Value> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        Ok(json!({ "history": [] }))
    }
}

/// Build a registry from named fakes, keeping handles for assertions.
pub fn backends(fakes: Vec<(&str, Arc<FakeBackend>)>) -> Backends {
    Backends::new(
        fakes
            .into_iter()
            .map(|(name, fake)| (name.to_string(), fake as Arc<dyn DnsBackend>))
            .collect(),
    )
    .unwrap()
}
