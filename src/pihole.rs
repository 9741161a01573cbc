//! Pi-hole API Client
//!
//! Thin wrapper over the Pi-hole v6 REST API. Handles session login,
//! config section reads, local record add/remove and query metrics.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::{DnsBackend, QueryFilter};

const SID_HEADER: &str = "X-FTL-SID";

/// Pi-hole API client for one appliance
pub struct PiholeClient {
    client: Client,
    base_url: String,
    password: String,
    session: Mutex<Option<Session>>,
}

// ============================================================
// API Types
// ============================================================

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    session: AuthSession,
}

#[derive(Debug, Deserialize)]
struct AuthSession {
    valid: bool,
    sid: Option<String>,
    message: Option<String>,
}

/// An authenticated session. `sid` is `None` when the appliance has no
/// password set.
#[derive(Debug, Clone)]
struct Session {
    sid: Option<String>,
}

// ============================================================
// Client Implementation
// ============================================================

impl PiholeClient {
    pub fn new(base_url: &str, password: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pihole-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            password: password.to_string(),
            session: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Authenticate and cache the session id.
    async fn login(&self) -> Result<Session> {
        debug!("Authenticating with {}", self.base_url);

        let response = self
            .client
            .post(self.url("auth"))
            .json(&AuthRequest {
                password: &self.password,
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        let response: AuthResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse auth response")?;

        if !response.session.valid {
            bail!(
                "Authentication failed: {}",
                response
                    .session
                    .message
                    .unwrap_or_else(|| "invalid password".to_string())
            );
        }

        info!("🔐 Authenticated with {}", self.base_url);
        Ok(Session {
            sid: response.session.sid,
        })
    }

    async fn session(&self) -> Result<Session> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }
        let session = self.login().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Response> {
        let session = self.session().await?;
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(sid) = &session.sid {
            request = request.header(SID_HEADER, sid.as_str());
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        request
            .send()
            .await
            .with_context(|| format!("Failed to call {} {}", method, path))
    }

    /// Send an authenticated request, logging in again once if the session
    /// has expired.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Response> {
        let mut response = self.dispatch(&method, path, query).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Session rejected by {}, re-authenticating", self.base_url);
            self.session.lock().await.take();
            response = self.dispatch(&method, path, query).await?;
        }
        ensure_success(response).await
    }

    async fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        self.send(Method::GET, path, query)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    /// Release the session on the appliance, if one is open.
    pub async fn logout(&self) -> Result<()> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };
        let Some(sid) = session.sid else {
            return Ok(());
        };

        let response = self
            .client
            .delete(self.url("auth"))
            .header(SID_HEADER, sid)
            .send()
            .await
            .context("Failed to end session")?;
        ensure_success(response).await?;

        info!("Session released for {}", self.base_url);
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    bail!("Pi-hole API error {} from {}: {}", status, url, body)
}

fn hosts_path(host: &str, ip: &str) -> String {
    format!(
        "config/dns/hosts/{}",
        urlencoding::encode(&format!("{} {}", ip, host))
    )
}

fn cname_path(host: &str, target: &str, ttl: u32) -> String {
    format!(
        "config/dns/cnameRecords/{}",
        urlencoding::encode(&format!("{},{},{}", host, target, ttl))
    )
}

#[async_trait]
impl DnsBackend for PiholeClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_config_section(&self, section: &str) -> Result<Value> {
        self.get_json(&format!("config/{}", section), &[]).await
    }

    async fn add_a_record(&self, host: &str, ip: &str) -> Result<()> {
        self.send(Method::PUT, &hosts_path(host, ip), &[]).await?;
        Ok(())
    }

    async fn remove_a_record(&self, host: &str, ip: &str) -> Result<()> {
        self.send(Method::DELETE, &hosts_path(host, ip), &[]).await?;
        Ok(())
    }

    async fn add_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()> {
        self.send(Method::PUT, &cname_path(host, target, ttl), &[])
            .await?;
        Ok(())
    }

    async fn remove_cname_record(&self, host: &str, target: &str, ttl: u32) -> Result<()> {
        self.send(Method::DELETE, &cname_path(host, target, ttl), &[])
            .await?;
        Ok(())
    }

    async fn get_queries(&self, filter: &QueryFilter) -> Result<Value> {
        self.get_json("queries", &filter.to_params()).await
    }

    async fn get_query_suggestions(&self) -> Result<Value> {
        self.get_json("queries/suggestions", &[]).await
    }

    async fn get_history(&self) -> Result<Value> {
        self.get_json("history", &[]).await
    }
}
