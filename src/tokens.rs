//! Confirmation Token Store
//!
//! Short-lived, single-use reservations backing the preview → confirm deletion
//! protocol. A preview stores the planned deletions under a random token; a
//! confirm redeems that token exactly once.
//!
//! ## Invariants
//!
//! - A token is valid only while `now < expires_at` and until it is consumed.
//! - Lookup, validation and removal happen under one lock acquisition.
//! - A token redeems only for the record kind and host it was issued for.
//! - Unknown, expired, consumed and mismatched tokens are reported
//!   identically as [`GatewayError::InvalidToken`].
//! - A mismatched confirm leaves the token in place for its real target.
//! - No network I/O happens while the lock is held.

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::records::{PlannedDeletion, RecordKind};

/// How long a preview's token stays redeemable.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(600);

/// Random bytes per token (128 bits).
const TOKEN_BYTES: usize = 16;

#[derive(Debug)]
struct PendingDeletionPlan {
    kind: RecordKind,
    host: String,
    expires_at: Instant,
    entries: Vec<PlannedDeletion>,
}

/// Process-wide registry of pending deletion plans keyed by token.
#[derive(Debug)]
pub struct TokenStore {
    ttl: Duration,
    plans: Mutex<HashMap<String, PendingDeletionPlan>>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            plans: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of unexpired plans.
    pub fn len(&self) -> usize {
        let mut plans = self.lock();
        Self::reap_locked(&mut plans, Instant::now());
        plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired plan, returning how many were removed.
    pub fn reap(&self) -> usize {
        self.reap_at(Instant::now())
    }

    /// Store a `kind` plan for `host` and return its freshly minted token.
    pub fn create(&self, kind: RecordKind, host: &str, entries: Vec<PlannedDeletion>) -> String {
        self.create_at(kind, host, entries, Instant::now())
    }

    /// Redeem `token` for a `kind` deletion of `host`, removing the plan and
    /// returning its entries.
    pub fn consume(
        &self,
        token: &str,
        kind: RecordKind,
        host: &str,
    ) -> Result<Vec<PlannedDeletion>> {
        self.consume_at(token, kind, host, Instant::now())
    }

    // The map holds plain data; a panic elsewhere cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingDeletionPlan>> {
        self.plans.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reap_locked(plans: &mut HashMap<String, PendingDeletionPlan>, now: Instant) -> usize {
        let before = plans.len();
        plans.retain(|_, plan| now < plan.expires_at);
        let reaped = before - plans.len();
        if reaped > 0 {
            debug!("Reaped {} expired deletion token(s)", reaped);
        }
        reaped
    }

    pub(crate) fn reap_at(&self, now: Instant) -> usize {
        Self::reap_locked(&mut self.lock(), now)
    }

    pub(crate) fn create_at(
        &self,
        kind: RecordKind,
        host: &str,
        entries: Vec<PlannedDeletion>,
        now: Instant,
    ) -> String {
        let token = generate_token();
        let plan = PendingDeletionPlan {
            kind,
            host: host.to_string(),
            expires_at: now + self.ttl,
            entries,
        };

        let mut plans = self.lock();
        Self::reap_locked(&mut plans, now);
        plans.insert(token.clone(), plan);
        debug!(
            "Issued {} deletion token {}… for '{}' ({} live)",
            kind,
            token_prefix(&token),
            host,
            plans.len()
        );
        token
    }

    pub(crate) fn consume_at(
        &self,
        token: &str,
        kind: RecordKind,
        host: &str,
        now: Instant,
    ) -> Result<Vec<PlannedDeletion>> {
        let mut plans = self.lock();

        let rejection = match plans.get(token) {
            None => Some("unknown or already used"),
            Some(plan) if now >= plan.expires_at => Some("expired"),
            Some(plan) if plan.kind != kind => Some("issued for another record kind"),
            Some(plan) if plan.host != host => Some("issued for another host"),
            Some(_) => None,
        };
        Self::reap_locked(&mut plans, now);

        if let Some(reason) = rejection {
            debug!(
                "Rejected deletion token {}… for '{}': {}",
                token_prefix(token),
                host,
                reason
            );
            return Err(GatewayError::InvalidToken);
        }

        let plan = plans.remove(token).ok_or(GatewayError::InvalidToken)?;
        debug!(
            "Consumed deletion token {}… for '{}'",
            token_prefix(token),
            host
        );
        Ok(plan.entries)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Leading characters of a token, safe for logs.
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}
