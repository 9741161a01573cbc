//! Pi-hole Gateway Library
//!
//! Aggregates several Pi-hole appliances behind one tool API and guards
//! record deletion with a preview → confirm token protocol.

pub mod backend;
pub mod config;
pub mod deletion;
pub mod error;
pub mod pihole;
pub mod records;
pub mod resolver;
pub mod server;
pub mod tokens;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{Backends, DnsBackend, QueryFilter};
pub use deletion::{DeletionOrchestrator, DeletionOutcome, DeletionResponse};
pub use error::GatewayError;
pub use pihole::PiholeClient;
pub use tokens::TokenStore;
pub use tools::Gateway;
