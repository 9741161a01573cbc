//! Discovery resources: configured Pi-holes, gateway version, tool catalogue
//! and the usage guide handed to calling agents.

use serde::Serialize;

use super::Gateway;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Usage guide for agents driving the tool API. Served verbatim.
pub const USAGE_GUIDE: &str = r#"# Pi-hole Gateway: DNS management guide

Every tool below is a `POST /api/tools/<name>` call with a JSON body. All tools
act on every configured Pi-hole unless a `pihole` (or `piholes`) argument
narrows them. `GET /api/resources/piholes` lists the configured names.

## Deleting records takes two calls

1. Preview: call `remove_local_a_record` or `remove_local_cname_record` with
   `{"host": "..."}` and no `confirm`. The response has
   `"status": "pending_deletion"`, the `planned` records and a
   `confirmationToken`. Nothing has been deleted yet.
2. Show the planned records to the user and ask whether to proceed.
3. Only if the user agrees, call the same tool again with the same host and
   `"confirm": "<confirmationToken>"`, using the exact token from step 1.

Never send `confirm` on the first call and never invent a token. A token works
once, only for the tool and host that issued it, and expires after a few
minutes. On `"status": "invalid_token"`, start again from step 1.

A confirm reports `deleted` and, if some Pi-holes refused, `failed`. Run the
deletion again to retry the failed ones.

## Tools

Config:
- `list_local_dns {piholes?}` lists local A and CNAME records
- `add_local_a_record {host, ip, pihole?}` adds an A record
- `add_local_cname_record {host, target, ttl=300, pihole?}` adds a CNAME record
- `remove_local_a_record {host, pihole?}` previews an A record deletion
- `remove_local_a_record {host, confirm}` confirms it with the token
- `remove_local_cname_record {host, pihole?}` previews a CNAME record deletion
- `remove_local_cname_record {host, confirm}` confirms it with the token

Metrics:
- `list_queries {piholes?, length=10, from_ts?, until_ts?, upstream?, domain?, client_filter?, cursor?}`
- `list_query_history {piholes?}` returns query counts over time
- `list_query_suggestions {piholes?}` suggests domains, clients and upstreams

Discovery: `GET /api/resources/tools` and `GET /api/resources/tools/<category>`.

## Before changing anything

Check the current records with `list_local_dns` first. Adding a record that
already exists reports `"status": "exists"` and changes nothing; deleting a
missing one reports `"status": "not_found"`. Tell the user when a request has
no effect.
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Metrics,
    Config,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 2] = [ToolCategory::Metrics, ToolCategory::Config];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "metrics" => Some(ToolCategory::Metrics),
            "config" => Some(ToolCategory::Config),
            _ => None,
        }
    }

    pub fn info(&self) -> ToolInfo {
        match self {
            ToolCategory::Metrics => ToolInfo {
                name: "metrics",
                description: "Pi-hole activity metrics",
            },
            ToolCategory::Config => ToolInfo {
                name: "config",
                description: "Configuration retrieval and updates",
            },
        }
    }

    pub fn tools(&self) -> Vec<ToolInfo> {
        match self {
            ToolCategory::Metrics => vec![
                ToolInfo {
                    name: "list_queries",
                    description: "Retrieve query log entries",
                },
                ToolInfo {
                    name: "list_query_history",
                    description: "Get time-series of query counts",
                },
                ToolInfo {
                    name: "list_query_suggestions",
                    description: "Suggest popular domains",
                },
            ],
            ToolCategory::Config => vec![
                ToolInfo {
                    name: "list_local_dns",
                    description: "List local A and CNAME records from Pi-hole",
                },
                ToolInfo {
                    name: "add_local_a_record",
                    description: "Add a local A record to Pi-hole",
                },
                ToolInfo {
                    name: "add_local_cname_record",
                    description: "Add a local CNAME record to Pi-hole",
                },
                ToolInfo {
                    name: "remove_local_a_record",
                    description: "Remove a local A record from Pi-hole with token confirmation",
                },
                ToolInfo {
                    name: "remove_local_cname_record",
                    description: "Remove a local CNAME record from Pi-hole with token confirmation",
                },
            ],
        }
    }
}

pub fn tool_categories() -> Vec<ToolInfo> {
    ToolCategory::ALL.iter().map(ToolCategory::info).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiholeInfo {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PiholesResource {
    pub piholes: Vec<PiholeInfo>,
}

impl Gateway {
    pub fn piholes(&self) -> PiholesResource {
        PiholesResource {
            piholes: self
                .backends()
                .iter()
                .map(|(name, backend)| PiholeInfo {
                    name: name.to_string(),
                    url: backend.base_url().to_string(),
                })
                .collect(),
        }
    }
}
