//! Local DNS record types and the record matcher.
//!
//! Pi-hole stores local records as flat strings:
//! - A records in `dns.hosts` as `"<ip> <host>"`
//! - CNAME records in `dns.cnameRecords` as `"<host>,<target>,<ttl>"`
//!
//! Matching always parses the record shape; a hostname that merely appears as a
//! substring of another record never matches.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// TTL used when a CNAME record carries none (or an unparseable one).
pub const DEFAULT_CNAME_TTL: u32 = 300;

/// Record kinds the gateway can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    A,
    Cname,
}

impl RecordKind {
    /// Config section holding records of this kind.
    pub fn section(&self) -> &'static str {
        match self {
            RecordKind::A => "dns/hosts",
            RecordKind::Cname => "dns/cnameRecords",
        }
    }

    /// Key of the record list inside `config.dns`.
    fn config_key(&self) -> &'static str {
        match self {
            RecordKind::A => "hosts",
            RecordKind::Cname => "cnameRecords",
        }
    }

    /// Label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Cname => "CNAME",
        }
    }

    /// Pull the raw record strings out of a config section response.
    ///
    /// A missing path yields an empty list, as does any non-string entry.
    pub fn raw_records(&self, section: &Value) -> Vec<String> {
        section
            .get("config")
            .and_then(|c| c.get("dns"))
            .and_then(|d| d.get(self.config_key()))
            .and_then(Value::as_array)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| r.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ARecord {
    pub host: String,
    pub ip: String,
}

impl ARecord {
    pub fn new(host: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ip: ip.into(),
        }
    }

    /// Parse `"<ip> <host>"`, splitting on the first space only.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, ' ');
        let ip = parts.next()?;
        let host = parts.next()?;
        Some(Self::new(host, ip))
    }
}

impl fmt::Display for ARecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ip, self.host)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnameRecord {
    pub host: String,
    pub target: String,
    pub ttl: u32,
}

impl CnameRecord {
    pub fn new(host: impl Into<String>, target: impl Into<String>, ttl: u32) -> Self {
        Self {
            host: host.into(),
            target: target.into(),
            ttl,
        }
    }

    /// Parse `"<host>,<target>,<ttl>"`. Missing or malformed trailing parts
    /// fall back to an empty target and [`DEFAULT_CNAME_TTL`].
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(',');
        let host = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();
        let ttl = parts
            .next()
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(DEFAULT_CNAME_TTL);
        Self::new(host, target, ttl)
    }
}

impl fmt::Display for CnameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.host, self.target, self.ttl)
    }
}

/// Parsed fields of a planned deletion, flattened into the entry on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordDetails {
    A(ARecord),
    Cname(CnameRecord),
}

impl RecordDetails {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordDetails::A(_) => RecordKind::A,
            RecordDetails::Cname(_) => RecordKind::Cname,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            RecordDetails::A(r) => &r.host,
            RecordDetails::Cname(r) => &r.host,
        }
    }
}

impl fmt::Display for RecordDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDetails::A(r) => fmt::Display::fmt(r, f),
            RecordDetails::Cname(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// One record on one backend slated for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDeletion {
    pub pihole: String,
    /// The raw record string exactly as the backend reported it.
    pub record: String,
    #[serde(flatten)]
    pub details: RecordDetails,
}

/// Find all A records on `pihole` whose hostname is exactly `host`.
pub fn find_a_matches(pihole: &str, raw_records: &[String], host: &str) -> Vec<PlannedDeletion> {
    raw_records
        .iter()
        .filter_map(|raw| {
            let parsed = ARecord::parse(raw)?;
            (parsed.host == host).then(|| PlannedDeletion {
                pihole: pihole.to_string(),
                record: raw.clone(),
                details: RecordDetails::A(parsed),
            })
        })
        .collect()
}

/// Find all CNAME records on `pihole` whose alias is exactly `host`.
pub fn find_cname_matches(
    pihole: &str,
    raw_records: &[String],
    host: &str,
) -> Vec<PlannedDeletion> {
    raw_records
        .iter()
        .filter_map(|raw| {
            let parsed = CnameRecord::parse(raw);
            (parsed.host == host).then(|| PlannedDeletion {
                pihole: pihole.to_string(),
                record: raw.clone(),
                details: RecordDetails::Cname(parsed),
            })
        })
        .collect()
}

pub fn find_matches(
    kind: RecordKind,
    pihole: &str,
    raw_records: &[String],
    host: &str,
) -> Vec<PlannedDeletion> {
    match kind {
        RecordKind::A => find_a_matches(pihole, raw_records, host),
        RecordKind::Cname => find_cname_matches(pihole, raw_records, host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(records: &[&str]) -> Vec<String> {
        records.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_a_match_exact_host() {
        let records = raw(&["10.0.0.1 foo.lan", "10.0.0.2 bar.lan"]);
        let matches = find_a_matches("primary", &records, "foo.lan");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pihole, "primary");
        assert_eq!(matches[0].record, "10.0.0.1 foo.lan");
        assert_eq!(
            matches[0].details,
            RecordDetails::A(ARecord::new("foo.lan", "10.0.0.1"))
        );
    }

    #[test]
    fn test_a_match_is_not_substring() {
        let records = raw(&["10.0.0.1 foo.lan.example", "10.0.0.3 myfoo.lan", "foo.lan"]);
        assert!(find_a_matches("primary", &records, "foo.lan").is_empty());
    }

    #[test]
    fn test_a_match_multiple_ips() {
        let records = raw(&["10.0.0.1 foo.lan", "10.0.0.9 foo.lan"]);
        let matches = find_a_matches("primary", &records, "foo.lan");
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_a_split_on_first_space_only() {
        // Everything after the first space is the host; a trailing alias list
        // therefore does not match the bare hostname.
        let records = raw(&["10.0.0.1 foo.lan alias.lan"]);
        assert!(find_a_matches("p", &records, "foo.lan").is_empty());
        assert_eq!(find_a_matches("p", &records, "foo.lan alias.lan").len(), 1);
    }

    #[test]
    fn test_cname_missing_ttl_defaults() {
        let matches = find_cname_matches("primary", &raw(&["a,b"]), "a");

        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].details,
            RecordDetails::Cname(CnameRecord::new("a", "b", 300))
        );
    }

    #[test]
    fn test_cname_malformed_ttl_defaults() {
        let matches = find_cname_matches("primary", &raw(&["a,b,soon"]), "a");
        assert_eq!(
            matches[0].details,
            RecordDetails::Cname(CnameRecord::new("a", "b", DEFAULT_CNAME_TTL))
        );
    }

    #[test]
    fn test_cname_host_only() {
        let matches = find_cname_matches("primary", &raw(&["a"]), "a");
        assert_eq!(
            matches[0].details,
            RecordDetails::Cname(CnameRecord::new("a", "", 300))
        );
    }

    #[test]
    fn test_cname_explicit_ttl() {
        let records = raw(&["www.lan,web.lan,3600", "other.lan,web.lan"]);
        let matches = find_matches(RecordKind::Cname, "p", &records, "www.lan");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record, "www.lan,web.lan,3600");
        assert_eq!(
            matches[0].details,
            RecordDetails::Cname(CnameRecord::new("www.lan", "web.lan", 3600))
        );
    }

    #[test]
    fn test_canonical_strings() {
        assert_eq!(ARecord::new("foo.lan", "10.0.0.1").to_string(), "10.0.0.1 foo.lan");
        assert_eq!(CnameRecord::new("a", "b", 300).to_string(), "a,b,300");
    }

    #[test]
    fn test_raw_records_extraction() {
        let section = json!({
            "config": { "dns": { "hosts": ["10.0.0.1 foo.lan", 42], "cnameRecords": [] } }
        });
        assert_eq!(RecordKind::A.raw_records(&section), vec!["10.0.0.1 foo.lan"]);
        assert!(RecordKind::Cname.raw_records(&section).is_empty());
        assert!(RecordKind::A.raw_records(&json!({})).is_empty());
    }

    #[test]
    fn test_planned_deletion_serializes_flat() {
        let entry = PlannedDeletion {
            pihole: "primary".to_string(),
            record: "a,b,300".to_string(),
            details: RecordDetails::Cname(CnameRecord::new("a", "b", 300)),
        };
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            value,
            json!({"pihole": "primary", "record": "a,b,300", "host": "a", "target": "b", "ttl": 300})
        );
    }
}
