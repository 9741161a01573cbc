//! Target resolution
//!
//! Single-target write operations fail loudly on an unknown name; multi-target
//! read operations silently drop unknown names and carry on with the rest.

use tracing::debug;

use crate::backend::Backends;
use crate::error::{GatewayError, Result};

/// Resolve the optional `pihole` argument of a write/delete operation.
///
/// `None` means every configured backend.
pub fn resolve_one(backends: &Backends, requested: Option<&str>) -> Result<Vec<String>> {
    match requested {
        None => Ok(backends.names().map(str::to_string).collect()),
        Some(name) if backends.contains(name) => Ok(vec![name.to_string()]),
        Some(name) => Err(GatewayError::UnknownTarget(name.to_string())),
    }
}

/// Resolve the optional `piholes` list of a read operation.
///
/// `None` or an empty list means every configured backend. Unknown names are
/// dropped and duplicates collapsed, keeping the requested order.
pub fn resolve_many(backends: &Backends, requested: Option<&[String]>) -> Vec<String> {
    let requested = match requested {
        Some(names) if !names.is_empty() => names,
        _ => return backends.names().map(str::to_string).collect(),
    };

    let mut resolved: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if !backends.contains(name) {
            debug!("Ignoring unknown Pi-hole '{}'", name);
            continue;
        }
        if !resolved.contains(name) {
            resolved.push(name.clone());
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{backends, FakeBackend};
    use std::sync::Arc;

    fn two() -> Backends {
        backends(vec![
            ("primary", Arc::new(FakeBackend::new())),
            ("secondary", Arc::new(FakeBackend::new())),
        ])
    }

    #[test]
    fn test_resolve_one_defaults_to_all() {
        assert_eq!(resolve_one(&two(), None).unwrap(), vec!["primary", "secondary"]);
    }

    #[test]
    fn test_resolve_one_known() {
        assert_eq!(resolve_one(&two(), Some("secondary")).unwrap(), vec!["secondary"]);
    }

    #[test]
    fn test_resolve_one_unknown_is_hard_error() {
        let err = resolve_one(&two(), Some("tertiary")).unwrap_err();
        assert!(matches!(err, GatewayError::UnknownTarget(ref n) if n == "tertiary"));
        assert_eq!(err.to_string(), "Pi-hole 'tertiary' not found");
    }

    #[test]
    fn test_resolve_many_drops_unknown() {
        let requested = vec!["secondary".to_string(), "bogus".to_string()];
        assert_eq!(resolve_many(&two(), Some(&requested)), vec!["secondary"]);
    }

    #[test]
    fn test_resolve_many_all_unknown_is_empty() {
        let requested = vec!["bogus".to_string()];
        assert!(resolve_many(&two(), Some(&requested)).is_empty());
    }

    #[test]
    fn test_resolve_many_none_or_empty_means_all() {
        assert_eq!(resolve_many(&two(), None).len(), 2);
        assert_eq!(resolve_many(&two(), Some(&[])).len(), 2);
    }

    #[test]
    fn test_resolve_many_collapses_duplicates() {
        let requested = vec![
            "secondary".to_string(),
            "primary".to_string(),
            "secondary".to_string(),
        ];
        assert_eq!(
            resolve_many(&two(), Some(&requested)),
            vec!["secondary", "primary"]
        );
    }
}
