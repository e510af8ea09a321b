// ── Compatibility issues ──
//
// Non-fatal problems surfaced to the operator. Issues are keyed by id:
// raising an id that is already open changes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

/// Issue id used for a hub-side server version that does not match.
pub const SERVER_VERSION_ISSUE: &str = "server_version_mismatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityIssue {
    pub id: String,
    pub severity: IssueSeverity,
    pub required_version: String,
    pub reported_version: String,
    pub raised_at: DateTime<Utc>,
}

/// Shared, de-duplicating issue sink.
#[derive(Debug, Clone, Default)]
pub struct IssueRegistry {
    issues: Arc<DashMap<String, CompatibilityIssue>>,
}

impl IssueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue. Returns `true` only when `id` was not already open.
    pub fn raise_issue(
        &self,
        id: &str,
        severity: IssueSeverity,
        required_version: &str,
        reported_version: &str,
    ) -> bool {
        match self.issues.entry(id.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                warn!(id, %severity, required_version, reported_version, "compatibility issue raised");
                slot.insert(CompatibilityIssue {
                    id: id.to_owned(),
                    severity,
                    required_version: required_version.to_owned(),
                    reported_version: reported_version.to_owned(),
                    raised_at: Utc::now(),
                });
                true
            }
        }
    }

    /// Close an open issue. Returns `true` if it was open.
    pub fn resolve(&self, id: &str) -> bool {
        let removed = self.issues.remove(id).is_some();
        if removed {
            info!(id, "compatibility issue resolved");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<CompatibilityIssue> {
        self.issues.get(id).map(|entry| entry.value().clone())
    }

    /// Open issues, ordered by id.
    pub fn issues(&self) -> Vec<CompatibilityIssue> {
        let mut all: Vec<_> = self.issues.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Compare the hub's reported server version against `required`.
///
/// A mismatch opens [`SERVER_VERSION_ISSUE`]; a match closes it. Returns
/// whether the versions match.
pub fn check_server_version(registry: &IssueRegistry, required: &str, reported: &str) -> bool {
    if reported.trim() == required {
        registry.resolve(SERVER_VERSION_ISSUE);
        true
    } else {
        registry.raise_issue(SERVER_VERSION_ISSUE, IssueSeverity::Error, required, reported);
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn raising_same_id_is_idempotent() {
        let registry = IssueRegistry::new();
        assert!(registry.raise_issue("x", IssueSeverity::Warning, "1.0", "0.9"));
        assert!(!registry.raise_issue("x", IssueSeverity::Critical, "1.0", "0.8"));

        assert_eq!(registry.len(), 1);
        let issue = registry.get("x").unwrap();
        assert_eq!(issue.severity, IssueSeverity::Warning);
        assert_eq!(issue.reported_version, "0.9");
    }

    #[test]
    fn version_check_raises_then_resolves() {
        let registry = IssueRegistry::new();

        assert!(!check_server_version(&registry, "0.2.0", "0.1.4"));
        assert!(!check_server_version(&registry, "0.2.0", "0.1.4"));
        assert_eq!(registry.issues().len(), 1);
        assert_eq!(registry.issues()[0].id, SERVER_VERSION_ISSUE);

        assert!(check_server_version(&registry, "0.2.0", "0.2.0"));
        assert!(registry.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let registry = IssueRegistry::new();
        let clone = registry.clone();
        clone.raise_issue("y", IssueSeverity::Error, "2", "1");
        assert!(registry.get("y").is_some());
    }
}
