//! History validation
//!
//! Structural checks over one backend's items: id uniqueness,
//! required fields, response-count, provider-repeat and latency
//! sanity. Useful after hand-editing the archive file or importing
//! one from elsewhere. Reported issues are informational; nothing is
//! repaired here.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use serde::Serialize;
use trifold_common::model::{HistoryItem, StorageBackend};

/// Largest number of responses a history item can carry, one per
/// provider.
pub const MAX_RESPONSES: usize = 3;

/// One problem found in one history item.
#[derive(Debug, Serialize)]
pub struct ValidationIssue {
    /// Id of the item the problem was found in
    pub id: String,
    pub message: String,
}

/// Outcome of one validation run.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub backend: StorageBackend,
    /// Number of items examined
    pub checked: usize,
    pub ok: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Run structural checks over a backend's items.
pub fn validate_items(backend: StorageBackend, items: &[HistoryItem]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen_ids = HashSet::new();

    // Allow modest clock skew before calling a timestamp future-dated
    let future_cutoff = Utc::now() + Duration::minutes(5);

    for item in items {
        if item.id.trim().is_empty() {
            issues.push(issue(item, "empty id".to_string()));
        } else if !seen_ids.insert(item.id.clone()) {
            issues.push(issue(item, "duplicate id".to_string()));
        }

        if item.query.trim().is_empty() {
            issues.push(issue(item, "empty query".to_string()));
        }

        if item.responses.len() > MAX_RESPONSES {
            issues.push(issue(
                item,
                format!(
                    "{} responses (expected at most {})",
                    item.responses.len(),
                    MAX_RESPONSES
                ),
            ));
        }

        if item.created_at > future_cutoff {
            issues.push(issue(item, "created_at is in the future".to_string()));
        }

        // Each provider answers a query at most once
        let mut seen_providers = HashSet::new();
        for (index, response) in item.responses.iter().enumerate() {
            if !seen_providers.insert(response.provider) {
                issues.push(issue(
                    item,
                    format!("response {} repeats provider {}", index, response.provider),
                ));
            }
            if response.latency_ms < 0 {
                issues.push(issue(item, format!("response {} has negative latency", index)));
            }
            if response.text.is_empty() && response.error.is_none() {
                issues.push(issue(
                    item,
                    format!("response {} has neither text nor error", index),
                ));
            }
            if response.model.trim().is_empty() {
                issues.push(issue(item, format!("response {} has no model name", index)));
            }
        }
    }

    ValidationReport {
        backend,
        checked: items.len(),
        ok: issues.is_empty(),
        issues,
    }
}

fn issue(item: &HistoryItem, message: String) -> ValidationIssue {
    ValidationIssue {
        id: item.id.clone(),
        message,
    }
}
