//! Pagination walking
//!
//! Two walks are supported:
//! - Listing walks advance a fixed offset until the server returns an empty
//!   page (Bugzilla never sends an explicit end flag).
//! - Unit walks advance by a start point increase for as long as each page
//!   carries the more-marker (Gerrit change queries).
//!
//! Pages of one walk are strictly sequential: page N+1 is requested only
//! after page N has been decoded.

use crate::crawler::normalize::{normalize, Record, ResponseFormat};
use crate::units::WorkUnit;
use crate::Result;
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;

/// Text Gerrit answers with when a username matches several accounts and
/// only one of them is the exact (possibly inactive) account
pub const INACTIVE_ACCOUNT_MARKER: &str = "following exact account";

/// Field each listed record is identified by
pub const ID_FIELD: &str = "id";

/// Everything a listing walk produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// All records, in page order
    pub records: Vec<Record>,

    /// The identifier of every record that carried one, in the same order
    pub ids: Vec<WorkUnit>,
}

/// Per-unit outcome of a unit walk
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    pub unit: WorkUnit,
    pub records: Vec<Record>,
    /// Start point of the last page plus the records it held
    pub total_count: usize,
    /// False once the unit had to be re-resolved as an inactive account
    pub is_active: bool,
}

/// Walks paginated endpoints to completion
#[derive(Debug, Clone, Copy)]
pub struct PaginationWalker {
    step: usize,
}

impl PaginationWalker {
    /// Creates a walker advancing by `step` per page
    pub fn new(step: usize) -> Self {
        Self { step }
    }

    /// The offset increase between two pages
    pub fn step(&self) -> usize {
        self.step
    }

    /// Walks a bug listing until an empty page comes back
    ///
    /// `fetch` receives the offset and returns the raw body for it.
    pub async fn crawl_all<F, Fut>(&self, mut fetch: F) -> Result<Listing>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut listing = Listing::default();
        let mut offset = 0;

        loop {
            let body = fetch(offset).await?;
            let page = normalize(&body, &ResponseFormat::BugList)?;

            if page.records.is_empty() {
                tracing::debug!("Empty page at offset {}, listing complete", offset);
                break;
            }

            tracing::debug!("Offset {}: {} records", offset, page.records.len());

            for record in &page.records {
                match record.get(ID_FIELD).and_then(WorkUnit::from_value) {
                    Some(id) => listing.ids.push(id),
                    None => tracing::warn!("Record at offset {} has no usable '{}'", offset, ID_FIELD),
                }
            }
            listing.records.extend(page.records);
            offset += self.step;
        }

        tracing::info!(
            "Listing walk finished: {} records, {} ids",
            listing.records.len(),
            listing.ids.len()
        );
        Ok(listing)
    }

    /// Walks all pages belonging to one unit
    ///
    /// `fetch` receives the identifier to query and the start point. When the
    /// first response carries the inactive-account marker, the first numeric
    /// account id found in it replaces the unit's identifier for one re-fetch
    /// and every later page, and the unit is marked inactive. Without a
    /// candidate the walk stops with no records.
    pub async fn crawl_unit<F, Fut>(&self, unit: &WorkUnit, mut fetch: F) -> Result<CrawlResult>
    where
        F: FnMut(String, usize) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut query_id = unit.to_string();
        let mut offset = 0;
        let mut records = Vec::new();
        let mut last_page_len = 0;
        let mut is_active = true;

        loop {
            let mut body = fetch(query_id.clone(), offset).await?;

            if is_active && body.contains(INACTIVE_ACCOUNT_MARKER) {
                is_active = false;
                match extract_account_candidate(&body) {
                    Some(candidate) => {
                        tracing::warn!("{} is inactive, re-querying as account {}", unit, candidate);
                        query_id = candidate;
                        body = fetch(query_id.clone(), offset).await?;
                    }
                    None => {
                        tracing::warn!("{} is inactive and no account id could be found", unit);
                        break;
                    }
                }
            }

            let page = normalize(&body, &ResponseFormat::GerritChanges)?;
            last_page_len = page.records.len();
            records.extend(page.records);

            if !page.more_available {
                break;
            }
            offset += self.step;
        }

        Ok(CrawlResult {
            unit: unit.clone(),
            records,
            total_count: offset + last_page_len,
            is_active,
        })
    }
}

/// Pulls the first `<digits>:` account id out of a disambiguation message
pub fn extract_account_candidate(body: &str) -> Option<String> {
    static CANDIDATE: OnceLock<Regex> = OnceLock::new();
    CANDIDATE
        .get_or_init(|| Regex::new(r"(\d+):").expect("static regex"))
        .captures(body)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn bug_page(ids: std::ops::Range<u64>) -> String {
        let bugs: Vec<_> = ids.map(|id| json!({"id": id, "summary": "x"})).collect();
        json!({ "bugs": bugs }).to_string()
    }

    #[tokio::test]
    async fn test_crawl_all_stops_on_empty_page() {
        let pages: HashMap<usize, String> = [
            (0, bug_page(0..3)),
            (3, bug_page(3..5)),
            (6, bug_page(5..6)),
            (9, bug_page(0..0)),
        ]
        .into_iter()
        .collect();
        let requested = Arc::new(Mutex::new(Vec::new()));

        let walker = PaginationWalker::new(3);
        let listing = walker
            .crawl_all(|offset| {
                requested.lock().unwrap().push(offset);
                let body = pages.get(&offset).cloned().unwrap_or_default();
                async move { Ok(body) }
            })
            .await
            .unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![0, 3, 6, 9]);
        assert_eq!(listing.records.len(), 6);
        assert_eq!(
            listing.ids,
            (0..6).map(WorkUnit::Id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_crawl_all_propagates_malformed_page() {
        let walker = PaginationWalker::new(500);
        let result = walker
            .crawl_all(|_| async { Ok("<html>maintenance</html>".to_string()) })
            .await;
        assert!(matches!(result, Err(crate::TrawlError::MalformedResponse(_))));
    }

    fn gerrit_page(numbers: &[u64], more: bool) -> String {
        let mut changes: Vec<_> = numbers
            .iter()
            .map(|n| json!({"_number": n, "owner": {"_account_id": 1004}}))
            .collect();
        if more {
            if let Some(last) = changes.last_mut() {
                last["_more_changes"] = json!(true);
            }
        }
        format!(")]}}'\n{}", serde_json::to_string_pretty(&changes).unwrap())
    }

    #[tokio::test]
    async fn test_crawl_unit_follows_more_marker() {
        let walker = PaginationWalker::new(2);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let result = walker
            .crawl_unit(&WorkUnit::from("alice"), |id, start| {
                calls.lock().unwrap().push((id, start));
                let body = match start {
                    0 => gerrit_page(&[1, 2], true),
                    2 => gerrit_page(&[3, 4], true),
                    _ => gerrit_page(&[5], false),
                };
                async move { Ok(body) }
            })
            .await
            .unwrap();

        assert_eq!(result.records.len(), 5);
        assert_eq!(result.total_count, 5);
        assert!(result.is_active);
        assert!(result
            .records
            .iter()
            .all(|r| !r.contains_key("_more_changes")));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ("alice".to_string(), 0),
                ("alice".to_string(), 2),
                ("alice".to_string(), 4)
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_unit_empty_first_page() {
        let walker = PaginationWalker::new(500);
        let result = walker
            .crawl_unit(&WorkUnit::from("nobody"), |_, _| async {
                Ok(")]}'\n[]\n".to_string())
            })
            .await
            .unwrap();

        assert!(result.records.is_empty());
        assert_eq!(result.total_count, 0);
        assert!(result.is_active);
    }

    #[tokio::test]
    async fn test_inactive_account_is_resolved_once() {
        let walker = PaginationWalker::new(500);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let result = walker
            .crawl_unit(&WorkUnit::from("bob"), |id, _start| {
                calls.lock().unwrap().push(id.clone());
                let body = if id == "bob" {
                    "Account 'bob' is ambiguous, see the following exact account:\n1000321: Bob <bob@example.org>\n".to_string()
                } else {
                    gerrit_page(&[8], false)
                };
                async move { Ok(body) }
            })
            .await
            .unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["bob".to_string(), "1000321".to_string()]
        );
        assert!(!result.is_active);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.total_count, 1);
    }

    #[tokio::test]
    async fn test_inactive_account_without_candidate_stops() {
        let walker = PaginationWalker::new(500);
        let calls = Arc::new(Mutex::new(0));

        let result = walker
            .crawl_unit(&WorkUnit::from("ghost"), |_, _| {
                *calls.lock().unwrap() += 1;
                async { Ok("no following exact account could be named".to_string()) }
            })
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(!result.is_active);
        assert!(result.records.is_empty());
        assert_eq!(result.total_count, 0);
    }

    #[test]
    fn test_extract_account_candidate() {
        assert_eq!(
            extract_account_candidate("matches:\n1000096: John <j@x.org>\n1000097: other"),
            Some("1000096".to_string())
        );
        assert_eq!(extract_account_candidate("no ids here"), None);
    }
}
