//! Past-query history: retrieval, filtering, and presentation state.

use std::borrow::Cow;

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{HistoryRecord, MatchedClause};

/// At most this many matched clauses are rendered in full per record.
pub const CLAUSE_PREVIEW_LIMIT: usize = 3;

/// Rendered clause text is truncated to this many characters.
pub const CLAUSE_TEXT_LIMIT: usize = 180;

/// Holds the user's past query records plus single-selection expand state.
///
/// Expansion is keyed by stable record identity rather than position, so
/// changing the filter cannot silently re-point an expansion at a different
/// record. [`HistoryStore::toggle_expand_at`] resolves positional indices for
/// callers that still address records by their place in a filtered view.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: Vec<HistoryRecord>,
    expanded: Option<String>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full record sequence, replacing prior contents wholesale.
    /// On failure the prior records are left untouched.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<()> {
        match client.get_json::<Vec<HistoryRecord>>("/api/my-queries/").await {
            Ok(records) => {
                info!("fetched {} history record(s)", records.len());
                self.records = records;
                // Drop the expansion if its record is gone
                if let Some(key) = &self.expanded {
                    if !self.records.iter().any(|r| &r.stable_key() == key) {
                        self.expanded = None;
                    }
                }
                Ok(())
            }
            Err(e) => {
                warn!("history fetch failed: {}", e);
                Err(e)
            }
        }
    }

    /// All records in server order (newest first).
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.expanded = None;
    }

    /// Records whose query text contains `search` case-insensitively, in
    /// original order. An empty search yields everything. No side effects.
    pub fn filter(&self, search: &str) -> Vec<&HistoryRecord> {
        let needle = search.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.query_text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Toggle expansion for a record: the same record twice collapses it,
    /// a different record moves the single selection.
    pub fn toggle_expand(&mut self, record: &HistoryRecord) {
        let key = record.stable_key();
        if self.expanded.as_deref() == Some(key.as_str()) {
            self.expanded = None;
        } else {
            self.expanded = Some(key);
        }
    }

    /// Positional compatibility shim: toggle the record at `index` within
    /// the view produced by `filter(search)`. Returns false when the index
    /// is out of range.
    pub fn toggle_expand_at(&mut self, search: &str, index: usize) -> bool {
        let key = match self.filter(search).get(index) {
            Some(record) => record.stable_key(),
            None => return false,
        };
        if self.expanded.as_deref() == Some(key.as_str()) {
            self.expanded = None;
        } else {
            self.expanded = Some(key);
        }
        true
    }

    pub fn is_expanded(&self, record: &HistoryRecord) -> bool {
        self.expanded.as_deref() == Some(record.stable_key().as_str())
    }
}

/// A clause prepared for rendering.
#[derive(Debug, Clone)]
pub struct ClauseLine {
    pub text: String,
    pub similarity: f64,
    pub source: Option<String>,
}

/// Matched clauses prepared for rendering: at most
/// [`CLAUSE_PREVIEW_LIMIT`] shown in full, the rest counted.
#[derive(Debug, Clone)]
pub struct ClausePreview {
    pub shown: Vec<ClauseLine>,
    pub remaining: usize,
}

/// Apply the clause presentation rule to a record's matched clauses.
pub fn clause_preview(clauses: &[MatchedClause]) -> ClausePreview {
    ClausePreview {
        shown: clauses
            .iter()
            .take(CLAUSE_PREVIEW_LIMIT)
            .map(|c| ClauseLine {
                text: truncate_clause(&c.text).into_owned(),
                similarity: c.similarity,
                source: c.source.clone(),
            })
            .collect(),
        remaining: clauses.len().saturating_sub(CLAUSE_PREVIEW_LIMIT),
    }
}

/// Truncate clause text to [`CLAUSE_TEXT_LIMIT`] characters with an
/// ellipsis marker.
pub fn truncate_clause(text: &str) -> Cow<'_, str> {
    // Byte length bounds character count, so short text skips the scan
    if text.len() <= CLAUSE_TEXT_LIMIT {
        return Cow::Borrowed(text);
    }
    match text.char_indices().nth(CLAUSE_TEXT_LIMIT) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query_text: &str, minute: u32) -> HistoryRecord {
        serde_json::from_value(serde_json::json!({
            "query_text": query_text,
            "created_at": format!("2025-06-01T12:{:02}:00Z", minute),
            "decision_response": {"decision": "Approved", "justification": ""}
        }))
        .unwrap()
    }

    fn store_with(queries: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new();
        store.records = queries
            .iter()
            .enumerate()
            .map(|(i, q)| record(q, i as u32))
            .collect();
        store
    }

    #[test]
    fn test_empty_filter_returns_all_in_order() {
        let store = store_with(&["first", "second", "third"]);
        let all = store.filter("");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].query_text, "first");
        assert_eq!(all[2].query_text, "third");
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let store = store_with(&[
            "What does this policy cover?",
            "Premium payment term",
            "Is this Policy good long-term?",
        ]);
        let matched = store.filter("POLICY");
        assert_eq!(matched.len(), 2);
        assert!(store.filter("premium").len() == 1);
        assert!(store.filter("nothing here").is_empty());
    }

    #[test]
    fn test_toggle_expand_pair_collapses() {
        let mut store = store_with(&["a", "b"]);
        let first = store.records()[0].clone();

        store.toggle_expand(&first);
        assert!(store.is_expanded(&first));

        store.toggle_expand(&first);
        assert!(!store.is_expanded(&first));
    }

    #[test]
    fn test_toggle_expand_is_single_selection() {
        let mut store = store_with(&["a", "b"]);
        let first = store.records()[0].clone();
        let second = store.records()[1].clone();

        store.toggle_expand(&first);
        store.toggle_expand(&second);
        assert!(!store.is_expanded(&first));
        assert!(store.is_expanded(&second));
    }

    #[test]
    fn test_expansion_survives_filter_change() {
        let mut store = store_with(&["alpha policy", "beta"]);
        let beta = store.records()[1].clone();

        // Expand via position within a filtered view...
        assert!(store.toggle_expand_at("beta", 0));
        assert!(store.is_expanded(&beta));

        // ...then change the filter; the expansion still points at beta,
        // not at whatever now occupies index 0.
        let unfiltered = store.filter("");
        assert_eq!(unfiltered[0].query_text, "alpha policy");
        assert!(!store.is_expanded(unfiltered[0]));
        assert!(store.is_expanded(&beta));
    }

    #[test]
    fn test_toggle_expand_at_out_of_range() {
        let mut store = store_with(&["a"]);
        assert!(!store.toggle_expand_at("", 5));
    }

    fn clauses(n: usize) -> Vec<MatchedClause> {
        (0..n)
            .map(|i| MatchedClause {
                text: format!("clause {}", i),
                similarity: 90.0 + i as f64,
                source: None,
            })
            .collect()
    }

    #[test]
    fn test_clause_preview_limits_to_three() {
        let preview = clause_preview(&clauses(5));
        assert_eq!(preview.shown.len(), 3);
        assert_eq!(preview.remaining, 2);

        let exact = clause_preview(&clauses(3));
        assert_eq!(exact.shown.len(), 3);
        assert_eq!(exact.remaining, 0);
    }

    #[test]
    fn test_truncate_clause_at_limit() {
        let short = "covered under section 4";
        assert_eq!(truncate_clause(short), short);

        let long = "x".repeat(CLAUSE_TEXT_LIMIT + 40);
        let truncated = truncate_clause(&long);
        assert_eq!(truncated.len(), CLAUSE_TEXT_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_clause_counts_characters_not_bytes() {
        // Exactly at the limit in characters, over it in bytes
        let wide = "é".repeat(CLAUSE_TEXT_LIMIT);
        assert_eq!(truncate_clause(&wide), wide);

        let over = "é".repeat(CLAUSE_TEXT_LIMIT + 1);
        let truncated = truncate_clause(&over);
        assert_eq!(truncated.chars().count(), CLAUSE_TEXT_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }
}
