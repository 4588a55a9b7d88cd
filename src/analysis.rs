//! Query analysis orchestration.
//!
//! Drives the document-id + question cycle through an explicit state machine:
//! `Idle → AwaitingDocument → Ready → Analyzing → {Complete | Failed}`.
//! Terminal states re-enter `Analyzing` on a new submission; there is no
//! cancellation of an in-flight analysis.

use tracing::{error, info};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::models::{AnalysisRequest, AnalysisResult};

/// Lifecycle of a query analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisState {
    /// No document workflow started yet.
    #[default]
    Idle,
    /// An upload is expected; submissions are rejected.
    AwaitingDocument,
    /// A document id is captured; a query may be submitted.
    Ready,
    /// A request is in flight.
    Analyzing,
    /// The last submission produced a result.
    Complete,
    /// The last submission failed; re-submission is allowed.
    Failed,
}

/// Orchestrates analysis submissions for the current interaction.
///
/// The document id and result are owned here and replaced wholesale on each
/// new upload/query.
#[derive(Debug, Default)]
pub struct QueryAnalysis {
    state: AnalysisState,
    document_id: Option<String>,
    result: Option<AnalysisResult>,
    last_error: Option<String>,
}

impl QueryAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Result of the last completed submission.
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mark that a document upload is underway.
    pub fn await_document(&mut self) {
        if self.state == AnalysisState::Idle {
            self.state = AnalysisState::AwaitingDocument;
        }
    }

    /// Capture the uploaded document id, replacing any previous one.
    pub fn set_document(&mut self, document_id: impl Into<String>) {
        self.document_id = Some(document_id.into());
        self.state = AnalysisState::Ready;
    }

    /// Precondition check for a submission: a document id exists and the
    /// query is non-empty after trimming. Raised synchronously, before any
    /// network I/O.
    pub fn validate(&self, query: &str) -> Result<()> {
        if self.document_id.is_none() {
            return Err(Error::validation("Please upload a document first."));
        }
        if query.trim().is_empty() {
            return Err(Error::validation("Please enter a query."));
        }
        Ok(())
    }

    /// Submit a query against the captured document.
    ///
    /// On success the state becomes `Complete` and the result is held here;
    /// on failure the state becomes `Failed`, the error is logged, and the
    /// orchestrator accepts a new submission.
    pub async fn submit(&mut self, client: &ApiClient, query: &str) -> Result<&AnalysisResult> {
        self.validate(query)?;
        let payload = AnalysisRequest {
            // Validation above guarantees the id is present.
            document_id: self.document_id.clone().unwrap_or_default(),
            query: query.trim().to_string(),
        };

        self.state = AnalysisState::Analyzing;
        match client
            .post_json::<_, AnalysisResult>("/api/analyze/", &payload)
            .await
        {
            Ok(result) => {
                info!(decision = %result.decision, "analysis complete");
                self.last_error = None;
                self.state = AnalysisState::Complete;
                Ok(&*self.result.insert(result))
            }
            Err(e) => {
                error!("analysis failed: {}", e);
                self.last_error = Some(e.to_string());
                self.state = AnalysisState::Failed;
                Err(e)
            }
        }
    }
}
