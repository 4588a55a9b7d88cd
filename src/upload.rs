//! Document upload pipeline.
//!
//! Turns user-selected files into a server-side document: candidates are
//! filtered by admitted MIME type, batched, and sent as one multipart request
//! with integer progress events derived from bytes sent over bytes total.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::UploadResponse;

/// MIME types admitted into an upload batch.
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Whether a MIME type is accepted for upload.
pub fn is_admitted(mime_type: &str) -> bool {
    mime_type == MIME_PDF || mime_type == MIME_DOCX
}

/// A user-selected file awaiting upload.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub contents: Bytes,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents: contents.into(),
        }
    }
}

/// Events emitted during an upload.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// Upload started.
    Started { files: usize, total_bytes: u64 },
    /// Integer progress in 0-100; each value is emitted at most once and
    /// 100 exactly once per successful upload.
    Progress { percent: u8 },
    /// Upload completed and a document id was captured.
    Completed { document_id: String },
}

/// Batches candidate files and uploads them as one multipart request.
///
/// Only one upload can be in flight per pipeline (the method takes `&mut
/// self`); callers should additionally disable re-invocation while pending.
#[derive(Debug, Default)]
pub struct UploadPipeline {
    batch: Vec<CandidateFile>,
    document_id: Option<String>,
}

impl UploadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append admitted candidates to the batch; others are silently dropped.
    /// Duplicate names are permitted. Returns how many were added.
    pub fn add_files(&mut self, candidates: impl IntoIterator<Item = CandidateFile>) -> usize {
        let before = self.batch.len();
        self.batch
            .extend(candidates.into_iter().filter(|c| is_admitted(&c.mime_type)));
        self.batch.len() - before
    }

    /// Remove every batch entry with the given name.
    pub fn remove_file(&mut self, name: &str) {
        self.batch.retain(|c| c.name != name);
    }

    pub fn batch(&self) -> &[CandidateFile] {
        &self.batch
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    fn total_bytes(&self) -> u64 {
        self.batch.iter().map(|c| c.contents.len() as u64).sum()
    }

    /// Document id captured by the last successful upload.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Upload the batch. No-op (returns `Ok(None)`) when the batch is empty.
    ///
    /// On success the returned document id is also captured on the pipeline
    /// and progress state is discarded. On failure the batch is left intact
    /// so the caller may re-attempt.
    pub async fn upload(
        &mut self,
        client: &ApiClient,
        events: UnboundedSender<UploadEvent>,
    ) -> Result<Option<String>> {
        if self.batch.is_empty() {
            return Ok(None);
        }

        let total_bytes = self.total_bytes();
        let _ = events.send(UploadEvent::Started {
            files: self.batch.len(),
            total_bytes,
        });
        let tracker = Arc::new(ProgressTracker::new(total_bytes, events.clone()));

        let mut form = Form::new();
        for file in &self.batch {
            form = form.part("file", progress_part(file, Arc::clone(&tracker))?);
        }

        let response = match client.post_multipart("/api/upload/", form).await {
            Ok(response) => response,
            Err(e) => {
                error!("upload failed: {}", e);
                return Err(e);
            }
        };
        match ApiClient::decode::<UploadResponse>(response).await {
            Ok(uploaded) => {
                tracker.finish();
                let _ = events.send(UploadEvent::Completed {
                    document_id: uploaded.document_id.clone(),
                });
                info!(document_id = %uploaded.document_id, "uploaded {} file(s)", self.batch.len());
                self.document_id = Some(uploaded.document_id.clone());
                Ok(Some(uploaded.document_id))
            }
            Err(e) => {
                error!("upload failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Integer percent of `sent` over `total`, rounded to nearest.
pub(crate) fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (((sent * 100) + total / 2) / total).min(100) as u8
}

/// Shared byte counter that emits each integer percent at most once.
struct ProgressTracker {
    sent: AtomicU64,
    total: u64,
    last_percent: AtomicI64,
    events: UnboundedSender<UploadEvent>,
}

impl ProgressTracker {
    fn new(total: u64, events: UnboundedSender<UploadEvent>) -> Self {
        Self {
            sent: AtomicU64::new(0),
            total,
            last_percent: AtomicI64::new(-1),
            events,
        }
    }

    fn record(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.emit(percent_of(sent, self.total));
    }

    /// Guarantee 100 is reported once the request has completed, covering
    /// degenerate batches of only zero-length files.
    fn finish(&self) {
        self.emit(100);
    }

    fn emit(&self, percent: u8) {
        let previous = self.last_percent.fetch_max(percent as i64, Ordering::Relaxed);
        if (percent as i64) > previous {
            let _ = self.events.send(UploadEvent::Progress { percent });
        }
    }
}

/// Build a multipart part whose body reports bytes to the shared tracker as
/// reqwest streams it out.
fn progress_part(file: &CandidateFile, tracker: Arc<ProgressTracker>) -> Result<Part> {
    const CHUNK_SIZE: usize = 64 * 1024;

    let contents = file.contents.clone();
    let length = contents.len() as u64;
    let chunks: Vec<Bytes> = (0..contents.len())
        .step_by(CHUNK_SIZE)
        .map(|start| contents.slice(start..(start + CHUNK_SIZE).min(contents.len())))
        .collect();
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        tracker.record(chunk.len() as u64);
        Ok::<Bytes, std::convert::Infallible>(chunk)
    }));

    let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), length)
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)?;
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn pdf(name: &str) -> CandidateFile {
        CandidateFile::new(name, MIME_PDF, &b"%PDF-1.4 fake"[..])
    }

    #[test]
    fn test_add_files_drops_unadmitted_types() {
        let mut pipeline = UploadPipeline::new();
        let added = pipeline.add_files(vec![
            pdf("policy.pdf"),
            CandidateFile::new("notes.txt", "text/plain", &b"notes"[..]),
            CandidateFile::new("terms.docx", MIME_DOCX, &b"docx"[..]),
        ]);
        assert_eq!(added, 2);
        assert_eq!(pipeline.batch().len(), 2);
        assert!(pipeline.batch().iter().all(|c| is_admitted(&c.mime_type)));
    }

    #[test]
    fn test_add_files_appends_and_keeps_duplicates() {
        let mut pipeline = UploadPipeline::new();
        pipeline.add_files(vec![pdf("policy.pdf")]);
        pipeline.add_files(vec![pdf("policy.pdf")]);
        assert_eq!(pipeline.batch().len(), 2);
    }

    #[test]
    fn test_remove_file_by_name() {
        let mut pipeline = UploadPipeline::new();
        pipeline.add_files(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("a.pdf")]);
        pipeline.remove_file("a.pdf");
        assert_eq!(pipeline.batch().len(), 1);
        assert_eq!(pipeline.batch()[0].name, "b.pdf");
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(0, 200), 0);
        assert_eq!(percent_of(1, 200), 1); // 0.5 rounds up
        assert_eq!(percent_of(100, 200), 50);
        assert_eq!(percent_of(200, 200), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_tracker_emits_each_percent_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = ProgressTracker::new(400, tx);
        for _ in 0..4 {
            tracker.record(100);
        }
        tracker.finish();

        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let UploadEvent::Progress { percent } = event {
                percents.push(percent);
            }
        }
        assert_eq!(percents, vec![25, 50, 75, 100]);
        assert_eq!(percents.iter().filter(|&&p| p == 100).count(), 1);
    }

    #[test]
    fn test_tracker_skips_repeated_values() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = ProgressTracker::new(1000, tx);
        // Two tiny chunks both round to 1 percent
        tracker.record(5);
        tracker.record(5);
        tracker.record(990);
        tracker.finish();

        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let UploadEvent::Progress { percent } = event {
                percents.push(percent);
            }
        }
        assert_eq!(percents, vec![1, 100]);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_batch_for_retry() {
        let settings = crate::config::Settings {
            // Nothing listens here, so the request itself fails
            base_url: "http://127.0.0.1:9".to_string(),
            token_file: Some(std::env::temp_dir().join("policyintel-test-token-unused")),
            ..crate::config::Settings::default()
        };
        let client = ApiClient::new(&settings).unwrap();

        let mut pipeline = UploadPipeline::new();
        pipeline.add_files(vec![pdf("policy.pdf")]);

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = pipeline.upload(&client, tx).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Transport(_)));

        // Batch intact, no document captured, re-attempt accepted
        assert_eq!(pipeline.batch().len(), 1);
        assert!(pipeline.document_id().is_none());

        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(pipeline.upload(&client, tx).await.is_err());
        assert_eq!(pipeline.batch().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_empty_batch_is_noop() {
        let settings = crate::config::Settings {
            base_url: "http://127.0.0.1:9".to_string(),
            token_file: Some(std::env::temp_dir().join("policyintel-test-token-unused")),
            ..crate::config::Settings::default()
        };
        let client = ApiClient::new(&settings).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut pipeline = UploadPipeline::new();
        let result = pipeline.upload(&client, tx).await.unwrap();
        assert!(result.is_none());
        assert!(rx.try_recv().is_err());
    }
}
