//! End-to-end precondition behavior over the public API.
//!
//! These tests point the client at an unreachable address: any validation
//! error proves the corresponding call never reached the network.

use policyintel::analysis::{AnalysisState, QueryAnalysis};
use policyintel::config::Settings;
use policyintel::session::{Session, SignupForm};
use policyintel::upload::{CandidateFile, UploadPipeline, MIME_PDF};
use policyintel::ApiClient;

fn offline_client(dir: &tempfile::TempDir) -> ApiClient {
    let settings = Settings {
        base_url: "http://127.0.0.1:9".to_string(),
        token_file: Some(dir.path().join("token")),
        ..Settings::default()
    };
    ApiClient::new(&settings).unwrap()
}

#[tokio::test]
async fn analysis_without_document_never_dials_out() {
    let dir = tempfile::tempdir().unwrap();
    let client = offline_client(&dir);

    let mut analysis = QueryAnalysis::new();
    let err = analysis
        .submit(&client, "What does this policy cover?")
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(analysis.state(), AnalysisState::Idle);
}

#[tokio::test]
async fn signup_precondition_blocks_request() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(offline_client(&dir));

    let form = SignupForm {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "one".into(),
        confirm_password: "two".into(),
        first_name: "Alice".into(),
        last_name: "Smith".into(),
        ..SignupForm::default()
    };
    let err = session.signup(&form).await.unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn upload_batch_admits_only_documents() {
    let mut pipeline = UploadPipeline::new();
    let added = pipeline.add_files(vec![
        CandidateFile::new("policy.pdf", MIME_PDF, &b"%PDF-1.4"[..]),
        CandidateFile::new("notes.txt", "text/plain", &b"notes"[..]),
    ]);
    assert_eq!(added, 1);
    assert_eq!(pipeline.batch().len(), 1);
    assert_eq!(pipeline.batch()[0].name, "policy.pdf");
}
