//! Wire types shared across the PolicyIntel API surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Credentials payload for `POST /api/login/`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// New-account payload for `POST /api/signup/`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub role: String,
}

/// Token issued on login (and on signup, which also creates one).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Error body shape the server uses on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The authenticated user's profile from `GET /api/user-info/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Optional on signup; the server sends an empty string when unset.
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Server-assigned handle for an uploaded document.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
}

/// Payload for `POST /api/analyze/`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub document_id: String,
    pub query: String,
}

/// Decision reached by the backend for a query.
///
/// The wire value is a plain string; anything other than the two known
/// verdicts is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Decision {
    Approved,
    Rejected,
    Other(String),
}

impl From<String> for Decision {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("approved") {
            Decision::Approved
        } else if value.eq_ignore_ascii_case("rejected") {
            Decision::Rejected
        } else {
            Decision::Other(value)
        }
    }
}

impl From<Decision> for String {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approved => "Approved".to_string(),
            Decision::Rejected => "Rejected".to_string(),
            Decision::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approved => write!(f, "Approved"),
            Decision::Rejected => write!(f, "Rejected"),
            Decision::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A snippet of source-document text judged relevant to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedClause {
    pub text: String,
    /// Similarity percentage in 0-100.
    pub similarity: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Structured decision returned by `POST /api/analyze/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub decision: Decision,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub matched_clauses: Vec<MatchedClause>,
}

/// The LLM pipeline sometimes emits amounts as strings ("5000" or "5,000").
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.replace(',', "").trim().parse::<f64>().ok(),
        Some(_) => None,
    })
}

/// A persisted past query with its decision and parsed input fields.
///
/// `decision_response` has the same shape as a live [`AnalysisResult`];
/// only the field name differs on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub query_text: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "decision_response")]
    pub response: AnalysisResult,
    /// Field name to extracted-value-or-null mapping from query parsing.
    #[serde(default)]
    pub parsed_input: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub document_id: Option<String>,
}

impl HistoryRecord {
    /// Stable identity for presentation state, independent of the record's
    /// position in any filtered view.
    pub fn stable_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.created_at.to_rfc3339().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.query_text.as_bytes());
        hex::encode(hasher.finalize())
    }
}
