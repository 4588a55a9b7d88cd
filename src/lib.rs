//! PolicyIntel client - insurance-document question answering.
//!
//! The core is the session and query-orchestration layer: a durable
//! authenticated session ([`session::Session`]), a document upload pipeline
//! ([`upload::UploadPipeline`]), a query analysis state machine
//! ([`analysis::QueryAnalysis`]), and searchable query history
//! ([`history::HistoryStore`]). The CLI in [`cli`] is a thin presentation
//! surface over these.

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod session;
pub mod upload;

pub use client::ApiClient;
pub use error::{Error, Result};
pub use session::Session;
