//! PolicyIntel - client for an insurance-document question answering service.
//!
//! Authenticate, upload a policy document, ask a natural-language question,
//! and browse past queries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if policyintel::cli::is_verbose() {
        "policyintel=info"
    } else {
        "policyintel=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    policyintel::cli::run().await
}
