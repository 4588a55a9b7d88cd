//! CLI for the PolicyIntel client.
//!
//! This module contains the argument parser and dispatches to
//! command-specific modules.

mod ask;
mod auth;
mod history;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::config::Settings;
use crate::session::{Session, SignupForm};

/// Check for the verbose flag before clap parses (logging is initialized
/// before the parser runs).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Parser)]
#[command(name = "policyintel")]
#[command(about = "Client for the PolicyIntel insurance-document question answering service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides the default location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (overrides config file)
    #[arg(long, global = true, env = "POLICYINTEL_API_URL")]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        username: String,
        /// Password (or set POLICYINTEL_PASSWORD)
        #[arg(short, long, env = "POLICYINTEL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "POLICYINTEL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Optional
        #[arg(long)]
        organization: Option<String>,
        /// Optional
        #[arg(long)]
        role: Option<String>,
    },

    /// Clear the stored session token
    Logout,

    /// Show the authenticated user's profile
    Profile,

    /// Upload policy documents and print the document id
    Upload {
        /// PDF or DOCX files to upload
        files: Vec<PathBuf>,
    },

    /// Ask a question about a policy document
    Ask {
        /// The question to analyze
        query: String,
        /// Files to upload before asking (PDF or DOCX)
        #[arg(short, long)]
        file: Vec<PathBuf>,
        /// Reuse a document id from a previous upload
        #[arg(short, long)]
        document_id: Option<String>,
    },

    /// List and search past queries
    History {
        /// Case-insensitive substring filter over query text
        #[arg(short, long)]
        search: Option<String>,
        /// Expand the record at this 1-based position in the listed results
        #[arg(short, long)]
        expand: Option<usize>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        settings.base_url = url;
    }

    let client = ApiClient::new(&settings)?;
    let mut session = Session::new(client);

    match cli.command {
        Commands::Login { username, password } => {
            auth::cmd_login(&mut session, &username, &password).await
        }
        Commands::Signup {
            username,
            email,
            password,
            confirm_password,
            first_name,
            last_name,
            organization,
            role,
        } => {
            let form = SignupForm {
                username,
                email,
                password,
                confirm_password,
                first_name,
                last_name,
                organization,
                role,
            };
            auth::cmd_signup(&session, &form).await
        }
        Commands::Logout => auth::cmd_logout(&mut session),
        Commands::Profile => auth::cmd_profile(&mut session).await,
        Commands::Upload { files } => ask::cmd_upload(&session, &files).await,
        Commands::Ask {
            query,
            file,
            document_id,
        } => ask::cmd_ask(&session, &query, &file, document_id).await,
        Commands::History { search, expand } => {
            history::cmd_history(&mut session, search.as_deref().unwrap_or(""), expand).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_accepts_files_and_document_id() {
        let cli = Cli::try_parse_from([
            "policyintel",
            "ask",
            "What does this policy cover?",
            "--file",
            "policy.pdf",
            "--document-id",
            "doc-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask {
                query,
                file,
                document_id,
            } => {
                assert_eq!(query, "What does this policy cover?");
                assert_eq!(file.len(), 1);
                assert_eq!(document_id.as_deref(), Some("doc-1"));
            }
            _ => panic!("expected ask command"),
        }
    }
}
