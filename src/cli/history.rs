//! History listing and search.

use chrono::Local;
use console::style;

use crate::history::clause_preview;
use crate::models::{Decision, HistoryRecord};
use crate::session::Session;

pub async fn cmd_history(
    session: &mut Session,
    search: &str,
    expand: Option<usize>,
) -> anyhow::Result<()> {
    session.fetch_history().await?;

    if let Some(position) = expand {
        let index = position.saturating_sub(1);
        if !session.history_mut().toggle_expand_at(search, index) {
            anyhow::bail!("no record at position {}", position);
        }
    }

    let store = session.history();
    let filtered = store.filter(search);
    if filtered.is_empty() {
        println!("No matching queries found.");
        return Ok(());
    }

    println!();
    for (i, record) in filtered.iter().enumerate() {
        print_summary(i + 1, record);
        if store.is_expanded(record) {
            print_expanded(record);
        }
    }
    Ok(())
}

fn print_summary(position: usize, record: &HistoryRecord) {
    let when = record
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M");
    println!(
        "{:>3}. {}  {}",
        position,
        style(&record.query_text).bold(),
        style(when).dim()
    );
    println!(
        "     Document: {}",
        record.filename.as_deref().unwrap_or("N/A")
    );
}

fn print_expanded(record: &HistoryRecord) {
    let response = &record.response;
    let decision = match &response.decision {
        Decision::Approved => style("Approved").green(),
        Decision::Rejected => style("Rejected").red(),
        Decision::Other(other) => style(other.as_str()).yellow(),
    };
    println!("     Decision: {}", decision);
    println!("     Justification: {}", response.justification);

    if !record.parsed_input.is_empty() {
        println!("     Parsed input:");
        for (field, value) in &record.parsed_input {
            let rendered = match value {
                serde_json::Value::Null => "N/A".to_string(),
                serde_json::Value::String(s) if s.is_empty() => "N/A".to_string(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("       {}: {}", field, rendered);
        }
    }

    if !response.matched_clauses.is_empty() {
        println!("     Matched clauses:");
        let preview = clause_preview(&response.matched_clauses);
        for (i, clause) in preview.shown.iter().enumerate() {
            println!("       {}. \"{}\"", i + 1, clause.text);
            println!(
                "          Similarity: {:.2}% - Source: {}",
                clause.similarity,
                clause.source.as_deref().unwrap_or("N/A")
            );
        }
        if preview.remaining > 0 {
            println!(
                "       {}",
                style(format!("...and {} more", preview.remaining)).dim()
            );
        }
    }
    println!();
}
