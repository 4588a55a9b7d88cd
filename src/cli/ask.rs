//! Upload and analysis commands.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::analysis::QueryAnalysis;
use crate::models::{AnalysisResult, Decision};
use crate::session::Session;
use crate::upload::{CandidateFile, UploadEvent, UploadPipeline};

/// Minimum visible duration of the analysis spinner. The orchestrator itself
/// transitions on actual completion; this dwell only smooths the display.
const MIN_ANALYSIS_DISPLAY: Duration = Duration::from_millis(1500);

/// Read files from disk into upload candidates, deriving the MIME type from
/// the file extension.
async fn read_candidates(paths: &[PathBuf]) -> anyhow::Result<Vec<CandidateFile>> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let contents = tokio::fs::read(path).await?;
        candidates.push(CandidateFile::new(name, mime_type, contents));
    }
    Ok(candidates)
}

/// Fill a pipeline from paths, warning about files the batch rejects.
async fn stage_files(pipeline: &mut UploadPipeline, paths: &[PathBuf]) -> anyhow::Result<()> {
    let candidates = read_candidates(paths).await?;
    let offered = candidates.len();
    let added = pipeline.add_files(candidates);
    if added < offered {
        eprintln!(
            "{} skipped {} file(s): only PDF and DOCX are accepted",
            style("!").yellow(),
            offered - added
        );
    }
    Ok(())
}

/// Upload the staged batch with a progress bar. Returns the document id, or
/// `None` when the batch was empty.
async fn upload_with_progress(
    session: &Session,
    pipeline: &mut UploadPipeline,
) -> anyhow::Result<Option<String>> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let bar = ProgressBar::new(100).with_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}%")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    let reporter_bar = bar.clone();
    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::Started { files, .. } => {
                    reporter_bar.set_message(format!("Uploading {} file(s)", files));
                }
                UploadEvent::Progress { percent } => reporter_bar.set_position(percent as u64),
                UploadEvent::Completed { .. } => {}
            }
        }
    });

    let outcome = pipeline.upload(session.client(), tx).await;
    let _ = reporter.await;
    bar.finish_and_clear();

    Ok(outcome?)
}

pub async fn cmd_upload(session: &Session, files: &[PathBuf]) -> anyhow::Result<()> {
    if files.is_empty() {
        anyhow::bail!("no files given");
    }

    let mut pipeline = UploadPipeline::new();
    stage_files(&mut pipeline, files).await?;

    match upload_with_progress(session, &mut pipeline).await? {
        Some(document_id) => {
            println!("{} uploaded", style("✓").green());
            println!("  document id: {}", style(document_id).bold());
        }
        None => println!("nothing to upload"),
    }
    Ok(())
}

pub async fn cmd_ask(
    session: &Session,
    query: &str,
    files: &[PathBuf],
    document_id: Option<String>,
) -> anyhow::Result<()> {
    let mut analysis = QueryAnalysis::new();

    if let Some(id) = document_id {
        analysis.set_document(id);
    } else if !files.is_empty() {
        analysis.await_document();
        let mut pipeline = UploadPipeline::new();
        stage_files(&mut pipeline, files).await?;
        if let Some(id) = upload_with_progress(session, &mut pipeline).await? {
            analysis.set_document(id);
        }
    }

    // Reject empty query / missing document before showing any spinner
    analysis.validate(query)?;

    let spinner = ProgressBar::new_spinner().with_message("Analyzing query...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let started = Instant::now();

    let outcome = analysis.submit(session.client(), query).await;

    // Cosmetic minimum display time so fast responses do not flash
    if let Some(remaining) = MIN_ANALYSIS_DISPLAY.checked_sub(started.elapsed()) {
        tokio::time::sleep(remaining).await;
    }
    spinner.finish_and_clear();

    print_result(outcome?);
    Ok(())
}

fn print_result(result: &AnalysisResult) {
    println!();
    match &result.decision {
        Decision::Approved => println!("Decision:      {}", style("✅ Approved").green()),
        Decision::Rejected => println!("Decision:      {}", style("❌ Rejected").red()),
        Decision::Other(other) => println!("Decision:      {}", style(other).yellow()),
    }
    if result.decision == Decision::Approved {
        if let Some(amount) = result.amount {
            println!(
                "Amount:        {}",
                style(format!("${}", group_thousands(amount))).green()
            );
        }
    }
    println!("Justification: {}", result.justification);

    if !result.matched_clauses.is_empty() {
        println!("\n{}", style("Matched clauses").bold());
        println!("{}", "-".repeat(50));
        for clause in &result.matched_clauses {
            println!(
                "  {} {}",
                style(format!("{:.0}% match", clause.similarity)).cyan(),
                style(clause.source.as_deref().unwrap_or("N/A")).dim()
            );
            println!("    {}", clause.text);
        }
    }
}

/// Render an amount with comma-grouped thousands, e.g. `12500 → "12,500"`.
fn group_thousands(amount: f64) -> String {
    let raw = if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1200.0), "1,200");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(1500.5), "1,500.50");
        assert_eq!(group_thousands(-12000.0), "-12,000");
    }
}
